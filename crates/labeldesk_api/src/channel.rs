//! Job-scoped WebSocket push channel (`/ws/jobs/{id}`).
//!
//! The backend pushes the same JSON shape as `GET /api/jobs/{id}` roughly
//! once a second and closes the socket after a terminal status. While the
//! job row is not visible yet it pushes `{"error": "job not found"}` instead.

use futures::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::ApiError;
use crate::session::Session;
use crate::types::{DbId, JobDto};

/// One decoded frame from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelFrame {
    /// A full job snapshot
    Status(JobDto),
    /// A transient error reported by the backend (e.g. job row not visible yet)
    Error(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFrame {
    Error { error: String },
    Status(JobDto),
}

impl ChannelFrame {
    /// Decode a text or binary frame body.
    pub fn parse(bytes: &[u8]) -> Result<Self, ApiError> {
        let raw: RawFrame = serde_json::from_slice(bytes)?;
        Ok(match raw {
            RawFrame::Error { error } => ChannelFrame::Error(error),
            RawFrame::Status(job) => ChannelFrame::Status(job),
        })
    }
}

/// A live push channel for one job.
pub struct JobChannel {
    job_id: DbId,
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl JobChannel {
    /// Open the push channel for `job_id`.
    pub async fn connect(session: &Session, job_id: DbId) -> Result<Self, ApiError> {
        let url = session.ws_route(&format!("/ws/jobs/{job_id}"));
        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))?;
        if let Some(token) = &session.token {
            let value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|e| ApiError::WebSocket(format!("invalid token header: {e}")))?;
            request.headers_mut().insert("Authorization", value);
        }

        let (stream, _response) = connect_async(request)
            .await
            .map_err(|e| ApiError::WebSocket(format!("failed to connect to {url}: {e}")))?;

        log::info!("Job {} push channel connected at {}", job_id, url);
        Ok(Self { job_id, stream })
    }

    /// Job this channel is scoped to.
    pub fn job_id(&self) -> DbId {
        self.job_id
    }

    /// Wait for the next frame.
    ///
    /// Returns `Ok(None)` once the server closed the channel.
    pub async fn next_frame(&mut self) -> Result<Option<ChannelFrame>, ApiError> {
        while let Some(message) = self.stream.next().await {
            let message = message.map_err(|e| ApiError::WebSocket(e.to_string()))?;
            match message {
                Message::Text(text) => return ChannelFrame::parse(text.as_bytes()).map(Some),
                Message::Binary(data) => return ChannelFrame::parse(&data).map(Some),
                Message::Close(_) => {
                    log::debug!("Job {} push channel closed by server", self.job_id);
                    return Ok(None);
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    /// Close the channel; errors are ignored since the socket is being dropped.
    pub async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            log::debug!("Job {} push channel close: {}", self.job_id, e);
        }
    }
}
