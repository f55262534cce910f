//! reqwest implementation of [`Backend`].

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use crate::backend::{Backend, RawPayload};
use crate::error::ApiError;
use crate::session::Session;
use crate::types::{
    AnnotationDto, DbId, ItemDto, JobDto, LabelClassDto, LiveCsv, LockGrant, LockRequest,
    UnlockRequest,
};

/// HTTP client for one backend on behalf of one session.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    session: Session,
}

impl HttpBackend {
    /// Create a client with a fresh connection pool.
    pub fn new(session: Session) -> Self {
        Self {
            client: reqwest::Client::new(),
            session,
        }
    }

    fn get(&self, route: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.session.url(route)))
    }

    fn post(&self, route: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.session.url(route)))
    }

    fn put(&self, route: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.put(self.session.url(route)))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.session.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ---- private helpers ----

    /// Return the response unchanged on 2xx, or an [`ApiError::Status`]
    /// carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait(?Send)]
impl Backend for HttpBackend {
    async fn list_items_page(
        &self,
        dataset_id: DbId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ItemDto>, ApiError> {
        let response = self
            .get(&format!("/api/datasets/{dataset_id}/items"))
            .query(&[("offset", offset), ("limit", limit)])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_classes(&self, project_id: DbId) -> Result<Vec<LabelClassDto>, ApiError> {
        let response = self
            .get(&format!("/api/projects/{project_id}/classes"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn load_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
    ) -> Result<Vec<AnnotationDto>, ApiError> {
        let response = self
            .get(&format!("/api/items/{item_id}/annotations"))
            .query(&[("annotation_set_id", annotation_set_id)])
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn replace_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
        annotations: &[AnnotationDto],
    ) -> Result<Vec<AnnotationDto>, ApiError> {
        let response = self
            .put(&format!("/api/items/{item_id}/annotations"))
            .query(&[("annotation_set_id", annotation_set_id)])
            .json(annotations)
            .send()
            .await?;
        log::debug!(
            "PUT annotations item={} set={} count={} -> {}",
            item_id,
            annotation_set_id,
            annotations.len(),
            response.status()
        );
        Self::parse_response(response).await
    }

    async fn acquire_lock(&self, item_id: DbId, request: &LockRequest) -> Result<LockGrant, ApiError> {
        let response = self
            .post(&format!("/api/items/{item_id}/lock"))
            .json(request)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn release_lock(&self, item_id: DbId, request: &UnlockRequest) -> Result<(), ApiError> {
        let response = self
            .post(&format!("/api/items/{item_id}/unlock"))
            .json(request)
            .send()
            .await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn fetch_raw(&self, route: &str) -> Result<RawPayload, ApiError> {
        let response = Self::ensure_success(self.get(route).send().await?).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();
        let bytes = response.bytes().await?.to_vec();
        Ok(RawPayload {
            content_type,
            bytes,
        })
    }

    async fn get_job(&self, job_id: DbId) -> Result<JobDto, ApiError> {
        let response = self.get(&format!("/api/jobs/{job_id}")).send().await?;
        Self::parse_response(response).await
    }

    async fn live_metrics(&self, job_id: DbId, limit: u32) -> Result<LiveCsv, ApiError> {
        let response = self
            .get(&format!("/api/jobs/{job_id}/train-yolo/live-csv"))
            .query(&[("limit", limit)])
            .send()
            .await?;
        Self::parse_response(response).await
    }
}
