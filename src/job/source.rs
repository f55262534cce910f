//! Where job snapshots come from.
//!
//! A [`StatusSource`] yields snapshots one at a time. [`PushSource`] reads the
//! job's WebSocket channel; [`PollSource`] asks `GET /api/jobs/{id}` on a fixed
//! interval. The watcher does not care which one it holds.

use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;
use labeldesk_api::types::{DbId, JobDto};
use labeldesk_api::{Backend, ChannelFrame, JobChannel, Session};
use tokio::time::{Interval, MissedTickBehavior};

use crate::error::MonitorError;

/// Transport behind a [`StatusSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Push,
    Poll,
}

impl SourceKind {
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Push => "push",
            SourceKind::Poll => "poll",
        }
    }
}

/// A stream of job snapshots.
#[async_trait(?Send)]
pub trait StatusSource {
    fn kind(&self) -> SourceKind;

    /// Wait for the next snapshot.
    ///
    /// `Ok(None)` means the source is exhausted (the push channel closed).
    async fn next_snapshot(&mut self) -> Result<Option<JobDto>, MonitorError>;

    /// Stop producing snapshots and release the transport.
    async fn close(&mut self);
}

/// Snapshots pushed over the job's WebSocket channel.
pub struct PushSource {
    channel: JobChannel,
}

impl PushSource {
    pub fn new(channel: JobChannel) -> Self {
        Self { channel }
    }

    pub async fn connect(session: &Session, job_id: DbId) -> Result<Self, MonitorError> {
        Ok(Self::new(JobChannel::connect(session, job_id).await?))
    }
}

#[async_trait(?Send)]
impl StatusSource for PushSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Push
    }

    async fn next_snapshot(&mut self) -> Result<Option<JobDto>, MonitorError> {
        loop {
            match self.channel.next_frame().await? {
                Some(ChannelFrame::Status(job)) => return Ok(Some(job)),
                Some(ChannelFrame::Error(reason)) => {
                    log::debug!("Job {} push error frame: {}", self.channel.job_id(), reason);
                }
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) {
        self.channel.close().await;
    }
}

/// Snapshots fetched from the status endpoint on a fixed interval.
///
/// The first fetch happens immediately.
pub struct PollSource<B: Backend + ?Sized> {
    backend: Rc<B>,
    job_id: DbId,
    ticker: Interval,
}

impl<B: Backend + ?Sized> PollSource<B> {
    pub fn new(backend: Rc<B>, job_id: DbId, interval: Duration) -> Self {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            backend,
            job_id,
            ticker,
        }
    }
}

#[async_trait(?Send)]
impl<B: Backend + ?Sized> StatusSource for PollSource<B> {
    fn kind(&self) -> SourceKind {
        SourceKind::Poll
    }

    async fn next_snapshot(&mut self) -> Result<Option<JobDto>, MonitorError> {
        self.ticker.tick().await;
        match self.backend.get_job(self.job_id).await {
            Ok(job) => Ok(Some(job)),
            Err(e) if e.is_not_found() => Err(MonitorError::NotFound(self.job_id)),
            Err(e) => Err(MonitorError::Api(e)),
        }
    }

    async fn close(&mut self) {}
}

/// Open the best available source: the push channel when `prefer_push` is
/// set and it connects, polling otherwise.
pub async fn connect_source<B: Backend + ?Sized + 'static>(
    backend: Rc<B>,
    session: &Session,
    job_id: DbId,
    prefer_push: bool,
    poll_interval: Duration,
) -> Box<dyn StatusSource> {
    if prefer_push {
        match PushSource::connect(session, job_id).await {
            Ok(source) => return Box::new(source),
            Err(e) => log::warn!("Job {} push channel unavailable, polling: {}", job_id, e),
        }
    }
    Box::new(PollSource::new(backend, job_id, poll_interval))
}
