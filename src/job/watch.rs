//! Follows one job until it reaches a terminal status.

use std::rc::Rc;
use std::time::Duration;

use labeldesk_api::types::DbId;
use labeldesk_api::{Backend, Session};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::source::{PollSource, SourceKind, StatusSource, connect_source};
use super::status::{Job, JobMonitor, JobStatus, Observation};
use crate::config::JobsConfig;
use crate::error::MonitorError;

/// Progress reported while watching.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    /// Snapshots now come from this transport
    SourceChanged(SourceKind),
    /// A non-terminal snapshot replaced the held job
    Updated(Job),
    /// A poll failed; polling continues
    Error(String),
    /// Terminal status; raised once, after which the watch ends
    Finished(Job),
}

/// Drives a [`JobMonitor`] from a [`StatusSource`], falling back from push to
/// polling when the channel fails.
pub struct JobWatcher<B: Backend + ?Sized + 'static> {
    backend: Rc<B>,
    session: Session,
    prefer_push: bool,
    poll_interval: Duration,
    monitor: JobMonitor,
    last_error: Option<String>,
    status_tx: watch::Sender<Option<JobStatus>>,
}

impl<B: Backend + ?Sized + 'static> JobWatcher<B> {
    pub fn new(backend: Rc<B>, session: Session, job_id: DbId, config: &JobsConfig) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            backend,
            session,
            prefer_push: config.prefer_push,
            poll_interval: config.poll_interval(),
            monitor: JobMonitor::new(job_id),
            last_error: None,
            status_tx,
        }
    }

    pub fn job_id(&self) -> DbId {
        self.monitor.job_id()
    }

    pub fn monitor(&self) -> &JobMonitor {
        &self.monitor
    }

    /// Reason of the last failed poll, cleared by the next snapshot.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Receiver of the latest known status, e.g. for a metrics reader.
    pub fn subscribe(&self) -> watch::Receiver<Option<JobStatus>> {
        self.status_tx.subscribe()
    }

    /// Watch the job until it finishes, fails hard or `cancel` fires.
    pub async fn run(
        &mut self,
        cancel: CancellationToken,
        on_event: impl FnMut(JobEvent),
    ) -> Result<Job, MonitorError> {
        let source = connect_source(
            Rc::clone(&self.backend),
            &self.session,
            self.job_id(),
            self.prefer_push,
            self.poll_interval,
        )
        .await;
        self.watch(source, cancel, on_event).await
    }

    /// Watch starting from an already opened source.
    pub async fn watch(
        &mut self,
        mut source: Box<dyn StatusSource>,
        cancel: CancellationToken,
        mut on_event: impl FnMut(JobEvent),
    ) -> Result<Job, MonitorError> {
        let job_id = self.job_id();
        log::debug!("👀 Watching job {} via {}", job_id, source.kind().name());
        on_event(JobEvent::SourceChanged(source.kind()));

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => None,
                next = source.next_snapshot() => Some(next),
            };
            let Some(next) = next else {
                log::debug!("Watch of job {} cancelled", job_id);
                source.close().await;
                return Err(MonitorError::Cancelled);
            };

            match next {
                Ok(Some(dto)) => match self.monitor.observe(dto) {
                    Observation::Updated(job) => {
                        self.last_error = None;
                        self.status_tx.send_replace(Some(job.status));
                        on_event(JobEvent::Updated(job));
                    }
                    Observation::Finished(job) => {
                        self.last_error = None;
                        source.close().await;
                        self.status_tx.send_replace(Some(job.status));
                        on_event(JobEvent::Finished(job.clone()));
                        return Ok(job);
                    }
                    Observation::Ignored => {}
                },
                Ok(None) => {
                    log::debug!("Job {} {} source ended early", job_id, source.kind().name());
                    source = self.fall_back(source, &mut on_event).await;
                }
                Err(MonitorError::NotFound(id)) => {
                    source.close().await;
                    return Err(MonitorError::NotFound(id));
                }
                Err(e) if source.kind() == SourceKind::Push => {
                    log::warn!("Job {} push channel failed: {}", job_id, e);
                    source = self.fall_back(source, &mut on_event).await;
                }
                Err(e) => {
                    log::warn!("Job {} poll failed: {}", job_id, e);
                    let reason = e.to_string();
                    self.last_error = Some(reason.clone());
                    on_event(JobEvent::Error(reason));
                }
            }
        }
    }

    async fn fall_back(
        &self,
        mut old: Box<dyn StatusSource>,
        on_event: &mut impl FnMut(JobEvent),
    ) -> Box<dyn StatusSource> {
        old.close().await;
        let source = PollSource::new(Rc::clone(&self.backend), self.job_id(), self.poll_interval);
        on_event(JobEvent::SourceChanged(SourceKind::Poll));
        Box::new(source)
    }
}
