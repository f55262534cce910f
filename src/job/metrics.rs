//! Live metrics tail of a training job.
//!
//! The results table only appears after the first epoch, so a 404 from the
//! tail endpoint means "not yet", not failure.

use std::rc::Rc;
use std::time::Duration;

use labeldesk_api::Backend;
use labeldesk_api::types::{DbId, LiveCsv};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::status::JobStatus;

/// What the reader currently knows about the metrics table.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MetricsState {
    /// Nothing published yet
    #[default]
    Pending,
    /// Latest tail of the table
    Ready(LiveCsv),
    /// The last fetch failed; polling continues
    Failed(String),
}

/// Polls the metrics tail independently of the status channel.
pub struct MetricsReader<B: Backend + ?Sized> {
    backend: Rc<B>,
    job_id: DbId,
    rows: u32,
    state: MetricsState,
}

impl<B: Backend + ?Sized> MetricsReader<B> {
    pub fn new(backend: Rc<B>, job_id: DbId, rows: u32) -> Self {
        Self {
            backend,
            job_id,
            rows,
            state: MetricsState::Pending,
        }
    }

    pub fn state(&self) -> &MetricsState {
        &self.state
    }

    /// Fetch the tail once.
    pub async fn refresh(&mut self) -> &MetricsState {
        self.state = match self.backend.live_metrics(self.job_id, self.rows).await {
            Ok(table) => {
                log::trace!("Job {} metrics: {} rows", self.job_id, table.rows.len());
                MetricsState::Ready(table)
            }
            Err(e) if e.is_not_found() => {
                log::trace!("Job {} metrics not published yet", self.job_id);
                MetricsState::Pending
            }
            Err(e) => {
                log::warn!("Job {} metrics fetch failed: {}", self.job_id, e);
                MetricsState::Failed(e.reason())
            }
        };
        &self.state
    }

    /// Poll every `interval` while `status` reports an active job.
    ///
    /// Stops when the status turns terminal, its sender goes away or
    /// `cancel` fires. Polling does not start before a status is known.
    pub async fn follow(
        &mut self,
        interval: Duration,
        mut status: watch::Receiver<Option<JobStatus>>,
        cancel: CancellationToken,
        mut on_update: impl FnMut(&MetricsState),
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if status.borrow_and_update().is_some_and(|s| s.is_terminal()) {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let current = *status.borrow();
                    match current {
                        Some(s) if s.is_terminal() => break,
                        Some(_) => on_update(self.refresh().await),
                        None => {}
                    }
                }
            }
        }
        log::debug!("Job {} metrics reader stopped", self.job_id);
    }
}
