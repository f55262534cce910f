//! Job status state machine and the monitor that enforces it.

use chrono::{DateTime, Utc};
use labeldesk_api::types::{DbId, JobDto};

/// Lifecycle of a backend job: `queued -> running -> {success | done | failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    Failed,
    Done,
}

impl JobStatus {
    /// Parse the backend status string. Unknown strings yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Some(JobStatus::Queued),
            "running" => Some(JobStatus::Running),
            "success" => Some(JobStatus::Success),
            "failed" => Some(JobStatus::Failed),
            "done" => Some(JobStatus::Done),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Done => "done",
        }
    }

    /// `success`, `done` and `failed` end the job.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed | JobStatus::Done)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.name())
    }
}

/// A validated job snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub id: DbId,
    pub status: JobStatus,
    /// Fraction complete in `[0, 1]`
    pub progress: f64,
    pub message: String,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Validate a wire snapshot. Returns `None` for unknown status strings;
    /// progress is clamped into `[0, 1]`.
    pub fn from_dto(dto: JobDto) -> Option<Self> {
        let status = JobStatus::parse(&dto.status)?;
        let progress = if dto.progress.is_finite() {
            dto.progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Some(Self {
            id: dto.id,
            status,
            progress,
            message: dto.message,
            updated_at: dto.updated_at,
        })
    }
}

/// What an observed snapshot did to the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// The snapshot replaced the held job
    Updated(Job),
    /// The snapshot was terminal; raised exactly once per job
    Finished(Job),
    /// Snapshot dropped (after terminal, other job, or unknown status)
    Ignored,
}

/// Holds the latest snapshot of one job.
#[derive(Debug, Clone)]
pub struct JobMonitor {
    job_id: DbId,
    job: Option<Job>,
    finished: bool,
}

impl JobMonitor {
    pub fn new(job_id: DbId) -> Self {
        Self {
            job_id,
            job: None,
            finished: false,
        }
    }

    pub fn job_id(&self) -> DbId {
        self.job_id
    }

    /// Latest snapshot, if any arrived.
    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Process one wire snapshot.
    pub fn observe(&mut self, dto: JobDto) -> Observation {
        if self.finished {
            log::trace!("Job {} already finished; snapshot ignored", self.job_id);
            return Observation::Ignored;
        }
        if dto.id != self.job_id {
            log::debug!("Snapshot for job {} ignored by monitor of {}", dto.id, self.job_id);
            return Observation::Ignored;
        }
        let Some(job) = Job::from_dto(dto.clone()) else {
            log::debug!("Job {} reported unknown status {:?}", self.job_id, dto.status);
            return Observation::Ignored;
        };
        self.job = Some(job.clone());
        if job.status.is_terminal() {
            self.finished = true;
            log::info!("🏁 Job {} finished: {} {}", job.id, job.status, job.message);
            Observation::Finished(job)
        } else {
            log::debug!(
                "Job {} {} {:.0}% {}",
                job.id,
                job.status,
                job.progress * 100.0,
                job.message
            );
            Observation::Updated(job)
        }
    }
}
