//! Monitoring of long-running backend jobs (auto-annotation, training).
//!
//! - [`status`]: the status state machine and [`JobMonitor`]
//! - [`source`]: push and poll transports behind [`StatusSource`]
//! - [`watch`]: [`JobWatcher`], which follows a job to its terminal status
//! - [`metrics`]: [`MetricsReader`] for the live results table

pub mod metrics;
pub mod source;
pub mod status;
pub mod watch;

pub use metrics::{MetricsReader, MetricsState};
pub use source::{PollSource, PushSource, SourceKind, StatusSource, connect_source};
pub use status::{Job, JobMonitor, JobStatus, Observation};
pub use watch::{JobEvent, JobWatcher};
