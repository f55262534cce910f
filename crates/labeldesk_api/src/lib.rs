//! labeldesk_api - backend client for the labeldesk annotation editor.
//!
//! This crate owns everything that crosses the wire:
//! - [`types`]: request/response bodies as the backend serializes them
//! - [`Backend`]: the async seam the editor runtime talks to
//! - [`HttpBackend`]: the reqwest implementation of [`Backend`]
//! - [`JobChannel`]: the job-scoped WebSocket push channel
//! - [`Session`]: explicit connection context (base URL, bearer token, owner)

mod backend;
mod channel;
mod error;
mod http;
mod session;
pub mod types;

pub use backend::{Backend, ITEMS_PAGE_SIZE, RawPayload};
pub use channel::{ChannelFrame, JobChannel};
pub use error::ApiError;
pub use http::HttpBackend;
pub use session::{Role, Session};
