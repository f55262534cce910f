//! The async seam between the editor runtime and the labeling backend.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{
    AnnotationDto, DbId, ItemDto, JobDto, LabelClassDto, LiveCsv, LockGrant, LockRequest,
    UnlockRequest,
};

/// Largest page the backend serves from the item listing.
pub const ITEMS_PAGE_SIZE: u32 = 500;

/// Raw bytes returned by a binary route, with the declared content type.
#[derive(Debug, Clone, Default)]
pub struct RawPayload {
    /// `Content-Type` header value, lowercased; empty when absent
    pub content_type: String,
    /// Response body
    pub bytes: Vec<u8>,
}

impl RawPayload {
    /// Whether the backend declared an image media type.
    pub fn is_image_typed(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

/// Backend operations the editor core depends on.
///
/// The runtime is single-threaded, so futures are not required to be `Send`.
#[async_trait(?Send)]
pub trait Backend {
    /// List one page of a dataset's items in backend order.
    async fn list_items_page(
        &self,
        dataset_id: DbId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ItemDto>, ApiError>;

    /// List every item of a dataset, following pages until a short one.
    async fn list_items(&self, dataset_id: DbId) -> Result<Vec<ItemDto>, ApiError> {
        let mut items = Vec::new();
        loop {
            let page = self
                .list_items_page(dataset_id, items.len() as u32, ITEMS_PAGE_SIZE)
                .await?;
            let done = page.len() < ITEMS_PAGE_SIZE as usize;
            items.extend(page);
            if done {
                return Ok(items);
            }
        }
    }

    /// List a project's label classes.
    async fn list_classes(&self, project_id: DbId) -> Result<Vec<LabelClassDto>, ApiError>;

    /// Load the annotation list of an (item, annotation set) pair.
    async fn load_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
    ) -> Result<Vec<AnnotationDto>, ApiError>;

    /// Replace the annotation list of an (item, annotation set) pair wholesale.
    ///
    /// Returns the stored list with server-assigned ids.
    async fn replace_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
        annotations: &[AnnotationDto],
    ) -> Result<Vec<AnnotationDto>, ApiError>;

    /// Acquire or renew the edit lock on an item.
    async fn acquire_lock(&self, item_id: DbId, request: &LockRequest) -> Result<LockGrant, ApiError>;

    /// Release the edit lock on an item.
    async fn release_lock(&self, item_id: DbId, request: &UnlockRequest) -> Result<(), ApiError>;

    /// Fetch an arbitrary authenticated binary route (image candidates).
    async fn fetch_raw(&self, route: &str) -> Result<RawPayload, ApiError>;

    /// Fetch a job's current status.
    async fn get_job(&self, job_id: DbId) -> Result<JobDto, ApiError>;

    /// Fetch the tail of a training job's results table.
    async fn live_metrics(&self, job_id: DbId, limit: u32) -> Result<LiveCsv, ApiError>;
}
