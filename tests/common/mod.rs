//! In-memory backend shared by the integration tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use labeldesk_api::types::{
    AnnotationDto, DbId, ItemDto, JobDto, LabelClassDto, LiveCsv, LockGrant, LockRequest,
    UnlockRequest,
};
use labeldesk_api::{ApiError, Backend, ITEMS_PAGE_SIZE, RawPayload};
use tokio::time::Instant;

pub const PROJECT: DbId = 1;
pub const DATASET: DbId = 2;
pub const ANNOTATION_SET: DbId = 3;

fn status(status: u16, detail: &str) -> ApiError {
    ApiError::Status {
        status,
        body: format!(r#"{{"detail":"{detail}"}}"#),
    }
}

pub fn item(id: DbId, width: u32, height: u32) -> ItemDto {
    ItemDto {
        id,
        file_name: format!("item-{id}.png"),
        width,
        height,
        split: "train".into(),
    }
}

pub fn class(id: DbId, name: &str, color: &str) -> LabelClassDto {
    LabelClassDto {
        id,
        name: name.into(),
        color: color.into(),
        order_index: id as i32,
    }
}

pub fn job(id: DbId, status: &str, progress: f64) -> JobDto {
    JobDto {
        id,
        status: status.into(),
        progress,
        message: format!("{status} {:.0}%", progress * 100.0),
        updated_at: None,
        job_type: Some("train_yolo".into()),
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba([40, 80, 120, 255]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("encode png");
    bytes
}

/// Backend state held in memory; every call is recorded.
#[derive(Default)]
pub struct FakeBackend {
    pub items: RefCell<Vec<ItemDto>>,
    pub classes: RefCell<Vec<LabelClassDto>>,
    pub annotations: RefCell<HashMap<DbId, Vec<AnnotationDto>>>,
    /// Artificial latency of annotation loads, per item
    pub load_delay: RefCell<HashMap<DbId, Duration>>,
    /// Lock calls that succeed before every further one is refused
    pub lock_budget: Cell<Option<usize>>,
    pub lock_calls: RefCell<Vec<(DbId, Instant)>>,
    pub releases: RefCell<Vec<DbId>>,
    pub saves: RefCell<Vec<(DbId, Vec<AnnotationDto>)>>,
    pub jobs: RefCell<VecDeque<Result<JobDto, u16>>>,
    pub job_polls: Cell<usize>,
    pub metrics: RefCell<VecDeque<Result<LiveCsv, u16>>>,
    pub metric_polls: Cell<usize>,
    next_id: Cell<DbId>,
}

impl FakeBackend {
    /// Dataset with two items (800x600, 640x480) and two classes.
    pub fn dataset() -> Self {
        let backend = Self::default();
        backend.next_id.set(100);
        *backend.items.borrow_mut() = vec![item(10, 800, 600), item(11, 640, 480)];
        *backend.classes.borrow_mut() = vec![class(5, "car", "#ff0000"), class(6, "person", "#00ff00")];
        backend
    }

    pub fn lock_call_count(&self) -> usize {
        self.lock_calls.borrow().len()
    }
}

#[async_trait(?Send)]
impl Backend for FakeBackend {
    async fn list_items_page(
        &self,
        dataset_id: DbId,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<ItemDto>, ApiError> {
        assert_eq!(dataset_id, DATASET);
        let items = self.items.borrow();
        let start = (offset as usize).min(items.len());
        let end = (start + limit.min(ITEMS_PAGE_SIZE) as usize).min(items.len());
        Ok(items[start..end].to_vec())
    }

    async fn list_classes(&self, project_id: DbId) -> Result<Vec<LabelClassDto>, ApiError> {
        assert_eq!(project_id, PROJECT);
        Ok(self.classes.borrow().clone())
    }

    async fn load_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
    ) -> Result<Vec<AnnotationDto>, ApiError> {
        assert_eq!(annotation_set_id, ANNOTATION_SET);
        let delay = self.load_delay.borrow().get(&item_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .annotations
            .borrow()
            .get(&item_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn replace_annotations(
        &self,
        item_id: DbId,
        annotation_set_id: DbId,
        annotations: &[AnnotationDto],
    ) -> Result<Vec<AnnotationDto>, ApiError> {
        assert_eq!(annotation_set_id, ANNOTATION_SET);
        let stored: Vec<AnnotationDto> = annotations
            .iter()
            .cloned()
            .map(|mut a| {
                if a.id.is_none() {
                    let id = self.next_id.get();
                    self.next_id.set(id + 1);
                    a.id = Some(id);
                }
                a
            })
            .collect();
        self.saves.borrow_mut().push((item_id, annotations.to_vec()));
        self.annotations.borrow_mut().insert(item_id, stored.clone());
        Ok(stored)
    }

    async fn acquire_lock(&self, item_id: DbId, request: &LockRequest) -> Result<LockGrant, ApiError> {
        assert_eq!(request.annotation_set_id, ANNOTATION_SET);
        let calls = {
            let mut calls = self.lock_calls.borrow_mut();
            calls.push((item_id, Instant::now()));
            calls.len()
        };
        if self.lock_budget.get().is_some_and(|budget| calls > budget) {
            return Err(status(409, "locked by another user"));
        }
        Ok(LockGrant {
            ok: true,
            expires_at: Utc::now() + chrono::Duration::seconds(i64::from(request.ttl_seconds)),
        })
    }

    async fn release_lock(&self, item_id: DbId, request: &UnlockRequest) -> Result<(), ApiError> {
        assert_eq!(request.annotation_set_id, ANNOTATION_SET);
        self.releases.borrow_mut().push(item_id);
        Ok(())
    }

    async fn fetch_raw(&self, route: &str) -> Result<RawPayload, ApiError> {
        let item = self
            .items
            .borrow()
            .iter()
            .find(|item| route == format!("/api/items/{}/file", item.id))
            .cloned();
        match item {
            Some(item) => Ok(RawPayload {
                content_type: "image/png".into(),
                bytes: png_bytes(item.width / 100, item.height / 100),
            }),
            None => Err(status(404, "not found")),
        }
    }

    async fn get_job(&self, _job_id: DbId) -> Result<JobDto, ApiError> {
        self.job_polls.set(self.job_polls.get() + 1);
        match self.jobs.borrow_mut().pop_front() {
            Some(Ok(job)) => Ok(job),
            Some(Err(code)) => Err(status(code, "job error")),
            None => Err(status(500, "script exhausted")),
        }
    }

    async fn live_metrics(&self, _job_id: DbId, _limit: u32) -> Result<LiveCsv, ApiError> {
        self.metric_polls.set(self.metric_polls.get() + 1);
        match self.metrics.borrow_mut().pop_front() {
            Some(Ok(table)) => Ok(table),
            Some(Err(code)) => Err(status(code, "metrics error")),
            None => Err(status(404, "results.csv not found")),
        }
    }
}
