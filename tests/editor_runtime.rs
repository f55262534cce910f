//! Drives the editor runtime against an in-memory backend with paused time.

mod common;

use std::rc::Rc;
use std::time::Duration;

use common::{ANNOTATION_SET, DATASET, FakeBackend, PROJECT};
use labeldesk::editor::{Editor, EditorContext, ImageState, LoadState};
use labeldesk::input::PointerEvent;
use labeldesk::message::Message;
use labeldesk::runtime::Runtime;
use labeldesk::scene::BannerLevel;
use labeldesk::tools::Tool;
use labeldesk::EditorConfig;
use labeldesk_api::types::{AnnotationAttributes, AnnotationDto};
use labeldesk_api::Session;
use tokio::task::LocalSet;

fn runtime(backend: &Rc<FakeBackend>) -> Runtime<FakeBackend> {
    let session = Session::new("http://localhost:8000", "alice");
    let context = EditorContext::new(&session, PROJECT, DATASET, ANNOTATION_SET);
    let editor = Editor::new(context, &EditorConfig::new());
    Runtime::new(Rc::clone(backend), editor)
}

/// Process messages until `done` holds.
async fn pump_until(runtime: &mut Runtime<FakeBackend>, mut done: impl FnMut(&Editor) -> bool) {
    let wait = async {
        while !done(runtime.editor()) {
            runtime.next().await;
        }
    };
    tokio::time::timeout(Duration::from_secs(3600), wait)
        .await
        .expect("editor never reached the expected state");
}

fn ready(editor: &Editor) -> bool {
    editor.lease().is_locked()
        && editor.shapes_state() == &LoadState::Ready
        && matches!(editor.image(), ImageState::Ready(_))
}

fn drag(runtime: &mut Runtime<FakeBackend>, from: (f32, f32), to: (f32, f32)) {
    runtime.dispatch(Message::Pointer(PointerEvent::Down { x: from.0, y: from.1 }));
    runtime.dispatch(Message::Pointer(PointerEvent::Move { x: to.0, y: to.1 }));
    runtime.dispatch(Message::Pointer(PointerEvent::Up { x: to.0, y: to.1 }));
}

fn click(runtime: &mut Runtime<FakeBackend>, x: f32, y: f32) {
    runtime.dispatch(Message::Pointer(PointerEvent::Down { x, y }));
    runtime.dispatch(Message::Pointer(PointerEvent::Up { x, y }));
}

#[tokio::test(start_paused = true)]
async fn box_drag_delete_save() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;
            assert_eq!(runtime.editor().current_item().map(|i| i.id), Some(10));
            assert_eq!(runtime.editor().active_class(), Some(5));

            drag(&mut runtime, (100.0, 100.0), (300.0, 250.0));
            let shape = &runtime.editor().shapes()[0];
            assert_eq!((shape.rect.x, shape.rect.y), (100.0, 100.0));
            assert_eq!((shape.rect.w, shape.rect.h), (200.0, 150.0));

            runtime.dispatch(Message::SetTool(Tool::Select));
            drag(&mut runtime, (200.0, 200.0), (50.0, 200.0));
            assert_eq!(runtime.editor().shapes()[0].rect.x, 0.0);
            assert_eq!(runtime.editor().shapes()[0].rect.w, 200.0);

            runtime.dispatch(Message::DeleteSelected);
            assert!(runtime.editor().shapes().is_empty());
            assert!(runtime.editor().is_dirty());

            runtime.dispatch(Message::Save);
            assert!(runtime.editor().is_saving());
            pump_until(&mut runtime, |e| !e.is_saving()).await;

            assert!(!runtime.editor().is_dirty());
            assert_eq!(backend.saves.borrow().as_slice(), &[(10, Vec::new())]);
            // A successful save renews the lease
            pump_until(&mut runtime, |e| !e.lease().in_flight()).await;
            assert_eq!(backend.lock_call_count(), 2);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn polygon_is_saved_with_envelope_and_ids_come_back() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;

            runtime.dispatch(Message::SetTool(Tool::DrawPolygon));
            click(&mut runtime, 10.0, 10.0);
            click(&mut runtime, 50.0, 10.0);
            runtime.dispatch(Message::Pointer(PointerEvent::Down { x: 30.0, y: 40.0 }));
            runtime.dispatch(Message::Pointer(PointerEvent::DoubleClick { x: 30.0, y: 40.0 }));
            assert_eq!(runtime.editor().shapes().len(), 1);

            runtime.dispatch(Message::Save);
            pump_until(&mut runtime, |e| !e.is_saving()).await;

            let saves = backend.saves.borrow();
            let (item_id, sent) = &saves[0];
            assert_eq!(*item_id, 10);
            let expected = AnnotationDto {
                id: None,
                class_id: 5,
                x: 10.0,
                y: 10.0,
                w: 40.0,
                h: 30.0,
                confidence: None,
                approved: false,
                attributes: Some(AnnotationAttributes {
                    polygon: Some(vec![10.0, 10.0, 50.0, 10.0, 30.0, 40.0]),
                    ..AnnotationAttributes::default()
                }),
            };
            assert_eq!(sent.as_slice(), &[expected]);
            assert_eq!(runtime.editor().shapes()[0].id, Some(100));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn lease_is_renewed_before_it_expires() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;
            let first_expiry = runtime.editor().lease().expires_at();

            let renewed = Rc::clone(&backend);
            pump_until(&mut runtime, move |e| {
                renewed.lock_call_count() == 2 && !e.lease().in_flight()
            })
            .await;

            let calls = backend.lock_calls.borrow();
            let gap = calls[1].1 - calls[0].1;
            assert!(gap < Duration::from_secs(300), "renewed after {:?}", gap);
            assert!(gap >= Duration::from_secs(150), "renewed after {:?}", gap);
            assert!(runtime.editor().lease().is_locked());
            assert!(runtime.editor().lease().expires_at() >= first_expiry);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn failed_renewal_drops_to_read_only() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            backend.lock_budget.set(Some(1));
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;

            let renewed = Rc::clone(&backend);
            pump_until(&mut runtime, move |e| {
                renewed.lock_call_count() == 2 && !e.lease().in_flight()
            })
            .await;

            let editor = runtime.editor();
            assert!(!editor.lease().is_locked());
            assert_eq!(editor.lease().reason(), Some("locked by another user"));
            assert!(!editor.is_editable());
            let banner = editor.banner();
            assert_eq!(banner.level, BannerLevel::Warning);
            assert!(banner.text.contains("locked by another user"));

            drag(&mut runtime, (100.0, 100.0), (300.0, 250.0));
            assert!(runtime.editor().shapes().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn navigation_drops_the_previous_item() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let box_at = |x: f64| AnnotationDto {
                id: Some(x as i64),
                class_id: 5,
                x,
                y: 10.0,
                w: 20.0,
                h: 20.0,
                confidence: Some(0.9),
                approved: false,
                attributes: None,
            };
            backend
                .annotations
                .borrow_mut()
                .insert(10, vec![box_at(1.0), box_at(40.0)]);
            backend.annotations.borrow_mut().insert(11, vec![box_at(7.0)]);
            backend
                .load_delay
                .borrow_mut()
                .insert(10, Duration::from_secs(10));

            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, |e| e.current_index() == Some(0)).await;
            let first_scope = runtime.scope_generation();

            runtime.dispatch(Message::NextItem);
            assert_ne!(runtime.scope_generation(), first_scope);
            pump_until(&mut runtime, ready).await;
            assert_eq!(runtime.editor().current_item().map(|i| i.id), Some(11));

            // Outlive the slow load of the first item
            tokio::time::sleep(Duration::from_secs(30)).await;
            runtime.drain();

            let editor = runtime.editor();
            assert_eq!(editor.current_item().map(|i| i.id), Some(11));
            assert_eq!(editor.shapes().len(), 1);
            assert_eq!(editor.shapes()[0].id, Some(7));
            assert_eq!(backend.releases.borrow().as_slice(), &[10]);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn dirty_navigation_needs_confirmation() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;

            drag(&mut runtime, (100.0, 100.0), (300.0, 250.0));
            runtime.dispatch(Message::NextItem);
            assert_eq!(runtime.editor().pending_navigation(), Some(1));
            assert_eq!(runtime.editor().current_index(), Some(0));

            runtime.dispatch(Message::ConfirmDiscard);
            pump_until(&mut runtime, ready).await;
            assert_eq!(runtime.editor().current_item().map(|i| i.id), Some(11));
            assert!(runtime.editor().shapes().is_empty());
            assert!(backend.saves.borrow().is_empty());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn items_past_the_first_page_are_reachable() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            backend
                .items
                .borrow_mut()
                .extend((12..511).map(|id| common::item(id, 320, 240)));
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;
            assert_eq!(runtime.editor().items().len(), 501);

            runtime.dispatch(Message::GotoItem(499));
            pump_until(&mut runtime, ready).await;
            runtime.dispatch(Message::NextItem);
            pump_until(&mut runtime, ready).await;
            assert_eq!(runtime.editor().current_index(), Some(500));
            assert_eq!(runtime.editor().current_item().map(|i| i.id), Some(510));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_releases_the_lock() {
    LocalSet::new()
        .run_until(async {
            let backend = Rc::new(FakeBackend::dataset());
            let mut runtime = runtime(&backend);
            runtime.start();
            pump_until(&mut runtime, ready).await;

            runtime.shutdown().await;
            assert_eq!(backend.releases.borrow().as_slice(), &[10]);
        })
        .await;
}
