//! Single-threaded driver that executes editor effects against a backend.
//!
//! Effects run as local tasks (the runtime must be used inside a
//! `tokio::task::LocalSet`) and report back as messages over an unbounded
//! channel. Per-item work runs inside an [`ItemScope`]; entering another item
//! drops the scope, which cancels every task and timer started for the old
//! one. Lock releases and saves run outside any scope so they are never cut
//! off by navigation.

use std::future::Future;
use std::rc::Rc;

use chrono::Utc;
use labeldesk_api::Backend;
use labeldesk_api::types::{DbId, UnlockRequest};
use tokio::sync::mpsc;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::editor::Editor;
use crate::image_loader;
use crate::message::{Effect, Message};
use crate::model::{Item, LabelClass, Shape};

/// Cancellation scope of one item visit.
///
/// Dropping the scope cancels every task spawned in it.
pub struct ItemScope {
    generation: u64,
    token: CancellationToken,
    _cancel_on_drop: DropGuard,
}

impl ItemScope {
    pub fn new(generation: u64) -> Self {
        let token = CancellationToken::new();
        Self {
            generation,
            _cancel_on_drop: token.clone().drop_guard(),
            token,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Token that fires when the scope is dropped.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Run `future` until it completes or the scope ends; its message is
    /// only delivered on completion.
    pub fn spawn<F>(&self, tx: mpsc::UnboundedSender<Message>, future: F)
    where
        F: Future<Output = Message> + 'static,
    {
        let token = self.token.clone();
        let generation = self.generation;
        tokio::task::spawn_local(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    log::trace!("Task of generation {} cancelled", generation);
                }
                message = future => deliver(&tx, message),
            }
        });
    }
}

fn deliver(tx: &mpsc::UnboundedSender<Message>, message: Message) {
    if tx.send(message).is_err() {
        log::trace!("Runtime gone; dropping message");
    }
}

/// Owns an [`Editor`] and performs the I/O it asks for.
pub struct Runtime<B: Backend + 'static> {
    backend: Rc<B>,
    editor: Editor,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    scope: Option<ItemScope>,
}

impl<B: Backend + 'static> Runtime<B> {
    pub fn new(backend: Rc<B>, editor: Editor) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            backend,
            editor,
            tx,
            rx,
            scope: None,
        }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Generation of the live item scope, if any.
    pub fn scope_generation(&self) -> Option<u64> {
        self.scope.as_ref().map(ItemScope::generation)
    }

    /// Kick off loading the dataset.
    pub fn start(&mut self) {
        let effects = self.editor.start();
        self.execute_all(effects);
    }

    /// Feed one message to the editor and execute the resulting effects.
    pub fn dispatch(&mut self, message: Message) {
        let effects = self.editor.update(message);
        self.execute_all(effects);
    }

    /// Wait for the next message and dispatch it.
    pub async fn next(&mut self) {
        if let Some(message) = self.rx.recv().await {
            self.dispatch(message);
        }
    }

    /// Dispatch every message already queued, without waiting.
    pub fn drain(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(message) = self.rx.try_recv() {
            self.dispatch(message);
            handled += 1;
        }
        handled
    }

    /// Leave the current item: release its lease and cancel per-item work.
    pub async fn shutdown(mut self) {
        let effects = self.editor.close();
        self.scope = None;
        for effect in effects {
            if let Effect::ReleaseLock { item_id, request } = effect {
                release(self.backend.as_ref(), item_id, &request).await;
            }
        }
    }

    fn execute_all(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.execute(effect);
        }
    }

    fn execute(&mut self, effect: Effect) {
        let backend = Rc::clone(&self.backend);
        match effect {
            Effect::LoadItems { dataset_id } => self.spawn(async move {
                let result = backend.list_items(dataset_id).await;
                Message::ItemsLoaded(
                    result
                        .map(|items| items.into_iter().map(Item::from).collect())
                        .map_err(|e| e.reason()),
                )
            }),
            Effect::LoadClasses { project_id } => self.spawn(async move {
                let result = backend.list_classes(project_id).await;
                Message::ClassesLoaded(
                    result
                        .map(|classes| classes.into_iter().map(LabelClass::from).collect())
                        .map_err(|e| e.reason()),
                )
            }),
            Effect::EnterItem {
                generation,
                item_id,
            } => {
                log::debug!("Scope for item {} (generation {})", item_id, generation);
                self.scope = Some(ItemScope::new(generation));
            }
            Effect::LoadShapes {
                generation,
                item_id,
                annotation_set_id,
            } => self.spawn_scoped(async move {
                let result = backend.load_annotations(item_id, annotation_set_id).await;
                Message::ShapesLoaded {
                    generation,
                    result: result
                        .map(|dtos| dtos.into_iter().map(Shape::from_dto).collect())
                        .map_err(|e| e.reason()),
                }
            }),
            Effect::LoadImage {
                generation,
                item_id,
            } => self.spawn_scoped(async move {
                let result = image_loader::load_image(backend.as_ref(), item_id).await;
                Message::ImageLoaded {
                    generation,
                    item_id,
                    result: result.map_err(|e| e.to_string()),
                }
            }),
            Effect::AcquireLock {
                generation,
                item_id,
                request,
            } => self.spawn_scoped(async move {
                let result = match backend.acquire_lock(item_id, &request).await {
                    Ok(grant) if grant.ok => Ok(grant.expires_at),
                    Ok(_) => Err("lock not granted".to_string()),
                    Err(e) => Err(e.reason()),
                };
                Message::LockResponse {
                    generation,
                    result,
                    received_at: Utc::now(),
                }
            }),
            Effect::ReleaseLock { item_id, request } => {
                tokio::task::spawn_local(async move {
                    release(backend.as_ref(), item_id, &request).await;
                });
            }
            Effect::ScheduleRenewal {
                generation,
                seq,
                after,
            } => self.spawn_scoped(async move {
                tokio::time::sleep(after).await;
                Message::RenewalDue { generation, seq }
            }),
            Effect::Save {
                generation,
                revision,
                item_id,
                annotation_set_id,
                shapes,
            } => self.spawn(async move {
                let result = backend
                    .replace_annotations(item_id, annotation_set_id, &shapes)
                    .await;
                Message::SaveCompleted {
                    generation,
                    revision,
                    result: result
                        .map(|dtos| dtos.into_iter().map(Shape::from_dto).collect())
                        .map_err(|e| e.reason()),
                }
            }),
        }
    }

    fn spawn<F>(&self, future: F)
    where
        F: Future<Output = Message> + 'static,
    {
        let tx = self.tx.clone();
        tokio::task::spawn_local(async move {
            let message = future.await;
            deliver(&tx, message);
        });
    }

    fn spawn_scoped<F>(&self, future: F)
    where
        F: Future<Output = Message> + 'static,
    {
        match &self.scope {
            Some(scope) => scope.spawn(self.tx.clone(), future),
            None => self.spawn(future),
        }
    }
}

/// Best-effort lock release; failures only matter for the log.
async fn release<B: Backend + ?Sized>(backend: &B, item_id: DbId, request: &UnlockRequest) {
    match backend.release_lock(item_id, request).await {
        Ok(()) => log::debug!("🔓 Released lock on item {}", item_id),
        Err(e) => log::debug!("🔓 Release of item {} failed (ignored): {}", item_id, e),
    }
}
