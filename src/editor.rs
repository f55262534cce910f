//! The annotation editor controller.
//!
//! [`Editor`] owns all editor state and is driven by [`Message`]s. It never
//! performs I/O; [`Editor::update`] returns the [`Effect`]s a runtime should
//! execute, and their completions come back as messages tagged with the
//! generation of the item they belong to.

use chrono::Utc;
use image::RgbaImage;
use labeldesk_api::types::{DbId, LockRequest, UnlockRequest};
use labeldesk_api::{Role, Session};

use crate::color_utils::generated_color;
use crate::config::EditorConfig;
use crate::constants::{stroke, zoom};
use crate::input::PointerEvent;
use crate::keybindings::{KeyAction, KeyBindings};
use crate::lease::{LeaseManager, LockState};
use crate::message::{Effect, Message};
use crate::model::{
    Item, LabelClass, Rect, Shape, ShapeDocument, ShapeList, ShapePatch, palette_order,
};
use crate::scene::{Banner, ImagePlacement, Scene, SceneItem, SceneShape};
use crate::tools::{Gesture, Tool, ToolAction, ToolContext, ToolState};
use crate::viewport::Viewport;

/// Which project, dataset and annotation set the editor works on, and as whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorContext {
    pub project_id: DbId,
    pub dataset_id: DbId,
    pub annotation_set_id: DbId,
    /// Identity sent with lock requests
    pub owner: String,
    pub role: Role,
}

impl EditorContext {
    pub fn new(session: &Session, project_id: DbId, dataset_id: DbId, annotation_set_id: DbId) -> Self {
        Self {
            project_id,
            dataset_id,
            annotation_set_id,
            owner: session.owner.clone(),
            role: session.role,
        }
    }
}

/// Progress of a backend fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Image of the current item.
#[derive(Debug, Clone, Default)]
pub enum ImageState {
    #[default]
    Empty,
    Loading,
    Ready(RgbaImage),
    Failed(String),
}

/// Interactive annotation editor state.
pub struct Editor {
    context: EditorContext,
    bindings: KeyBindings,
    lease: LeaseManager,

    items: Vec<Item>,
    items_state: LoadState,
    classes: Vec<LabelClass>,
    classes_state: LoadState,

    /// Index into `items` of the item being edited
    current: Option<usize>,
    /// Bumped on every item change; tags per-item effects
    generation: u64,
    document: ShapeDocument,
    shapes_state: LoadState,
    image: ImageState,

    tools: ToolState,
    viewport: Viewport,
    view_size: (f32, f32),
    selected: Option<usize>,
    active_class: Option<DbId>,

    /// Revision of the save in flight
    saving: Option<u64>,
    /// A renewal came due while saving; the save completion issues it
    renewal_deferred: bool,
    save_error: Option<String>,
    /// Navigation target waiting for a discard confirmation
    pending_navigation: Option<usize>,
}

impl Editor {
    pub fn new(context: EditorContext, config: &EditorConfig) -> Self {
        let lease = LeaseManager::new(config.lock.ttl_seconds, config.lock.renew_lead(), context.role);
        Self {
            context,
            bindings: config.keybindings.clone(),
            lease,
            items: Vec::new(),
            items_state: LoadState::Idle,
            classes: Vec::new(),
            classes_state: LoadState::Idle,
            current: None,
            generation: 0,
            document: ShapeDocument::new(ShapeList::new(crate::model::Bounds::new(0.0, 0.0))),
            shapes_state: LoadState::Idle,
            image: ImageState::Empty,
            tools: ToolState::new(),
            viewport: Viewport::identity(),
            view_size: (0.0, 0.0),
            selected: None,
            active_class: None,
            saving: None,
            renewal_deferred: false,
            save_error: None,
            pending_navigation: None,
        }
    }

    /// Effects that load the dataset and the class palette.
    pub fn start(&mut self) -> Vec<Effect> {
        self.items_state = LoadState::Loading;
        self.classes_state = LoadState::Loading;
        vec![
            Effect::LoadItems {
                dataset_id: self.context.dataset_id,
            },
            Effect::LoadClasses {
                project_id: self.context.project_id,
            },
        ]
    }

    /// Leave the current item for good (view unmount).
    pub fn close(&mut self) -> Vec<Effect> {
        let effects = self.leave_item();
        self.generation += 1;
        self.current = None;
        self.pending_navigation = None;
        self.saving = None;
        self.renewal_deferred = false;
        self.shapes_state = LoadState::Idle;
        self.image = ImageState::Empty;
        log::debug!("Editor closed (generation {})", self.generation);
        effects
    }

    // Accessors

    pub fn context(&self) -> &EditorContext {
        &self.context
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn classes(&self) -> &[LabelClass] {
        &self.classes
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_item(&self) -> Option<&Item> {
        self.current.and_then(|i| self.items.get(i))
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn document(&self) -> &ShapeDocument {
        &self.document
    }

    pub fn shapes(&self) -> &[Shape] {
        self.document.shapes().shapes()
    }

    pub fn is_dirty(&self) -> bool {
        self.document.is_dirty()
    }

    pub fn shapes_state(&self) -> &LoadState {
        &self.shapes_state
    }

    pub fn image(&self) -> &ImageState {
        &self.image
    }

    pub fn lease(&self) -> &LeaseManager {
        &self.lease
    }

    pub fn tool(&self) -> Tool {
        self.tools.tool()
    }

    pub fn gesture(&self) -> &Gesture {
        self.tools.gesture()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn active_class(&self) -> Option<DbId> {
        self.active_class
    }

    pub fn is_saving(&self) -> bool {
        self.saving.is_some()
    }

    pub fn save_error(&self) -> Option<&str> {
        self.save_error.as_deref()
    }

    pub fn pending_navigation(&self) -> Option<usize> {
        self.pending_navigation
    }

    /// Whether edit operations are currently allowed.
    pub fn is_editable(&self) -> bool {
        self.current.is_some() && self.shapes_state == LoadState::Ready && self.lease.is_editable()
    }

    /// Handle one message and return the I/O to perform.
    pub fn update(&mut self, message: Message) -> Vec<Effect> {
        match message {
            Message::Pointer(event) => self.on_pointer(event),
            Message::Wheel { delta, x, y } => {
                self.viewport = self.viewport.zoom_at(x, y, zoom::WHEEL_FACTOR.powf(delta));
                log::trace!("Zoom {:.3} at ({:.0}, {:.0})", self.viewport.scale, x, y);
            }
            Message::Key { key, modifiers } => {
                if let Some(action) = self.bindings.action_for(key, modifiers, self.classes.len()) {
                    return self.on_key_action(action);
                }
            }
            Message::ViewResized { width, height } => {
                self.view_size = (width, height);
                self.fit_view();
            }
            Message::SetTool(tool) => self.tools.set_tool(tool),
            Message::SetActiveClass(id) => self.set_active_class(id),
            Message::SelectShape(index) => {
                let index = index.filter(|&i| i < self.document.shapes().len());
                if index != self.selected {
                    // A drag in progress belongs to the old selection
                    self.tools.cancel();
                    self.selected = index;
                }
            }
            Message::SetSelectedClass(class_id) => self.set_selected_class(class_id),
            Message::SetSelectedNote(note) => self.edit_selected(ShapePatch::note(note)),
            Message::ToggleApproved => self.toggle_approved(),
            Message::DeleteSelected => self.delete_selected(),
            Message::FinishPolygon => {
                let ctx = ToolContext {
                    shapes: self.document.shapes(),
                    viewport: &self.viewport,
                    active_class: self.active_class,
                    editable: self.is_editable(),
                };
                let action = self.tools.finish_polygon(&ctx);
                self.apply_tool_action(action);
            }
            Message::FitView => self.fit_view(),
            Message::Undo => self.undo(),
            Message::Redo => self.redo(),
            Message::Save => return self.save(),
            Message::PrevItem => return self.navigate_by(-1),
            Message::NextItem => return self.navigate_by(1),
            Message::GotoItem(index) => return self.request_navigation(index),
            Message::ConfirmDiscard => return self.confirm_discard(),
            Message::CancelNavigation => {
                if let Some(target) = self.pending_navigation.take() {
                    log::debug!("Navigation to item {} cancelled", target);
                }
            }
            Message::ItemsLoaded(result) => return self.on_items_loaded(result),
            Message::ClassesLoaded(result) => self.on_classes_loaded(result),
            Message::ShapesLoaded { generation, result } => {
                self.on_shapes_loaded(generation, result)
            }
            Message::ImageLoaded {
                generation,
                item_id,
                result,
            } => self.on_image_loaded(generation, item_id, result),
            Message::LockResponse {
                generation,
                result,
                received_at,
            } => return self.on_lock_response(generation, result, received_at),
            Message::RenewalDue { generation, seq } => return self.on_renewal_due(generation, seq),
            Message::SaveCompleted {
                generation,
                revision,
                result,
            } => return self.on_save_completed(generation, revision, result),
        }
        Vec::new()
    }

    // Input

    fn on_pointer(&mut self, event: PointerEvent) {
        let ctx = ToolContext {
            shapes: self.document.shapes(),
            viewport: &self.viewport,
            active_class: self.active_class,
            editable: self.is_editable(),
        };
        let action = self.tools.handle(event, &ctx);
        self.apply_tool_action(action);
    }

    fn apply_tool_action(&mut self, action: ToolAction) {
        match action {
            ToolAction::None => {}
            ToolAction::Commit(shape) => {
                if !self.is_editable() {
                    return;
                }
                let class_id = shape.class_id;
                if self.document.record(|list| list.add_shape(shape)) {
                    log::info!(
                        "✅ Created shape {} (class={})",
                        self.document.shapes().len() - 1,
                        class_id
                    );
                }
            }
            ToolAction::Select(index) => self.selected = index,
            ToolAction::Move { index, dx, dy } => {
                if self.is_editable()
                    && self
                        .document
                        .record(|list| list.update_shape(index, ShapePatch::translate(dx, dy)))
                {
                    log::debug!("↔️ Moved shape {} by ({:.1}, {:.1})", index, dx, dy);
                }
            }
            ToolAction::Pan { dx, dy } => self.viewport = self.viewport.pan_by(dx, dy),
        }
    }

    fn on_key_action(&mut self, action: KeyAction) -> Vec<Effect> {
        match action {
            KeyAction::PrevItem => return self.navigate_by(-1),
            KeyAction::NextItem => return self.navigate_by(1),
            KeyAction::SelectClass(index) => {
                if let Some(id) = self.classes.get(index).map(|c| c.id) {
                    self.set_active_class(id);
                }
            }
            KeyAction::DeleteSelected => self.delete_selected(),
            KeyAction::Save => return self.save(),
            KeyAction::Undo => self.undo(),
            KeyAction::Redo => self.redo(),
            KeyAction::SetTool(tool) => self.tools.set_tool(tool),
            KeyAction::Nudge { dx, dy } => self.edit_selected(ShapePatch::translate(dx, dy)),
            KeyAction::ToggleApproved => self.toggle_approved(),
            KeyAction::FitView => self.fit_view(),
            KeyAction::FinishPolygon => return self.update(Message::FinishPolygon),
            KeyAction::Cancel => {
                if !self.tools.cancel() {
                    self.selected = None;
                }
            }
        }
        Vec::new()
    }

    fn set_active_class(&mut self, id: DbId) {
        if self.classes.iter().any(|c| c.id == id) {
            self.active_class = Some(id);
            log::debug!("🏷️ Active class: {}", id);
        }
    }

    fn fit_view(&mut self) {
        let Some(item) = self.current_item() else {
            return;
        };
        let (view_w, view_h) = self.view_size;
        if view_w <= 0.0 || view_h <= 0.0 {
            return;
        }
        self.viewport = Viewport::fit_to_view(
            item.width as f32,
            item.height as f32,
            view_w,
            view_h,
            zoom::FIT_PADDING,
        );
    }

    // Edits (all gated)

    fn edit_selected(&mut self, patch: ShapePatch) {
        let Some(index) = self.selected else {
            return;
        };
        if self.is_editable() {
            self.document.record(|list| list.update_shape(index, patch));
        }
    }

    fn set_selected_class(&mut self, class_id: DbId) {
        if self.classes.iter().any(|c| c.id == class_id) {
            self.edit_selected(ShapePatch::class(class_id));
        } else {
            log::debug!("🏷️ Ignoring unknown class {}", class_id);
        }
    }

    fn toggle_approved(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        if self.is_editable() {
            self.document.record(|list| list.toggle_approved(index));
        }
    }

    fn delete_selected(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        if self.is_editable() && self.document.record(|list| list.remove_shape(index)) {
            log::info!("🗑️ Deleted shape {}", index);
            self.selected = None;
            self.tools.cancel();
        }
    }

    fn undo(&mut self) {
        if self.is_editable() && self.document.undo() {
            self.after_history_jump();
        }
    }

    fn redo(&mut self) {
        if self.is_editable() && self.document.redo() {
            self.after_history_jump();
        }
    }

    fn after_history_jump(&mut self) {
        self.tools.cancel();
        let len = self.document.shapes().len();
        self.selected = self.selected.filter(|&i| i < len);
    }

    // Save

    fn save(&mut self) -> Vec<Effect> {
        let Some(item_id) = self.current_item().map(|item| item.id) else {
            return Vec::new();
        };
        if !self.document.is_dirty() {
            log::debug!("💾 Nothing to save");
            return Vec::new();
        }
        if let Some(revision) = self.saving {
            log::debug!("💾 Save of revision {} still in flight", revision);
            return Vec::new();
        }
        let revision = self.document.revision();
        self.saving = Some(revision);
        self.save_error = None;
        let shapes: Vec<_> = self.shapes().iter().map(Shape::to_dto).collect();
        log::info!("💾 Saving {} shapes for item {}", shapes.len(), item_id);
        vec![Effect::Save {
            generation: self.generation,
            revision,
            item_id,
            annotation_set_id: self.context.annotation_set_id,
            shapes,
        }]
    }

    fn on_save_completed(
        &mut self,
        generation: u64,
        revision: u64,
        result: Result<Vec<Shape>, String>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            log::debug!("Discarding save result for generation {}", generation);
            return Vec::new();
        }
        self.saving = None;
        let deferred = std::mem::take(&mut self.renewal_deferred);
        match result {
            Ok(stored) => {
                let clean = self
                    .document
                    .mark_saved(revision, |list| list.adopt_ids(&stored));
                log::info!(
                    "💾 Saved {} shapes{}",
                    stored.len(),
                    if clean { "" } else { " (edited since)" }
                );
                self.renew_lock()
            }
            Err(e) => {
                log::warn!("💾 Save failed: {}", e);
                self.save_error = Some(e);
                if deferred {
                    self.renew_lock()
                } else {
                    Vec::new()
                }
            }
        }
    }

    // Lock

    fn lock_request(&self) -> LockRequest {
        LockRequest {
            annotation_set_id: self.context.annotation_set_id,
            ttl_seconds: self.lease.ttl_seconds(),
            owner: self.context.owner.clone(),
        }
    }

    fn renew_lock(&mut self) -> Vec<Effect> {
        let Some(item_id) = self.current_item().map(|item| item.id) else {
            return Vec::new();
        };
        if !self.lease.begin_acquire() {
            return Vec::new();
        }
        vec![Effect::AcquireLock {
            generation: self.generation,
            item_id,
            request: self.lock_request(),
        }]
    }

    fn on_lock_response(
        &mut self,
        generation: u64,
        result: Result<chrono::DateTime<Utc>, String>,
        received_at: chrono::DateTime<Utc>,
    ) -> Vec<Effect> {
        if generation != self.generation {
            log::debug!("Discarding lock response for generation {}", generation);
            return Vec::new();
        }
        match result {
            Ok(expires_at) => {
                let timer = self.lease.on_granted(expires_at, received_at);
                vec![Effect::ScheduleRenewal {
                    generation,
                    seq: timer.seq,
                    after: timer.after,
                }]
            }
            Err(reason) => {
                self.lease.on_failed(reason);
                if !self.is_editable() {
                    self.tools.cancel();
                }
                Vec::new()
            }
        }
    }

    fn on_renewal_due(&mut self, generation: u64, seq: u64) -> Vec<Effect> {
        if generation != self.generation || !self.lease.timer_is_current(seq) {
            log::debug!("Ignoring stale renewal timer {} (generation {})", seq, generation);
            return Vec::new();
        }
        if self.saving.is_some() {
            log::debug!("🔒 Renewal waits for the save in flight");
            self.renewal_deferred = true;
            return Vec::new();
        }
        log::debug!("🔒 Renewing lock");
        self.renew_lock()
    }

    // Navigation

    fn navigate_by(&mut self, step: isize) -> Vec<Effect> {
        match self.current.and_then(|i| i.checked_add_signed(step)) {
            Some(target) => self.request_navigation(target),
            None => Vec::new(),
        }
    }

    fn request_navigation(&mut self, target: usize) -> Vec<Effect> {
        if target >= self.items.len() || Some(target) == self.current {
            return Vec::new();
        }
        if self.document.is_dirty() {
            log::info!("Unsaved changes; navigation to item {} needs confirmation", target);
            self.pending_navigation = Some(target);
            return Vec::new();
        }
        self.enter_item(target)
    }

    fn confirm_discard(&mut self) -> Vec<Effect> {
        match self.pending_navigation.take() {
            Some(target) => {
                log::info!("Discarding unsaved changes");
                self.enter_item(target)
            }
            None => Vec::new(),
        }
    }

    /// Release the lease of the item being left, if one was requested.
    fn leave_item(&mut self) -> Vec<Effect> {
        let item_id = self.current_item().map(|item| item.id);
        let requested = self.lease.reset();
        match item_id {
            Some(item_id) if requested => vec![Effect::ReleaseLock {
                item_id,
                request: UnlockRequest {
                    annotation_set_id: self.context.annotation_set_id,
                    owner: self.context.owner.clone(),
                },
            }],
            _ => Vec::new(),
        }
    }

    fn enter_item(&mut self, index: usize) -> Vec<Effect> {
        let Some(item) = self.items.get(index).cloned() else {
            return Vec::new();
        };
        let mut effects = self.leave_item();

        self.generation += 1;
        self.current = Some(index);
        self.document = ShapeDocument::new(ShapeList::new(item.bounds()));
        self.shapes_state = LoadState::Loading;
        self.image = ImageState::Loading;
        self.selected = None;
        self.tools.cancel();
        self.saving = None;
        self.renewal_deferred = false;
        self.save_error = None;
        self.pending_navigation = None;
        self.fit_view();
        log::info!(
            "📂 Item {} ({}) [{}/{}]",
            item.id,
            item.file_name,
            index + 1,
            self.items.len()
        );

        let generation = self.generation;
        effects.push(Effect::EnterItem {
            generation,
            item_id: item.id,
        });
        effects.push(Effect::LoadShapes {
            generation,
            item_id: item.id,
            annotation_set_id: self.context.annotation_set_id,
        });
        effects.push(Effect::LoadImage {
            generation,
            item_id: item.id,
        });
        effects.extend(self.renew_lock());
        effects
    }

    // Loads

    fn on_items_loaded(&mut self, result: Result<Vec<Item>, String>) -> Vec<Effect> {
        match result {
            Ok(items) => {
                log::info!("Loaded {} items", items.len());
                self.items = items;
                self.items_state = LoadState::Ready;
                if self.current.is_none() && !self.items.is_empty() {
                    return self.enter_item(0);
                }
            }
            Err(e) => {
                log::warn!("Failed to load items: {}", e);
                self.items_state = LoadState::Failed(e);
            }
        }
        Vec::new()
    }

    fn on_classes_loaded(&mut self, result: Result<Vec<LabelClass>, String>) {
        match result {
            Ok(classes) => {
                self.classes = palette_order(classes);
                self.classes_state = LoadState::Ready;
                let active_known = self
                    .active_class
                    .is_some_and(|id| self.classes.iter().any(|c| c.id == id));
                if !active_known {
                    self.active_class = self.classes.first().map(|c| c.id);
                }
                log::debug!("🏷️ Loaded {} classes", self.classes.len());
            }
            Err(e) => {
                log::warn!("Failed to load classes: {}", e);
                self.classes_state = LoadState::Failed(e);
            }
        }
    }

    fn on_shapes_loaded(&mut self, generation: u64, result: Result<Vec<Shape>, String>) {
        if generation != self.generation {
            log::debug!("Discarding shapes for generation {}", generation);
            return;
        }
        let Some(bounds) = self.current_item().map(Item::bounds) else {
            return;
        };
        match result {
            Ok(shapes) => {
                self.document = ShapeDocument::new(ShapeList::from_loaded(bounds, shapes));
                self.shapes_state = LoadState::Ready;
                log::debug!("Loaded {} shapes", self.document.shapes().len());
            }
            Err(e) => {
                log::warn!("Failed to load shapes: {}", e);
                self.shapes_state = LoadState::Failed(e);
            }
        }
    }

    fn on_image_loaded(&mut self, generation: u64, item_id: DbId, result: Result<RgbaImage, String>) {
        let current_id = self.current_item().map(|item| item.id);
        if generation != self.generation || current_id != Some(item_id) {
            log::debug!("Discarding image of item {} (generation {})", item_id, generation);
            return;
        }
        self.image = match result {
            Ok(image) => ImageState::Ready(image),
            Err(e) => {
                log::warn!("Failed to load image of item {}: {}", item_id, e);
                ImageState::Failed(e)
            }
        };
    }

    // Rendering

    /// Status line derived from load, lock and save state.
    pub fn banner(&self) -> Banner {
        if let LoadState::Failed(e) = &self.items_state {
            return Banner::error(format!("Failed to load items: {}", e));
        }
        if self.current.is_none() {
            return match self.items_state {
                LoadState::Loading => Banner::info("Loading items..."),
                _ => Banner::info("No items"),
            };
        }
        if let LoadState::Failed(e) = &self.shapes_state {
            return Banner::error(format!("Failed to load annotations: {}", e));
        }
        if let Some(e) = &self.save_error {
            return Banner::error(format!("Save failed: {}", e));
        }
        if self.pending_navigation.is_some() {
            return Banner::warning("Unsaved changes. Discard them to continue?");
        }
        let admin = self.lease.role().bypasses_lock_gate();
        match self.lease.state() {
            LockState::Unlocked { reason: Some(reason) } if admin => {
                return Banner::warning(format!("Editing without lock (admin): {}", reason));
            }
            LockState::Unlocked { reason: Some(reason) } => {
                return Banner::warning(format!("Read-only: {}", reason));
            }
            LockState::Unlocked { reason: None } if self.lease.in_flight() => {
                return Banner::info("Acquiring lock...");
            }
            LockState::Unlocked { reason: None } if admin => {
                return Banner::warning("Editing without lock (admin)");
            }
            LockState::Unlocked { reason: None } => return Banner::info("Read-only"),
            LockState::Locked { .. } => {}
        }
        if self.shapes_state == LoadState::Loading {
            return Banner::info("Loading annotations...");
        }
        if self.saving.is_some() {
            return Banner::info("Saving...");
        }
        if self.document.is_dirty() {
            return Banner::info("Unsaved changes");
        }
        match self.lease.expires_at() {
            Some(expires_at) => Banner::info(format!(
                "Locked for editing until {} UTC",
                expires_at.format("%H:%M:%S")
            )),
            None => Banner::info("Ready"),
        }
    }

    /// Screen-space description of the canvas.
    pub fn scene(&self) -> Scene {
        let image = match (&self.image, self.current_item()) {
            (ImageState::Ready(_), Some(item)) => {
                let (x, y) = self.viewport.to_screen_space(0.0, 0.0);
                Some(ImagePlacement {
                    x,
                    y,
                    width: item.width as f32 * self.viewport.scale,
                    height: item.height as f32 * self.viewport.scale,
                })
            }
            _ => None,
        };

        let items = self
            .shapes()
            .iter()
            .enumerate()
            .map(|(index, shape)| {
                let selected = self.selected == Some(index);
                let width = if selected {
                    stroke::SELECTED
                } else {
                    stroke::NORMAL
                };
                SceneItem::new(self.screen_shape(shape), self.class_color(shape.class_id), width)
                    .selected(selected)
                    .approved(shape.approved)
            })
            .collect();

        Scene {
            image,
            items,
            preview: self.preview(),
            banner: self.banner(),
        }
    }

    fn preview(&self) -> Option<SceneItem> {
        let color = self
            .active_class
            .map(|id| self.class_color(id))
            .unwrap_or([255, 255, 255]);
        match self.tools.gesture() {
            Gesture::Box { anchor, current } => {
                let rect = Rect::from_corners(anchor.0, anchor.1, current.0, current.1);
                Some(SceneItem::new(self.screen_rect(&rect), color, stroke::PREVIEW))
            }
            Gesture::Polygon { vertices, hover } => {
                let vertices = vertices
                    .iter()
                    .chain(hover.iter())
                    .map(|&(x, y)| self.viewport.to_screen_space(x, y))
                    .collect();
                Some(SceneItem::new(
                    SceneShape::Polygon {
                        vertices,
                        closed: false,
                    },
                    color,
                    stroke::PREVIEW,
                ))
            }
            Gesture::Drag { .. } => {
                let (index, dx, dy) = self.tools.drag_offset()?;
                let mut moved = self.document.shapes().get(index)?.clone();
                moved.translate_within(dx, dy, self.document.shapes().bounds());
                Some(
                    SceneItem::new(
                        self.screen_shape(&moved),
                        self.class_color(moved.class_id),
                        stroke::SELECTED,
                    )
                    .selected(true),
                )
            }
            Gesture::Idle | Gesture::Pan { .. } => None,
        }
    }

    fn class_color(&self, class_id: DbId) -> [u8; 3] {
        self.classes
            .iter()
            .find(|c| c.id == class_id)
            .map(|c| c.color)
            .unwrap_or_else(|| generated_color(class_id))
    }

    fn screen_rect(&self, rect: &Rect) -> SceneShape {
        let (x, y) = self.viewport.to_screen_space(rect.x, rect.y);
        SceneShape::Rect {
            x,
            y,
            width: rect.w * self.viewport.scale,
            height: rect.h * self.viewport.scale,
        }
    }

    fn screen_shape(&self, shape: &Shape) -> SceneShape {
        if shape.is_polygon() {
            SceneShape::Polygon {
                vertices: shape
                    .vertices()
                    .into_iter()
                    .map(|(x, y)| self.viewport.to_screen_space(x, y))
                    .collect(),
                closed: true,
            }
        } else {
            self.screen_rect(&shape.rect)
        }
    }
}
