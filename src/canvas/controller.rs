//! Pointer-driven canvas controller.
//!
//! One controller exists per open document. It owns the viewport and the
//! gesture state; the annotation list stays in the [`AnnotationStore`], which
//! is borrowed for each event so every edit goes through its validation.

use super::interaction::{InteractionState, MouseButton};
use crate::hit_test::{self, HitTarget};
use crate::message::Notification;
use crate::model::BBox;
use crate::state::AnnotationStore;
use crate::viewport::{Point, Projection, Size, ViewportState};

#[derive(Debug, Clone)]
pub struct CanvasController {
    viewport: ViewportState,
    interaction: InteractionState,
    widget_size: Size,
    /// Widget position of the last left press; wheel zoom is anchored here.
    last_click: Option<Point>,
}

impl CanvasController {
    pub fn new(widget_size: Size) -> Self {
        Self {
            viewport: ViewportState::auto_fit(),
            interaction: InteractionState::Idle,
            widget_size,
            last_click: None,
        }
    }

    pub fn viewport(&self) -> &ViewportState {
        &self.viewport
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    pub fn widget_size(&self) -> Size {
        self.widget_size
    }

    /// Record a new widget size. Auto-fit follows automatically.
    pub fn resize(&mut self, widget_size: Size) {
        self.widget_size = widget_size;
    }

    /// Drop all per-frame view state: gesture, zoom, pan and click anchor.
    pub fn reset(&mut self) {
        self.viewport.reset();
        self.interaction = InteractionState::Idle;
        self.last_click = None;
    }

    /// Abandon any press-drag in progress. Box indices held by a move or
    /// resize gesture are stale once the box list changes underneath it.
    pub fn cancel_gesture(&mut self) {
        if !self.interaction.is_idle() {
            log::debug!("Cancelling {:?}", self.interaction);
            self.interaction = InteractionState::Idle;
        }
    }

    /// The current image/widget mapping, or `None` while no image is shown.
    pub fn projection(&self, store: &AnnotationStore) -> Option<Projection> {
        let image = store.image_size();
        if image.is_empty() {
            return None;
        }
        Some(self.viewport.projection(self.widget_size, image))
    }

    /// Widget-space rectangles of every box, in list order, for drawing.
    pub fn widget_rects(&self, store: &AnnotationStore) -> Vec<BBox> {
        match self.projection(store) {
            Some(proj) => store
                .annotations()
                .iter()
                .map(|ann| proj.box_to_widget(&ann.bbox))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Start a gesture. Presses are ignored while another gesture is active.
    pub fn on_press(
        &mut self,
        pos: Point,
        button: MouseButton,
        store: &mut AnnotationStore,
    ) -> Option<Notification> {
        if button != MouseButton::Left || !self.interaction.is_idle() {
            return None;
        }
        let proj = self.projection(store)?;
        self.last_click = Some(pos);

        match hit_test::hit_test(pos, store.annotations(), &proj) {
            HitTarget::Body(index) => {
                log::debug!("Press on box {} body, moving", index);
                self.interaction = InteractionState::MovingBox {
                    index,
                    last_pointer: pos,
                };
                store.select(Some(index));
                Some(Notification::SelectionChanged(Some(index)))
            }
            HitTarget::Handle(index, handle) => {
                log::debug!("Press on box {} {} handle, resizing", index, handle.name());
                self.interaction = InteractionState::ResizingBox {
                    index,
                    handle,
                    last_pointer: pos,
                };
                store.select(Some(index));
                Some(Notification::SelectionChanged(Some(index)))
            }
            HitTarget::Empty => {
                log::trace!("Press on empty canvas, panning");
                self.interaction = InteractionState::Panning {
                    start_pointer: pos,
                    start_pan: (self.viewport.pan_x, self.viewport.pan_y),
                    last_pointer: pos,
                };
                None
            }
        }
    }

    /// Continue the active gesture.
    ///
    /// A rejected box candidate only skips this step; the gesture continues
    /// and the next delta is still measured from this pointer position.
    pub fn on_move(&mut self, pos: Point, store: &mut AnnotationStore) -> Option<Notification> {
        let proj = self.projection(store)?;

        match self.interaction {
            InteractionState::Idle => None,
            InteractionState::Panning {
                start_pointer,
                start_pan,
                last_pointer,
            } => {
                self.viewport.pan_by(
                    pos.x - last_pointer.x,
                    pos.y - last_pointer.y,
                    self.widget_size,
                    store.image_size(),
                );
                self.interaction = InteractionState::Panning {
                    start_pointer,
                    start_pan,
                    last_pointer: pos,
                };
                None
            }
            InteractionState::MovingBox {
                index,
                last_pointer,
            } => {
                self.interaction = InteractionState::MovingBox {
                    index,
                    last_pointer: pos,
                };
                let (dx, dy) = proj.delta_to_image(pos.x - last_pointer.x, pos.y - last_pointer.y);
                self.commit(index, store, |b| b.translated(dx, dy))
            }
            InteractionState::ResizingBox {
                index,
                handle,
                last_pointer,
            } => {
                self.interaction = InteractionState::ResizingBox {
                    index,
                    handle,
                    last_pointer: pos,
                };
                let (dx, dy) = proj.delta_to_image(pos.x - last_pointer.x, pos.y - last_pointer.y);
                self.commit(index, store, |b| handle.drag(&b, dx, dy))
            }
        }
    }

    fn commit(
        &mut self,
        index: usize,
        store: &mut AnnotationStore,
        step: impl FnOnce(BBox) -> BBox,
    ) -> Option<Notification> {
        let Some(old) = store.bbox(index) else {
            log::debug!("Box {} vanished during drag, ending gesture", index);
            self.interaction = InteractionState::Idle;
            return None;
        };
        let candidate = step(old);
        if candidate == old {
            return None;
        }
        store
            .move_or_resize(index, candidate)
            .then_some(Notification::BoxModified(index))
    }

    /// End the active gesture.
    pub fn on_release(&mut self, pos: Point, button: MouseButton) {
        if button != MouseButton::Left {
            return;
        }
        if let InteractionState::Panning {
            start_pointer,
            start_pan,
            ..
        } = self.interaction
        {
            log::trace!(
                "Pan from ({:.1}, {:.1}) to ({:.1}, {:.1}), offset ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                start_pointer.x,
                start_pointer.y,
                pos.x,
                pos.y,
                start_pan.0,
                start_pan.1,
                self.viewport.pan_x,
                self.viewport.pan_y
            );
        } else if !self.interaction.is_idle() {
            log::debug!("Finished {} gesture", self.interaction.name());
        }
        self.interaction = InteractionState::Idle;
    }

    /// Return to auto-fit with no pan. Selection and gesture are untouched.
    pub fn on_double_click(&mut self, button: MouseButton) {
        if button == MouseButton::Left {
            self.viewport.reset();
            log::debug!("Viewport reset to auto-fit");
        }
    }

    /// Zoom one notch per call. Positive `delta` zooms in, negative zooms out.
    ///
    /// The anchor is the last press position, or `pos` if there has been none.
    pub fn on_wheel(&mut self, pos: Point, delta: f64, store: &AnnotationStore) {
        let image = store.image_size();
        if image.is_empty() || delta == 0.0 {
            return;
        }
        let anchor = self.last_click.unwrap_or(pos);
        self.viewport
            .zoom_step(delta > 0.0, anchor, self.widget_size, image);
    }
}
