//! Pointer gesture state.

use crate::hit_test::Handle;
use crate::viewport::Point;

/// Pointer buttons the canvas distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// The gesture in progress. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    /// No button held.
    #[default]
    Idle,
    /// Dragging the image.
    Panning {
        start_pointer: Point,
        start_pan: (f64, f64),
        last_pointer: Point,
    },
    /// Dragging a whole box.
    MovingBox { index: usize, last_pointer: Point },
    /// Dragging one corner of a box.
    ResizingBox {
        index: usize,
        handle: Handle,
        last_pointer: Point,
    },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    /// Index of the box being dragged, if any.
    pub fn active_box(&self) -> Option<usize> {
        match self {
            InteractionState::MovingBox { index, .. }
            | InteractionState::ResizingBox { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            InteractionState::Idle => "idle",
            InteractionState::Panning { .. } => "panning",
            InteractionState::MovingBox { .. } => "moving",
            InteractionState::ResizingBox { .. } => "resizing",
        }
    }
}
