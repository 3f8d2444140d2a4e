//! Interactive canvas: viewport, gestures and box editing by pointer.

mod controller;
mod interaction;

pub use controller::CanvasController;
pub use interaction::{InteractionState, MouseButton};
