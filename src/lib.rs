//! Bounding-box annotation editor core.
//!
//! Loads per-frame box annotations, lets a pointer pan, zoom, move and resize
//! boxes on a zoomable canvas, validates every edit against the image bounds
//! and writes changes back with a short debounce.

pub mod canvas;
pub mod config;
pub mod constants;
pub mod editor;
pub mod format;
pub mod message;
pub mod model;
pub mod state;
pub mod viewport;

pub use editor::{Editor, EditorError, EditorSettings};
