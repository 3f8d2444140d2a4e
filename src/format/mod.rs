//! Frame discovery, per-frame annotation files and save timing.
//!
//! Frames are image/JSON pairs found by [`FsFrameSource::discover`]. The
//! editor only sees the [`FrameSource`] trait, so tests run against an
//! in-memory source.

mod auto_save;
mod error;
pub mod frame_json;
mod frame_source;
#[cfg(test)]
pub(crate) mod memory;

pub use auto_save::{AutoSaveManager, Debouncer};
pub use error::FormatError;
pub use frame_source::{FramePair, FrameSource, FsFrameSource, match_pairs};
