//! Error types for frame and annotation file operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing frames.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing or serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image header could not be read
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid file structure or content
    #[error("Invalid format: {message}")]
    InvalidFormat {
        /// Description of the format error
        message: String,
    },

    /// A frame index past the end of the sequence
    #[error("Frame {index} out of range (frame count {count})")]
    FrameOutOfRange {
        /// Requested index
        index: usize,
        /// Number of frames available
        count: usize,
    },

    /// Discovery produced nothing to annotate
    #[error("No matching image/JSON file pairs found in {images:?} and {annotations:?}")]
    NoFramePairs {
        /// Image folder that was scanned
        images: PathBuf,
        /// Annotation folder that was scanned
        annotations: PathBuf,
    },
}

impl FormatError {
    /// Create an invalid format error with a message.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            message: message.into(),
        }
    }
}
