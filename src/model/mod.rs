//! Data models for the annotator.

mod annotation;
mod vocabulary;

pub use annotation::{Annotation, BBox};
pub use vocabulary::{DEFAULT_CLASS_OPTIONS, DEFAULT_DETAILED_CLASS_OPTIONS, Vocabulary};
