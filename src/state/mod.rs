//! Editor state: the loaded frame's boxes, frame counts and session position.

mod annotation_store;
mod frame_counts;
mod session;

pub use annotation_store::AnnotationStore;
pub use frame_counts::FrameCountCache;
pub use session::{SessionState, SessionStore};
