//! Notifications for the presentation shell.
//!
//! The core never calls back into the UI. Operations push typed
//! notifications which the shell drains and reacts to.

/// Something the shell may want to redraw or reflect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// The selected box changed; `None` means nothing is selected
    SelectionChanged(Option<usize>),
    /// The geometry of a box on the current frame changed
    BoxModified(usize),
    /// A frame finished loading
    FrameLoaded(usize),
    /// The frame's annotations were written to disk
    Saved(usize),
    /// Writing the frame's annotations failed; edits are still pending
    SaveFailed(usize),
}
