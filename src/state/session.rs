//! Last-viewed position, restored on the next start.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::format::Debouncer;

/// Where the user left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionState {
    pub frame_index: usize,
    pub bbox_index: Option<usize>,
}

/// On-disk shape. Indices are signed so that a stale or hand-edited file
/// degrades to "no session" instead of failing to parse.
#[derive(Serialize, Deserialize)]
struct SessionFile {
    frame_index: i64,
    #[serde(default)]
    bbox_index: Option<i64>,
}

/// Reads and writes the session file. Writes are debounced.
#[derive(Debug)]
pub struct SessionStore {
    path: PathBuf,
    timer: Debouncer,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>, delay: Duration) -> Self {
        Self {
            path: path.into(),
            timer: Debouncer::new(delay),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort restore. Any read or parse problem, or a frame index
    /// outside `0..frame_count`, yields `None`.
    pub fn load(&self, frame_count: usize) -> Option<SessionState> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) => {
                log::debug!("No session state at {}: {}", self.path.display(), e);
                return None;
            }
        };
        let file: SessionFile = match serde_json::from_str(&json) {
            Ok(file) => file,
            Err(e) => {
                log::warn!("Ignoring unreadable session state: {}", e);
                return None;
            }
        };

        let frame_index = usize::try_from(file.frame_index)
            .ok()
            .filter(|&i| i < frame_count)?;
        let bbox_index = file.bbox_index.and_then(|i| usize::try_from(i).ok());
        Some(SessionState {
            frame_index,
            bbox_index,
        })
    }

    /// Write immediately. Failures are logged and otherwise ignored.
    pub fn save(&mut self, state: SessionState) {
        self.timer.cancel();
        let file = SessionFile {
            frame_index: i64::try_from(state.frame_index).unwrap_or(i64::MAX),
            bbox_index: state.bbox_index.and_then(|i| i64::try_from(i).ok()),
        };
        let result = serde_json::to_string(&file)
            .map_err(std::io::Error::from)
            .and_then(|json| std::fs::write(&self.path, json));
        match result {
            Ok(()) => log::trace!("Saved session state {:?}", state),
            Err(e) => log::warn!("Failed to save session state: {}", e),
        }
    }

    pub fn schedule(&mut self, now: Instant) {
        self.timer.schedule(now);
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Whether a scheduled write is due. Consumes the deadline.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        self.timer.fire_if_due(now)
    }
}
