//! Cached box counts per frame for cross-frame navigation.

use std::collections::HashMap;

use crate::format::FrameSource;

/// Box count per frame index, read from the source on first use.
///
/// A frame whose file cannot be read counts as empty. Entries are kept
/// current by the editor whenever the loaded frame gains, loses or saves boxes.
#[derive(Debug, Default, Clone)]
pub struct FrameCountCache {
    counts: HashMap<usize, usize>,
}

impl FrameCountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&mut self, index: usize, source: &dyn FrameSource) -> usize {
        *self
            .counts
            .entry(index)
            .or_insert_with(|| match source.count_annotations(index) {
                Ok(count) => count,
                Err(e) => {
                    log::warn!("Could not count boxes in frame {}: {}", index, e);
                    0
                }
            })
    }

    pub fn set(&mut self, index: usize, count: usize) {
        self.counts.insert(index, count);
    }

    pub fn invalidate(&mut self, index: usize) {
        self.counts.remove(&index);
    }

    /// Nearest frame after `from` that has at least one box.
    pub fn next_non_empty(&mut self, from: usize, source: &dyn FrameSource) -> Option<usize> {
        (from + 1..source.frame_count()).find(|&i| self.count(i, source) > 0)
    }

    /// Nearest frame before `from` that has at least one box.
    pub fn prev_non_empty(&mut self, from: usize, source: &dyn FrameSource) -> Option<usize> {
        (0..from).rev().find(|&i| self.count(i, source) > 0)
    }
}
