//! In-memory frames for tests.

use std::cell::Cell;

use crate::format::error::FormatError;
use crate::format::frame_source::FrameSource;
use crate::model::Annotation;

#[derive(Debug, Clone)]
pub struct MemoryFrame {
    pub size: (u32, u32),
    pub annotations: Vec<Annotation>,
}

/// A frame source that keeps everything in a `Vec` and can simulate
/// write failures. A `(0, 0)` size stands for an unreadable image.
#[derive(Debug, Default)]
pub struct MemoryFrameSource {
    pub frames: Vec<MemoryFrame>,
    pub fail_writes: bool,
    pub saves: usize,
    pub count_reads: Cell<usize>,
}

impl MemoryFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_frame(mut self, size: (u32, u32), annotations: Vec<Annotation>) -> Self {
        self.frames.push(MemoryFrame { size, annotations });
        self
    }

    pub fn annotations(&self, index: usize) -> &[Annotation] {
        &self.frames[index].annotations
    }

    fn frame(&self, index: usize) -> Result<&MemoryFrame, FormatError> {
        self.frames.get(index).ok_or(FormatError::FrameOutOfRange {
            index,
            count: self.frames.len(),
        })
    }
}

impl FrameSource for MemoryFrameSource {
    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_name(&self, index: usize) -> String {
        format!("frame_{index:04}")
    }

    fn image_size(&self, index: usize) -> Result<(u32, u32), FormatError> {
        match self.frame(index)?.size {
            (0, 0) => Err(FormatError::invalid_format("unreadable image")),
            size => Ok(size),
        }
    }

    fn load_annotations(&self, index: usize) -> Result<Vec<Annotation>, FormatError> {
        Ok(self.frame(index)?.annotations.clone())
    }

    fn count_annotations(&self, index: usize) -> Result<usize, FormatError> {
        self.count_reads.set(self.count_reads.get() + 1);
        Ok(self.frame(index)?.annotations.len())
    }

    fn save_annotations(
        &mut self,
        index: usize,
        annotations: &[Annotation],
    ) -> Result<(), FormatError> {
        if self.fail_writes {
            return Err(FormatError::Io(std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "read-only",
            )));
        }
        let count = self.frames.len();
        let frame = self
            .frames
            .get_mut(index)
            .ok_or(FormatError::FrameOutOfRange { index, count })?;
        frame.annotations = annotations.to_vec();
        self.saves += 1;
        Ok(())
    }
}
