//! The authoritative annotation list for the loaded frame.

use crate::constants::{DEFAULT_BOX_SIZE, NEW_BOX_CLASS, NEW_BOX_SCORE};
use crate::model::{Annotation, BBox, Vocabulary};
use crate::viewport::Size;

/// Owns the current frame's annotations, the selection and the dirty flag.
///
/// Every mutation is validated first; a rejected request leaves the store
/// untouched. Other components only see read-only slices.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    image_size: Size,
    selected: Option<usize>,
    dirty: bool,
}

impl AnnotationStore {
    /// Wrap a freshly loaded list. Nothing is selected and the store is clean.
    pub fn new(annotations: Vec<Annotation>, image_size: Size) -> Self {
        Self {
            annotations,
            image_size,
            selected: None,
            dirty: false,
        }
    }

    /// A store with no image and no boxes.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Size::new(0.0, 0.0))
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub fn bbox(&self, index: usize) -> Option<BBox> {
        self.annotations.get(index).map(|a| a.bbox)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn image_size(&self) -> Size {
        self.image_size
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select a box, or clear the selection with `None`.
    ///
    /// Returns false and keeps the old selection if the index is out of range.
    pub fn select(&mut self, index: Option<usize>) -> bool {
        match index {
            Some(i) if i >= self.annotations.len() => false,
            _ => {
                self.selected = index;
                true
            }
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Replace the whole list. The selection is clamped to the new length.
    pub fn replace_all(&mut self, annotations: Vec<Annotation>) {
        self.annotations = annotations;
        self.selected = match (self.selected, self.annotations.len()) {
            (_, 0) | (None, _) => None,
            (Some(i), n) => Some(i.min(n - 1)),
        };
        self.dirty = true;
    }

    /// Well-formed and inside the image.
    pub fn is_valid_box(&self, bbox: &BBox) -> bool {
        bbox.is_well_formed() && bbox.fits_within(self.image_size.width, self.image_size.height)
    }

    /// Replace the box at `index` if `candidate` is valid.
    pub fn move_or_resize(&mut self, index: usize, candidate: BBox) -> bool {
        if !self.is_valid_box(&candidate) {
            log::trace!("Rejected box {:?} for annotation {}", candidate.to_array(), index);
            return false;
        }
        let Some(ann) = self.annotations.get_mut(index) else {
            return false;
        };
        ann.bbox = candidate;
        self.dirty = true;
        true
    }

    /// Append a default-sized unlabeled box centred in the image.
    pub fn add_box(&mut self) -> usize {
        let cx = (self.image_size.width / 2.0).floor();
        let cy = (self.image_size.height / 2.0).floor();
        let half = DEFAULT_BOX_SIZE / 2.0;
        let bbox = BBox::new(cx - half, cy - half, cx + half, cy + half)
            .clamped_to(self.image_size.width, self.image_size.height);

        self.annotations
            .push(Annotation::new(bbox, NEW_BOX_CLASS).with_score(NEW_BOX_SCORE));
        self.dirty = true;
        self.annotations.len() - 1
    }

    /// Remove the box at `index`, keeping the selection on the same annotation
    /// when it survives.
    pub fn delete_box(&mut self, index: usize) -> Option<Annotation> {
        if index >= self.annotations.len() {
            return None;
        }
        let removed = self.annotations.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        self.dirty = true;
        Some(removed)
    }

    /// Set the class from free text. Returns the canonical class, or `None`
    /// when the text is not in the vocabulary.
    pub fn set_class(&mut self, index: usize, raw: &str, vocabulary: &Vocabulary) -> Option<String> {
        let canonical = vocabulary.canonical(raw)?.to_string();
        let ann = self.annotations.get_mut(index)?;
        if ann.class != canonical {
            ann.class = canonical.clone();
            self.dirty = true;
        }
        Some(canonical)
    }

    /// Set the detailed class from free text. Blank text removes the field.
    ///
    /// Returns the stored value (empty when cleared), or `None` when rejected.
    pub fn set_class_detailed(
        &mut self,
        index: usize,
        raw: &str,
        vocabulary: &Vocabulary,
    ) -> Option<String> {
        let value = if raw.trim().is_empty() {
            None
        } else {
            Some(vocabulary.canonical(raw)?.to_string())
        };
        let ann = self.annotations.get_mut(index)?;
        if ann.class_detailed != value {
            ann.class_detailed = value.clone();
            self.dirty = true;
        }
        Some(value.unwrap_or_default())
    }

    /// Set the free-text caption. Blank text removes the field.
    pub fn set_caption(&mut self, index: usize, text: &str) -> bool {
        let Some(ann) = self.annotations.get_mut(index) else {
            return false;
        };
        let trimmed = text.trim();
        let value = (!trimmed.is_empty()).then(|| trimmed.to_string());
        if ann.detailed_caption != value {
            ann.detailed_caption = value;
            self.dirty = true;
        }
        true
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::empty()
    }
}
