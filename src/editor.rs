//! The editor: one open frame sequence and everything the shell calls into.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use web_time::Instant;

use crate::canvas::{CanvasController, MouseButton};
use crate::config::AppConfig;
use crate::format::{AutoSaveManager, FormatError, FrameSource};
use crate::message::Notification;
use crate::model::{Annotation, BBox, Vocabulary};
use crate::state::{AnnotationStore, FrameCountCache, SessionState, SessionStore};
use crate::viewport::{Point, Size};

/// Errors surfaced to the shell. Invalid edits are not errors.
#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Frame {index} out of range (frame count {count})")]
    FrameOutOfRange { index: usize, count: usize },

    /// Pending edits could not be written, so the requested action was not taken.
    #[error("Failed to save annotations: {0}")]
    Save(#[source] FormatError),

    #[error("Cannot read image for frame {index}: {source}")]
    NoImage {
        index: usize,
        #[source]
        source: FormatError,
    },
}

/// Timing and file settings for an [`Editor`].
#[derive(Debug, Clone)]
pub struct EditorSettings {
    pub autosave_delay: Duration,
    pub session_save_delay: Duration,
    /// Session file location. `None` disables session persistence.
    pub session_path: Option<PathBuf>,
    pub widget_size: Size,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            autosave_delay: AutoSaveManager::DEFAULT_DEBOUNCE_DELAY,
            session_save_delay: Duration::from_millis(
                crate::constants::DEFAULT_SESSION_SAVE_DELAY_MS,
            ),
            session_path: None,
            widget_size: Size::new(1280.0, 800.0),
        }
    }
}

impl From<&AppConfig> for EditorSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            autosave_delay: Duration::from_millis(config.autosave_delay_ms),
            session_save_delay: Duration::from_millis(config.session_save_delay_ms),
            session_path: Some(config.session_state_path.clone()),
            ..Self::default()
        }
    }
}

/// Which box to select once a frame is loaded.
#[derive(Debug, Clone, Copy)]
enum Pick {
    Index(usize),
    Last,
}

/// Owns the frame source, the loaded frame's store, the canvas and the
/// save timers. The shell forwards input here, calls [`Editor::tick`]
/// regularly and drains [`Editor::take_notifications`].
pub struct Editor<S: FrameSource> {
    source: S,
    store: AnnotationStore,
    canvas: CanvasController,
    current_frame: usize,
    /// Whether `current_frame` holds a successfully loaded frame.
    loaded: bool,
    classes: Vocabulary,
    detailed_classes: Vocabulary,
    autosave: AutoSaveManager,
    session: Option<SessionStore>,
    counts: FrameCountCache,
    notifications: Vec<Notification>,
}

impl<S: FrameSource> Editor<S> {
    /// Create an editor with nothing loaded. Call [`Editor::restore_session`]
    /// or [`Editor::load_frame`] next.
    pub fn new(
        source: S,
        classes: Vocabulary,
        detailed_classes: Vocabulary,
        settings: EditorSettings,
    ) -> Self {
        let session = settings
            .session_path
            .map(|path| SessionStore::new(path, settings.session_save_delay));
        Self {
            source,
            store: AnnotationStore::empty(),
            canvas: CanvasController::new(settings.widget_size),
            current_frame: 0,
            loaded: false,
            classes,
            detailed_classes,
            autosave: AutoSaveManager::new().with_debounce_delay(settings.autosave_delay),
            session,
            counts: FrameCountCache::new(),
            notifications: Vec::new(),
        }
    }

    // ---- accessors ----

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn canvas(&self) -> &CanvasController {
        &self.canvas
    }

    pub fn classes(&self) -> &Vocabulary {
        &self.classes
    }

    pub fn detailed_classes(&self) -> &Vocabulary {
        &self.detailed_classes
    }

    pub fn frame_count(&self) -> usize {
        self.source.frame_count()
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn selected_box(&self) -> Option<usize> {
        self.store.selected()
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    /// Drain queued notifications in emission order.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    // ---- frames ----

    /// Load the frame the last session ended on, or the first frame.
    pub fn restore_session(&mut self) -> Result<(), EditorError> {
        let saved = self
            .session
            .as_ref()
            .and_then(|s| s.load(self.source.frame_count()));
        match saved {
            Some(state) => {
                log::info!(
                    "Restoring session at frame {} box {:?}",
                    state.frame_index + 1,
                    state.bbox_index
                );
                self.load_frame(state.frame_index, state.bbox_index)
            }
            None => self.load_frame(0, None),
        }
    }

    /// Flush pending edits, then replace the loaded frame.
    ///
    /// With boxes present, `select` (clamped to the last box) or the first box
    /// is selected. The viewport returns to auto-fit.
    pub fn load_frame(&mut self, index: usize, select: Option<usize>) -> Result<(), EditorError> {
        self.load_frame_picking(index, Pick::Index(select.unwrap_or(0)))
    }

    fn load_frame_picking(&mut self, index: usize, pick: Pick) -> Result<(), EditorError> {
        let count = self.source.frame_count();
        if index >= count {
            return Err(EditorError::FrameOutOfRange { index, count });
        }
        self.flush_autosave()?;

        let (width, height) = self
            .source
            .image_size(index)
            .map_err(|source| EditorError::NoImage { index, source })?;

        let annotations = match self.source.load_annotations(index) {
            Ok(annotations) => annotations,
            Err(e) => {
                log::warn!("Error loading annotations for frame {}: {}", index + 1, e);
                Vec::new()
            }
        };
        self.counts.set(index, annotations.len());

        let image_size = Size::new(f64::from(width), f64::from(height));
        self.store = AnnotationStore::new(annotations, image_size);
        self.current_frame = index;
        self.loaded = true;
        self.canvas.reset();

        let selected = match (self.store.len(), pick) {
            (0, _) => None,
            (n, Pick::Index(i)) => Some(i.min(n - 1)),
            (n, Pick::Last) => Some(n - 1),
        };
        self.store.select(selected);

        log::info!(
            "Loaded frame {}/{}: {} ({} boxes)",
            index + 1,
            count,
            self.source.frame_name(index),
            self.store.len()
        );
        self.notifications.push(Notification::FrameLoaded(index));
        self.notifications.push(Notification::SelectionChanged(selected));
        self.schedule_session_save();
        Ok(())
    }

    /// Move to the following frame. Returns false at the last frame.
    pub fn next_frame(&mut self) -> Result<bool, EditorError> {
        if self.current_frame + 1 >= self.source.frame_count() {
            return Ok(false);
        }
        self.load_frame(self.current_frame + 1, None)?;
        Ok(true)
    }

    /// Move to the preceding frame. Returns false at the first frame.
    pub fn previous_frame(&mut self) -> Result<bool, EditorError> {
        if self.current_frame == 0 {
            return Ok(false);
        }
        self.load_frame(self.current_frame - 1, None)?;
        Ok(true)
    }

    // ---- whole-list and selection ----

    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) {
        let before = self.store.selected();
        self.store.replace_all(annotations);
        self.canvas.cancel_gesture();
        self.counts.set(self.current_frame, self.store.len());
        if self.store.selected() != before {
            self.notify_selection();
        }
        self.schedule_autosave();
    }

    /// Select a box or clear the selection. Out-of-range indices are ignored.
    pub fn set_selected_box(&mut self, index: Option<usize>) -> bool {
        if index == self.store.selected() {
            return true;
        }
        if !self.store.select(index) {
            return false;
        }
        self.notify_selection();
        true
    }

    /// Select the next box, continuing into the nearest later frame that
    /// has boxes. Stays on the last box when there is none.
    pub fn select_next_box(&mut self) -> Result<(), EditorError> {
        let n = self.store.len();
        match self.store.selected() {
            None if n > 0 => {
                self.set_selected_box(Some(0));
                return Ok(());
            }
            Some(i) if i + 1 < n => {
                self.set_selected_box(Some(i + 1));
                return Ok(());
            }
            _ => {}
        }
        match self.counts.next_non_empty(self.current_frame, &self.source) {
            Some(frame) => self.load_frame_picking(frame, Pick::Index(0)),
            None => {
                if n > 0 {
                    self.set_selected_box(Some(n - 1));
                }
                Ok(())
            }
        }
    }

    /// Select the previous box, continuing into the nearest earlier frame
    /// that has boxes. Stays on the first box when there is none.
    pub fn select_prev_box(&mut self) -> Result<(), EditorError> {
        let n = self.store.len();
        match self.store.selected() {
            None if n > 0 => {
                self.set_selected_box(Some(n - 1));
                return Ok(());
            }
            Some(i) if i > 0 => {
                self.set_selected_box(Some(i - 1));
                return Ok(());
            }
            _ => {}
        }
        match self.counts.prev_non_empty(self.current_frame, &self.source) {
            Some(frame) => self.load_frame_picking(frame, Pick::Last),
            None => {
                if n > 0 {
                    self.set_selected_box(Some(0));
                }
                Ok(())
            }
        }
    }

    // ---- pointer input ----

    pub fn on_press(&mut self, pos: Point, button: MouseButton) {
        if let Some(note) = self.canvas.on_press(pos, button, &mut self.store) {
            self.notifications.push(note);
            self.schedule_session_save();
        }
    }

    pub fn on_move(&mut self, pos: Point) {
        if let Some(note) = self.canvas.on_move(pos, &mut self.store) {
            self.notifications.push(note);
            self.schedule_autosave();
        }
    }

    pub fn on_release(&mut self, pos: Point, button: MouseButton) {
        self.canvas.on_release(pos, button);
    }

    pub fn on_double_click(&mut self, button: MouseButton) {
        self.canvas.on_double_click(button);
    }

    pub fn on_wheel(&mut self, pos: Point, delta: f64) {
        self.canvas.on_wheel(pos, delta, &self.store);
    }

    pub fn resize(&mut self, widget_size: Size) {
        self.canvas.resize(widget_size);
    }

    // ---- editing ----

    /// Append a default box and select it. Returns `None` with no image loaded.
    pub fn add_box(&mut self) -> Option<usize> {
        if self.store.image_size().is_empty() {
            return None;
        }
        let index = self.store.add_box();
        self.counts.set(self.current_frame, self.store.len());
        self.store.select(Some(index));
        log::info!("Added box {}", index);
        self.notify_selection();
        self.schedule_autosave();
        Some(index)
    }

    /// Remove a box and write the frame right away.
    ///
    /// A failed write is logged and reported through
    /// [`Notification::SaveFailed`]; the edit stays pending.
    pub fn delete_box(&mut self, index: usize) -> Option<Annotation> {
        let before = self.store.selected();
        let removed = self.store.delete_box(index)?;
        self.canvas.cancel_gesture();
        self.counts.set(self.current_frame, self.store.len());
        log::info!("Deleted box {}: {}", index, removed.class);
        if self.store.selected() != before {
            self.notify_selection();
        }
        if let Err(e) = self.flush_autosave() {
            log::debug!("Delete kept pending: {}", e);
        }
        Some(removed)
    }

    /// Set coordinates from numeric input. Invalid boxes are ignored.
    pub fn set_box(&mut self, index: usize, coords: [f64; 4]) -> bool {
        let candidate = BBox::from_array(coords);
        if self.store.bbox(index) == Some(candidate) {
            return true;
        }
        if !self.store.move_or_resize(index, candidate) {
            return false;
        }
        self.notifications.push(Notification::BoxModified(index));
        self.schedule_autosave();
        true
    }

    /// Set the class if `raw` names one. Returns the canonical spelling.
    pub fn set_class(&mut self, index: usize, raw: &str) -> Option<String> {
        let class = self.store.set_class(index, raw, &self.classes)?;
        self.schedule_autosave();
        Some(class)
    }

    /// Set or clear (with blank text) the detailed class.
    pub fn set_class_detailed(&mut self, index: usize, raw: &str) -> Option<String> {
        let value = self
            .store
            .set_class_detailed(index, raw, &self.detailed_classes)?;
        self.schedule_autosave();
        Some(value)
    }

    pub fn set_caption(&mut self, index: usize, text: &str) -> bool {
        let accepted = self.store.set_caption(index, text);
        self.schedule_autosave();
        accepted
    }

    /// Finish editing the class field.
    ///
    /// Unknown text reverts to the box's current class when that is valid,
    /// otherwise to the vocabulary's fallback. Blank text means the fallback.
    pub fn commit_class(&mut self, index: usize, raw: &str) -> Option<String> {
        let current = self.store.get(index)?.class.clone();
        let chosen = if raw.trim().is_empty() {
            self.classes.fallback()
        } else {
            self.classes
                .canonical(raw)
                .or_else(|| self.classes.canonical(&current))
                .or_else(|| self.classes.fallback())
        };
        let chosen = chosen?.to_string();
        self.set_class(index, &chosen)
    }

    /// Finish editing the detailed class field.
    ///
    /// Unknown text reverts to the box's current detailed class when valid,
    /// otherwise the field is removed.
    pub fn commit_class_detailed(&mut self, index: usize, raw: &str) -> Option<String> {
        let current = self.store.get(index)?.class_detailed.clone();
        let chosen = if raw.trim().is_empty() {
            String::new()
        } else {
            self.detailed_classes
                .canonical(raw)
                .or_else(|| {
                    current
                        .as_deref()
                        .and_then(|c| self.detailed_classes.canonical(c))
                })
                .unwrap_or_default()
                .to_string()
        };
        self.set_class_detailed(index, &chosen)
    }

    // ---- persistence ----

    /// Run due timers. Call this from the shell's event loop.
    pub fn tick(&mut self) {
        self.tick_at(Instant::now());
    }

    pub fn tick_at(&mut self, now: Instant) {
        if self.autosave.should_save(now) && self.store.is_dirty() {
            // Failure is already logged and reported; the next edit retries.
            let _ = self.write_current(now);
        }
        if self.session.as_mut().is_some_and(|s| s.fire_if_due(now)) {
            self.save_session_now();
        }
    }

    /// Cancel the autosave timer and write now if anything is pending.
    pub fn flush_autosave(&mut self) -> Result<(), EditorError> {
        self.autosave.cancel();
        if !self.store.is_dirty() {
            return Ok(());
        }
        self.write_current(Instant::now()).map_err(EditorError::Save)
    }

    /// Write the loaded frame even if nothing changed. Does nothing until a
    /// frame has been loaded.
    pub fn save_now(&mut self) -> Result<(), EditorError> {
        self.autosave.cancel();
        self.write_current(Instant::now()).map_err(EditorError::Save)
    }

    /// Flush everything before shutdown.
    pub fn close(&mut self) -> Result<(), EditorError> {
        self.flush_autosave()?;
        self.save_session_now();
        Ok(())
    }

    fn write_current(&mut self, now: Instant) -> Result<(), FormatError> {
        let frame = self.current_frame;
        if !self.loaded {
            log::debug!("No frame loaded, skipping save");
            return Ok(());
        }
        match self.source.save_annotations(frame, self.store.annotations()) {
            Ok(()) => {
                self.store.clear_dirty();
                self.autosave.mark_saved(now);
                self.counts.set(frame, self.store.len());
                log::info!("Saved frame {}: {}", frame + 1, self.source.frame_name(frame));
                self.notifications.push(Notification::Saved(frame));
                Ok(())
            }
            Err(e) => {
                log::error!("Save failed for frame {}: {}", frame + 1, e);
                self.autosave.mark_save_failed();
                self.notifications.push(Notification::SaveFailed(frame));
                Err(e)
            }
        }
    }

    fn schedule_autosave(&mut self) {
        if self.store.is_dirty() {
            self.autosave.mark_changed(Instant::now());
        }
    }

    fn notify_selection(&mut self) {
        self.notifications
            .push(Notification::SelectionChanged(self.store.selected()));
        self.schedule_session_save();
    }

    fn schedule_session_save(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.schedule(Instant::now());
        }
    }

    fn save_session_now(&mut self) {
        if !self.loaded {
            return;
        }
        let state = SessionState {
            frame_index: self.current_frame,
            bbox_index: self.store.selected(),
        };
        if let Some(session) = self.session.as_mut() {
            session.save(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::memory::MemoryFrameSource;

    fn ann(x1: f64, y1: f64, x2: f64, y2: f64, class: &str) -> Annotation {
        Annotation::new(BBox::new(x1, y1, x2, y2), class)
    }

    fn editor(source: MemoryFrameSource) -> Editor<MemoryFrameSource> {
        let settings = EditorSettings {
            widget_size: Size::new(500.0, 400.0),
            ..EditorSettings::default()
        };
        Editor::new(
            source,
            Vocabulary::default_classes(),
            Vocabulary::default_detailed_classes(),
            settings,
        )
    }

    fn three_frames() -> MemoryFrameSource {
        MemoryFrameSource::new()
            .with_frame(
                (1000, 800),
                vec![ann(10.0, 10.0, 50.0, 50.0, "Car"), ann(60.0, 60.0, 90.0, 90.0, "Bus")],
            )
            .with_frame((1000, 800), vec![])
            .with_frame((1000, 800), vec![ann(100.0, 100.0, 200.0, 200.0, "Truck")])
    }

    fn later() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[test]
    fn test_load_frame_selects() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        assert_eq!(ed.selected_box(), Some(0));
        assert_eq!(
            ed.take_notifications(),
            vec![
                Notification::FrameLoaded(0),
                Notification::SelectionChanged(Some(0))
            ]
        );

        ed.load_frame(0, Some(9)).unwrap();
        assert_eq!(ed.selected_box(), Some(1));

        ed.load_frame(1, Some(0)).unwrap();
        assert_eq!(ed.selected_box(), None);

        assert!(matches!(
            ed.load_frame(3, None),
            Err(EditorError::FrameOutOfRange { index: 3, count: 3 })
        ));
        assert_eq!(ed.current_frame(), 1);
    }

    #[test]
    fn test_load_frame_resets_viewport() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        ed.on_wheel(Point::new(100.0, 100.0), 1.0);
        assert!(!ed.canvas().viewport().is_auto_fit());
        ed.next_frame().unwrap();
        assert!(ed.canvas().viewport().is_auto_fit());
    }

    #[test]
    fn test_frame_navigation_bounds() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        assert!(!ed.previous_frame().unwrap());
        assert!(ed.next_frame().unwrap());
        assert!(ed.next_frame().unwrap());
        assert!(!ed.next_frame().unwrap());
        assert_eq!(ed.current_frame(), 2);
        assert_eq!(ed.frame_count(), 3);
    }

    #[test]
    fn test_scenario_d_delete_last_box_then_navigate() {
        let source = MemoryFrameSource::new()
            .with_frame((1000, 800), vec![ann(10.0, 10.0, 50.0, 50.0, "Car")])
            .with_frame((1000, 800), vec![])
            .with_frame((1000, 800), vec![ann(100.0, 100.0, 200.0, 200.0, "Truck")]);
        let mut ed = editor(source);
        ed.load_frame(0, None).unwrap();

        ed.delete_box(0);
        assert_eq!(ed.selected_box(), None);
        assert!(ed.source().annotations(0).is_empty());

        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (2, Some(0)));
    }

    #[test]
    fn test_flush_before_frame_switch() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();

        // Drag box 0 by (10, 10) widget px at auto-fit 0.5 -> (20, 20) image px
        ed.on_press(Point::new(15.0, 15.0), MouseButton::Left);
        ed.on_move(Point::new(25.0, 25.0));
        ed.on_release(Point::new(25.0, 25.0), MouseButton::Left);
        assert!(ed.is_dirty());

        // Switch before the 250 ms debounce elapses
        ed.next_frame().unwrap();
        assert_eq!(ed.source().saves, 1);
        assert_eq!(
            ed.source().annotations(0)[0].bbox,
            BBox::new(30.0, 30.0, 70.0, 70.0)
        );
        assert!(!ed.is_dirty());
    }

    #[test]
    fn test_autosave_after_debounce() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        assert!(ed.set_box(0, [20.0, 20.0, 40.0, 40.0]));

        ed.tick_at(Instant::now());
        assert_eq!(ed.source().saves, 0);

        ed.tick_at(later());
        assert_eq!(ed.source().saves, 1);
        assert!(!ed.is_dirty());

        // Nothing new to write
        ed.tick_at(later() + Duration::from_secs(5));
        assert_eq!(ed.source().saves, 1);
    }

    #[test]
    fn test_failed_save_keeps_dirty_and_retries() {
        let mut source = three_frames();
        source.fail_writes = true;
        let mut ed = editor(source);
        ed.load_frame(0, None).unwrap();
        ed.set_box(0, [20.0, 20.0, 40.0, 40.0]);
        ed.take_notifications();

        ed.tick_at(later());
        assert!(ed.is_dirty());
        assert_eq!(ed.take_notifications(), vec![Notification::SaveFailed(0)]);

        // A failed flush blocks the frame switch
        assert!(matches!(ed.next_frame(), Err(EditorError::Save(_))));
        assert_eq!(ed.current_frame(), 0);

        // Next edit reschedules and the write goes through
        ed.source.fail_writes = false;
        ed.set_box(0, [21.0, 20.0, 40.0, 40.0]);
        ed.tick_at(later());
        assert!(!ed.is_dirty());
        assert_eq!(ed.source().annotations(0)[0].bbox.x1, 21.0);
    }

    #[test]
    fn test_set_box_rejects_invalid() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        ed.take_notifications();
        assert!(!ed.set_box(0, [50.0, 10.0, 40.0, 50.0]));
        assert!(!ed.set_box(0, [10.0, 10.0, 1001.0, 50.0]));
        assert!(!ed.set_box(7, [10.0, 10.0, 20.0, 20.0]));
        assert!(!ed.is_dirty());
        assert!(ed.take_notifications().is_empty());

        assert!(ed.set_box(0, [0.0, 0.0, 1000.0, 800.0]));
        assert_eq!(ed.take_notifications(), vec![Notification::BoxModified(0)]);
    }

    #[test]
    fn test_add_and_delete_box() {
        let mut ed = editor(three_frames());
        ed.load_frame(1, None).unwrap();
        let index = ed.add_box().unwrap();
        assert_eq!(index, 0);
        assert_eq!(ed.selected_box(), Some(0));
        assert_eq!(ed.store().bbox(0), Some(BBox::new(450.0, 350.0, 550.0, 450.0)));

        let removed = ed.delete_box(0).unwrap();
        assert_eq!(removed.class, "new_object");
        assert_eq!(ed.selected_box(), None);
        // Deletion writes immediately
        assert!(!ed.is_dirty());
        assert!(ed.source().annotations(1).is_empty());
        assert!(ed.delete_box(0).is_none());
    }

    #[test]
    fn test_add_box_without_image() {
        let mut ed = editor(three_frames());
        assert_eq!(ed.add_box(), None);
    }

    #[test]
    fn test_cross_frame_navigation() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();

        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (0, Some(1)));

        // Frame 1 is empty, so the jump lands on frame 2
        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (2, Some(0)));

        // No later frame: stays on the last box
        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (2, Some(0)));

        // Backwards lands on the last box of frame 0
        ed.select_prev_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (0, Some(1)));

        ed.select_prev_box().unwrap();
        ed.select_prev_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (0, Some(0)));
    }

    #[test]
    fn test_navigation_sees_local_counts() {
        let mut ed = editor(three_frames());
        ed.load_frame(2, None).unwrap();
        ed.delete_box(0);

        ed.load_frame(1, None).unwrap();
        ed.add_box();
        ed.load_frame(0, Some(1)).unwrap();

        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (1, Some(0)));
        ed.select_next_box().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (1, Some(0)));
    }

    #[test]
    fn test_commit_class_fallbacks() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();

        assert_eq!(ed.commit_class(0, "bus").as_deref(), Some("Bus"));
        // Unknown text reverts to the box's last valid class
        assert_eq!(ed.commit_class(0, "spaceship").as_deref(), Some("Bus"));
        assert_eq!(ed.commit_class(0, "  ").as_deref(), Some("Other"));
        assert_eq!(ed.store().get(0).unwrap().class, "Other");

        // A box whose stored class is not in the vocabulary falls back to Other
        ed.set_annotations(vec![ann(10.0, 10.0, 50.0, 50.0, "new_object")]);
        assert_eq!(ed.commit_class(0, "spaceship").as_deref(), Some("Other"));
        assert_eq!(ed.commit_class(5, "Car"), None);
    }

    #[test]
    fn test_commit_class_detailed_fallbacks() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        let valid = ed.detailed_classes().options()[0].clone();

        assert_eq!(
            ed.commit_class_detailed(0, &valid.to_uppercase()).as_deref(),
            Some(valid.as_str())
        );
        assert_eq!(
            ed.commit_class_detailed(0, "not a real class").as_deref(),
            Some(valid.as_str())
        );
        assert_eq!(ed.commit_class_detailed(0, "").as_deref(), Some(""));
        assert_eq!(ed.store().get(0).unwrap().class_detailed, None);
        assert_eq!(ed.commit_class_detailed(0, "not a real class").as_deref(), Some(""));
    }

    #[test]
    fn test_caption_and_class_edits_schedule_save() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        assert!(ed.set_caption(0, "red hatchback"));
        assert_eq!(ed.set_class(0, "nope"), None);
        assert_eq!(ed.set_class(1, "TRUCK").as_deref(), Some("Truck"));

        ed.tick_at(later());
        let saved = ed.source().annotations(0);
        assert_eq!(saved[0].detailed_caption.as_deref(), Some("red hatchback"));
        assert_eq!(saved[1].class, "Truck");
    }

    #[test]
    fn test_set_selected_box() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        ed.take_notifications();

        assert!(ed.set_selected_box(Some(1)));
        assert!(!ed.set_selected_box(Some(2)));
        assert!(ed.set_selected_box(None));
        assert_eq!(
            ed.take_notifications(),
            vec![
                Notification::SelectionChanged(Some(1)),
                Notification::SelectionChanged(None)
            ]
        );
    }

    #[test]
    fn test_set_annotations_clamps_selection() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, Some(1)).unwrap();
        ed.take_notifications();
        ed.set_annotations(vec![ann(1.0, 1.0, 2.0, 2.0, "Car")]);
        assert_eq!(ed.selected_box(), Some(0));
        assert!(ed.is_dirty());
        assert_eq!(ed.take_notifications(), vec![Notification::SelectionChanged(Some(0))]);
    }

    #[test]
    fn test_unreadable_image_keeps_frame() {
        let source = MemoryFrameSource::new()
            .with_frame((640, 480), vec![])
            .with_frame((0, 0), vec![]);
        let mut ed = editor(source);
        ed.load_frame(0, None).unwrap();
        assert!(matches!(
            ed.load_frame(1, None),
            Err(EditorError::NoImage { index: 1, .. })
        ));
        assert_eq!(ed.current_frame(), 0);
        assert_eq!(ed.store().image_size(), Size::new(640.0, 480.0));
    }

    #[test]
    fn test_save_without_loaded_frame_writes_nothing() {
        let mut ed = editor(three_frames());
        ed.save_now().unwrap();
        ed.close().unwrap();
        assert_eq!(ed.source().saves, 0);
        assert_eq!(ed.source().annotations(0).len(), 2);

        // Restoring fails on an unreadable first frame; its file stays intact
        let source = MemoryFrameSource::new()
            .with_frame((0, 0), vec![ann(10.0, 10.0, 50.0, 50.0, "Car")]);
        let mut ed = editor(source);
        assert!(matches!(
            ed.restore_session(),
            Err(EditorError::NoImage { index: 0, .. })
        ));
        ed.save_now().unwrap();
        ed.tick_at(later());
        assert_eq!(ed.source().saves, 0);
        assert_eq!(ed.source().annotations(0).len(), 1);
    }

    fn bus_between_car_and_dog() -> MemoryFrameSource {
        MemoryFrameSource::new().with_frame(
            (1000, 800),
            vec![
                ann(10.0, 10.0, 50.0, 50.0, "Car"),
                ann(100.0, 100.0, 300.0, 300.0, "Bus"),
                ann(500.0, 500.0, 600.0, 600.0, "Dog"),
            ],
        )
    }

    #[test]
    fn test_delete_during_drag_ends_gesture() {
        let mut ed = editor(bus_between_car_and_dog());
        ed.load_frame(0, None).unwrap();

        // Body of the Bus at auto-fit 0.5
        ed.on_press(Point::new(100.0, 100.0), MouseButton::Left);
        assert_eq!(ed.selected_box(), Some(1));
        ed.delete_box(0);
        assert!(ed.canvas().interaction().is_idle());

        ed.on_move(Point::new(110.0, 110.0));
        ed.on_release(Point::new(110.0, 110.0), MouseButton::Left);
        assert_eq!(ed.store().get(0).unwrap().bbox, BBox::new(100.0, 100.0, 300.0, 300.0));
        assert_eq!(ed.store().get(1).unwrap().bbox, BBox::new(500.0, 500.0, 600.0, 600.0));
    }

    #[test]
    fn test_replacing_boxes_during_drag_ends_gesture() {
        let mut ed = editor(bus_between_car_and_dog());
        ed.load_frame(0, None).unwrap();

        ed.on_press(Point::new(100.0, 100.0), MouseButton::Left);
        let mut reordered = ed.store().annotations().to_vec();
        reordered.reverse();
        ed.set_annotations(reordered);
        assert!(ed.canvas().interaction().is_idle());

        ed.on_move(Point::new(110.0, 110.0));
        let boxes: Vec<BBox> = ed.store().annotations().iter().map(|a| a.bbox).collect();
        assert_eq!(
            boxes,
            vec![
                BBox::new(500.0, 500.0, 600.0, 600.0),
                BBox::new(100.0, 100.0, 300.0, 300.0),
                BBox::new(10.0, 10.0, 50.0, 50.0),
            ]
        );
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EditorSettings {
            session_path: Some(dir.path().join(".annotation_tool_state.json")),
            ..EditorSettings::default()
        };

        let mut ed = Editor::new(
            three_frames(),
            Vocabulary::default_classes(),
            Vocabulary::default_detailed_classes(),
            settings.clone(),
        );
        ed.restore_session().unwrap();
        assert_eq!(ed.current_frame(), 0);
        ed.load_frame(2, None).unwrap();
        ed.close().unwrap();

        let mut ed = Editor::new(
            three_frames(),
            Vocabulary::default_classes(),
            Vocabulary::default_detailed_classes(),
            settings,
        );
        ed.restore_session().unwrap();
        assert_eq!((ed.current_frame(), ed.selected_box()), (2, Some(0)));
    }

    #[test]
    fn test_close_flushes() {
        let mut ed = editor(three_frames());
        ed.load_frame(0, None).unwrap();
        ed.set_caption(1, "bus stop");
        ed.close().unwrap();
        assert_eq!(
            ed.source().annotations(0)[1].detailed_caption.as_deref(),
            Some("bus stop")
        );
    }
}
