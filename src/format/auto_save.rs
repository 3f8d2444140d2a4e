//! Debounced save timers.
//!
//! Every edit pushes the deadline forward, so a burst of edits is written once
//! after the pointer settles. All checks take the current time explicitly.

use std::time::Duration;
use web_time::Instant;

/// A restartable single-shot timer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)start the countdown from `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Returns true once when the deadline has passed, clearing it.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.deadline = None;
            true
        } else {
            false
        }
    }
}

/// Auto-save timing for the current frame's annotations.
///
/// Dirtiness lives with the annotations; this only decides when to write.
/// A failed save leaves the timer idle until the next edit reschedules it.
#[derive(Debug)]
pub struct AutoSaveManager {
    timer: Debouncer,

    /// Time of last successful save.
    last_save: Option<Instant>,

    /// Consecutive failed saves.
    failures: u32,

    enabled: bool,
}

impl AutoSaveManager {
    /// Default debounce delay (250 ms).
    pub const DEFAULT_DEBOUNCE_DELAY: Duration =
        Duration::from_millis(crate::constants::DEFAULT_AUTOSAVE_DELAY_MS);

    pub fn new() -> Self {
        Self {
            timer: Debouncer::new(Self::DEFAULT_DEBOUNCE_DELAY),
            last_save: None,
            failures: 0,
            enabled: true,
        }
    }

    /// Set the debounce delay.
    pub fn with_debounce_delay(mut self, delay: Duration) -> Self {
        self.timer = Debouncer::new(delay);
        self
    }

    /// Record an edit at `now`, restarting the countdown.
    pub fn mark_changed(&mut self, now: Instant) {
        if self.enabled {
            self.timer.schedule(now);
            log::trace!("Auto-save: scheduled in {:?}", self.timer.delay());
        }
    }

    pub fn is_pending(&self) -> bool {
        self.timer.is_pending()
    }

    /// Whether the countdown elapsed. Consumes the deadline.
    pub fn should_save(&mut self, now: Instant) -> bool {
        self.enabled && self.timer.fire_if_due(now)
    }

    /// Drop any pending countdown, e.g. before a synchronous flush.
    pub fn cancel(&mut self) {
        self.timer.cancel();
    }

    pub fn mark_saved(&mut self, now: Instant) {
        self.last_save = Some(now);
        self.failures = 0;
        self.timer.cancel();
        log::trace!("Auto-save: marked saved");
    }

    pub fn mark_save_failed(&mut self) {
        self.failures += 1;
        log::trace!("Auto-save: save failed ({} in a row)", self.failures);
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn last_save(&self) -> Option<Instant> {
        self.last_save
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.timer.cancel();
        }
        log::debug!("Auto-save: enabled = {}", enabled);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl Default for AutoSaveManager {
    fn default() -> Self {
        Self::new()
    }
}
