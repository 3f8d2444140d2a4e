//! Global constants for the annotator

/// Smallest user zoom level
pub const MIN_SCALE: f64 = 0.1;

/// Largest user zoom level
pub const MAX_SCALE: f64 = 5.0;

/// Scale value meaning "not customized, use auto-fit".
pub const AUTO_FIT_SENTINEL: f64 = 1.0;

/// Zoom multiplier for one wheel notch towards the user
pub const ZOOM_IN_FACTOR: f64 = 1.1;

/// Zoom multiplier for one wheel notch away from the user
pub const ZOOM_OUT_FACTOR: f64 = 0.9;

/// Side length of a corner handle hit square, in widget pixels
pub const HANDLE_SIZE: f64 = 16.0;

/// Side length of a freshly added box, in image pixels
pub const DEFAULT_BOX_SIZE: f64 = 100.0;

/// Class assigned to freshly added boxes until the user labels them
pub const NEW_BOX_CLASS: &str = "new_object";

/// Score assigned to freshly added boxes
pub const NEW_BOX_SCORE: f64 = 1.0;

/// Default autosave debounce delay in milliseconds
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 250;

/// Default session-state debounce delay in milliseconds
pub const DEFAULT_SESSION_SAVE_DELAY_MS: u64 = 300;

/// File name of the session-state file
pub const SESSION_STATE_FILENAME: &str = ".annotation_tool_state.json";

/// Image extensions considered during frame-pair discovery
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png"];

/// Extension of per-frame annotation files
pub const ANNOTATION_EXTENSION: &str = "json";
