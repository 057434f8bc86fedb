//! Narration sequencer constants.

/// Default on-screen time of a page when auto-advance is enabled (seconds)
pub const DEFAULT_PAGE_DISPLAY_TIME: f32 = 3.0;
/// Default duration of the fade-out after the final page (seconds)
pub const DEFAULT_NARRATION_FADE_OUT: f32 = 1.5;
