//! HUD display constants.

/// Item panel / trigger button fade-in speed (per second)
pub const HUD_FADE_IN_SPEED: f32 = 5.0;
/// Item panel / trigger button fade-out speed (per second)
pub const HUD_FADE_OUT_SPEED: f32 = 8.0;
/// Alpha below which a fading HUD element counts as hidden
pub const HUD_ALPHA_EPSILON: f32 = 0.01;
/// Ending overlay fade-in speed (alpha per second)
pub const ENDING_FADE_SPEED: f32 = 1.0;
