//! Scene transition constants.

/// Default duration of the transition particle effect (seconds)
pub const DEFAULT_EFFECT_DURATION: f32 = 1.5;
/// Fraction of the effect duration after which the scene load is issued
pub const LOAD_AT_EFFECT_FRACTION: f32 = 0.7;
/// Default wait after narration finishes before transitioning (seconds)
pub const DEFAULT_POST_NARRATION_DELAY: f32 = 1.0;
/// Default duration of the full-screen wipe that accompanies a load (seconds)
pub const SCREEN_WIPE_DURATION: f32 = 1.5;
