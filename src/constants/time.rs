//! Time system constants.

/// Default fixed step of the headless walkthrough runner (seconds)
pub const DEFAULT_FIXED_DT: f32 = 1.0 / 60.0;
/// Largest frame delta fed to the simulation (prevents timer jumps after stalls)
pub const MAX_FRAME_DT: f32 = 0.1;
/// Hard stop for a scripted walkthrough (seconds of game time)
pub const DEFAULT_MAX_WALK_SECONDS: f32 = 600.0;
/// Time the runner keeps ticking after the last script step (seconds)
pub const SCRIPT_LINGER_SECONDS: f32 = 5.0;
