//! Observer camera constants.

/// Default walking speed (world units per second)
pub const CAMERA_MOVE_SPEED: f32 = 5.0;
/// Default mouse-look sensitivity (degrees per mouse unit)
pub const CAMERA_ROTATION_SPEED: f32 = 2.0;
/// Pitch is clamped to +/- this many degrees
pub const CAMERA_PITCH_LIMIT: f32 = 90.0;
/// Default eye height of the observer
pub const CAMERA_EYE_HEIGHT: f32 = 1.6;
