//! Game constants organized by domain.
//!
//! Centralizing magic numbers makes tuning easier and documents intent.
//! Constants are split into submodules by domain for easier navigation.
//! Most of them are defaults that the world configuration may override.

mod camera;
mod hud;
mod interaction;
mod narration;
mod time;
mod transition;

pub use camera::*;
pub use hud::*;
pub use interaction::*;
pub use narration::*;
pub use time::*;
pub use transition::*;
