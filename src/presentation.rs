//! Presentation collaborators.
//!
//! The coordination core never draws or plays anything itself. It talks to
//! these traits, and the host decides what showing text or playing a voice
//! clip actually means. The implementations here log through `tracing` so
//! the headless runner has something to show.

use glam::Vec4;
use tracing::{debug, info};

/// RGBA colour, components in `0..=1`
pub type Color = Vec4;

/// Opaque white, the default text colour
pub const WHITE: Color = Vec4::ONE;

/// Surface that displays narration text (a panel with a text field)
pub trait PresentationSurface {
    /// Make the surface visible with `text`, optionally tinted
    fn show(&mut self, text: &str, color: Option<Color>);
    /// Hide the surface entirely
    fn hide(&mut self);
    /// Set the opacity of everything on the surface (`0..=1`)
    fn set_opacity(&mut self, opacity: f32);
}

/// The HUD's prompt area: item/trigger name plus the activation key icon
pub trait PromptPresenter {
    fn show_prompt(&mut self, text: &str, color: Option<Color>);
    fn hide_prompt(&mut self);
    fn show_trigger_button(&mut self);
    fn hide_trigger_button(&mut self);
}

/// Plays voice clips for narration pages
pub trait VoicePlayer {
    /// Start `clip`, replacing whatever is playing
    fn play(&self, clip: &str);
    /// Stop the current clip, if any
    fn stop(&self);
}

/// Narration surface that reports every call to the log
#[derive(Debug, Clone)]
pub struct TracingSurface {
    name: String,
    visible: bool,
    opacity: f32,
}

impl TracingSurface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: false,
            opacity: 1.0,
        }
    }
}

impl PresentationSurface for TracingSurface {
    fn show(&mut self, text: &str, _color: Option<Color>) {
        self.visible = true;
        info!(surface = %self.name, "{}", text);
    }

    fn hide(&mut self) {
        if self.visible {
            debug!(surface = %self.name, "hidden");
        }
        self.visible = false;
    }

    fn set_opacity(&mut self, opacity: f32) {
        // Only log coarse steps, fades call this every frame
        if (self.opacity - opacity).abs() >= 0.25 || opacity == 0.0 || opacity == 1.0 {
            debug!(surface = %self.name, opacity, "opacity");
        }
        self.opacity = opacity;
    }
}

/// Voice player used when no audio output is available
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentVoicePlayer;

impl VoicePlayer for SilentVoicePlayer {
    fn play(&self, clip: &str) {
        debug!(clip, "voice clip (silent)");
    }

    fn stop(&self) {}
}
