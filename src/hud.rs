//! Heads-up display state.
//!
//! The HUD does not draw anything itself. It tracks what should be visible
//! (item prompt, trigger button, ending overlay) and eases each element's
//! alpha toward its target every frame; [`HudSnapshot`] is what a renderer
//! would read.

use tracing::debug;

use crate::constants::*;
use crate::presentation::{Color, PromptPresenter, WHITE};
use crate::progress::ProgressTracker;

/// An element that fades toward shown / hidden
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FadeElement {
    pub alpha: f32,
    pub shown: bool,
}

impl FadeElement {
    /// Exponential ease toward the target alpha
    fn ease(&mut self, fade_in_speed: f32, fade_out_speed: f32, dt: f32) {
        let (target, speed) = if self.shown {
            (1.0, fade_in_speed)
        } else {
            (0.0, fade_out_speed)
        };
        let t = (speed * dt).clamp(0.0, 1.0);
        self.alpha += (target - self.alpha) * t;
        if (target - self.alpha).abs() < HUD_ALPHA_EPSILON {
            self.alpha = target;
        }
    }
}

#[derive(Debug, Clone)]
pub struct HudControl {
    pub item_panel: FadeElement,
    pub trigger_button: FadeElement,
    pub ending_overlay: FadeElement,
    item_text: String,
    item_color: Color,
    pub default_text_color: Color,
    /// Hiding the item info also hides the trigger button
    pub show_trigger_only_with_item: bool,
    pub fade_in_speed: f32,
    pub fade_out_speed: f32,
    pub ending_fade_speed: f32,
}

impl HudControl {
    pub fn new() -> Self {
        Self {
            item_panel: FadeElement::default(),
            trigger_button: FadeElement::default(),
            ending_overlay: FadeElement::default(),
            item_text: String::new(),
            item_color: WHITE,
            default_text_color: WHITE,
            show_trigger_only_with_item: true,
            fade_in_speed: HUD_FADE_IN_SPEED,
            fade_out_speed: HUD_FADE_OUT_SPEED,
            ending_fade_speed: ENDING_FADE_SPEED,
        }
    }

    pub fn show_item_info(&mut self, name: &str, color: Option<Color>) {
        if name.is_empty() {
            return;
        }
        debug!(item = name, "hud item info shown");
        self.item_text = name.to_string();
        self.item_color = color.unwrap_or(self.default_text_color);
        self.item_panel.shown = true;
        self.trigger_button.shown = true;
    }

    pub fn hide_item_info(&mut self) {
        self.item_panel.shown = false;
        self.item_text.clear();
        if self.show_trigger_only_with_item {
            self.trigger_button.shown = false;
        }
    }

    /// Whether the item panel is currently targeting `name`
    pub fn is_showing(&self, name: &str) -> bool {
        self.item_panel.shown && self.item_text == name
    }

    pub fn item_text(&self) -> &str {
        &self.item_text
    }

    pub fn item_color(&self) -> Color {
        self.item_color
    }

    /// Hide every element (ending sequence)
    pub fn hide_all(&mut self) {
        self.hide_item_info();
        self.trigger_button.shown = false;
    }

    pub fn show_ending(&mut self) {
        self.ending_overlay.shown = true;
    }

    /// Ease every element one frame
    pub fn update(&mut self, dt: f32) {
        puffin::profile_function!();
        self.item_panel
            .ease(self.fade_in_speed, self.fade_out_speed, dt);
        self.trigger_button
            .ease(self.fade_in_speed, self.fade_out_speed, dt);

        // Ending overlay fades in linearly
        if self.ending_overlay.shown {
            self.ending_overlay.alpha =
                (self.ending_overlay.alpha + self.ending_fade_speed * dt).min(1.0);
        }
    }
}

impl Default for HudControl {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptPresenter for HudControl {
    fn show_prompt(&mut self, text: &str, color: Option<Color>) {
        self.show_item_info(text, color);
    }

    fn hide_prompt(&mut self) {
        self.hide_item_info();
    }

    fn show_trigger_button(&mut self) {
        self.trigger_button.shown = true;
    }

    fn hide_trigger_button(&mut self) {
        self.trigger_button.shown = false;
    }
}

/// What a renderer would draw this frame
#[derive(Debug, Clone, PartialEq)]
pub struct HudSnapshot {
    pub prompt: Option<String>,
    pub prompt_alpha: f32,
    pub trigger_alpha: f32,
    pub narration: Option<String>,
    pub narration_opacity: f32,
    pub items_label: String,
    pub narrations_label: String,
    pub ending_alpha: f32,
}

impl HudSnapshot {
    pub fn capture(
        hud: &HudControl,
        progress: &ProgressTracker,
        narration: Option<(&str, f32)>,
    ) -> Self {
        Self {
            prompt: (!hud.item_text.is_empty()).then(|| hud.item_text.clone()),
            prompt_alpha: hud.item_panel.alpha,
            trigger_alpha: hud.trigger_button.alpha,
            narration: narration.map(|(text, _)| text.to_string()),
            narration_opacity: narration.map_or(0.0, |(_, opacity)| opacity),
            items_label: progress.items.to_string(),
            narrations_label: progress.narrations.to_string(),
            ending_alpha: hud.ending_overlay.alpha,
        }
    }
}
