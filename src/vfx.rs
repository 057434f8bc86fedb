//! Visual effects for scene transitions.
//!
//! Effects are spawned, animated and removed without affecting the
//! walkthrough logic. A renderer would read `progress()` to draw them.

use glam::Vec3;
use tracing::debug;

use crate::constants::SCREEN_WIPE_DURATION;

/// Something that can play a transition effect for `duration` seconds
pub trait TransitionEffects {
    fn play(&mut self, origin: Option<Vec3>, duration: f32);
}

/// A one-shot visual effect
#[derive(Debug, Clone)]
pub struct VisualEffect {
    pub effect_type: EffectType,
    pub timer: f32,    // Time remaining
    pub duration: f32, // Total duration (for progress calculation)
}

impl VisualEffect {
    pub fn new(effect_type: EffectType, duration: f32) -> Self {
        Self {
            effect_type,
            timer: duration,
            duration,
        }
    }

    /// Progress from 0.0 (just started) to 1.0 (finished)
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.timer / self.duration).clamp(0.0, 1.0)
    }

    pub fn is_finished(&self) -> bool {
        self.timer <= 0.0
    }

    /// Update the effect, returns true if still alive
    pub fn update(&mut self, dt: f32) -> bool {
        self.timer -= dt;
        !self.is_finished()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectType {
    /// Particles bursting out of a point in the world
    ParticleBurst { origin: Vec3 },
    /// Full-screen wipe, used when there is no origin
    ScreenWipe,
}

/// Manager for all active visual effects
#[derive(Debug, Default)]
pub struct VfxManager {
    pub effects: Vec<VisualEffect>,
}

impl VfxManager {
    pub fn new() -> Self {
        Self {
            effects: Vec::new(),
        }
    }

    pub fn spawn(&mut self, effect_type: EffectType, duration: f32) {
        debug!(?effect_type, duration, "vfx spawned");
        self.effects.push(VisualEffect::new(effect_type, duration));
    }

    pub fn spawn_wipe(&mut self) {
        self.spawn(EffectType::ScreenWipe, SCREEN_WIPE_DURATION);
    }

    /// Update all effects, removing finished ones
    pub fn update(&mut self, dt: f32) {
        puffin::profile_function!();
        self.effects.retain_mut(|effect| effect.update(dt));
    }

    pub fn is_playing(&self) -> bool {
        !self.effects.is_empty()
    }
}

impl TransitionEffects for VfxManager {
    fn play(&mut self, origin: Option<Vec3>, duration: f32) {
        let effect_type = match origin {
            Some(origin) => EffectType::ParticleBurst { origin },
            None => EffectType::ScreenWipe,
        };
        self.spawn(effect_type, duration);
    }
}
