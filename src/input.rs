//! Input handling.
//!
//! Key presses are edge-triggered: a key shows up in `keys_pressed` only on
//! the frame it went down, and stays in `keys_held` until it is released.
//! Mouse motion accumulates into a per-frame delta.

use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

/// Input state tracking
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Keys that went down this frame
    pub keys_pressed: HashSet<KeyCode>,
    /// Keys currently down
    pub keys_held: HashSet<KeyCode>,
    /// Mouse motion since the last frame
    pub mouse_delta: Vec2,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key-down event. Auto-repeat of a held key is not a new press.
    pub fn press(&mut self, key: KeyCode) {
        if self.keys_held.insert(key) {
            self.keys_pressed.insert(key);
        }
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    /// Press and release within the same frame
    pub fn tap(&mut self, key: KeyCode) {
        self.press(key);
        self.release(key);
    }

    pub fn add_mouse_motion(&mut self, dx: f32, dy: f32) {
        self.mouse_delta += Vec2::new(dx, dy);
    }

    /// Whether `key` went down this frame (does not consume the press)
    pub fn was_pressed(&self, key: KeyCode) -> bool {
        self.keys_pressed.contains(&key)
    }

    /// Consume a press so later systems this frame do not see it
    pub fn take_press(&mut self, key: KeyCode) -> bool {
        self.keys_pressed.remove(&key)
    }

    pub fn is_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Movement axes from WASD / arrows: `x` strafes right, `y` moves forward
    pub fn movement_axis(&self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.is_held(KeyCode::KeyW) || self.is_held(KeyCode::ArrowUp) {
            axis.y += 1.0;
        }
        if self.is_held(KeyCode::KeyS) || self.is_held(KeyCode::ArrowDown) {
            axis.y -= 1.0;
        }
        if self.is_held(KeyCode::KeyD) || self.is_held(KeyCode::ArrowRight) {
            axis.x += 1.0;
        }
        if self.is_held(KeyCode::KeyA) || self.is_held(KeyCode::ArrowLeft) {
            axis.x -= 1.0;
        }
        axis
    }

    /// Clear per-frame state. Held keys survive.
    pub fn end_frame(&mut self) {
        self.keys_pressed.clear();
        self.mouse_delta = Vec2::ZERO;
    }
}
