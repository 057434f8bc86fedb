//! Scripted input timeline for headless runs.
//!
//! A script is a list of timed steps (`press`, `teleport`, `look`, `walk`)
//! applied to the engine before each tick, standing in for a player.

use glam::{Vec2, Vec3};
use serde::Deserialize;
use tracing::debug;
use winit::keyboard::KeyCode;

use super::WalkEngine;

/// One timed step
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStep {
    /// Seconds since the start of the run
    pub at: f32,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "do", rename_all = "snake_case")]
pub enum ScriptAction {
    /// Press and release a key
    Press { key: KeyCode },
    /// Move the observer
    Teleport { position: Vec3 },
    /// Turn the observer toward a point
    Look { target: Vec3 },
    /// Hold a movement direction (`x` strafe, `y` forward) for a while
    Walk { axis: Vec2, duration: f32 },
}

#[derive(Debug, Clone, Copy)]
struct Walking {
    axis: Vec2,
    until: f32,
}

/// Replays steps in time order
#[derive(Debug, Clone)]
pub struct Script {
    steps: Vec<ScriptStep>,
    next: usize,
    walking: Option<Walking>,
}

impl Script {
    pub fn new(mut steps: Vec<ScriptStep>) -> Self {
        steps.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self {
            steps,
            next: 0,
            walking: None,
        }
    }

    /// Every step applied and no walk in progress
    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len() && self.walking.is_none()
    }

    /// Time the last step ends
    pub fn end_time(&self) -> f32 {
        self.steps
            .iter()
            .map(|step| match step.action {
                ScriptAction::Walk { duration, .. } => step.at + duration,
                _ => step.at,
            })
            .fold(0.0, f32::max)
    }

    /// Apply every step due at `now`, then continue any walk for `dt`
    pub fn apply(&mut self, now: f32, dt: f32, engine: &mut WalkEngine) {
        while let Some(step) = self.steps.get(self.next) {
            if step.at > now {
                break;
            }
            debug!(at = step.at, action = ?step.action, "script step");
            match step.action {
                ScriptAction::Press { key } => engine.input.tap(key),
                ScriptAction::Teleport { position } => engine.camera.position = position,
                ScriptAction::Look { target } => engine.camera.look_at(target),
                ScriptAction::Walk { axis, duration } => {
                    self.walking = Some(Walking {
                        axis,
                        until: step.at + duration,
                    })
                }
            }
            self.next += 1;
        }

        if let Some(walking) = self.walking {
            if now >= walking.until {
                self.walking = None;
            } else if engine.camera.enabled {
                engine.camera.translate(walking.axis, dt);
            }
        }
    }
}
