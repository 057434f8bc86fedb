//! ECS components for points of interest.
//!
//! Narration sequencers are not components: they own non-`Send` presentation
//! collaborators, so the engine keeps them beside the world, keyed by the
//! entity that carries their [`Narrator`] marker.

use glam::Vec3;

/// Position component - world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub Vec3);

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self(Vec3::new(x, y, z))
    }
}

/// Name component - used for logs and the HUD
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(pub String);

/// Marks a point of interest in the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointOfInterest;

/// Marks the entity whose narration sequencer lives in the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Narrator {
    pub id: String,
    /// Restart this narration during `init`
    pub play_on_start: bool,
}

/// Entity is no longer drawn (picked-up items)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hidden;
