//! Edge-triggered proximity detection.
//!
//! Callers only care about the moment an observer crosses a range boundary
//! (to show or hide a prompt once), so the detector remembers the previous
//! state and reports transitions instead of a raw boolean.

use glam::Vec3;

/// Result of one proximity poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProximityChange {
    /// Observer just came within range
    Entered,
    /// Observer just left range (or a position became unavailable)
    Exited,
    /// No boundary crossed since the last poll
    Unchanged,
}

/// Tracks whether an observer is inside a point of interest's range
#[derive(Debug, Clone, Copy, Default)]
pub struct ProximityDetector {
    inside: bool,
}

impl ProximityDetector {
    pub fn new() -> Self {
        Self { inside: false }
    }

    /// Whether the last poll found the observer in range
    pub fn is_inside(&self) -> bool {
        self.inside
    }

    /// Poll with the current positions. A missing position counts as out of range.
    pub fn update(
        &mut self,
        observer: Option<Vec3>,
        poi: Option<Vec3>,
        range: f32,
    ) -> ProximityChange {
        let now_inside = match (observer, poi) {
            (Some(observer), Some(poi)) => observer.distance(poi) <= range,
            _ => false,
        };

        match (self.inside, now_inside) {
            (false, true) => {
                self.inside = true;
                ProximityChange::Entered
            }
            (true, false) => {
                self.inside = false;
                ProximityChange::Exited
            }
            _ => ProximityChange::Unchanged,
        }
    }

    /// Forget the previous state without reporting an edge
    pub fn reset(&mut self) {
        self.inside = false;
    }
}
