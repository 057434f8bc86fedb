//! Collection progress counters shown on the HUD.

use std::fmt;

/// Which counter a completion belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressKind {
    /// Picked-up items
    Items,
    /// Narrations heard for the first time
    Narrations,
}

/// `collected` out of `total`, never more than `total`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressCounter {
    collected: u32,
    total: u32,
}

impl ProgressCounter {
    pub fn new(total: u32) -> Self {
        Self { collected: 0, total }
    }

    /// Add one, saturating at the total. Returns true if the count changed.
    pub fn increase(&mut self) -> bool {
        if self.collected < self.total {
            self.collected += 1;
            true
        } else {
            false
        }
    }

    /// Change the total, clamping what was already collected
    pub fn set_total(&mut self, total: u32) {
        self.total = total;
        self.collected = self.collected.min(total);
    }

    /// `(collected, total)`
    pub fn snapshot(&self) -> (u32, u32) {
        (self.collected, self.total)
    }

    pub fn is_complete(&self) -> bool {
        self.collected == self.total
    }
}

impl fmt::Display for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collected, self.total)
    }
}

/// The HUD's two progress counters
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    pub items: ProgressCounter,
    pub narrations: ProgressCounter,
}

impl ProgressTracker {
    pub fn new(items_total: u32, narrations_total: u32) -> Self {
        let mut tracker = Self::default();
        tracker.set_total(ProgressKind::Items, items_total);
        tracker.set_total(ProgressKind::Narrations, narrations_total);
        tracker
    }

    pub fn counter(&self, kind: ProgressKind) -> &ProgressCounter {
        match kind {
            ProgressKind::Items => &self.items,
            ProgressKind::Narrations => &self.narrations,
        }
    }

    pub fn set_total(&mut self, kind: ProgressKind, total: u32) {
        match kind {
            ProgressKind::Items => self.items.set_total(total),
            ProgressKind::Narrations => self.narrations.set_total(total),
        }
    }

    /// Saturating increment of one counter. Returns true if it changed.
    pub fn increase(&mut self, kind: ProgressKind) -> bool {
        match kind {
            ProgressKind::Items => self.items.increase(),
            ProgressKind::Narrations => self.narrations.increase(),
        }
    }
}
