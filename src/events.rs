//! Game event system for decoupled communication between systems.
//!
//! Systems push events during the tick; the engine drains and logs them at
//! the end of the frame, and the VFX and HUD can react without tight coupling.

use hecs::Entity;

use crate::progress::ProgressKind;

/// Game events that systems can emit and subscribe to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// A narration's active flag flipped
    NarrationStateChanged { narration: Entity, active: bool },
    /// A trigger fired its bound action
    TriggerActivated { trigger: Entity, first_time: bool },
    /// The observer picked up an item
    ItemPicked { item: Entity },
    /// The item detail view opened
    DetailOpened { item: Entity },
    /// The item detail view closed
    DetailClosed { item: Entity },
    /// A progress counter moved
    ProgressChanged {
        kind: ProgressKind,
        collected: u32,
        total: u32,
    },
    /// A coordinator accepted a transition request
    TransitionStarted { target_scene: String },
    /// A scene load was issued
    SceneLoadRequested { scene: String },
}

/// Simple event queue - events are pushed during update, processed at end of frame
#[derive(Debug, Default)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Push an event to be processed later
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Drain all events for processing
    pub fn drain(&mut self) -> impl Iterator<Item = GameEvent> + '_ {
        self.events.drain(..)
    }

    /// Check if there are pending events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
