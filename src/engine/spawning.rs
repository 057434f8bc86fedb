//! Data-driven world construction.
//!
//! Turns a [`WalkConfig`] into entities: narrators, transition coordinators,
//! interaction triggers and pickable items. References between them are
//! resolved from config ids to entities here, once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;
use hecs::{Entity, EntityBuilder, World};
use tracing::info;

use crate::components::{Name, Narrator, PointOfInterest, Position};
use crate::config::{ActionConfig, ItemConfig, NarrationConfig, TriggerConfig, WalkConfig};
use crate::error::{Result, WalkError};
use crate::events::GameEvent;
use crate::items::PickableItem;
use crate::narration::{NarrationSequencer, NarrationSettings};
use crate::presentation::WHITE;
use crate::transition::{SceneTransitionCoordinator, TransitionSettings};
use crate::trigger::{InteractionTrigger, TriggerAction};

use super::Collaborators;

/// A narration sequencer and the entity that stands for it in the world
pub struct NarrationSlot {
    pub entity: Entity,
    pub sequencer: NarrationSequencer,
}

/// Narration state changes delivered by sequencer subscriptions, drained by the engine
pub type NarrationChanges = Rc<RefCell<Vec<GameEvent>>>;

/// Start screen wiring
#[derive(Debug, Clone)]
pub struct StartScreen {
    pub key: winit::keyboard::KeyCode,
    pub narration: Option<Entity>,
    pub coordinator: Entity,
    pub target_scene: String,
}

/// Everything spawned from a config
pub struct SpawnedWorld {
    pub world: World,
    pub narrations: Vec<NarrationSlot>,
    pub narration_changes: NarrationChanges,
    pub start: Option<StartScreen>,
}

/// Build the world described by `config`
pub fn spawn_world(config: &WalkConfig, collaborators: &mut Collaborators) -> Result<SpawnedWorld> {
    let mut world = World::new();

    let narration_changes = NarrationChanges::default();
    let mut narration_ids = HashMap::new();
    let mut narrations = Vec::with_capacity(config.narrations.len());
    for narration in &config.narrations {
        let slot = spawn_narrator(&mut world, narration, collaborators, &narration_changes);
        narration_ids.insert(narration.id.clone(), slot.entity);
        narrations.push(slot);
    }
    let lookup = |id: &Option<String>| id.as_ref().and_then(|id| narration_ids.get(id).copied());

    let mut transition_ids = HashMap::new();
    for transition in &config.transitions {
        let mut coordinator =
            SceneTransitionCoordinator::new(transition.id.clone(), transition.settings.clone());
        coordinator.narration = lookup(&transition.narration);
        let entity = world.spawn((Name(transition.id.clone()), coordinator));
        transition_ids.insert(transition.id.clone(), entity);
    }

    for trigger in &config.triggers {
        let action = match &trigger.action {
            ActionConfig::Narration { narration } => TriggerAction::Narration {
                sequencer: lookup(narration),
            },
            ActionConfig::SceneTransition {
                transition,
                target_scene,
                pre_delay,
            } => {
                if target_scene.trim().is_empty() {
                    return Err(WalkError::MissingTargetScene {
                        owner: trigger.name.clone(),
                    });
                }
                TriggerAction::SceneTransition {
                    coordinator: transition
                        .as_ref()
                        .and_then(|id| transition_ids.get(id).copied()),
                    target_scene: target_scene.clone(),
                    pre_delay: *pre_delay,
                }
            }
        };
        spawn_trigger(&mut world, trigger, action);
    }

    for item in &config.items {
        spawn_item(&mut world, item, lookup(&item.narration));
    }

    let start = match &config.start {
        Some(start) => {
            let narration = lookup(&start.narration);
            let settings = TransitionSettings {
                wait_for_narration: narration.is_some(),
                post_narration_delay: start.post_narration_delay,
                effect_duration: start.effect_duration,
            };
            let mut coordinator = SceneTransitionCoordinator::new("start screen", settings);
            coordinator.narration = narration;
            let coordinator = world.spawn((Name("start screen".to_string()), coordinator));
            Some(StartScreen {
                key: start.key,
                narration,
                coordinator,
                target_scene: start.target_scene.clone(),
            })
        }
        None => None,
    };

    info!(
        entities = world.len(),
        narrations = narrations.len(),
        "world spawned"
    );

    Ok(SpawnedWorld {
        world,
        narrations,
        narration_changes,
        start,
    })
}

fn spawn_narrator(
    world: &mut World,
    config: &NarrationConfig,
    collaborators: &mut Collaborators,
    changes: &NarrationChanges,
) -> NarrationSlot {
    let mut builder = EntityBuilder::new();
    builder.add(Name(config.id.clone())).add(Narrator {
        id: config.id.clone(),
        play_on_start: config.play_on_start,
    });
    if let Some(position) = config.position {
        builder.add(Position(position));
    }
    let entity = world.spawn(builder.build());

    let settings = NarrationSettings {
        auto_advance: config.auto_advance,
        next_page_key: config.next_page_key,
        fade_out_duration: config.fade_out_duration,
        text_color: config.text_color.unwrap_or(WHITE),
    };
    let mut sequencer = NarrationSequencer::new(config.id.clone(), config.pages.clone(), settings)
        .with_surface((collaborators.surfaces)(&config.id))
        .with_voice(collaborators.voice.clone());
    let changes = changes.clone();
    sequencer.subscribe(move |active| {
        changes.borrow_mut().push(GameEvent::NarrationStateChanged {
            narration: entity,
            active,
        })
    });

    NarrationSlot { entity, sequencer }
}

fn spawn_trigger(world: &mut World, config: &TriggerConfig, action: TriggerAction) -> Entity {
    let trigger = InteractionTrigger::new(config.name.clone(), action)
        .with_range(config.range)
        .with_key(config.activation_key)
        .with_one_shot(config.is_one_shot())
        .with_prompt(
            config.prompt.clone().unwrap_or_else(|| config.name.clone()),
            config.prompt_color,
        );
    world.spawn((
        Name(config.name.clone()),
        PointOfInterest,
        Position(config.position),
        trigger,
    ))
}

fn spawn_item(world: &mut World, config: &ItemConfig, narration: Option<Entity>) -> Entity {
    let mut item = PickableItem::new(config.name.clone());
    item.description = config.description.clone();
    item.name_color = config.name_color;
    item.display_object = config.display_object.clone();
    item.pick_distance = config.pick_distance;
    item.radius = config.radius;
    item.inspectable = config.inspectable;
    item.narration = narration;
    item.can_pickup = config.can_pickup;
    world.spawn((
        Name(config.name.clone()),
        PointOfInterest,
        Position(config.position),
        item,
    ))
}

/// Effect origin for a transition trigger: 30% of the way from the POI to the observer
pub fn effect_origin(poi: Vec3, observer: Vec3) -> Vec3 {
    poi.lerp(observer, crate::constants::EFFECT_ORIGIN_LERP)
}
