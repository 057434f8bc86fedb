//! Walkthrough engine - owns all state and provides a clean API to the runner.
//!
//! The engine handles:
//! - The world of points of interest (triggers, items, coordinators)
//! - Narration sequencers and their timers
//! - Input edges, camera and HUD
//! - Event processing
//!
//! The runner (main.rs) only handles:
//! - Loading configuration
//! - Feeding input (here: a scripted timeline)
//! - Calling `tick` with a fixed step until a scene is loaded

pub mod script;
mod spawning;

pub use spawning::{effect_origin, NarrationChanges, NarrationSlot, StartScreen};

use std::rc::Rc;

use glam::Vec3;
use hecs::{Entity, World};
use tracing::{debug, error, info, warn};

use crate::camera::FirstPersonCamera;
use crate::components::{Narrator, Position};
use crate::config::WalkConfig;
use crate::constants::*;
use crate::error::Result;
use crate::events::{EventQueue, GameEvent};
use crate::hud::{HudControl, HudSnapshot};
use crate::input::InputState;
use crate::items::{DisplayCatalog, ItemDetailView, ItemPicker, PickableItem};
use crate::presentation::{PresentationSurface, SilentVoicePlayer, TracingSurface, VoicePlayer};
use crate::progress::{ProgressKind, ProgressTracker};
use crate::scene::{SceneLoader, SceneRegistry};
use crate::time_system::{GameClock, Scheduler};
use crate::transition::SceneTransitionCoordinator;
use crate::trigger::{Activation, InteractionTrigger, TransitionRequest, TriggerAction};
use crate::vfx::{TransitionEffects, VfxManager};

/// Builds the narration surface for a sequencer id
pub type SurfaceFactory = Box<dyn FnMut(&str) -> Box<dyn PresentationSurface>>;

/// Host-side collaborators injected at construction
pub struct Collaborators {
    pub loader: Box<dyn SceneLoader>,
    pub voice: Rc<dyn VoicePlayer>,
    pub surfaces: SurfaceFactory,
}

impl Collaborators {
    /// Logging stand-ins for a headless run
    pub fn headless<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loader: Box::new(SceneRegistry::new(scenes)),
            voice: Rc::new(SilentVoicePlayer),
            surfaces: Box::new(|id: &str| -> Box<dyn PresentationSurface> {
                Box::new(TracingSurface::new(id))
            }),
        }
    }
}

/// Game mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameMode {
    /// Waiting for the start key
    StartScreen,
    /// Walking around
    Playing,
    /// Ending overlay fading in
    Ending,
    /// A scene load was issued; nothing else happens
    SceneLoaded(String),
}

/// Result of a tick - what the runner needs to know
#[derive(Debug, Clone)]
pub struct TickResult {
    pub mode: GameMode,
    pub hud: HudSnapshot,
    /// Scene loaded during this tick
    pub loaded_scene: Option<String>,
}

/// The walkthrough engine - owns all state and coordination logic.
pub struct WalkEngine {
    pub mode: GameMode,
    pub world: World,
    pub narrations: Vec<NarrationSlot>,
    /// Filled by each sequencer's state-change subscription
    narration_changes: NarrationChanges,
    pub camera: FirstPersonCamera,
    pub input: InputState,
    pub hud: HudControl,
    pub progress: ProgressTracker,
    pub vfx: VfxManager,
    pub events: EventQueue,
    picker: ItemPicker,
    detail: ItemDetailView,
    start: Option<StartScreen>,
    ending_key: Option<winit::keyboard::KeyCode>,
    loader: Box<dyn SceneLoader>,
    /// Scene loads requested without a coordinator
    direct_loads: Scheduler<String>,
    /// 0 while the detail view is open
    pub time_scale: f32,
    /// Scaled game time
    pub clock: GameClock,
}

impl WalkEngine {
    /// Build the world from configuration.
    pub fn new(config: &WalkConfig, mut collaborators: Collaborators) -> Result<Self> {
        config.validate()?;
        let spawned = spawning::spawn_world(config, &mut collaborators)?;

        let mut camera = FirstPersonCamera::new(config.observer.position);
        camera.yaw = config.observer.yaw;
        camera.pitch = config.observer.pitch;
        if let Some(speed) = config.observer.move_speed {
            camera.move_speed = speed;
        }
        if let Some(speed) = config.observer.rotation_speed {
            camera.rotation_speed = speed;
        }

        let mut hud = HudControl::new();
        hud.show_trigger_only_with_item = config.hud.show_trigger_only_with_item;
        if let Some(speed) = config.hud.fade_in_speed {
            hud.fade_in_speed = speed;
        }
        if let Some(speed) = config.hud.fade_out_speed {
            hud.fade_out_speed = speed;
        }

        let progress = ProgressTracker::new(
            config
                .progress
                .items_total
                .unwrap_or(config.items.len() as u32),
            config
                .progress
                .narrations_total
                .unwrap_or(config.narration_trigger_count() as u32),
        );

        Ok(Self {
            mode: GameMode::Playing,
            world: spawned.world,
            narrations: spawned.narrations,
            narration_changes: spawned.narration_changes,
            camera,
            input: InputState::new(),
            hud,
            progress,
            vfx: VfxManager::new(),
            events: EventQueue::new(),
            picker: ItemPicker::new(config.observer.pickup_key),
            detail: ItemDetailView::new(
                config.detail_view.close_key,
                DisplayCatalog::new(config.detail_view.display_objects.clone()),
            ),
            start: spawned.start,
            ending_key: config.ending.as_ref().map(|ending| ending.key),
            loader: collaborators.loader,
            direct_loads: Scheduler::new(),
            time_scale: 1.0,
            clock: GameClock::new(),
        })
    }

    /// Enter the first mode and start narrations flagged to play on start
    pub fn init(&mut self) {
        self.mode = if self.start.is_some() {
            GameMode::StartScreen
        } else {
            GameMode::Playing
        };

        let autoplay: Vec<Entity> = self
            .world
            .query::<&Narrator>()
            .iter()
            .filter(|(_, narrator)| narrator.play_on_start)
            .map(|(entity, _)| entity)
            .collect();
        for entity in autoplay {
            self.restart_narration(entity);
        }
        info!(mode = ?self.mode, "engine initialized");
    }

    /// Stop timers, audio and effects
    pub fn shutdown(&mut self) {
        for slot in &mut self.narrations {
            slot.sequencer.shutdown();
        }
        for (_, coordinator) in self.world.query_mut::<&mut SceneTransitionCoordinator>() {
            coordinator.cancel();
        }
        self.direct_loads.clear();
        self.hud.hide_all();
        info!(
            items = %self.progress.items,
            narrations = %self.progress.narrations,
            "engine shut down"
        );
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.mode, GameMode::SceneLoaded(_))
    }

    pub fn detail_view(&self) -> &ItemDetailView {
        &self.detail
    }

    pub fn focused_item(&self) -> Option<Entity> {
        self.picker.focused()
    }

    pub fn narration(&self, entity: Entity) -> Option<&crate::narration::NarrationSequencer> {
        self.narrations
            .iter()
            .find(|slot| slot.entity == entity)
            .map(|slot| &slot.sequencer)
    }

    /// Advance one frame.
    pub fn tick(&mut self, dt: f32) -> Result<TickResult> {
        puffin::profile_function!();

        if let GameMode::SceneLoaded(_) = self.mode {
            self.input.end_frame();
            return Ok(self.tick_result(None));
        }

        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let scaled_dt = dt * self.time_scale;
        self.clock.advance_by(scaled_dt);

        self.process_mode_keys()?;

        if self.mode == GameMode::Playing {
            // Mouse-look and movement run on unscaled time; a disabled
            // camera ignores them anyway.
            self.camera.update(&self.input, dt);
            self.update_triggers()?;
            let opened = self.update_items();
            if !opened {
                self.update_detail_view();
            }
        }

        self.update_narrations(scaled_dt);

        let mut loaded = self.update_transitions(scaled_dt)?;
        for (_, scene) in self.direct_loads.advance(scaled_dt) {
            if let Some(current) = &loaded {
                warn!(
                    scene = %scene,
                    loaded = %current,
                    "scene already loaded this frame, load dropped"
                );
                continue;
            }
            info!(scene = %scene, "loading scene directly");
            self.loader.load(&scene).map_err(|err| {
                error!(scene = %scene, %err, "direct scene load failed");
                err
            })?;
            loaded = Some(scene);
        }
        if let Some(scene) = &loaded {
            self.events.push(GameEvent::SceneLoadRequested {
                scene: scene.clone(),
            });
            self.vfx.spawn_wipe();
            self.mode = GameMode::SceneLoaded(scene.clone());
        }

        self.hud.update(scaled_dt);
        self.vfx.update(scaled_dt);
        self.process_events();

        let result = self.tick_result(loaded);
        self.input.end_frame();
        Ok(result)
    }

    // --- Systems, in tick order ---

    fn process_mode_keys(&mut self) -> Result<()> {
        match self.mode {
            GameMode::StartScreen => {
                let Some(start) = self.start.clone() else {
                    self.mode = GameMode::Playing;
                    return Ok(());
                };
                if !self.input.take_press(start.key) {
                    return Ok(());
                }
                info!("start key pressed");
                if let Some(narration) = start.narration {
                    self.restart_narration(narration);
                }
                self.begin_transition(start.coordinator, TransitionRequest::new(start.target_scene))?;
                self.mode = GameMode::Playing;
            }
            GameMode::Playing => {
                if let Some(key) = self.ending_key {
                    if self.input.take_press(key) {
                        info!("ending started");
                        self.hud.hide_all();
                        self.hud.show_ending();
                        self.mode = GameMode::Ending;
                    }
                }
            }
            GameMode::Ending | GameMode::SceneLoaded(_) => {}
        }
        Ok(())
    }

    fn update_triggers(&mut self) -> Result<()> {
        puffin::profile_function!();

        let observer = self.camera.position;
        let mut fired: Vec<(Entity, Vec3, Activation)> = Vec::new();

        // Proximity first, then activation, per trigger
        for (entity, (position, trigger)) in self
            .world
            .query_mut::<(&Position, &mut InteractionTrigger)>()
        {
            trigger.poll(Some(observer), Some(position.0), &mut self.hud);
            let pressed = self.input.was_pressed(trigger.activation_key);
            if let Some(activation) = trigger.try_activate(pressed, &mut self.hud) {
                fired.push((entity, position.0, activation));
            }
        }

        for (entity, poi, activation) in fired {
            self.events.push(GameEvent::TriggerActivated {
                trigger: entity,
                first_time: activation.first_time,
            });
            match activation.action {
                TriggerAction::Narration { sequencer } => {
                    if activation.first_time {
                        self.increase_progress(ProgressKind::Narrations);
                    }
                    match sequencer {
                        Some(narration) => self.restart_narration(narration),
                        None => warn!(?entity, "narration trigger has no narration bound"),
                    }
                }
                TriggerAction::SceneTransition {
                    coordinator,
                    target_scene,
                    pre_delay,
                } => {
                    let mut request = TransitionRequest::new(target_scene);
                    request.pre_delay = pre_delay;
                    request.effect_origin = Some(effect_origin(poi, observer));
                    match coordinator {
                        Some(coordinator) => self.begin_transition(coordinator, request)?,
                        None => self.load_without_coordinator(request),
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true if the detail view opened this frame
    fn update_items(&mut self) -> bool {
        if self.detail.is_open() {
            return false;
        }
        let pressed = self.input.was_pressed(self.picker.pickup_key);
        let Some(pickup) = self
            .picker
            .update(&mut self.world, &self.camera, pressed, &mut self.hud)
        else {
            return false;
        };

        self.events.push(GameEvent::ItemPicked { item: pickup.item });
        self.increase_progress(ProgressKind::Items);

        if !pickup.inspectable {
            return false;
        }
        let item = match self.world.get::<&PickableItem>(pickup.item) {
            Ok(item) => (*item).clone(),
            Err(_) => return false,
        };
        self.detail
            .open(pickup.item, &item, &mut self.camera, &mut self.time_scale);
        self.events.push(GameEvent::DetailOpened { item: pickup.item });
        true
    }

    fn update_detail_view(&mut self) {
        if !self.detail.is_open() || !self.input.take_press(self.detail.close_key) {
            return;
        }
        let Some(closed) = self.detail.close(&mut self.camera, &mut self.time_scale) else {
            return;
        };
        self.events.push(GameEvent::DetailClosed { item: closed.item });
        if let Some(narration) = closed.narration {
            self.restart_narration(narration);
        }
    }

    fn update_narrations(&mut self, dt: f32) {
        puffin::profile_function!();

        let paging_allowed = !self.detail.is_open();
        for slot in &mut self.narrations {
            let sequencer = &mut slot.sequencer;
            if paging_allowed
                && sequencer.accepts_manual_advance()
                && self.input.was_pressed(sequencer.next_page_key())
            {
                sequencer.advance();
            }
            sequencer.tick(dt);
        }
    }

    fn update_transitions(&mut self, dt: f32) -> Result<Option<String>> {
        puffin::profile_function!();

        let mut loaded: Option<String> = None;
        for (_, coordinator) in self
            .world
            .query_mut::<&mut SceneTransitionCoordinator>()
        {
            // A load is terminal; the rest are not ticked into a second one
            if let Some(current) = &loaded {
                if coordinator.is_busy() {
                    warn!(
                        coordinator = %coordinator.name(),
                        loaded = %current,
                        "scene already loaded this frame, transition dropped"
                    );
                    coordinator.cancel();
                }
                continue;
            }
            let narration_active = coordinator.narration.and_then(|entity| {
                self.narrations
                    .iter()
                    .find(|slot| slot.entity == entity)
                    .map(|slot| slot.sequencer.is_active())
            });
            let scene = coordinator.tick(
                dt,
                narration_active,
                &mut self.vfx,
                self.loader.as_mut(),
            )?;
            loaded = scene;
        }
        Ok(loaded)
    }

    fn process_events(&mut self) {
        for event in self.narration_changes.borrow_mut().drain(..) {
            self.events.push(event);
        }
        for event in self.events.drain() {
            match &event {
                GameEvent::ProgressChanged { .. } | GameEvent::SceneLoadRequested { .. } => {
                    info!(?event, "event")
                }
                _ => debug!(?event, "event"),
            }
        }
    }

    // --- Helpers ---

    fn restart_narration(&mut self, entity: Entity) {
        if !self.world.contains(entity) {
            warn!(?entity, "narration no longer exists");
            return;
        }
        let Some(slot) = self.narrations.iter_mut().find(|slot| slot.entity == entity) else {
            warn!(?entity, "entity has no narration");
            return;
        };
        slot.sequencer.reset();
    }

    fn begin_transition(&mut self, coordinator: Entity, request: TransitionRequest) -> Result<()> {
        if self
            .world
            .get::<&SceneTransitionCoordinator>(coordinator)
            .is_err()
        {
            self.load_without_coordinator(request);
            return Ok(());
        }
        let target_scene = request.target_scene.clone();
        let started = match self.world.get::<&mut SceneTransitionCoordinator>(coordinator) {
            Ok(mut coordinator) => coordinator.begin(request)?,
            Err(_) => false,
        };
        if started {
            self.events
                .push(GameEvent::TransitionStarted { target_scene });
        }
        Ok(())
    }

    /// Play the default effect and load 70% of the way through it
    fn load_without_coordinator(&mut self, request: TransitionRequest) {
        warn!(scene = %request.target_scene, "no transition coordinator, loading directly");
        self.vfx
            .play(request.effect_origin, DEFAULT_EFFECT_DURATION);
        self.direct_loads.schedule_after(
            DEFAULT_EFFECT_DURATION * LOAD_AT_EFFECT_FRACTION,
            request.target_scene.clone(),
        );
        self.events.push(GameEvent::TransitionStarted {
            target_scene: request.target_scene,
        });
    }

    fn increase_progress(&mut self, kind: ProgressKind) {
        if self.progress.increase(kind) {
            let counter = self.progress.counter(kind);
            let (collected, total) = counter.snapshot();
            if counter.is_complete() {
                info!(?kind, total, "all collected");
            }
            self.events.push(GameEvent::ProgressChanged {
                kind,
                collected,
                total,
            });
        }
    }

    fn tick_result(&self, loaded_scene: Option<String>) -> TickResult {
        let narration = self.narrations.iter().find_map(|slot| {
            slot.sequencer
                .visible_page()
                .map(|page| (page.content.as_str(), slot.sequencer.opacity()))
        });
        TickResult {
            mode: self.mode.clone(),
            hud: HudSnapshot::capture(&self.hud, &self.progress, narration),
            loaded_scene,
        }
    }
}
