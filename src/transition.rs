//! Scene transitions.
//!
//! A coordinator takes one [`TransitionRequest`], optionally waits for a
//! narration to go inactive, plays the transition effect and loads the
//! target scene part-way through the effect so the load is hidden behind it.
//!
//! ```text
//! Idle -> WaitingForNarration -> Delaying -> PlayingEffect -> Done
//!   \__________________________/    \_________________________/
//!        (no wait requested)              (no effect: load now)
//! ```

use hecs::Entity;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::constants::{DEFAULT_POST_NARRATION_DELAY, LOAD_AT_EFFECT_FRACTION};
use crate::error::{Result, WalkError};
use crate::scene::SceneLoader;
use crate::time_system::{Scheduler, TimerHandle};
use crate::trigger::TransitionRequest;
use crate::vfx::TransitionEffects;

fn default_post_narration_delay() -> f32 {
    DEFAULT_POST_NARRATION_DELAY
}

/// Static per-coordinator settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransitionSettings {
    #[serde(default)]
    pub wait_for_narration: bool,
    /// Extra wait after the narration went inactive
    #[serde(default = "default_post_narration_delay")]
    pub post_narration_delay: f32,
    /// Effect length in seconds; `None` loads without an effect
    #[serde(default)]
    pub effect_duration: Option<f32>,
}

impl Default for TransitionSettings {
    fn default() -> Self {
        Self {
            wait_for_narration: false,
            post_narration_delay: DEFAULT_POST_NARRATION_DELAY,
            effect_duration: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    WaitingForNarration,
    Delaying,
    PlayingEffect,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransitionTimer {
    StartEffect,
    Load,
}

/// Drives one scene transition from request to load
pub struct SceneTransitionCoordinator {
    name: String,
    settings: TransitionSettings,
    /// Sequencer polled while waiting
    pub narration: Option<Entity>,
    phase: TransitionPhase,
    request: Option<TransitionRequest>,
    timers: Scheduler<TransitionTimer>,
    pending: Option<TimerHandle>,
}

impl SceneTransitionCoordinator {
    pub fn new(name: impl Into<String>, settings: TransitionSettings) -> Self {
        Self {
            name: name.into(),
            settings,
            narration: None,
            phase: TransitionPhase::Idle,
            request: None,
            timers: Scheduler::new(),
            pending: None,
        }
    }

    pub fn with_narration(mut self, narration: Entity) -> Self {
        self.narration = Some(narration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> TransitionPhase {
        self.phase
    }

    pub fn settings(&self) -> &TransitionSettings {
        &self.settings
    }

    /// A transition is under way
    pub fn is_busy(&self) -> bool {
        !matches!(self.phase, TransitionPhase::Idle | TransitionPhase::Done)
    }

    /// Accept a request. Returns Ok(false) if a transition is already running.
    pub fn begin(&mut self, request: TransitionRequest) -> Result<bool> {
        if request.target_scene.trim().is_empty() {
            error!(coordinator = %self.name, "transition requested without target scene");
            return Err(WalkError::MissingTargetScene {
                owner: self.name.clone(),
            });
        }
        if self.is_busy() {
            warn!(
                coordinator = %self.name,
                target = %request.target_scene,
                "transition already running, request ignored"
            );
            return Ok(false);
        }

        let wait = request
            .wait_for_narration
            .unwrap_or(self.settings.wait_for_narration);
        info!(
            coordinator = %self.name,
            target = %request.target_scene,
            wait,
            "transition started"
        );

        let pre_delay = request.pre_delay.unwrap_or(0.0);
        self.request = Some(request);

        if wait && self.narration.is_some() {
            self.phase = TransitionPhase::WaitingForNarration;
        } else {
            if wait {
                warn!(coordinator = %self.name, "no narration bound, not waiting");
            }
            self.start_delay(pre_delay);
        }
        Ok(true)
    }

    /// Advance one frame.
    ///
    /// `narration_active` is the bound sequencer's flag, or `None` if it could
    /// not be resolved. Returns the scene name when the load was issued.
    pub fn tick(
        &mut self,
        dt: f32,
        narration_active: Option<bool>,
        effects: &mut dyn TransitionEffects,
        loader: &mut dyn SceneLoader,
    ) -> Result<Option<String>> {
        puffin::profile_function!();

        let fired = self.timers.advance(dt);

        if self.phase == TransitionPhase::WaitingForNarration {
            let pre_delay = self.pre_delay();
            match narration_active {
                Some(true) => return Ok(None),
                Some(false) => {
                    debug!(coordinator = %self.name, "narration finished");
                    self.start_delay(self.settings.post_narration_delay + pre_delay);
                }
                None => {
                    warn!(coordinator = %self.name, "narration missing, not waiting");
                    self.start_delay(pre_delay);
                }
            }
        }

        for (handle, timer) in fired {
            if self.pending != Some(handle) {
                continue;
            }
            self.pending = None;
            match timer {
                TransitionTimer::StartEffect => self.start_effect(effects),
                TransitionTimer::Load => return self.load(loader).map(Some),
            }
        }

        if self.phase == TransitionPhase::PlayingEffect && self.pending.is_none() {
            return self.load(loader).map(Some);
        }
        Ok(None)
    }

    /// Drop whatever is in flight
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
        if self.is_busy() {
            debug!(coordinator = %self.name, "transition cancelled");
        }
        self.request = None;
        self.phase = TransitionPhase::Idle;
    }

    fn pre_delay(&self) -> f32 {
        self.request
            .as_ref()
            .and_then(|request| request.pre_delay)
            .unwrap_or(0.0)
    }

    fn start_delay(&mut self, delay: f32) {
        self.phase = TransitionPhase::Delaying;
        self.schedule(delay.max(0.0), TransitionTimer::StartEffect);
    }

    fn start_effect(&mut self, effects: &mut dyn TransitionEffects) {
        self.phase = TransitionPhase::PlayingEffect;
        // Without an effect the caller loads on this same tick
        if let Some(duration) = self.settings.effect_duration.filter(|d| *d > 0.0) {
            let origin = self.request.as_ref().and_then(|r| r.effect_origin);
            effects.play(origin, duration);
            self.schedule(duration * LOAD_AT_EFFECT_FRACTION, TransitionTimer::Load);
        }
    }

    fn schedule(&mut self, delay: f32, timer: TransitionTimer) {
        if let Some(handle) = self.pending.take() {
            self.timers.cancel(handle);
        }
        self.pending = Some(self.timers.schedule_after(delay, timer));
    }

    fn load(&mut self, loader: &mut dyn SceneLoader) -> Result<String> {
        let Some(request) = self.request.take() else {
            return Err(WalkError::MissingTargetScene {
                owner: self.name.clone(),
            });
        };
        self.phase = TransitionPhase::Done;
        info!(coordinator = %self.name, scene = %request.target_scene, "loading scene");
        loader.load(&request.target_scene).map_err(|err| {
            error!(coordinator = %self.name, %err, "scene load failed");
            WalkError::from(err)
        })?;
        Ok(request.target_scene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narration::{NarrationPage, NarrationSequencer, NarrationSettings};
    use crate::testing::{call_log, count, Call, CallLog, Recorder};

    const DT: f32 = 0.1;

    fn narration_entity() -> Entity {
        let mut world = hecs::World::new();
        world.spawn(())
    }

    fn run(
        coordinator: &mut SceneTransitionCoordinator,
        recorder: &mut Recorder,
        frames: usize,
        narration_active: Option<bool>,
    ) -> Option<String> {
        let mut effects = recorder.clone();
        for _ in 0..frames {
            let loaded = coordinator
                .tick(DT, narration_active, &mut effects, recorder)
                .expect("tick");
            if loaded.is_some() {
                return loaded;
            }
        }
        None
    }

    fn loads(log: &CallLog) -> usize {
        count(log, |c| matches!(c, Call::Load(_)))
    }

    #[test]
    fn test_empty_target_is_fatal() {
        let mut coordinator = SceneTransitionCoordinator::new("door", TransitionSettings::default());
        let err = coordinator.begin(TransitionRequest::new("  ")).unwrap_err();
        assert!(matches!(err, WalkError::MissingTargetScene { .. }));
        assert_eq!(coordinator.phase(), TransitionPhase::Idle);
    }

    #[test]
    fn test_no_wait_no_effect_loads_next_tick() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let mut coordinator = SceneTransitionCoordinator::new("door", TransitionSettings::default());
        assert!(coordinator.begin(TransitionRequest::new("Garden")).unwrap());

        let loaded = run(&mut coordinator, &mut recorder, 1, None);
        assert_eq!(loaded.as_deref(), Some("Garden"));
        assert_eq!(coordinator.phase(), TransitionPhase::Done);
        assert_eq!(count(&log, |c| matches!(c, Call::Effect(_))), 0);
    }

    #[test]
    fn test_load_at_seventy_percent_of_effect() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let settings = TransitionSettings {
            effect_duration: Some(1.0),
            ..TransitionSettings::default()
        };
        let mut coordinator = SceneTransitionCoordinator::new("door", settings);
        coordinator.begin(TransitionRequest::new("Garden")).unwrap();

        // First tick starts the effect, load is due 0.7s later
        assert!(run(&mut coordinator, &mut recorder, 1, None).is_none());
        assert_eq!(log.borrow().as_slice(), &[Call::Effect(1.0)]);
        assert!(run(&mut coordinator, &mut recorder, 6, None).is_none());
        assert_eq!(loads(&log), 0);
        assert!(run(&mut coordinator, &mut recorder, 2, None).is_some());
        assert_eq!(loads(&log), 1);
    }

    #[test]
    fn test_pre_delay_postpones_effect() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let mut coordinator = SceneTransitionCoordinator::new("door", TransitionSettings::default());
        let mut request = TransitionRequest::new("Garden");
        request.pre_delay = Some(0.5);
        coordinator.begin(request).unwrap();

        assert!(run(&mut coordinator, &mut recorder, 4, None).is_none());
        assert!(run(&mut coordinator, &mut recorder, 2, None).is_some());
    }

    #[test]
    fn test_waits_for_narration_to_finish() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let settings = TransitionSettings {
            wait_for_narration: true,
            post_narration_delay: 1.0,
            effect_duration: Some(1.5),
        };

        let mut narration = NarrationSequencer::new(
            "intro",
            vec![NarrationPage::new("one", 3.0), NarrationPage::new("two", 3.0)],
            NarrationSettings {
                fade_out_duration: 0.0,
                ..NarrationSettings::default()
            },
        );
        let mut coordinator = SceneTransitionCoordinator::new("door", settings)
            .with_narration(narration_entity());

        narration.reset();
        coordinator.begin(TransitionRequest::new("Garden")).unwrap();
        assert_eq!(coordinator.phase(), TransitionPhase::WaitingForNarration);

        assert!(run(&mut coordinator, &mut recorder, 50, Some(narration.is_active())).is_none());
        narration.advance();
        assert!(run(&mut coordinator, &mut recorder, 50, Some(narration.is_active())).is_none());
        assert_eq!(loads(&log), 0);

        narration.advance();
        assert!(!narration.is_active());

        // 1.0 post-narration delay, then 1.05 into the effect
        assert!(run(&mut coordinator, &mut recorder, 9, Some(false)).is_none());
        assert_eq!(count(&log, |c| matches!(c, Call::Effect(_))), 0);
        assert!(run(&mut coordinator, &mut recorder, 5, Some(false)).is_none());
        assert_eq!(count(&log, |c| matches!(c, Call::Effect(_))), 1);
        assert_eq!(loads(&log), 0);
        assert_eq!(run(&mut coordinator, &mut recorder, 12, Some(false)).as_deref(), Some("Garden"));
    }

    #[test]
    fn test_wait_without_narration_proceeds() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let settings = TransitionSettings {
            wait_for_narration: true,
            ..TransitionSettings::default()
        };
        let mut coordinator = SceneTransitionCoordinator::new("door", settings);
        coordinator.begin(TransitionRequest::new("Garden")).unwrap();
        assert_eq!(coordinator.phase(), TransitionPhase::Delaying);
        assert!(run(&mut coordinator, &mut recorder, 1, None).is_some());
    }

    #[test]
    fn test_unresolved_narration_stops_waiting() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        let settings = TransitionSettings {
            wait_for_narration: true,
            ..TransitionSettings::default()
        };
        let mut coordinator =
            SceneTransitionCoordinator::new("door", settings).with_narration(narration_entity());
        coordinator.begin(TransitionRequest::new("Garden")).unwrap();
        // No post-narration delay when the narration is gone
        assert!(run(&mut coordinator, &mut recorder, 2, None).is_some());
    }

    #[test]
    fn test_second_request_ignored_while_busy() {
        let mut coordinator = SceneTransitionCoordinator::new("door", TransitionSettings::default());
        assert!(coordinator.begin(TransitionRequest::new("Garden")).unwrap());
        assert!(!coordinator.begin(TransitionRequest::new("Cellar")).unwrap());
        coordinator.cancel();
        assert!(coordinator.begin(TransitionRequest::new("Cellar")).unwrap());
    }

    #[test]
    fn test_unknown_scene_propagates() {
        let log = call_log();
        let mut recorder = Recorder::new(&log);
        recorder.known_scenes = Some(vec!["Garden".to_string()]);
        let mut effects = recorder.clone();
        let mut coordinator = SceneTransitionCoordinator::new("door", TransitionSettings::default());
        coordinator.begin(TransitionRequest::new("Attic")).unwrap();

        let err = coordinator.tick(DT, None, &mut effects, &mut recorder).unwrap_err();
        assert!(matches!(err, WalkError::SceneLoad(_)));
    }
}
