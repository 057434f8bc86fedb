//! Interaction triggers.
//!
//! A trigger sits on a point of interest. It polls its proximity detector
//! every frame, shows the HUD prompt on the enter edge, hides it on the exit
//! edge, and fires its bound action when the activation key is pressed in
//! range. One-shot triggers stay spent until explicitly rearmed.

use glam::Vec3;
use hecs::Entity;
use tracing::{debug, info};
use winit::keyboard::KeyCode;

use crate::constants::DEFAULT_INTERACTION_RANGE;
use crate::presentation::{Color, PromptPresenter};
use crate::proximity::{ProximityChange, ProximityDetector};

/// Whether a trigger may still fire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Armed,
    Activated,
}

/// Where the observer is relative to the trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPhase {
    OutOfRange,
    InRange,
}

/// What a trigger does when activated.
///
/// Collaborators are looked up by entity; either may be missing at
/// activation time, in which case the engine falls back (see `engine`).
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerAction {
    /// Count the narration and restart the bound sequencer
    Narration { sequencer: Option<Entity> },
    /// Hand a transition request to the bound coordinator
    SceneTransition {
        coordinator: Option<Entity>,
        target_scene: String,
        pre_delay: Option<f32>,
    },
}

/// Request consumed once by a scene transition coordinator
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionRequest {
    pub target_scene: String,
    /// Extra wait before the effect starts
    pub pre_delay: Option<f32>,
    /// Overrides the coordinator's own "wait for narration" setting
    pub wait_for_narration: Option<bool>,
    /// Where the transition effect should spawn
    pub effect_origin: Option<Vec3>,
}

impl TransitionRequest {
    pub fn new(target_scene: impl Into<String>) -> Self {
        Self {
            target_scene: target_scene.into(),
            pre_delay: None,
            wait_for_narration: None,
            effect_origin: None,
        }
    }
}

/// Returned when a trigger fires
#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    /// First activation ever for this trigger (survives rearming)
    pub first_time: bool,
    pub action: TriggerAction,
}

/// Interaction trigger component
#[derive(Debug, Clone)]
pub struct InteractionTrigger {
    pub name: String,
    pub prompt: String,
    pub prompt_color: Option<Color>,
    pub range: f32,
    pub activation_key: KeyCode,
    pub one_shot: bool,
    pub action: TriggerAction,
    activation: ActivationState,
    ever_activated: bool,
    proximity: ProximityDetector,
    highlighted: bool,
}

impl InteractionTrigger {
    pub fn new(name: impl Into<String>, action: TriggerAction) -> Self {
        let name = name.into();
        Self {
            prompt: name.clone(),
            name,
            prompt_color: None,
            range: DEFAULT_INTERACTION_RANGE,
            activation_key: KeyCode::KeyF,
            one_shot: true,
            action,
            activation: ActivationState::Armed,
            ever_activated: false,
            proximity: ProximityDetector::new(),
            highlighted: false,
        }
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.range = range;
        self
    }

    pub fn with_key(mut self, key: KeyCode) -> Self {
        self.activation_key = key;
        self
    }

    pub fn with_one_shot(mut self, one_shot: bool) -> Self {
        self.one_shot = one_shot;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>, color: Option<Color>) -> Self {
        self.prompt = prompt.into();
        self.prompt_color = color;
        self
    }

    pub fn phase(&self) -> TriggerPhase {
        if self.proximity.is_inside() {
            TriggerPhase::InRange
        } else {
            TriggerPhase::OutOfRange
        }
    }

    pub fn activation(&self) -> ActivationState {
        self.activation
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    /// One-shot triggers can fire only while armed
    pub fn can_activate(&self) -> bool {
        !self.one_shot || self.activation == ActivationState::Armed
    }

    /// Poll proximity and run the enter/exit side effects
    pub fn poll(
        &mut self,
        observer: Option<Vec3>,
        poi: Option<Vec3>,
        prompt: &mut dyn PromptPresenter,
    ) -> ProximityChange {
        let change = self.proximity.update(observer, poi, self.range);
        match change {
            ProximityChange::Entered => {
                debug!(trigger = %self.name, "observer in range");
                self.show_prompt(prompt);
                if self.can_activate() {
                    self.set_highlight(true);
                }
            }
            ProximityChange::Exited => {
                debug!(trigger = %self.name, "observer out of range");
                prompt.hide_prompt();
                prompt.hide_trigger_button();
                self.set_highlight(false);
            }
            ProximityChange::Unchanged => {}
        }
        change
    }

    /// Fire if the key was pressed in range and the trigger is not spent
    pub fn try_activate(
        &mut self,
        key_pressed: bool,
        prompt: &mut dyn PromptPresenter,
    ) -> Option<Activation> {
        if !key_pressed || self.phase() != TriggerPhase::InRange || !self.can_activate() {
            return None;
        }

        let first_time = !self.ever_activated;
        self.ever_activated = true;
        self.activation = ActivationState::Activated;

        prompt.hide_prompt();
        prompt.hide_trigger_button();
        if self.one_shot {
            self.set_highlight(false);
        }

        info!(trigger = %self.name, first_time, "trigger activated");
        Some(Activation {
            first_time,
            action: self.action.clone(),
        })
    }

    /// Back to armed, without touching the prompt
    pub fn rearm(&mut self) {
        self.activation = ActivationState::Armed;
    }

    /// Rearm and, if the observer is still in range, show the prompt again
    pub fn reset_interaction(&mut self, prompt: &mut dyn PromptPresenter) {
        self.rearm();
        if self.phase() == TriggerPhase::InRange {
            self.set_highlight(true);
            self.show_prompt(prompt);
        }
    }

    fn show_prompt(&self, prompt: &mut dyn PromptPresenter) {
        prompt.show_trigger_button();
        prompt.show_prompt(&self.prompt, self.prompt_color);
    }

    fn set_highlight(&mut self, on: bool) {
        if self.highlighted != on {
            debug!(trigger = %self.name, on, "highlight");
        }
        self.highlighted = on;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{call_log, count, Call, Recorder};

    const NEAR: Option<Vec3> = Some(Vec3::new(1.0, 0.0, 0.0));
    const FAR: Option<Vec3> = Some(Vec3::new(10.0, 0.0, 0.0));
    const POI: Option<Vec3> = Some(Vec3::ZERO);

    fn narration_trigger(one_shot: bool) -> InteractionTrigger {
        InteractionTrigger::new("statue", TriggerAction::Narration { sequencer: None })
            .with_one_shot(one_shot)
            .with_prompt("Old statue", None)
    }

    #[test]
    fn test_enter_shows_prompt_exit_hides() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(true);

        assert_eq!(trigger.poll(NEAR, POI, &mut hud), ProximityChange::Entered);
        assert!(trigger.is_highlighted());
        assert_eq!(trigger.poll(NEAR, POI, &mut hud), ProximityChange::Unchanged);
        assert_eq!(count(&log, |c| matches!(c, Call::Prompt(_))), 1);

        assert_eq!(trigger.poll(FAR, POI, &mut hud), ProximityChange::Exited);
        assert!(!trigger.is_highlighted());
        assert_eq!(count(&log, |c| *c == Call::HidePrompt), 1);
        assert_eq!(trigger.phase(), TriggerPhase::OutOfRange);
    }

    #[test]
    fn test_key_ignored_out_of_range() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(true);
        trigger.poll(FAR, POI, &mut hud);
        assert!(trigger.try_activate(true, &mut hud).is_none());
        assert_eq!(trigger.activation(), ActivationState::Armed);
    }

    #[test]
    fn test_one_shot_fires_once_until_reset() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(true);
        trigger.poll(NEAR, POI, &mut hud);

        let first = trigger.try_activate(true, &mut hud);
        assert_eq!(first.map(|a| a.first_time), Some(true));
        assert!(!trigger.is_highlighted());

        for _ in 0..3 {
            trigger.poll(NEAR, POI, &mut hud);
            assert!(trigger.try_activate(true, &mut hud).is_none());
        }

        trigger.reset_interaction(&mut hud);
        assert!(trigger.is_highlighted());
        assert_eq!(log.borrow().last(), Some(&Call::Prompt("Old statue".to_string())));

        let again = trigger.try_activate(true, &mut hud);
        assert_eq!(again.map(|a| a.first_time), Some(false));
    }

    #[test]
    fn test_repeatable_trigger_fires_every_press() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(false);
        trigger.poll(NEAR, POI, &mut hud);

        assert!(trigger.try_activate(true, &mut hud).is_some());
        assert!(trigger.try_activate(false, &mut hud).is_none());
        assert!(trigger.try_activate(true, &mut hud).is_some());
        // Repeatable triggers keep their highlight
        assert!(trigger.is_highlighted());
    }

    #[test]
    fn test_exit_then_reenter_spent_trigger_not_highlighted() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(true);
        trigger.poll(NEAR, POI, &mut hud);
        trigger.try_activate(true, &mut hud);
        trigger.poll(FAR, POI, &mut hud);
        trigger.poll(NEAR, POI, &mut hud);
        assert!(!trigger.is_highlighted());
    }

    #[test]
    fn test_reset_out_of_range_only_rearms() {
        let log = call_log();
        let mut hud = Recorder::new(&log);
        let mut trigger = narration_trigger(true);
        trigger.poll(NEAR, POI, &mut hud);
        trigger.try_activate(true, &mut hud);
        trigger.poll(FAR, POI, &mut hud);

        let before = log.borrow().len();
        trigger.reset_interaction(&mut hud);
        assert_eq!(log.borrow().len(), before);
        assert_eq!(trigger.activation(), ActivationState::Armed);
    }
}
