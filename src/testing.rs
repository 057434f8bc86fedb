//! Recording collaborators shared by the unit tests.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use crate::presentation::{Color, PresentationSurface, PromptPresenter, VoicePlayer};
use crate::scene::{SceneLoadError, SceneLoader};
use crate::vfx::TransitionEffects;

/// One call made to a recording collaborator
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Show(String),
    Hide,
    Opacity(f32),
    Prompt(String),
    HidePrompt,
    TriggerButton(bool),
    Voice(String),
    StopVoice,
    Load(String),
    Effect(f32),
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub fn call_log() -> CallLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Records every call into a shared log
#[derive(Clone)]
pub struct Recorder {
    pub log: CallLog,
    /// Scene loads fail for names not in this list (None = accept all)
    pub known_scenes: Option<Vec<String>>,
}

impl Recorder {
    pub fn new(log: &CallLog) -> Self {
        Self {
            log: log.clone(),
            known_scenes: None,
        }
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl PresentationSurface for Recorder {
    fn show(&mut self, text: &str, _color: Option<Color>) {
        self.push(Call::Show(text.to_string()));
    }

    fn hide(&mut self) {
        self.push(Call::Hide);
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.push(Call::Opacity(opacity));
    }
}

impl PromptPresenter for Recorder {
    fn show_prompt(&mut self, text: &str, _color: Option<Color>) {
        self.push(Call::Prompt(text.to_string()));
    }

    fn hide_prompt(&mut self) {
        self.push(Call::HidePrompt);
    }

    fn show_trigger_button(&mut self) {
        self.push(Call::TriggerButton(true));
    }

    fn hide_trigger_button(&mut self) {
        self.push(Call::TriggerButton(false));
    }
}

impl VoicePlayer for Recorder {
    fn play(&self, clip: &str) {
        self.push(Call::Voice(clip.to_string()));
    }

    fn stop(&self) {
        self.push(Call::StopVoice);
    }
}

impl SceneLoader for Recorder {
    fn load(&mut self, scene: &str) -> Result<(), SceneLoadError> {
        if let Some(known) = &self.known_scenes {
            if !known.iter().any(|s| s == scene) {
                return Err(SceneLoadError::UnknownScene(scene.to_string()));
            }
        }
        self.push(Call::Load(scene.to_string()));
        Ok(())
    }
}

impl TransitionEffects for Recorder {
    fn play(&mut self, _origin: Option<Vec3>, duration: f32) {
        self.push(Call::Effect(duration));
    }
}

/// Count log entries matching a predicate
pub fn count(log: &CallLog, pred: impl Fn(&Call) -> bool) -> usize {
    log.borrow().iter().filter(|c| pred(c)).count()
}
