//! Walkthrough configuration.
//!
//! The world is described by a static JSON document loaded once at startup.
//! Runtime knobs (which file, frame step, hard stop, profiling) come from
//! environment variables.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::Deserialize;
use tracing::debug;
use winit::keyboard::KeyCode;

use crate::constants::*;
use crate::engine::script::ScriptStep;
use crate::error::{Result, WalkError};
use crate::narration::NarrationPage;
use crate::presentation::Color;
use crate::transition::TransitionSettings;

fn default_true() -> bool {
    true
}

fn default_observer_position() -> Vec3 {
    Vec3::new(0.0, CAMERA_EYE_HEIGHT, 0.0)
}

fn default_activation_key() -> KeyCode {
    KeyCode::KeyF
}

fn default_space() -> KeyCode {
    KeyCode::Space
}

fn default_ending_key() -> KeyCode {
    KeyCode::KeyO
}

fn default_range() -> f32 {
    DEFAULT_INTERACTION_RANGE
}

fn default_pick_distance() -> f32 {
    DEFAULT_PICKUP_DISTANCE
}

fn default_item_radius() -> f32 {
    DEFAULT_ITEM_RADIUS
}

fn default_fade_out() -> f32 {
    DEFAULT_NARRATION_FADE_OUT
}

fn default_post_narration_delay() -> f32 {
    DEFAULT_POST_NARRATION_DELAY
}

/// Everything needed to build the world
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalkConfig {
    /// Scene names the host knows how to load
    #[serde(default)]
    pub scenes: Vec<String>,
    #[serde(default)]
    pub observer: ObserverConfig,
    #[serde(default)]
    pub hud: HudConfig,
    #[serde(default)]
    pub narrations: Vec<NarrationConfig>,
    #[serde(default)]
    pub transitions: Vec<TransitionConfig>,
    #[serde(default)]
    pub triggers: Vec<TriggerConfig>,
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    #[serde(default)]
    pub detail_view: DetailViewConfig,
    #[serde(default)]
    pub start: Option<StartConfig>,
    #[serde(default)]
    pub ending: Option<EndingConfig>,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObserverConfig {
    #[serde(default = "default_observer_position")]
    pub position: Vec3,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default)]
    pub move_speed: Option<f32>,
    #[serde(default)]
    pub rotation_speed: Option<f32>,
    #[serde(default = "default_activation_key")]
    pub pickup_key: KeyCode,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            position: default_observer_position(),
            yaw: 0.0,
            pitch: 0.0,
            move_speed: None,
            rotation_speed: None,
            pickup_key: default_activation_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HudConfig {
    #[serde(default = "default_true")]
    pub show_trigger_only_with_item: bool,
    #[serde(default)]
    pub fade_in_speed: Option<f32>,
    #[serde(default)]
    pub fade_out_speed: Option<f32>,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            show_trigger_only_with_item: true,
            fade_in_speed: None,
            fade_out_speed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarrationConfig {
    pub id: String,
    #[serde(default)]
    pub position: Option<Vec3>,
    #[serde(default)]
    pub pages: Vec<NarrationPage>,
    /// Pages advance on their own timer instead of the next-page key
    #[serde(default)]
    pub auto_advance: bool,
    #[serde(default = "default_space")]
    pub next_page_key: KeyCode,
    #[serde(default = "default_fade_out")]
    pub fade_out_duration: f32,
    #[serde(default)]
    pub text_color: Option<Color>,
    #[serde(default)]
    pub play_on_start: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionConfig {
    pub id: String,
    /// Narration to wait for
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(flatten)]
    pub settings: TransitionSettings,
}

/// What a trigger does, by reference to other configured parts
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionConfig {
    Narration {
        #[serde(default)]
        narration: Option<String>,
    },
    SceneTransition {
        #[serde(default)]
        transition: Option<String>,
        #[serde(default)]
        target_scene: String,
        #[serde(default)]
        pre_delay: Option<f32>,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct TriggerConfig {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub prompt_color: Option<Color>,
    #[serde(default = "default_range")]
    pub range: f32,
    #[serde(default = "default_activation_key")]
    pub activation_key: KeyCode,
    /// Defaults to one-shot for narration triggers, repeatable for scene transitions
    #[serde(default)]
    pub one_shot: Option<bool>,
    pub action: ActionConfig,
}

impl TriggerConfig {
    pub fn is_one_shot(&self) -> bool {
        self.one_shot
            .unwrap_or(matches!(self.action, ActionConfig::Narration { .. }))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ItemConfig {
    pub name: String,
    pub position: Vec3,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub name_color: Option<Color>,
    #[serde(default)]
    pub display_object: Option<String>,
    #[serde(default = "default_pick_distance")]
    pub pick_distance: f32,
    #[serde(default = "default_item_radius")]
    pub radius: f32,
    #[serde(default)]
    pub inspectable: bool,
    /// Narration started when the detail view closes
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default = "default_true")]
    pub can_pickup: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailViewConfig {
    #[serde(default = "default_space")]
    pub close_key: KeyCode,
    #[serde(default)]
    pub display_objects: Vec<String>,
}

impl Default for DetailViewConfig {
    fn default() -> Self {
        Self {
            close_key: default_space(),
            display_objects: Vec::new(),
        }
    }
}

/// Start screen: the key starts a narration, then loads the first scene
#[derive(Debug, Clone, Deserialize)]
pub struct StartConfig {
    #[serde(default = "default_space")]
    pub key: KeyCode,
    #[serde(default)]
    pub narration: Option<String>,
    #[serde(default)]
    pub target_scene: String,
    #[serde(default = "default_post_narration_delay")]
    pub post_narration_delay: f32,
    #[serde(default)]
    pub effect_duration: Option<f32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndingConfig {
    #[serde(default = "default_ending_key")]
    pub key: KeyCode,
}

/// Counter totals; default to the number of items and narration triggers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressConfig {
    #[serde(default)]
    pub items_total: Option<u32>,
    #[serde(default)]
    pub narrations_total: Option<u32>,
}

impl WalkConfig {
    /// Read, parse and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| WalkError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config: WalkConfig =
            serde_json::from_str(&content).map_err(|source| WalkError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        debug!(
            path = %path.display(),
            narrations = config.narrations.len(),
            triggers = config.triggers.len(),
            items = config.items.len(),
            "config loaded"
        );
        Ok(config)
    }

    /// Reject configurations the engine cannot run
    pub fn validate(&self) -> Result<()> {
        let narrations = unique_ids("narration", self.narrations.iter().map(|n| n.id.as_str()))?;
        let transitions =
            unique_ids("transition", self.transitions.iter().map(|t| t.id.as_str()))?;

        let known_narration = |owner: &str, id: &Option<String>| -> Result<()> {
            match id {
                Some(id) if !narrations.contains(id.as_str()) => Err(WalkError::InvalidConfig(
                    format!("{owner} refers to unknown narration '{id}'"),
                )),
                _ => Ok(()),
            }
        };

        for transition in &self.transitions {
            known_narration(&transition.id, &transition.narration)?;
        }

        for trigger in &self.triggers {
            if trigger.range.is_nan() || trigger.range <= 0.0 {
                return Err(WalkError::InvalidConfig(format!(
                    "trigger '{}' has non-positive range {}",
                    trigger.name, trigger.range
                )));
            }
            match &trigger.action {
                ActionConfig::Narration { narration } => known_narration(&trigger.name, narration)?,
                ActionConfig::SceneTransition {
                    transition,
                    target_scene,
                    ..
                } => {
                    if target_scene.trim().is_empty() {
                        return Err(WalkError::MissingTargetScene {
                            owner: trigger.name.clone(),
                        });
                    }
                    if let Some(id) = transition {
                        if !transitions.contains(id.as_str()) {
                            return Err(WalkError::InvalidConfig(format!(
                                "trigger '{}' refers to unknown transition '{id}'",
                                trigger.name
                            )));
                        }
                    }
                }
            }
        }

        for item in &self.items {
            known_narration(&item.name, &item.narration)?;
        }

        if let Some(start) = &self.start {
            if start.target_scene.trim().is_empty() {
                return Err(WalkError::MissingTargetScene {
                    owner: "start screen".to_string(),
                });
            }
            known_narration("start screen", &start.narration)?;
        }

        Ok(())
    }

    /// Number of narration triggers, the default narration total
    pub fn narration_trigger_count(&self) -> usize {
        self.triggers
            .iter()
            .filter(|t| matches!(t.action, ActionConfig::Narration { .. }))
            .count()
    }
}

fn unique_ids<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<HashSet<&'a str>> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(WalkError::InvalidConfig(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(seen)
}

// =============================================================================
// RUN SETTINGS
// =============================================================================

/// How the headless runner drives the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub config_path: PathBuf,
    pub fixed_dt: f32,
    pub max_seconds: f32,
    pub profile: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from("assets/walkthrough.json"),
            fixed_dt: DEFAULT_FIXED_DT,
            max_seconds: DEFAULT_MAX_WALK_SECONDS,
            profile: false,
        }
    }
}

impl RunSettings {
    /// Construct settings from process environment variables.
    ///
    /// Environment variables:
    /// - `WALK_CONFIG` - Path to the world description
    /// - `WALK_FIXED_DT` - Seconds per simulated frame (default: 1/60)
    /// - `WALK_MAX_SECONDS` - Stop after this much simulated time (default: 600)
    /// - `WALK_PROFILE` - Turn on puffin scopes (default: false)
    ///
    /// A command line argument overrides `WALK_CONFIG`.
    pub fn from_env(arg: Option<String>) -> Self {
        let mut settings = Self::default();

        if let Some(path) = arg.or_else(|| env::var("WALK_CONFIG").ok()) {
            settings.config_path = PathBuf::from(path);
        }
        if let Some(dt) = read_env::<f32>("WALK_FIXED_DT") {
            settings.fixed_dt = dt.clamp(f32::EPSILON, MAX_FRAME_DT);
        }
        if let Some(seconds) = read_env::<f32>("WALK_MAX_SECONDS") {
            settings.max_seconds = seconds.max(0.0);
        }
        if let Some(profile) = read_env_bool("WALK_PROFILE") {
            settings.profile = profile;
        }

        settings
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
