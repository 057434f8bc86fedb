#![allow(dead_code)]

#[cfg(feature = "audio")]
mod audio;
mod camera;
mod components;
mod config;
mod constants;
mod engine;
mod error;
mod events;
mod hud;
mod input;
mod items;
mod narration;
mod observers;
mod presentation;
mod progress;
mod proximity;
mod scene;
#[cfg(test)]
mod testing;
mod time_system;
mod transition;
mod trigger;
mod vfx;

use std::path::Path;

use tracing::info;

use config::{RunSettings, WalkConfig};
use constants::*;
use engine::script::Script;
use engine::{Collaborators, GameMode, WalkEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = RunSettings::from_env(std::env::args().nth(1));
    puffin::set_scopes_on(settings.profile);

    let config = WalkConfig::load(&settings.config_path)?;
    let asset_dir = settings
        .config_path
        .parent()
        .unwrap_or_else(|| Path::new("."));
    let collaborators = collaborators(&config, asset_dir);

    let mut engine = WalkEngine::new(&config, collaborators)?;
    engine.init();

    let mut script = Script::new(config.script.clone());
    let stop_at = (script.end_time() + SCRIPT_LINGER_SECONDS).min(settings.max_seconds);
    info!(
        config = %settings.config_path.display(),
        dt = settings.fixed_dt,
        stop_at,
        "walkthrough started"
    );

    // Wall time of the scripted run; the engine clock stops while paused
    let mut now = 0.0;
    while now <= stop_at {
        puffin::GlobalProfiler::lock().new_frame();

        script.apply(now, settings.fixed_dt, &mut engine);
        let result = engine.tick(settings.fixed_dt)?;
        now += settings.fixed_dt;

        if let Some(scene) = result.loaded_scene {
            info!(scene = %scene, at = now, "scene loaded, stopping");
            break;
        }
        if result.mode == GameMode::Ending && result.hud.ending_alpha >= 1.0 {
            info!(at = now, "ending shown, stopping");
            break;
        }
    }

    if !engine.is_finished() && now > stop_at {
        info!(at = now, "walkthrough time limit reached");
    }
    engine.shutdown();
    Ok(())
}

#[cfg(feature = "audio")]
fn collaborators(config: &WalkConfig, asset_dir: &Path) -> Collaborators {
    let mut collaborators = Collaborators::headless(config.scenes.iter().cloned());
    if let Some(player) = audio::RodioVoicePlayer::try_new(asset_dir) {
        let voice: std::rc::Rc<dyn presentation::VoicePlayer> = std::rc::Rc::new(player);
        collaborators.voice = voice;
    }
    collaborators
}

#[cfg(not(feature = "audio"))]
fn collaborators(config: &WalkConfig, _asset_dir: &Path) -> Collaborators {
    Collaborators::headless(config.scenes.iter().cloned())
}
