//! Scene loading collaborator.
//!
//! Loading a scene is the host's job; the walkthrough only asks for it by
//! name. An unknown name is a fatal error that propagates up to `main`.

use std::collections::HashSet;

use thiserror::Error;
use tracing::info;

/// Errors surfaced by scene loaders
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SceneLoadError {
    #[error("scene name is empty")]
    EmptyName,

    #[error("unknown scene '{0}'")]
    UnknownScene(String),
}

/// Loads scenes by identity
pub trait SceneLoader {
    fn load(&mut self, scene: &str) -> Result<(), SceneLoadError>;
}

/// Scene loader backed by the list of scenes the host knows about
#[derive(Debug, Clone, Default)]
pub struct SceneRegistry {
    known: HashSet<String>,
    history: Vec<String>,
}

impl SceneRegistry {
    pub fn new<I, S>(scenes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            known: scenes.into_iter().map(Into::into).collect(),
            history: Vec::new(),
        }
    }

    pub fn contains(&self, scene: &str) -> bool {
        self.known.contains(scene)
    }

    /// Most recently loaded scene
    pub fn current(&self) -> Option<&str> {
        self.history.last().map(String::as_str)
    }

    /// Every scene loaded so far, oldest first
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl SceneLoader for SceneRegistry {
    fn load(&mut self, scene: &str) -> Result<(), SceneLoadError> {
        if scene.is_empty() {
            return Err(SceneLoadError::EmptyName);
        }
        if !self.known.contains(scene) {
            return Err(SceneLoadError::UnknownScene(scene.to_string()));
        }
        info!(scene, "loading scene");
        self.history.push(scene.to_string());
        Ok(())
    }
}
