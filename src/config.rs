//! Player-tunable settings.
//!
//! Read once at startup from `<config_dir>/emoji-reflex/config.toml`; a
//! missing or unreadable file yields the defaults.

use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

use crate::compute::GAME_DURATION_SECS;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Session length in seconds.
    pub game_duration_secs: u32,
    /// Master switch for the synthesized sound effects.
    pub audio: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game_duration_secs: GAME_DURATION_SECS,
            audio: true,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        match fs::read_to_string(&path) {
            Ok(raw) => toml::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "bad config file, using defaults");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("emoji-reflex").join("config.toml"))
}
