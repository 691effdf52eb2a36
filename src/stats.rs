//! High-score and daily-stat persistence.
//!
//! One JSON file in the platform data dir.  Every read failure — missing
//! file, bad JSON, stale date — degrades to zeroed defaults; the player
//! never sees a persistence error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStats {
    /// Calendar date key, `YYYY-MM-DD` local time.
    pub date: String,
    pub high_score: i64,
    pub games_played: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub high_score: i64,
    pub daily: DailyStats,
}

pub struct StatsStore {
    path: PathBuf,
    pub stats: Stats,
}

fn today() -> String {
    Local::now().date_naive().to_string()
}

impl StatsStore {
    /// Open the store rooted at `dir`, reading whatever is on disk.  A
    /// daily block recorded under an older date resets to zeroes for
    /// today; the global high score survives the rollover.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("stats.json");
        let mut stats = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "unreadable stats file, starting fresh");
                Stats::default()
            }),
            Err(_) => Stats::default(),
        };
        if stats.daily.date != today() {
            stats.daily = DailyStats {
                date: today(),
                ..DailyStats::default()
            };
        }
        Self { path, stats }
    }

    pub fn high_score(&self) -> i64 {
        self.stats.high_score
    }

    /// Fold one finished session into the records and save.  Called
    /// exactly once per session end.
    pub fn record_session(&mut self, final_score: i64) {
        if final_score > self.stats.high_score {
            self.stats.high_score = final_score;
        }
        self.stats.daily.games_played += 1;
        if final_score > self.stats.daily.high_score {
            self.stats.daily.high_score = final_score;
        }
        if let Err(err) = self.save() {
            warn!(%err, "failed to save stats");
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.stats)?;
        fs::write(&self.path, raw).with_context(|| format!("writing {}", self.path.display()))
    }
}

/// Platform data directory for the game, current dir as a last resort.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("emoji-reflex"))
        .unwrap_or_else(|| PathBuf::from("."))
}
