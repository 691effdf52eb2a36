//! All game data types — pure data, no logic.

use crate::rules::ActiveRule;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Rocket,
    Star,
    Diamond,
    Bomb,
    Devil,
    Clock,
    Mystery,
}

/// Which way the entity animates across the playfield. Cosmetic only —
/// the render layer moves it, the engine never looks at it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TravelDirection {
    Up,
    Down,
}

#[derive(Clone, Debug)]
pub struct Entity {
    /// Unique within a session, stable for the entity's lifetime.
    pub id: u64,
    pub kind: EntityKind,
    /// Horizontal lane, percent of playfield width. Fixed at spawn.
    pub x: u8,
    /// Seconds the entity stays live before the sweep removes it.
    pub duration: f64,
    /// Monotonic timestamp (ms) at creation.
    pub spawned_at: f64,
    /// True once interacted with; a popped entity is non-interactive.
    pub popped: bool,
    /// Set when popped; the sweep drops the entity a short grace later.
    pub popped_at: Option<f64>,
    pub direction: TravelDirection,
}

impl Entity {
    pub fn age_secs(&self, now_ms: f64) -> f64 {
        (now_ms - self.spawned_at) / 1000.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GamePhase {
    Menu,
    Playing,
    /// Reserved slot — nothing currently transitions into it.
    Paused,
    GameOver,
}

// ── Master session state ──────────────────────────────────────────────────────

/// The entire session state.  Cloneable so pure update functions can
/// return a new copy without mutating the original.
#[derive(Clone, Debug)]
pub struct SessionState {
    pub phase: GamePhase,
    /// No floor — negative base points (bomb, devil under a safety rule)
    /// can push it below zero.
    pub score: i64,
    /// Consecutive valid interactions; resets to 0 on any invalid one.
    pub combo: u32,
    /// Countdown seconds, floored at 0.
    pub time_left: u32,
    /// The live entity set.
    pub entities: Vec<Entity>,
    pub active_rule: Option<ActiveRule>,
    /// Current spawn cadence; shrinks as score grows.
    pub spawn_interval_ms: f64,
    pub last_spawn_ms: f64,
    pub next_entity_id: u64,
    /// Best score on record when the session started.
    pub high_score: i64,
}

// ── Interaction & tick outcomes ───────────────────────────────────────────────

/// Identifier handed to the audio collaborator; fire-and-forget.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AudioCue {
    Pop,
    Bonus,
    Damage,
    GameOver,
    Tick,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackTone {
    Positive,
    Negative,
    Bonus,
}

/// Floating-text payload for the render layer.
#[derive(Clone, Debug, PartialEq)]
pub struct Feedback {
    pub text: String,
    pub tone: FeedbackTone,
}

/// Everything a resolved click did to the session.
#[derive(Clone, Debug)]
pub struct InteractionOutcome {
    pub valid: bool,
    pub score_delta: i64,
    pub combo_after: u32,
    /// Signed countdown change in seconds (-5 penalty, +5 clock bonus).
    pub time_delta: i64,
    pub feedback: Feedback,
    pub cue: AudioCue,
    /// Shake the screen (invalid clicks only).
    pub shake: bool,
}

/// What one second of countdown did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Final seconds are running out — play the warning cue.
    pub warning: bool,
    /// The session just ended; the caller persists the final score once.
    pub game_over: bool,
    pub rule_triggered: bool,
}
