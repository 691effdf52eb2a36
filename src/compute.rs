//! Pure game-logic functions.
//!
//! Every public function takes an immutable reference to the current
//! `SessionState` (and, where needed, an RNG handle plus a monotonic
//! `now_ms`) and returns a brand-new `SessionState`.  Side effects are
//! limited to the injected RNG, so callers control determinism (useful
//! for tests with a seeded RNG).

use rand::Rng;

use crate::entities::{
    AudioCue, Entity, EntityKind, Feedback, FeedbackTone, GamePhase, InteractionOutcome,
    SessionState, TickOutcome, TravelDirection,
};
use crate::rules::pick_rule;

// ── Tuning constants ──────────────────────────────────────────────────────────

/// Default session length in seconds.
pub const GAME_DURATION_SECS: u32 = 60;
/// Spawn cadence at score 0.
pub const SPAWN_INTERVAL_INITIAL_MS: f64 = 800.0;
/// Spawn cadence floor.
pub const SPAWN_INTERVAL_MIN_MS: f64 = 300.0;
/// Extra seconds an untouched entity survives past its travel duration.
pub const EXPIRY_BUFFER_SECS: f64 = 0.5;
/// How long a popped entity lingers for its pop visual.
pub const POP_GRACE_MS: f64 = 300.0;
/// Seconds removed from the countdown by an invalid click.
pub const TIME_PENALTY_SECS: u32 = 5;
/// Seconds added by a clock entity.
pub const TIME_BONUS_SECS: u32 = 5;
/// Flat award for a lucky mystery, multiplier ignored.
pub const MYSTERY_LUCKY_POINTS: i64 = 100;
/// Score the player must exceed before ticks may inject rules.
pub const RULE_SCORE_GATE: i64 = 200;
/// Per-tick chance of a rule injection once past the gate.
pub const RULE_TICK_CHANCE: f64 = 0.1;

/// Base points per kind.  Bomb and devil only pay out (negatively) while
/// a rule makes them valid; clock and mystery are special-cased in the
/// resolver.
fn base_score(kind: EntityKind) -> i64 {
    match kind {
        EntityKind::Rocket => 10,
        EntityKind::Star => 10,
        EntityKind::Diamond => 50,
        EntityKind::Bomb => -50,
        EntityKind::Devil => -20,
        EntityKind::Clock => 0,
        EntityKind::Mystery => 0,
    }
}

/// Derived from score, capped at 1.  No lower clamp: a negative score
/// yields a negative value (slower entities, narrower bomb band).
fn difficulty(score: i64) -> f64 {
    (score as f64 / 1000.0).min(1.0)
}

/// Cadence after a spawn at the given score, floored at the minimum.
pub fn spawn_interval_for(score: i64) -> f64 {
    (SPAWN_INTERVAL_INITIAL_MS - score as f64 * 0.5).max(SPAWN_INTERVAL_MIN_MS)
}

// ── Session construction ──────────────────────────────────────────────────────

/// Idle state behind the menu.  A started session replaces it wholesale.
pub fn menu_state(high_score: i64) -> SessionState {
    SessionState {
        phase: GamePhase::Menu,
        score: 0,
        combo: 0,
        time_left: GAME_DURATION_SECS,
        entities: Vec::new(),
        active_rule: None,
        spawn_interval_ms: SPAWN_INTERVAL_INITIAL_MS,
        last_spawn_ms: 0.0,
        next_entity_id: 1,
        high_score,
    }
}

/// Fresh Playing-phase state.  Everything session-scoped resets here:
/// score, combo, countdown, entity set, spawn cadence, active rule.
pub fn init_session(high_score: i64) -> SessionState {
    init_session_with_duration(high_score, GAME_DURATION_SECS)
}

pub fn init_session_with_duration(high_score: i64, duration_secs: u32) -> SessionState {
    SessionState {
        phase: GamePhase::Playing,
        time_left: duration_secs,
        ..menu_state(high_score)
    }
}

// ── Entity spawner ────────────────────────────────────────────────────────────

/// Map a uniform roll in [0, 1) to an entity kind.  The bomb band widens
/// with score, up to a cumulative 0.50 — at which point the devil band
/// has shrunk to nothing.
pub fn kind_for_roll(roll: f64, score: i64) -> EntityKind {
    if roll < 0.05 {
        EntityKind::Diamond
    } else if roll < 0.08 {
        EntityKind::Clock
    } else if roll < 0.10 {
        EntityKind::Mystery
    } else if roll < 0.30 + difficulty(score) * 0.20 {
        EntityKind::Bomb
    } else if roll < 0.50 {
        EntityKind::Devil
    } else if roll < 0.75 {
        EntityKind::Star
    } else {
        EntityKind::Rocket
    }
}

/// Create one entity for the current score: kind from the weighted roll,
/// lane in [10, 90), travel duration shrinking as score rises (floored at
/// 2 s) with up to a second of jitter, coin-flip direction.
pub fn spawn_entity(state: &SessionState, rng: &mut impl Rng, now_ms: f64) -> Entity {
    let kind = kind_for_roll(rng.gen::<f64>(), state.score);
    let x = rng.gen_range(10u8..90);
    let duration = (4.0 - difficulty(state.score) * 1.5).max(2.0) + rng.gen::<f64>();
    let direction = if rng.gen_bool(0.5) {
        TravelDirection::Up
    } else {
        TravelDirection::Down
    };
    Entity {
        id: state.next_entity_id,
        kind,
        x,
        duration,
        spawned_at: now_ms,
        popped: false,
        popped_at: None,
        direction,
    }
}

// ── Per-frame advance ─────────────────────────────────────────────────────────

/// One frame while Playing: expire the active rule, spawn on cadence,
/// sweep dead entities.  Any other phase returns the state untouched.
/// The spawn check runs before the sweep.
pub fn advance_frame(state: &SessionState, rng: &mut impl Rng, now_ms: f64) -> SessionState {
    if state.phase != GamePhase::Playing {
        return state.clone();
    }

    let active_rule = state.active_rule.filter(|r| !r.expired(now_ms));

    let mut entities = state.entities.clone();
    let mut last_spawn_ms = state.last_spawn_ms;
    let mut spawn_interval_ms = state.spawn_interval_ms;
    let mut next_entity_id = state.next_entity_id;

    if now_ms - last_spawn_ms > spawn_interval_ms {
        entities.push(spawn_entity(state, rng, now_ms));
        next_entity_id += 1;
        last_spawn_ms = now_ms;
        spawn_interval_ms = spawn_interval_for(state.score);
    }

    // Sole removal path: popped entities linger only for the pop visual,
    // untouched ones expire once older than duration + buffer.
    entities.retain(|e| match e.popped_at {
        Some(t) => now_ms - t < POP_GRACE_MS,
        None => e.age_secs(now_ms) < e.duration + EXPIRY_BUFFER_SECS,
    });

    SessionState {
        entities,
        active_rule,
        last_spawn_ms,
        spawn_interval_ms,
        next_entity_id,
        ..state.clone()
    }
}

// ── Interaction resolver ──────────────────────────────────────────────────────

/// Resolve a click on an entity.  `None` is a no-op: wrong phase, unknown
/// id, or the entity was already popped.
pub fn resolve_interaction(
    state: &SessionState,
    entity_id: u64,
    now_ms: f64,
    rng: &mut impl Rng,
) -> Option<(SessionState, InteractionOutcome)> {
    if state.phase != GamePhase::Playing {
        return None;
    }
    let entity = state.entities.iter().find(|e| e.id == entity_id)?;
    if entity.popped {
        return None;
    }
    let kind = entity.kind;

    let valid = match &state.active_rule {
        Some(rule) => rule.allows(kind),
        None => !matches!(kind, EntityKind::Bomb | EntityKind::Devil),
    };

    // Popped either way; the frame sweep removes it after the grace period.
    let mut entities = state.entities.clone();
    if let Some(e) = entities.iter_mut().find(|e| e.id == entity_id) {
        e.popped = true;
        e.popped_at = Some(now_ms);
    }

    if !valid {
        let outcome = InteractionOutcome {
            valid: false,
            score_delta: 0,
            combo_after: 0,
            time_delta: -(TIME_PENALTY_SECS as i64),
            feedback: Feedback {
                text: "-5s".to_string(),
                tone: FeedbackTone::Negative,
            },
            cue: AudioCue::Damage,
            shake: true,
        };
        let next = SessionState {
            combo: 0,
            time_left: state.time_left.saturating_sub(TIME_PENALTY_SECS),
            entities,
            ..state.clone()
        };
        return Some((next, outcome));
    }

    let multiplier = (state.combo / 10 + 1) as i64;
    let mut score_delta = base_score(kind) * multiplier;
    let mut time_delta: i64 = 0;
    let mut active_rule = state.active_rule;

    let feedback = match kind {
        EntityKind::Clock => {
            time_delta = TIME_BONUS_SECS as i64;
            Feedback {
                text: "+5s".to_string(),
                tone: FeedbackTone::Bonus,
            }
        }
        EntityKind::Mystery => {
            if rng.gen_bool(0.5) {
                score_delta = MYSTERY_LUCKY_POINTS;
                Feedback {
                    text: "LUCKY!".to_string(),
                    tone: FeedbackTone::Bonus,
                }
            } else {
                active_rule = Some(pick_rule(rng).install(now_ms));
                score_delta = 0;
                Feedback {
                    text: "RULE CHANGE!".to_string(),
                    tone: FeedbackTone::Negative,
                }
            }
        }
        _ => Feedback {
            text: format!("{:+}", score_delta),
            tone: if kind == EntityKind::Diamond {
                FeedbackTone::Bonus
            } else {
                FeedbackTone::Positive
            },
        },
    };

    let combo_after = state.combo + 1;
    // The clock bonus is uncapped — time may exceed the session length.
    let time_left = (state.time_left as i64 + time_delta).max(0) as u32;

    let next = SessionState {
        score: state.score + score_delta,
        combo: combo_after,
        time_left,
        entities,
        active_rule,
        ..state.clone()
    };
    let outcome = InteractionOutcome {
        valid: true,
        score_delta,
        combo_after,
        time_delta,
        feedback,
        cue: if kind == EntityKind::Diamond {
            AudioCue::Bonus
        } else {
            AudioCue::Pop
        },
        shake: false,
    };
    Some((next, outcome))
}

// ── Session clock ─────────────────────────────────────────────────────────────

/// One second of countdown while Playing.  The decrement happens before
/// the independent rule-injection roll; the roll is skipped once the
/// session has ended.
pub fn clock_tick(
    state: &SessionState,
    rng: &mut impl Rng,
    now_ms: f64,
) -> (SessionState, TickOutcome) {
    if state.phase != GamePhase::Playing {
        return (state.clone(), TickOutcome::default());
    }

    let mut outcome = TickOutcome::default();
    let mut next = state.clone();

    if state.time_left <= 1 {
        next.time_left = 0;
        next.phase = GamePhase::GameOver;
        outcome.game_over = true;
        return (next, outcome);
    }
    if state.time_left <= 5 {
        outcome.warning = true;
    }
    next.time_left = state.time_left - 1;

    if next.active_rule.is_none() && next.score > RULE_SCORE_GATE && rng.gen_bool(RULE_TICK_CHANCE)
    {
        next.active_rule = Some(pick_rule(rng).install(now_ms));
        outcome.rule_triggered = true;
    }

    (next, outcome)
}
