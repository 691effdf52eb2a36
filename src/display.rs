//! Rendering layer — all terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! game state.  No game logic is performed; this module only translates
//! state into terminal commands.  It also owns the inverse mapping: the
//! hit test recomputes the same screen-space interpolation the renderer
//! uses so a mouse click can be traced back to an entity id.

use std::io::Write;

use crossterm::{
    cursor,
    style::{self, Color, Print},
    terminal, QueueableCommand,
};

use crate::entities::{
    Entity, EntityKind, Feedback, FeedbackTone, GamePhase, SessionState, TravelDirection,
};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD_SCORE: Color = Color::Yellow;
const C_HUD_COMBO: Color = Color::Yellow;
const C_TIME_OK: Color = Color::White;
const C_TIME_LOW: Color = Color::Red;
const C_RULE: Color = Color::Red;
const C_POSITIVE: Color = Color::Green;
const C_NEGATIVE: Color = Color::Red;
const C_BONUS: Color = Color::Cyan;
const C_HINT: Color = Color::DarkGrey;

/// How long a floating feedback text stays on screen.
pub const FLOAT_TEXT_MS: f64 = 800.0;
/// How long the screen shakes after an invalid click.
pub const SHAKE_MS: f64 = 500.0;

fn emoji(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Rocket => "🚀",
        EntityKind::Star => "⭐",
        EntityKind::Diamond => "💎",
        EntityKind::Bomb => "💣",
        EntityKind::Devil => "😈",
        EntityKind::Clock => "⏱",
        EntityKind::Mystery => "❓",
    }
}

fn tone_color(tone: FeedbackTone) -> Color {
    match tone {
        FeedbackTone::Positive => C_POSITIVE,
        FeedbackTone::Negative => C_NEGATIVE,
        FeedbackTone::Bonus => C_BONUS,
    }
}

// ── Presentation-only effects ─────────────────────────────────────────────────

struct FloatingText {
    text: String,
    tone: FeedbackTone,
    col: u16,
    row: u16,
    created_at: f64,
}

/// Transient visual state: floating score texts and the shake timer.
/// Lives entirely outside the session engine.
#[derive(Default)]
pub struct Fx {
    floating: Vec<FloatingText>,
    shake_until: f64,
}

impl Fx {
    pub fn push_feedback(&mut self, col: u16, row: u16, feedback: &Feedback, now_ms: f64) {
        self.floating.push(FloatingText {
            text: feedback.text.clone(),
            tone: feedback.tone,
            col,
            row,
            created_at: now_ms,
        });
    }

    pub fn trigger_shake(&mut self, now_ms: f64) {
        self.shake_until = now_ms + SHAKE_MS;
    }

    /// Drop floating texts past their lifetime.
    pub fn prune(&mut self, now_ms: f64) {
        self.floating
            .retain(|ft| now_ms - ft.created_at < FLOAT_TEXT_MS);
    }

    fn shaking(&self, now_ms: f64) -> bool {
        now_ms < self.shake_until
    }
}

// ── Screen-space mapping ──────────────────────────────────────────────────────

/// Playfield cell for an entity at `now_ms`.  Motion is pure presentation:
/// progress along the travel duration interpolated between the bottom and
/// top playfield rows (or the reverse for downward travellers).
fn entity_cell(e: &Entity, now_ms: f64, width: u16, height: u16) -> (u16, u16) {
    let col = 1 + (width.saturating_sub(4) as f64 * e.x as f64 / 100.0) as u16;
    let top = 2_i32;
    let bottom = height.saturating_sub(3).max(2) as i32;
    let progress = (e.age_secs(now_ms) / e.duration).clamp(0.0, 1.0);
    let travelled = ((bottom - top) as f64 * progress).round() as i32;
    let row = match e.direction {
        TravelDirection::Up => bottom - travelled,
        TravelDirection::Down => top + travelled,
    };
    (col, row.clamp(0, height as i32 - 1) as u16)
}

/// Map a click to the entity under it, newest first (the newest is drawn
/// on top).  Popped entities are transparent to clicks.
pub fn hit_test(
    state: &SessionState,
    now_ms: f64,
    width: u16,
    height: u16,
    col: u16,
    row: u16,
) -> Option<u64> {
    state.entities.iter().rev().find_map(|e| {
        if e.popped {
            return None;
        }
        let (ec, er) = entity_cell(e, now_ms, width, height);
        let dc = (col as i32 - ec as i32).abs();
        let dr = (row as i32 - er as i32).abs();
        (dc <= 1 && dr <= 1).then_some(e.id)
    })
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame.
pub fn render<W: Write>(
    out: &mut W,
    state: &SessionState,
    fx: &Fx,
    now_ms: f64,
) -> std::io::Result<()> {
    let (width, height) = terminal::size()?;
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    draw_border(out, width, height)?;
    draw_hud(out, state, width)?;

    // Alternate a one-column offset while the shake timer runs.
    let shake_dx = if fx.shaking(now_ms) && (now_ms / 60.0) as u64 % 2 == 0 {
        1
    } else {
        0
    };

    for entity in &state.entities {
        draw_entity(out, entity, now_ms, width, height, shake_dx)?;
    }

    if let Some(rule) = &state.active_rule {
        if state.phase == GamePhase::Playing {
            let banner = format!("⚠ {} ⚠", rule.text());
            let col = (width / 2).saturating_sub(banner.chars().count() as u16 / 2);
            out.queue(cursor::MoveTo(col, height / 3))?;
            out.queue(style::SetForegroundColor(C_RULE))?;
            out.queue(Print(&banner))?;
        }
    }

    for ft in &fx.floating {
        // Drift one row up per 300 ms of age.
        let rise = ((now_ms - ft.created_at) / 300.0) as u16;
        out.queue(cursor::MoveTo(ft.col, ft.row.saturating_sub(rise).max(2)))?;
        out.queue(style::SetForegroundColor(tone_color(ft.tone)))?;
        out.queue(Print(&ft.text))?;
    }

    draw_controls_hint(out, state, height)?;

    if state.phase == GamePhase::GameOver {
        draw_game_over(out, state, width, height)?;
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, height.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Border ────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, width: u16, height: u16) -> std::io::Result<()> {
    let w = width as usize;

    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;

    out.queue(cursor::MoveTo(0, height.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..height.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(width.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }

    Ok(())
}

// ── HUD (row 0) ───────────────────────────────────────────────────────────────

fn draw_hud<W: Write>(out: &mut W, state: &SessionState, width: u16) -> std::io::Result<()> {
    // Score — left
    out.queue(cursor::MoveTo(1, 0))?;
    out.queue(style::SetForegroundColor(C_HUD_SCORE))?;
    out.queue(Print(format!("Score: {:>8}", state.score)))?;

    // Combo — centre, only once it means something
    if state.combo > 1 {
        let combo_str = format!("{}x COMBO!", state.combo);
        let cx = (width / 2).saturating_sub(combo_str.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(cx, 0))?;
        out.queue(style::SetForegroundColor(C_HUD_COMBO))?;
        out.queue(Print(&combo_str))?;
    }

    // Countdown — right, red once the warning window starts
    let time_str = format!("Time {}:{:02}", state.time_left / 60, state.time_left % 60);
    let color = if state.time_left <= 5 {
        C_TIME_LOW
    } else {
        C_TIME_OK
    };
    let rx = width.saturating_sub(time_str.chars().count() as u16 + 1);
    out.queue(cursor::MoveTo(rx, 0))?;
    out.queue(style::SetForegroundColor(color))?;
    out.queue(Print(&time_str))?;

    Ok(())
}

// ── Entities ──────────────────────────────────────────────────────────────────

fn draw_entity<W: Write>(
    out: &mut W,
    entity: &Entity,
    now_ms: f64,
    width: u16,
    height: u16,
    shake_dx: u16,
) -> std::io::Result<()> {
    let (col, row) = entity_cell(entity, now_ms, width, height);
    if row < 2 || row > height.saturating_sub(3) {
        return Ok(());
    }
    out.queue(cursor::MoveTo(
        (col + shake_dx).min(width.saturating_sub(2)),
        row,
    ))?;
    out.queue(style::ResetColor)?;
    if entity.popped {
        out.queue(Print("💥"))?;
    } else {
        out.queue(Print(emoji(entity.kind)))?;
    }
    Ok(())
}

// ── Controls hint (last row) ──────────────────────────────────────────────────

fn draw_controls_hint<W: Write>(
    out: &mut W,
    state: &SessionState,
    height: u16,
) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(1, height.saturating_sub(1)))?;
    out.queue(style::SetForegroundColor(C_HINT))?;
    let hint = match state.phase {
        GamePhase::GameOver => "R : Play Again   M : Menu   Q : Quit",
        _ => "CLICK the good emojis — avoid 💣 and 😈   Q : Quit",
    };
    out.queue(Print(hint))?;
    Ok(())
}

// ── Game-over overlay ─────────────────────────────────────────────────────────

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &SessionState,
    width: u16,
    height: u16,
) -> std::io::Result<()> {
    let score_line = format!("Final Score: {}", state.score);
    let mut lines: Vec<(String, Color)> = vec![
        ("╔══════════════════╗".to_string(), Color::Red),
        ("║    GAME  OVER    ║".to_string(), Color::Red),
        ("╚══════════════════╝".to_string(), Color::Red),
        (score_line, Color::Yellow),
    ];
    if state.score >= state.high_score && state.score > 0 {
        lines.push(("🏆 NEW HIGH SCORE!".to_string(), Color::Yellow));
    }
    lines.push((
        "R - Play Again  M - Menu  Q - Quit".to_string(),
        Color::White,
    ));

    let cx = width / 2;
    let start_row = (height / 2).saturating_sub(lines.len() as u16 / 2);

    for (i, (msg, color)) in lines.iter().enumerate() {
        let row = start_row + i as u16;
        let col = cx.saturating_sub(msg.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(col, row))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(msg.as_str()))?;
    }

    Ok(())
}
