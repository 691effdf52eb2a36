use std::fs::{self, File};
use std::io::{stdout, BufWriter, Write};
use std::path::Path;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
        MouseEventKind,
    },
    style::{self, Color, Print},
    terminal, ExecutableCommand, QueueableCommand,
};
use rand::thread_rng;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use emoji_reflex::audio::Audio;
use emoji_reflex::compute::{
    advance_frame, clock_tick, init_session_with_duration, resolve_interaction,
};
use emoji_reflex::config::Config;
use emoji_reflex::display::{self, Fx};
use emoji_reflex::entities::{AudioCue, GamePhase, SessionState};
use emoji_reflex::rules::ActiveRule;
use emoji_reflex::stats::{data_dir, StatsStore};

const FRAME: Duration = Duration::from_millis(33); // ≈30 FPS
const TICK: Duration = Duration::from_secs(1);

/// Monotonic milliseconds since program start — the engine's clock.
fn now_ms(origin: Instant) -> f64 {
    origin.elapsed().as_secs_f64() * 1000.0
}

// ── Logging ───────────────────────────────────────────────────────────────────

/// Log to a file next to the stats — stderr belongs to the game screen.
fn init_logging(dir: &Path) {
    let _ = fs::create_dir_all(dir);
    let Ok(file) = File::create(dir.join("emoji-reflex.log")) else {
        return;
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}

// ── Menu ──────────────────────────────────────────────────────────────────────

enum MenuResult {
    Start,
    Quit,
}

fn show_menu<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    stats: &StatsStore,
) -> std::io::Result<MenuResult> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let (width, height) = terminal::size()?;
    let cx = width / 2;
    let cy = height / 2;

    let title = "★  EMOJI  REFLEX  ★";
    out.queue(cursor::MoveTo(
        cx.saturating_sub(title.chars().count() as u16 / 2),
        cy.saturating_sub(7),
    ))?;
    out.queue(style::SetForegroundColor(Color::Cyan))?;
    out.queue(Print(title))?;

    if stats.high_score() > 0 {
        let hs_str = format!("Best Score: {}", stats.high_score());
        out.queue(cursor::MoveTo(
            cx.saturating_sub(hs_str.chars().count() as u16 / 2),
            cy.saturating_sub(5),
        ))?;
        out.queue(style::SetForegroundColor(Color::Yellow))?;
        out.queue(Print(&hs_str))?;
    }

    let daily = &stats.stats.daily;
    if daily.games_played > 0 {
        let daily_str = format!(
            "Today's Best: {}  ({} game{})",
            daily.high_score,
            daily.games_played,
            if daily.games_played == 1 { "" } else { "s" },
        );
        out.queue(cursor::MoveTo(
            cx.saturating_sub(daily_str.chars().count() as u16 / 2),
            cy.saturating_sub(4),
        ))?;
        out.queue(style::SetForegroundColor(Color::Magenta))?;
        out.queue(Print(&daily_str))?;
    }

    let rules: &[(&str, Color)] = &[
        ("🚀 ⭐ 💎  Click to score points", Color::Green),
        ("💣 😈  Avoid bombs and devils", Color::Red),
        ("⏱  Clocks add time, ❓ is a gamble", Color::Cyan),
        ("⚠  Watch for rule changes!", Color::Yellow),
    ];
    for (i, (line, color)) in rules.iter().enumerate() {
        out.queue(cursor::MoveTo(cx.saturating_sub(16), cy.saturating_sub(2) + i as u16))?;
        out.queue(style::SetForegroundColor(*color))?;
        out.queue(Print(*line))?;
    }

    out.queue(cursor::MoveTo(cx.saturating_sub(16), cy + 4))?;
    out.queue(style::SetForegroundColor(Color::DarkGrey))?;
    out.queue(Print("ENTER / CLICK : Play   Q : Quit"))?;

    out.queue(style::ResetColor)?;
    out.flush()?;

    // Block until the player makes a choice
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('p') | KeyCode::Char('P') => {
                    return Ok(MenuResult::Start);
                }
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                    return Ok(MenuResult::Quit);
                }
                _ => {}
            },
            Ok(Event::Mouse(MouseEvent {
                kind: MouseEventKind::Down(_),
                ..
            })) => return Ok(MenuResult::Start),
            Ok(_) => {}
            Err(_) => return Ok(MenuResult::Quit),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

enum LoopResult {
    Quit,
    Retry,
    Menu,
}

/// One session from start to whatever the player does on the game-over
/// screen.  The frame cadence and the one-second countdown both live in
/// this loop body; leaving the function cancels both together, and a new
/// session re-arms them with fresh bookkeeping.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut SessionState,
    rx: &mpsc::Receiver<Event>,
    stats: &mut StatsStore,
    audio: &mut Audio,
    origin: Instant,
) -> std::io::Result<LoopResult> {
    let mut rng = thread_rng();
    let mut fx = Fx::default();
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(ev) = rx.try_recv() {
            match ev {
                Event::Key(KeyEvent {
                    code,
                    kind: KeyEventKind::Press,
                    modifiers,
                    ..
                }) => match code {
                    KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                        return Ok(LoopResult::Quit);
                    }
                    KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(LoopResult::Quit);
                    }
                    KeyCode::Char('r') | KeyCode::Char('R')
                        if state.phase == GamePhase::GameOver =>
                    {
                        return Ok(LoopResult::Retry);
                    }
                    KeyCode::Char('m') | KeyCode::Char('M')
                        if state.phase == GamePhase::GameOver =>
                    {
                        return Ok(LoopResult::Menu);
                    }
                    _ => {}
                },
                Event::Mouse(MouseEvent {
                    kind: MouseEventKind::Down(MouseButton::Left),
                    column,
                    row,
                    ..
                }) => {
                    if state.phase == GamePhase::Playing {
                        let now = now_ms(origin);
                        let (width, height) = terminal::size()?;
                        if let Some(id) = display::hit_test(state, now, width, height, column, row)
                        {
                            if let Some((next, outcome)) =
                                resolve_interaction(state, id, now, &mut rng)
                            {
                                audio.play(outcome.cue);
                                if outcome.shake {
                                    fx.trigger_shake(now);
                                }
                                fx.push_feedback(column, row, &outcome.feedback, now);
                                debug!(
                                    id,
                                    valid = outcome.valid,
                                    delta = outcome.score_delta,
                                    "click resolved"
                                );
                                *state = next;
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        // ── One-second countdown, catch-up style ──────────────────────────────
        while state.phase == GamePhase::Playing && last_tick.elapsed() >= TICK {
            last_tick += TICK;
            let (next, tick) = clock_tick(state, &mut rng, now_ms(origin));
            *state = next;
            if tick.warning {
                audio.play(AudioCue::Tick);
            }
            if tick.rule_triggered {
                if let Some(ActiveRule { kind, .. }) = state.active_rule {
                    info!(rule = ?kind, "rule injected");
                }
            }
            if tick.game_over {
                audio.play(AudioCue::GameOver);
                stats.record_session(state.score);
                info!(score = state.score, "session over");
            }
        }

        // ── Frame advance & render ────────────────────────────────────────────
        let now = now_ms(origin);
        *state = advance_frame(state, &mut rng, now);
        fx.prune(now);
        display::render(out, state, &fx, now)?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let dir = data_dir();
    init_logging(&dir);
    let config = Config::load();
    let mut stats = StatsStore::open(&dir);
    let mut audio = Audio::new(config.audio);
    let origin = Instant::now();

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;
    out.execute(event::EnableMouseCapture)?;

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || loop {
        match event::read() {
            Ok(ev) => {
                if tx.send(ev).is_err() {
                    break; // receiver dropped → program exiting
                }
            }
            Err(_) => break,
        }
    });

    let result = run(&mut out, &rx, &config, &mut stats, &mut audio, origin);

    // Always restore the terminal
    let _ = out.execute(event::DisableMouseCapture);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: &Config,
    stats: &mut StatsStore,
    audio: &mut Audio,
    origin: Instant,
) -> Result<()> {
    loop {
        match show_menu(out, rx, stats)? {
            MenuResult::Quit => break,
            MenuResult::Start => loop {
                audio.play(AudioCue::Bonus);
                let mut state =
                    init_session_with_duration(stats.high_score(), config.game_duration_secs);
                info!(duration = config.game_duration_secs, "session started");
                match game_loop(out, &mut state, rx, stats, audio, origin)? {
                    LoopResult::Quit => return Ok(()),
                    LoopResult::Retry => continue,
                    LoopResult::Menu => break,
                }
            },
        }
    }
    Ok(())
}
