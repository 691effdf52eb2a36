//! Synthesized sound effects.
//!
//! Cues are rendered to PCM frames on first use and played fire-and-forget
//! through kira.  When no output device exists (or audio is disabled in the
//! config) the whole module degrades to a no-op and the game runs silent.

use std::collections::HashMap;

use kira::sound::static_sound::{StaticSoundData, StaticSoundSettings};
use kira::track::{TrackBuilder, TrackHandle};
use kira::{AudioManager, Frame};
use tracing::{debug, error};

use crate::entities::AudioCue;

const SAMPLE_RATE: u32 = 44_100;

pub struct Audio {
    backend: Option<Backend>,
    cache: HashMap<AudioCue, StaticSoundData>,
}

struct Backend {
    _manager: AudioManager,
    sfx_track: TrackHandle,
}

impl Audio {
    pub fn new(enabled: bool) -> Self {
        let backend = if enabled {
            match open_backend() {
                Ok(b) => Some(b),
                Err(err) => {
                    debug!(%err, "audio unavailable, continuing silent");
                    None
                }
            }
        } else {
            None
        };
        Self {
            backend,
            cache: HashMap::new(),
        }
    }

    /// Fire-and-forget playback; does nothing without a device.
    pub fn play(&mut self, cue: AudioCue) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        let data = self
            .cache
            .entry(cue)
            .or_insert_with(|| synthesize(cue))
            .clone();
        if backend.sfx_track.play(data).is_err() {
            error!(?cue, "failed to play cue");
        }
    }
}

fn open_backend() -> anyhow::Result<Backend> {
    let mut manager = AudioManager::new(Default::default())?;
    let sfx_track = manager.add_sub_track(TrackBuilder::default())?;
    Ok(Backend {
        _manager: manager,
        sfx_track,
    })
}

// ── Oscillator rendering ──────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
    Square,
}

impl Waveform {
    fn sample(self, phase: f64) -> f64 {
        let p = phase.fract();
        match self {
            Waveform::Sine => (p * std::f64::consts::TAU).sin(),
            Waveform::Triangle => 4.0 * (p - 0.5).abs() - 1.0,
            Waveform::Sawtooth => 2.0 * p - 1.0,
            Waveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }
}

fn lin(a: f64, b: f64, u: f64) -> f64 {
    a + (b - a) * u
}

fn exp(a: f64, b: f64, u: f64) -> f64 {
    a * (b / a).powf(u)
}

/// Render `secs` of mono audio from an oscillator with per-sample
/// frequency and gain curves (`u` is normalized progress in [0, 1)).
/// The phase accumulates so frequency sweeps stay continuous.
fn render(
    secs: f64,
    wave: Waveform,
    freq: impl Fn(f64) -> f64,
    gain: impl Fn(f64) -> f64,
) -> Vec<Frame> {
    let n = (secs * SAMPLE_RATE as f64) as usize;
    let dt = 1.0 / SAMPLE_RATE as f64;
    let mut phase = 0.0_f64;
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / n as f64;
        phase += freq(u) * dt;
        out.push(Frame::from_mono((wave.sample(phase) * gain(u)) as f32));
    }
    out
}

fn synthesize(cue: AudioCue) -> StaticSoundData {
    let frames = match cue {
        // Short upward chirp.
        AudioCue::Pop => render(
            0.1,
            Waveform::Sine,
            |u| exp(400.0, 800.0, u),
            |u| exp(0.3, 0.01, u),
        ),
        // Three-step rising arpeggio.
        AudioCue::Bonus => render(
            0.3,
            Waveform::Triangle,
            |u| {
                if u < 1.0 / 3.0 {
                    lin(600.0, 1200.0, u * 3.0)
                } else if u < 2.0 / 3.0 {
                    lin(1200.0, 1800.0, u * 3.0 - 1.0)
                } else {
                    1800.0
                }
            },
            |u| lin(0.3, 0.0, u),
        ),
        // Low buzz sliding down.
        AudioCue::Damage => render(
            0.3,
            Waveform::Sawtooth,
            |u| lin(100.0, 50.0, u),
            |u| lin(0.5, 0.0, u),
        ),
        // Long descending groan.
        AudioCue::GameOver => render(
            1.0,
            Waveform::Sawtooth,
            |u| exp(300.0, 50.0, u),
            |u| lin(0.5, 0.0, u),
        ),
        // Faint metronome click.
        AudioCue::Tick => render(0.05, Waveform::Square, |_| 800.0, |u| lin(0.05, 0.0, u)),
    };
    StaticSoundData {
        sample_rate: SAMPLE_RATE,
        frames: frames.into(),
        settings: StaticSoundSettings::new(),
        slice: None,
    }
}
