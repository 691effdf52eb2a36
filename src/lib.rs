//! Emoji Reflex — a timed reflex clicking game.
//!
//! The session engine (`compute`, `entities`, `rules`) is pure and fully
//! deterministic given an injected RNG and a monotonic clock; rendering,
//! audio, configuration, and persistence are thin collaborators around it.

pub mod audio;
pub mod compute;
pub mod config;
pub mod display;
pub mod entities;
pub mod rules;
pub mod stats;
