// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! A preloaded PCM sound-cue engine.
//!
//! This crate provides:
//! - In-memory caching of a fixed set of short sound effects (raw 16 kHz
//!   mono 16-bit PCM) loaded once at startup
//! - One-shot and looped playback of cached effects through a pluggable
//!   downstream [`sink::Sink`]
//! - An uncached path for playing an arbitrary PCM file straight from disk
//!
//! The engine is an owned context object ([`engine::CueEngine`]); multiple
//! independent instances may coexist and tear down deterministically.

pub mod config;
pub mod effect;
pub mod engine;
pub mod error;
mod looper;
mod pcm;
pub mod sink;
mod store;
#[cfg(test)]
mod testutil;

pub use config::CueConfig;
pub use effect::Effect;
pub use engine::{CueEngine, EffectInfo};
pub use error::CueError;
pub use sink::{Sink, SinkError};

/// Sample rate all cue assets are authored at. Durations and capacity
/// checks assume this rate; the sink is expected to consume at it.
pub const SAMPLE_RATE: u32 = 16000;
