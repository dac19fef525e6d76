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

//! The downstream playback boundary.

use std::fmt;

pub mod mock;

/// Error types for sink submissions.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink is not available to accept audio.
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// The sink rejected a buffer.
    #[error("sink rejected a buffer of {0} samples")]
    Rejected(usize),
}

/// The external audio output consumer. Implementations wrap whatever
/// actually drains samples to hardware: a ring buffer feeding a DAC, an
/// OS audio callback, or the [`mock::MockSink`] in tests.
///
/// Samples are mono 16-bit PCM at [`crate::SAMPLE_RATE`].
pub trait Sink: fmt::Display + Send + Sync {
    /// Ensures a consuming task exists. Idempotent; calling this on a
    /// sink whose consumer is already running is a no-op.
    fn start_consumer(&self);

    /// Enqueues a full buffer. The engine always submits a complete
    /// effect per call, never a partial one.
    fn submit(&self, samples: &[i16]) -> Result<(), SinkError>;

    /// The current free space of the sink's queue, in samples.
    fn free_capacity_samples(&self) -> usize;

    /// Halts the consumer and discards queued-but-unplayed audio. Must
    /// complete the discard before returning.
    fn stop_consumer_and_clear(&self);
}
