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

use crate::sink::SinkError;

/// Error types for cue engine operations.
#[derive(Debug, thiserror::Error)]
pub enum CueError {
    /// A caller bug: out-of-range effect index or empty path.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation requires an initialized engine.
    #[error("engine is not initialized")]
    InvalidState,

    /// The backing asset is missing, or the cache slot is not loaded.
    #[error("not found: {0}")]
    NotFound(String),

    /// The asset is corrupt: zero length, or odd length (PCM samples
    /// are two bytes each).
    #[error("invalid PCM size for {path}: {len} bytes")]
    InvalidSize { path: String, len: u64 },

    /// A sample buffer could not be allocated.
    #[error("failed to allocate {0} bytes for sample buffer")]
    OutOfMemory(usize),

    /// The asset could not be read in full.
    #[error("read failure for {0}")]
    ReadFailure(String),

    /// Initialization produced zero usable effect slots.
    #[error("no effects available: every effect failed to load")]
    NoEffectsAvailable,

    /// The downstream sink rejected a submission.
    #[error("sink failure: {0}")]
    SinkFailure(#[from] SinkError),
}
