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

//! Raw PCM file reading.
//!
//! Cue assets are headerless little-endian 16-bit mono streams, so
//! "decoding" is a size sanity check plus a byte copy. The same reader
//! backs both the startup preloader and the uncached file-play path.

use std::{fs::File, io::Read, path::Path};

use tracing::debug;

use crate::error::CueError;

/// Reads an entire raw PCM file into a sample buffer.
///
/// Rejects zero-length and odd-length files: samples are two bytes each,
/// and an odd length is a corruption signal. The buffer is allocated
/// fallibly and sized exactly to the file; on any failure nothing is
/// retained.
pub fn read_pcm_file(path: &Path) -> Result<Vec<i16>, CueError> {
    let metadata = std::fs::metadata(path)
        .map_err(|_| CueError::NotFound(path.display().to_string()))?;

    let len = metadata.len();
    if len == 0 || len % 2 != 0 {
        return Err(CueError::InvalidSize {
            path: path.display().to_string(),
            len,
        });
    }
    let byte_len = len as usize;

    let file = File::open(path).map_err(|_| CueError::NotFound(path.display().to_string()))?;
    let samples = read_samples(file, byte_len, path)?;

    debug!(path = %path.display(), samples = samples.len(), "Read PCM file");
    Ok(samples)
}

/// Reads exactly `byte_len` bytes from the reader and converts them to
/// samples. A reader that runs dry early is a `ReadFailure`: the file
/// shrank between stat and read, and a partial buffer must never be
/// retained.
fn read_samples<R: Read>(reader: R, byte_len: usize, path: &Path) -> Result<Vec<i16>, CueError> {
    let mut bytes: Vec<u8> = Vec::new();
    bytes
        .try_reserve_exact(byte_len)
        .map_err(|_| CueError::OutOfMemory(byte_len))?;

    // Cap the read at the stat'd length so a concurrently growing file
    // can't overrun the buffer we just sized.
    let read = reader
        .take(byte_len as u64)
        .read_to_end(&mut bytes)
        .map_err(|_| CueError::ReadFailure(path.display().to_string()))?;
    if read != byte_len {
        return Err(CueError::ReadFailure(path.display().to_string()));
    }

    let mut samples: Vec<i16> = Vec::new();
    samples
        .try_reserve_exact(byte_len / 2)
        .map_err(|_| CueError::OutOfMemory(byte_len))?;
    samples.extend(
        bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]])),
    );

    Ok(samples)
}
