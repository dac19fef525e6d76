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

//! Sample storage and preloading for cached effects.
//!
//! Effects are loaded entirely into memory at startup for zero-latency
//! playback. Each effect owns one slot; slots are independent, so one
//! failed load never affects another.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::effect::Effect;
use crate::error::CueError;
use crate::pcm;

/// One effect's cache entry. The sample buffer is exclusively owned by
/// the slot: `None` until loaded, dropped and reset to `None` on unload.
/// A loaded slot always has a non-empty buffer, because zero-length
/// assets are rejected before allocation.
struct Slot {
    /// The backing asset for this slot.
    source_path: PathBuf,
    /// The cached samples, if loaded.
    samples: Option<Vec<i16>>,
}

impl Slot {
    fn loaded(&self) -> bool {
        self.samples.is_some()
    }

    fn sample_count(&self) -> usize {
        self.samples.as_ref().map(Vec::len).unwrap_or(0)
    }
}

/// Holds every effect's cache slot and performs the batch preload.
pub(crate) struct SampleStore {
    /// Slots indexed by `Effect::index`.
    slots: Vec<Slot>,
}

impl SampleStore {
    /// Creates an empty store with one unloaded slot per effect, backed
    /// by the conventional asset names under `asset_dir`.
    pub(crate) fn new(asset_dir: &Path) -> SampleStore {
        SampleStore {
            slots: Effect::ALL
                .iter()
                .map(|effect| Slot {
                    source_path: asset_dir.join(effect.asset_file()),
                    samples: None,
                })
                .collect(),
        }
    }

    /// Verifies the asset directory is attached and readable. Repeated
    /// calls against an attached directory succeed.
    pub(crate) fn attach(asset_dir: &Path) -> Result<(), CueError> {
        if !asset_dir.is_dir() {
            return Err(CueError::NotFound(asset_dir.display().to_string()));
        }
        Ok(())
    }

    /// Preloads every effect in `Effect::ALL` order. Per-slot failures
    /// are logged and skipped; returns `NoEffectsAvailable` only when
    /// every slot failed.
    pub(crate) fn load_all(&mut self) -> Result<(), CueError> {
        let mut loaded = 0;
        let mut failed = 0;

        for effect in Effect::ALL {
            match self.load_slot(effect) {
                Ok(()) => loaded += 1,
                Err(e) => {
                    failed += 1;
                    warn!(effect = %effect, error = %e, "Failed to load effect, skipping");
                }
            }
        }

        if loaded == 0 {
            return Err(CueError::NoEffectsAvailable);
        }

        info!(
            loaded,
            failed,
            memory_kb = self.total_memory_usage() / 1024,
            "Effects preloaded"
        );
        Ok(())
    }

    /// Loads a single slot from its backing asset.
    fn load_slot(&mut self, effect: Effect) -> Result<(), CueError> {
        let slot = &mut self.slots[effect.index()];
        let samples = pcm::read_pcm_file(&slot.source_path)?;

        let duration_ms = samples.len() as u64 * 1000 / crate::SAMPLE_RATE as u64;
        info!(
            effect = %effect,
            path = %slot.source_path.display(),
            samples = samples.len(),
            duration_ms,
            "Effect loaded"
        );

        slot.samples = Some(samples);
        Ok(())
    }

    /// Drops every slot's buffer and resets it to the unloaded state.
    pub(crate) fn unload_all(&mut self) {
        for slot in &mut self.slots {
            slot.samples = None;
        }
    }

    /// Returns true if the effect's slot is loaded.
    pub(crate) fn is_loaded(&self, effect: Effect) -> bool {
        self.slots[effect.index()].loaded()
    }

    /// Borrows the effect's cached samples, if loaded.
    pub(crate) fn samples(&self, effect: Effect) -> Option<&[i16]> {
        self.slots[effect.index()].samples.as_deref()
    }

    /// The effect's cached sample count; 0 when unloaded.
    pub(crate) fn sample_count(&self, effect: Effect) -> usize {
        self.slots[effect.index()].sample_count()
    }

    /// Total memory held by cached samples, in bytes.
    pub(crate) fn total_memory_usage(&self) -> usize {
        self.slots
            .iter()
            .map(|slot| slot.sample_count() * std::mem::size_of::<i16>())
            .sum()
    }
}

impl std::fmt::Debug for SampleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStore")
            .field(
                "loaded_slots",
                &self.slots.iter().filter(|s| s.loaded()).count(),
            )
            .field("total_memory_kb", &(self.total_memory_usage() / 1024))
            .finish()
    }
}
