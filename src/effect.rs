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

//! The closed set of predefined sound effects.

use std::fmt;

use crate::error::CueError;

/// A predefined sound effect. The set is closed: every variant has a
/// backing PCM asset under the configured asset directory, and untrusted
/// numeric identifiers only enter through [`Effect::from_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Short general-purpose beep.
    Beep,
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Device wake-up chime.
    Wakeup,
    /// "Thinking" filler cue.
    Thinking,
    /// Firmware/version update notice.
    VersionUpdate,
    /// Dice shake rattle.
    Dice,
}

impl Effect {
    /// All effects in load order. This is the fixed iteration order used
    /// by the preloader and the stable index space for [`Effect::index`].
    pub const ALL: [Effect; 7] = [
        Effect::Beep,
        Effect::Success,
        Effect::Error,
        Effect::Wakeup,
        Effect::Thinking,
        Effect::VersionUpdate,
        Effect::Dice,
    ];

    /// The conventional asset file name for this effect.
    pub fn asset_file(&self) -> &'static str {
        match self {
            Effect::Beep => "beep.pcm",
            Effect::Success => "success.pcm",
            Effect::Error => "error.pcm",
            Effect::Wakeup => "wakeup.pcm",
            Effect::Thinking => "thinking.pcm",
            Effect::VersionUpdate => "version_update.pcm",
            Effect::Dice => "dice.pcm",
        }
    }

    /// The stable index of this effect within [`Effect::ALL`].
    pub fn index(&self) -> usize {
        match self {
            Effect::Beep => 0,
            Effect::Success => 1,
            Effect::Error => 2,
            Effect::Wakeup => 3,
            Effect::Thinking => 4,
            Effect::VersionUpdate => 5,
            Effect::Dice => 6,
        }
    }

    /// Converts an untrusted numeric identifier into an effect. This is
    /// the only way an out-of-range identifier can be expressed, and it
    /// fails before any engine state is consulted.
    pub fn from_index(index: usize) -> Result<Effect, CueError> {
        Effect::ALL
            .get(index)
            .copied()
            .ok_or(CueError::InvalidArgument(format!(
                "effect index {} out of range (0..{})",
                index,
                Effect::ALL.len()
            )))
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Effect::Beep => "beep",
            Effect::Success => "success",
            Effect::Error => "error",
            Effect::Wakeup => "wakeup",
            Effect::Thinking => "thinking",
            Effect::VersionUpdate => "version-update",
            Effect::Dice => "dice",
        };
        write!(f, "{}", name)
    }
}
