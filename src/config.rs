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

use std::{
    error::Error,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// Default interval between free-capacity polls in the loop driver.
const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Default backoff when the loop driver finds the engine or slot not
/// ready, or a submission fails.
const DEFAULT_RETRY_INTERVAL_MS: u64 = 50;

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_retry_interval_ms() -> u64 {
    DEFAULT_RETRY_INTERVAL_MS
}

/// A YAML representation of the cue engine configuration.
#[derive(Deserialize, Clone, Serialize, Debug)]
pub struct CueConfig {
    /// The directory containing one raw PCM asset per effect.
    asset_dir: PathBuf,

    /// Interval between sink free-capacity polls while looping, in
    /// milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// Backoff while looping when the engine or slot is not ready or a
    /// submission fails, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    retry_interval_ms: u64,
}

impl CueConfig {
    /// Creates a config with default intervals for the given asset
    /// directory.
    pub fn new<P: Into<PathBuf>>(asset_dir: P) -> CueConfig {
        CueConfig {
            asset_dir: asset_dir.into(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            retry_interval_ms: DEFAULT_RETRY_INTERVAL_MS,
        }
    }

    /// Deserializes a config from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<CueConfig, Box<dyn Error>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_yml::from_str(&contents)?)
    }

    /// Gets the asset directory.
    pub fn asset_dir(&self) -> &Path {
        &self.asset_dir
    }

    /// Gets the capacity poll interval.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Gets the not-ready/failed-submit retry interval.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CueConfig::new("/tmp/cues");
        assert_eq!(config.asset_dir(), Path::new("/tmp/cues"));
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.retry_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_yaml_defaults_apply() {
        let config: CueConfig = serde_yml::from_str("asset_dir: /data/cues\n").unwrap();
        assert_eq!(config.asset_dir(), Path::new("/data/cues"));
        assert_eq!(config.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.retry_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_yaml_overrides() {
        let config: CueConfig = serde_yml::from_str(
            "asset_dir: /data/cues\npoll_interval_ms: 5\nretry_interval_ms: 100\n",
        )
        .unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(5));
        assert_eq!(config.retry_interval(), Duration::from_millis(100));
    }
}
