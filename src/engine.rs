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

//! The cue engine: preload lifecycle and playback dispatch.

use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::CueConfig;
use crate::effect::Effect;
use crate::error::CueError;
use crate::looper::LoopDriver;
use crate::pcm;
use crate::sink::Sink;
use crate::store::SampleStore;

/// Sample count and duration of a loaded effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectInfo {
    /// Number of cached 16-bit samples.
    pub sample_count: usize,
    /// Playback duration at the fixed 16 kHz cue rate.
    pub duration_ms: u64,
}

/// State shared between the engine's callers and the loop thread.
///
/// The store is written only inside `initialize`/`deinitialize`, never
/// concurrently with playback: deinitialization joins the loop thread
/// before unloading, so steady-state readers only ever contend on the
/// read side of the lock.
pub(crate) struct Shared {
    config: CueConfig,
    initialized: AtomicBool,
    store: RwLock<SampleStore>,
    sink: Arc<dyn Sink>,
}

impl Shared {
    pub(crate) fn config(&self) -> &CueConfig {
        &self.config
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub(crate) fn store(&self) -> &RwLock<SampleStore> {
        &self.store
    }

    pub(crate) fn sink(&self) -> &dyn Sink {
        self.sink.as_ref()
    }
}

/// A preloaded sound-cue engine bound to one downstream sink.
///
/// Each engine owns its own sample cache and loop driver; instances are
/// independent and tear down deterministically on [`CueEngine::deinitialize`]
/// or drop.
pub struct CueEngine {
    shared: Arc<Shared>,
    looper: LoopDriver,
}

impl CueEngine {
    /// Creates an engine for the given config and sink. No assets are
    /// touched until [`CueEngine::initialize`].
    pub fn new(config: CueConfig, sink: Arc<dyn Sink>) -> CueEngine {
        let store = SampleStore::new(config.asset_dir());
        CueEngine {
            shared: Arc::new(Shared {
                config,
                initialized: AtomicBool::new(false),
                store: RwLock::new(store),
                sink,
            }),
            looper: LoopDriver::new(),
        }
    }

    /// Preloads every effect from the asset directory.
    ///
    /// Already being initialized is not an error: logged and ignored.
    /// A missing asset directory aborts initialization. Individual
    /// effects that fail to load are logged and skipped; only a batch
    /// where *every* effect failed is fatal (`NoEffectsAvailable`).
    /// After partial success callers should gate on
    /// [`CueEngine::is_loaded`] before relying on a specific effect.
    pub fn initialize(&self) -> Result<(), CueError> {
        if self.shared.is_initialized() {
            warn!("Cue engine already initialized");
            return Ok(());
        }

        SampleStore::attach(self.shared.config.asset_dir())?;
        self.shared.store.write().load_all()?;
        self.shared.initialized.store(true, Ordering::Release);

        info!(
            asset_dir = %self.shared.config.asset_dir().display(),
            "Cue engine initialized"
        );
        Ok(())
    }

    /// Unloads every cached effect and clears the initialized gate.
    /// Stops the loop driver first, so no loop thread can be mid-flight
    /// while buffers are freed. No-op when not initialized.
    pub fn deinitialize(&self) {
        if !self.shared.is_initialized() {
            return;
        }

        self.stop_loop();
        self.shared.store.write().unload_all();
        self.shared.initialized.store(false, Ordering::Release);
        info!("Cue engine deinitialized");
    }

    /// Plays a cached effect once. Fails with `InvalidState` before
    /// initialization and `NotFound` when the effect's slot did not
    /// load. Submission is fire-and-forget: failures are logged and
    /// surfaced, never retried.
    pub fn play(&self, effect: Effect) -> Result<(), CueError> {
        if !self.shared.is_initialized() {
            return Err(CueError::InvalidState);
        }

        let store = self.shared.store.read();
        let samples = store
            .samples(effect)
            .ok_or_else(|| CueError::NotFound(format!("effect {} is not loaded", effect)))?;

        self.shared.sink.start_consumer();
        if let Err(e) = self.shared.sink.submit(samples) {
            warn!(effect = %effect, error = %e, "Effect playback failed");
            return Err(e.into());
        }

        info!(effect = %effect, samples = samples.len(), "Playing effect");
        Ok(())
    }

    /// Plays an arbitrary raw PCM file without caching it. Usable even
    /// before (or without) initialization. The file is re-read and the
    /// buffer re-allocated on every call, and dropped as soon as the
    /// submission returns; use cached effects for anything repeated.
    pub fn play_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CueError> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(CueError::InvalidArgument("empty file path".to_string()));
        }

        let samples = pcm::read_pcm_file(path)?;

        self.shared.sink.start_consumer();
        if let Err(e) = self.shared.sink.submit(&samples) {
            warn!(path = %path.display(), error = %e, "File playback failed");
            return Err(e.into());
        }

        info!(
            path = %path.display(),
            samples = samples.len(),
            "Playing file"
        );
        Ok(())
    }

    /// Halts the sink's consumer and discards queued-but-unplayed audio.
    /// The discard completes before this returns, so a subsequent
    /// [`CueEngine::play`] can never be garbled by earlier audio.
    pub fn stop(&self) {
        self.shared.sink.stop_consumer_and_clear();
    }

    /// Returns true if the effect's slot is loaded.
    pub fn is_loaded(&self, effect: Effect) -> bool {
        self.shared.store.read().is_loaded(effect)
    }

    /// Gets the cached sample count and duration of a loaded effect.
    pub fn get_info(&self, effect: Effect) -> Result<EffectInfo, CueError> {
        let store = self.shared.store.read();
        if !store.is_loaded(effect) {
            return Err(CueError::NotFound(format!(
                "effect {} is not loaded",
                effect
            )));
        }

        let sample_count = store.sample_count(effect);
        Ok(EffectInfo {
            sample_count,
            duration_ms: sample_count as u64 * 1000 / crate::SAMPLE_RATE as u64,
        })
    }

    /// Starts looping a cached effect, or retargets a live loop to it.
    /// The loop resubmits the whole effect whenever the sink reports
    /// room for it, until [`CueEngine::stop_loop`].
    pub fn start_loop(&self, effect: Effect) -> Result<(), CueError> {
        if !self.shared.is_initialized() {
            return Err(CueError::InvalidState);
        }
        if !self.shared.store.read().is_loaded(effect) {
            return Err(CueError::NotFound(format!(
                "effect {} is not loaded",
                effect
            )));
        }

        self.shared.sink.start_consumer();
        self.looper.start(self.shared.clone(), effect)
    }

    /// Stops the loop: joins the loop thread, then clears the sink so
    /// no looped audio outlives the call. No-op when no loop is
    /// running.
    pub fn stop_loop(&self) {
        self.looper.stop(self.shared.sink.as_ref());
    }
}

impl Drop for CueEngine {
    fn drop(&mut self) {
        // A live loop thread holds the shared state; join it so drop is
        // deterministic even when the caller skipped deinitialize.
        self.stop_loop();
    }
}

impl std::fmt::Debug for CueEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CueEngine")
            .field("initialized", &self.shared.is_initialized())
            .field("looping", &self.looper.is_running())
            .field("store", &*self.shared.store.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::sink::mock::{MockSink, SinkEvent};
    use crate::testutil::{eventually, init_tracing, write_pcm};
    use tempfile::TempDir;

    /// Beep asset: 3200 bytes -> 1600 samples -> 100ms at 16kHz.
    const BEEP_SAMPLES: usize = 1600;
    /// Every other asset is kept small to tell submissions apart.
    const SMALL_SAMPLES: usize = 64;

    fn write_assets(dir: &Path) {
        for effect in Effect::ALL {
            let count = if effect == Effect::Beep {
                BEEP_SAMPLES
            } else {
                SMALL_SAMPLES
            };
            write_pcm(&dir.join(effect.asset_file()), &vec![100i16; count]).unwrap();
        }
    }

    fn test_engine() -> (CueEngine, Arc<MockSink>, TempDir) {
        init_tracing();
        let dir = tempfile::tempdir().unwrap();
        write_assets(dir.path());

        let sink = Arc::new(MockSink::get("mock"));
        // Fast intervals keep the loop tests snappy.
        let config: CueConfig = serde_yml::from_str(&format!(
            "asset_dir: {}\npoll_interval_ms: 1\nretry_interval_ms: 2\n",
            dir.path().display()
        ))
        .unwrap();
        let engine = CueEngine::new(config, sink.clone());
        (engine, sink, dir)
    }

    #[test]
    fn test_play_before_initialize() {
        let (engine, sink, _dir) = test_engine();
        for effect in Effect::ALL {
            assert!(matches!(engine.play(effect), Err(CueError::InvalidState)));
        }
        assert_eq!(sink.submission_count(), 0);
    }

    #[test]
    fn test_initialize_loads_all_effects() {
        let (engine, _sink, _dir) = test_engine();
        engine.initialize().unwrap();

        for effect in Effect::ALL {
            assert!(engine.is_loaded(effect));
        }

        let info = engine.get_info(Effect::Beep).unwrap();
        assert_eq!(info.sample_count, 1600);
        assert_eq!(info.duration_ms, 100);
    }

    #[test]
    fn test_initialize_twice_is_soft() {
        let (engine, _sink, _dir) = test_engine();
        engine.initialize().unwrap();
        engine.initialize().unwrap();
    }

    #[test]
    fn test_initialize_missing_asset_dir() {
        let sink = Arc::new(MockSink::get("mock"));
        let engine = CueEngine::new(CueConfig::new("/nonexistent/cues"), sink);

        assert!(matches!(engine.initialize(), Err(CueError::NotFound(_))));
        // The engine must stay uninitialized.
        assert!(matches!(
            engine.play(Effect::Beep),
            Err(CueError::InvalidState)
        ));
    }

    #[test]
    fn test_partial_load_failure() {
        let (engine, _sink, dir) = test_engine();
        // Corrupt one asset with an odd length.
        std::fs::write(
            dir.path().join(Effect::Error.asset_file()),
            vec![0u8; 101],
        )
        .unwrap();

        engine.initialize().unwrap();
        assert!(!engine.is_loaded(Effect::Error));
        assert!(engine.is_loaded(Effect::Beep));
        assert!(matches!(
            engine.play(Effect::Error),
            Err(CueError::NotFound(_))
        ));
        assert!(matches!(
            engine.get_info(Effect::Error),
            Err(CueError::NotFound(_))
        ));
    }

    #[test]
    fn test_every_effect_failing_is_fatal() {
        let (engine, _sink, dir) = test_engine();
        for effect in Effect::ALL {
            std::fs::remove_file(dir.path().join(effect.asset_file())).unwrap();
        }

        assert!(matches!(
            engine.initialize(),
            Err(CueError::NoEffectsAvailable)
        ));
        assert!(matches!(
            engine.play(Effect::Beep),
            Err(CueError::InvalidState)
        ));
    }

    #[test]
    fn test_play_submits_whole_buffer() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.play(Effect::Beep).unwrap();

        assert!(sink.is_consumer_running());
        let submitted = sink.submitted();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].len(), 1600);
        assert!(submitted[0].iter().all(|&s| s == 100));
    }

    #[test]
    fn test_play_propagates_sink_failure() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        sink.set_fail_submissions(true);
        assert!(matches!(
            engine.play(Effect::Beep),
            Err(CueError::SinkFailure(_))
        ));
    }

    #[test]
    fn test_play_file_without_initialize() {
        let (engine, sink, dir) = test_engine();

        let path = dir.path().join("custom.pcm");
        write_pcm(&path, &[7i16; 32]).unwrap();

        engine.play_file(&path).unwrap();
        assert!(sink.is_consumer_running());
        assert_eq!(sink.submitted()[0], vec![7i16; 32]);
    }

    #[test]
    fn test_play_file_errors() {
        let (engine, _sink, dir) = test_engine();

        assert!(matches!(
            engine.play_file(""),
            Err(CueError::InvalidArgument(_))
        ));
        assert!(matches!(
            engine.play_file("/missing.pcm"),
            Err(CueError::NotFound(_))
        ));

        let odd = dir.path().join("odd.pcm");
        std::fs::write(&odd, vec![0u8; 33]).unwrap();
        assert!(matches!(
            engine.play_file(&odd),
            Err(CueError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_stop_clears_before_next_play() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.play(Effect::Beep).unwrap();
        engine.stop();
        engine.play(Effect::Dice).unwrap();

        let events = sink.events();
        let last_clear = events
            .iter()
            .rposition(|e| *e == SinkEvent::Cleared)
            .unwrap();
        let last_submit = events
            .iter()
            .rposition(|e| matches!(e, SinkEvent::Submitted(_)))
            .unwrap();
        assert!(last_clear < last_submit);
    }

    #[test]
    fn test_deinitialize_then_reinitialize() {
        let (engine, _sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.deinitialize();
        for effect in Effect::ALL {
            assert!(!engine.is_loaded(effect));
        }
        assert!(matches!(
            engine.play(Effect::Beep),
            Err(CueError::InvalidState)
        ));

        // A full cycle restores every previously loaded effect.
        engine.initialize().unwrap();
        for effect in Effect::ALL {
            assert!(engine.is_loaded(effect));
        }
    }

    #[test]
    fn test_deinitialize_when_uninitialized() {
        let (engine, sink, _dir) = test_engine();
        engine.deinitialize();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_start_loop_requires_initialize_and_load() {
        let (engine, _sink, dir) = test_engine();
        assert!(matches!(
            engine.start_loop(Effect::Dice),
            Err(CueError::InvalidState)
        ));

        std::fs::remove_file(dir.path().join(Effect::Dice.asset_file())).unwrap();
        engine.initialize().unwrap();
        assert!(matches!(
            engine.start_loop(Effect::Dice),
            Err(CueError::NotFound(_))
        ));
    }

    #[test]
    fn test_loop_resubmits_until_stopped() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.start_loop(Effect::Dice).unwrap();
        eventually(
            || sink.submission_count() >= 3,
            "loop never resubmitted the effect",
        );

        engine.stop_loop();
        assert!(!engine.looper.is_running());
        assert!(sink.events().contains(&SinkEvent::Cleared));

        // The thread is joined, so no submission can land after the
        // count is sampled here.
        let settled = sink.submission_count();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(sink.submission_count(), settled);
    }

    #[test]
    fn test_stop_loop_clear_is_final() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.start_loop(Effect::Dice).unwrap();
        eventually(|| sink.submission_count() >= 1, "loop never submitted");
        engine.stop_loop();

        // The thread is joined before the clear, so nothing can be
        // submitted behind it.
        let events = sink.events();
        let last_clear = events
            .iter()
            .rposition(|e| *e == SinkEvent::Cleared)
            .unwrap();
        assert!(!events[last_clear..]
            .iter()
            .any(|e| matches!(e, SinkEvent::Submitted(_))));
    }

    #[test]
    fn test_loop_respects_sink_capacity() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        sink.set_free_capacity(SMALL_SAMPLES - 1);
        engine.start_loop(Effect::Dice).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(sink.submission_count(), 0);

        sink.set_free_capacity(usize::MAX);
        eventually(
            || sink.submission_count() >= 1,
            "loop never submitted after capacity freed",
        );
        engine.stop_loop();
    }

    #[test]
    fn test_loop_retries_after_submit_failure() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        sink.set_fail_submissions(true);
        engine.start_loop(Effect::Dice).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(sink.submission_count(), 0);

        sink.set_fail_submissions(false);
        eventually(
            || sink.submission_count() >= 1,
            "loop never recovered from submit failure",
        );
        engine.stop_loop();
    }

    #[test]
    fn test_start_loop_twice_spawns_one_thread() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.start_loop(Effect::Beep).unwrap();
        eventually(
            || sink.submission_count() >= 1,
            "loop never submitted the first effect",
        );

        // Restarting with a different effect only retargets the live
        // thread.
        engine.start_loop(Effect::Dice).unwrap();
        eventually(
            || {
                sink.submitted()
                    .iter()
                    .any(|buf| buf.len() == SMALL_SAMPLES)
            },
            "loop never picked up the retargeted effect",
        );

        assert_eq!(engine.looper.spawn_count(), 1);
        engine.stop_loop();
    }

    #[test]
    fn test_stop_loop_when_not_running() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();
        engine.stop_loop();
        // No clear is issued when nothing was looping.
        assert!(!sink.events().contains(&SinkEvent::Cleared));
    }

    #[test]
    fn test_deinitialize_stops_loop_first() {
        let (engine, sink, _dir) = test_engine();
        engine.initialize().unwrap();

        engine.start_loop(Effect::Dice).unwrap();
        eventually(|| sink.submission_count() >= 1, "loop never submitted");

        engine.deinitialize();
        assert!(!engine.looper.is_running());
        assert!(!engine.is_loaded(Effect::Dice));
    }
}
