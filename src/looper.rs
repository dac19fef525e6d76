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

//! The loop driver: a background thread that resubmits one cached
//! effect to the sink whenever the sink has room for it.
//!
//! This is a deliberate polling producer. Cue effects are sub-second and
//! fire at UI frequency, so a few bounded wakeups per effect are cheaper
//! than wiring the sink up for readiness callbacks.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::Duration,
};

use parking_lot::Mutex;
use thread_priority::{set_current_thread_priority, ThreadPriority, ThreadPriorityValue};
use tracing::{debug, warn};

use crate::effect::Effect;
use crate::engine::Shared;
use crate::error::CueError;
use crate::sink::Sink;

/// Stack size for the loop thread. The body only polls and submits, so
/// it stays far below this.
const LOOP_THREAD_STACK: usize = 128 * 1024;

/// Best-effort priority for the loop thread; keeps resubmission ahead of
/// UI work without requiring RT privileges.
const LOOP_THREAD_PRIORITY: u8 = 40;

/// Drives looped playback of a single selected effect. At most one loop
/// thread exists at any time; starting again while running only changes
/// which effect the existing thread submits next.
pub(crate) struct LoopDriver {
    /// The thread's self-termination signal, observed within one poll
    /// interval.
    running: Arc<AtomicBool>,
    /// Index of the effect the thread will submit next cycle.
    active: Arc<AtomicUsize>,
    /// Join handle of the live thread. `Some` iff a thread was spawned
    /// and not yet joined.
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    /// Total threads spawned over the driver's lifetime.
    spawns: AtomicUsize,
}

impl LoopDriver {
    pub(crate) fn new() -> LoopDriver {
        LoopDriver {
            running: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
            handle: Mutex::new(None),
            spawns: AtomicUsize::new(0),
        }
    }

    /// Returns true if the loop thread has been started and not stopped.
    pub(crate) fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn spawn_count(&self) -> usize {
        self.spawns.load(Ordering::Relaxed)
    }

    /// Starts looping the given effect, or retargets the live thread to
    /// it. The retarget takes effect on the thread's next cycle; one
    /// more submission of the previous effect may slip through, which is
    /// acceptable for a fire-and-forget cue.
    pub(crate) fn start(&self, shared: Arc<Shared>, effect: Effect) -> Result<(), CueError> {
        self.active.store(effect.index(), Ordering::Release);

        let mut handle = self.handle.lock();
        if self.running.load(Ordering::Acquire) && handle.is_some() {
            debug!(effect = %effect, "Loop already running, retargeted");
            return Ok(());
        }

        self.running.store(true, Ordering::Release);

        let running = self.running.clone();
        let active = self.active.clone();
        let spawned = thread::Builder::new()
            .name("cue-loop".to_string())
            .stack_size(LOOP_THREAD_STACK)
            .spawn(move || loop_body(shared, running, active));

        match spawned {
            Ok(join_handle) => {
                self.spawns.fetch_add(1, Ordering::Relaxed);
                *handle = Some(join_handle);
                debug!(effect = %effect, "Loop thread started");
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::Release);
                warn!(error = %e, "Failed to spawn loop thread");
                Err(CueError::OutOfMemory(LOOP_THREAD_STACK))
            }
        }
    }

    /// Stops the loop: clears the running flag, joins the thread, then
    /// discards the sink's queued audio. Joining first means no cycle
    /// can slip a submission in behind the clear; the join is bounded
    /// by one poll interval. No-op when the loop is not running.
    pub(crate) fn stop(&self, sink: &dyn Sink) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }

        if let Some(join_handle) = self.handle.lock().take() {
            if join_handle.join().is_err() {
                warn!("Loop thread panicked");
            }
        }

        sink.stop_consumer_and_clear();
        debug!("Loop stopped");
    }
}

/// One poll cycle at a time until the running flag drops. Not-ready
/// conditions back off for the retry interval rather than erroring, so
/// `start_loop` may race a slow load without killing the loop.
fn loop_body(shared: Arc<Shared>, running: Arc<AtomicBool>, active: Arc<AtomicUsize>) {
    raise_priority();

    let poll = shared.config().poll_interval();
    let retry = shared.config().retry_interval();

    loop {
        if !running.load(Ordering::Acquire) {
            break;
        }

        let backoff = cycle(&shared, &active, poll, retry);
        if let Some(backoff) = backoff {
            thread::sleep(backoff);
        }
    }

    debug!("Loop thread exiting");
}

/// Runs one cycle; returns how long to sleep before the next one, or
/// `None` to go straight into it after a successful submission.
fn cycle(
    shared: &Shared,
    active: &AtomicUsize,
    poll: Duration,
    retry: Duration,
) -> Option<Duration> {
    if !shared.is_initialized() {
        return Some(retry);
    }

    let effect = match Effect::from_index(active.load(Ordering::Acquire)) {
        Ok(effect) => effect,
        Err(_) => return Some(retry),
    };

    let store = shared.store().read();
    let samples = match store.samples(effect) {
        Some(samples) => samples,
        None => return Some(retry),
    };

    if shared.sink().free_capacity_samples() < samples.len() {
        return Some(poll);
    }

    // Always a whole effect per submission; partial buffers would
    // truncate the audible shape.
    if let Err(e) = shared.sink().submit(samples) {
        warn!(effect = %effect, error = %e, "Loop submission failed");
        return Some(retry);
    }

    None
}

fn raise_priority() {
    let priority = match ThreadPriorityValue::try_from(LOOP_THREAD_PRIORITY) {
        Ok(priority) => priority,
        Err(_) => return,
    };
    if set_current_thread_priority(ThreadPriority::Crossplatform(priority)).is_err() {
        debug!("Could not raise loop thread priority, continuing at default");
    }
}
