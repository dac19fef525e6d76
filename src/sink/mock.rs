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
    fmt,
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};

use parking_lot::Mutex;

use super::{Sink, SinkError};

/// An operation observed by the mock sink, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// `start_consumer` was called.
    ConsumerStarted,
    /// `submit` accepted a buffer of this many samples.
    Submitted(usize),
    /// `stop_consumer_and_clear` was called.
    Cleared,
}

/// A mock sink. Doesn't actually play anything; records every call so
/// tests can assert on ordering and submission contents.
pub struct MockSink {
    name: String,
    consumer_running: AtomicBool,
    free_capacity: AtomicUsize,
    fail_submissions: AtomicBool,
    events: Mutex<Vec<SinkEvent>>,
    submitted: Mutex<Vec<Vec<i16>>>,
}

impl MockSink {
    /// Gets a mock sink with effectively unlimited queue headroom.
    pub fn get(name: &str) -> MockSink {
        MockSink {
            name: name.to_string(),
            consumer_running: AtomicBool::new(false),
            free_capacity: AtomicUsize::new(usize::MAX),
            fail_submissions: AtomicBool::new(false),
            events: Mutex::new(Vec::new()),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Returns true if the consumer is currently running.
    pub fn is_consumer_running(&self) -> bool {
        self.consumer_running.load(Ordering::Relaxed)
    }

    /// Sets the free capacity the sink will report.
    pub fn set_free_capacity(&self, samples: usize) {
        self.free_capacity.store(samples, Ordering::Relaxed);
    }

    /// Makes every subsequent submission fail until cleared.
    pub fn set_fail_submissions(&self, fail: bool) {
        self.fail_submissions.store(fail, Ordering::Relaxed);
    }

    /// A snapshot of every recorded event, in call order.
    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    /// The number of accepted submissions so far.
    pub fn submission_count(&self) -> usize {
        self.submitted.lock().len()
    }

    /// A snapshot of every accepted sample buffer.
    pub fn submitted(&self) -> Vec<Vec<i16>> {
        self.submitted.lock().clone()
    }
}

impl Sink for MockSink {
    fn start_consumer(&self) {
        self.consumer_running.store(true, Ordering::Relaxed);
        self.events.lock().push(SinkEvent::ConsumerStarted);
    }

    fn submit(&self, samples: &[i16]) -> Result<(), SinkError> {
        if self.fail_submissions.load(Ordering::Relaxed) {
            return Err(SinkError::Rejected(samples.len()));
        }
        self.events.lock().push(SinkEvent::Submitted(samples.len()));
        self.submitted.lock().push(samples.to_vec());
        Ok(())
    }

    fn free_capacity_samples(&self) -> usize {
        self.free_capacity.load(Ordering::Relaxed)
    }

    fn stop_consumer_and_clear(&self) {
        self.consumer_running.store(false, Ordering::Relaxed);
        let mut events = self.events.lock();
        events.push(SinkEvent::Cleared);
    }
}

impl fmt::Display for MockSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}
