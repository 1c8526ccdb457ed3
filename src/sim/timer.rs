//! Deterministic timer queue
//!
//! The controller only needs to schedule and cancel; the host advances time
//! and dispatches whatever fired.

use serde::{Deserialize, Serialize};

/// Shortest accepted repeat interval (seconds)
const MIN_INTERVAL: f64 = 1e-3;
/// Slack for f32 step accumulation
const DUE_EPSILON: f64 = 1e-6;

/// Opaque handle returned by the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerHandle(u64);

/// What a timer delivers when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerEvent {
    SpawnObstacles,
    ShowGameOver,
}

/// Scheduling capability the controller depends on
pub trait Scheduler {
    fn schedule_repeating(&mut self, interval: f32, event: TimerEvent) -> TimerHandle;
    fn schedule_once(&mut self, delay: f32, event: TimerEvent) -> TimerHandle;
    /// Synchronous; unknown or already finished handles are ignored
    fn cancel(&mut self, handle: TimerHandle);
}

#[derive(Debug, Clone)]
struct Entry {
    handle: TimerHandle,
    due: f64,
    interval: Option<f64>,
    event: TimerEvent,
}

/// Timer queue driven by simulation time
#[derive(Debug, Clone, Default)]
pub struct Timers {
    now: f64,
    next_id: u64,
    entries: Vec<Entry>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulation time seen by this queue
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.entries.iter().any(|e| e.handle == handle)
    }

    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Move time forward and return every event that came due, in firing order.
    /// A repeating timer fires once per elapsed interval.
    pub fn advance(&mut self, dt: f32) -> Vec<TimerEvent> {
        let target = self.now + dt.max(0.0) as f64;
        let mut fired = Vec::new();

        while let Some(index) = self.next_due(target) {
            let entry = &mut self.entries[index];
            fired.push(entry.event);
            match entry.interval {
                Some(interval) => entry.due += interval,
                None => {
                    self.entries.remove(index);
                }
            }
        }

        self.now = target;
        fired
    }

    /// Earliest entry due by `target`; ties go to the older handle
    fn next_due(&self, target: f64) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= target + DUE_EPSILON)
            .min_by(|(_, a), (_, b)| {
                a.due
                    .partial_cmp(&b.due)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.handle.cmp(&b.handle))
            })
            .map(|(i, _)| i)
    }

    fn push(&mut self, delay: f64, interval: Option<f64>, event: TimerEvent) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            handle,
            due: self.now + delay,
            interval,
            event,
        });
        handle
    }
}

impl Scheduler for Timers {
    fn schedule_repeating(&mut self, interval: f32, event: TimerEvent) -> TimerHandle {
        let interval = (interval as f64).max(MIN_INTERVAL);
        self.push(interval, Some(interval), event)
    }

    fn schedule_once(&mut self, delay: f32, event: TimerEvent) -> TimerHandle {
        self.push((delay as f64).max(0.0), None, event)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.entries.retain(|e| e.handle != handle);
    }
}
