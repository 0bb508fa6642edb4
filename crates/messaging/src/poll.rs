//! Fixed-interval poll scheduling
//!
//! The loop itself owns no timer thread; the host drives it by asking
//! [`PollLoop::due`] and calling [`PollLoop::begin_cycle`] when it is. This
//! keeps the whole engine single-threaded and the schedule decisions pure
//! and testable.
//!
//! Every cycle is stamped with a [`CycleTag`] capturing the generation and
//! peer active at call time. Results are only applied while
//! [`PollLoop::accepts`] still matches the tag, so a slow response for an
//! old peer can never land in the currently displayed thread.
//!
//! Failed cycles do not change the schedule: the cadence is fixed and the
//! next successful cycle self-heals the view. No backoff is applied on
//! repeated failures; that is a deliberate choice, not an oversight.

use std::time::{Duration, Instant};

use crate::models::UserId;

/// Default fetch cadence
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Identity of one poll cycle, captured when its fetches are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTag {
    /// Incremented on every (re)start; invalidates older in-flight cycles
    pub generation: u64,
    /// Peer selected when the cycle began, if any
    pub peer: Option<UserId>,
}

/// Fixed-interval scheduler for the fetch-and-merge sequence
#[derive(Debug)]
pub struct PollLoop {
    interval: Duration,
    running: bool,
    generation: u64,
    peer: Option<UserId>,
    next_due: Option<Instant>,
}

impl Default for PollLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl PollLoop {
    pub fn new() -> Self {
        Self::with_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            running: false,
            generation: 0,
            peer: None,
            next_due: None,
        }
    }

    /// Begin polling for the given peer (or just the conversation list when
    /// no peer is selected). The first cycle is due immediately so the view
    /// is never blank for a full interval.
    ///
    /// Also used on peer change: bumps the generation so any cycle still in
    /// flight for the previous peer is discarded on completion.
    pub fn start(&mut self, peer: Option<UserId>, now: Instant) {
        self.generation += 1;
        self.running = true;
        self.peer = peer;
        self.next_due = Some(now);
    }

    /// Cancel the schedule. In-flight cycles are not aborted, but their
    /// results stop being accepted.
    pub fn stop(&mut self) {
        self.running = false;
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Peer the loop is currently addressed to
    pub fn peer(&self) -> Option<UserId> {
        self.peer
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// When the next cycle is due, for hosts that want to sleep until then
    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Whether a cycle should fire now
    pub fn due(&self, now: Instant) -> bool {
        self.running && self.next_due.is_some_and(|due| now >= due)
    }

    /// Start a cycle: advance the schedule by one interval and return the
    /// tag to stamp the cycle's fetches with. `None` if not due.
    pub fn begin_cycle(&mut self, now: Instant) -> Option<CycleTag> {
        if !self.due(now) {
            return None;
        }
        self.next_due = Some(now + self.interval);
        Some(CycleTag {
            generation: self.generation,
            peer: self.peer,
        })
    }

    /// Whether a completed cycle's results may still be applied
    pub fn accepts(&self, tag: &CycleTag) -> bool {
        self.running && tag.generation == self.generation && tag.peer == self.peer
    }
}
