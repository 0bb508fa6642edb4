//! Scroll anchoring for the thread viewport
//!
//! Polling delivers content changes at arbitrary moments relative to user
//! scroll gestures. Auto-scrolling on every update makes reading history
//! unusable; never auto-scrolling makes live chat feel broken. The anchor
//! resolves this with two bits of state: whether the viewport currently sits
//! at the bottom, and whether the user scrolled within a short debounce
//! window. The viewport moves only when both say it is safe.
//!
//! Everything here is pure over injected geometry and time; the platform
//! adapter feeds in scroll events and executes the returned commands.

use std::time::{Duration, Instant};

/// How close to the maximum offset still counts as "at the bottom"
pub const BOTTOM_THRESHOLD: f32 = 50.0;

/// How long after a user scroll event auto-scroll stays suppressed
pub const USER_SCROLL_DEBOUNCE: Duration = Duration::from_millis(500);

/// Viewport geometry at the moment of a scroll event
///
/// Units are whatever the platform measures in (px, points); only ratios
/// and differences matter here.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Current scroll offset from the top
    pub offset: f32,
    /// Visible height
    pub viewport: f32,
    /// Total content height
    pub content: f32,
}

impl Viewport {
    /// Largest reachable offset
    pub fn max_offset(&self) -> f32 {
        (self.content - self.viewport).max(0.0)
    }

    /// Whether the view is within `threshold` of the maximum offset
    pub fn is_at_bottom(&self, threshold: f32) -> bool {
        self.content - self.offset <= self.viewport + threshold
    }
}

/// What the platform adapter should do with the viewport after a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollCommand {
    /// Leave the viewport untouched
    Hold,
    /// Smooth-scroll to the newest message (steady-state arrival)
    AnimateToBottom,
    /// Snap to the newest message without animation (thread switch)
    JumpToBottom,
}

/// Tracks viewport position and user scroll intent
#[derive(Debug)]
pub struct ScrollAnchor {
    at_bottom: bool,
    last_user_scroll: Option<Instant>,
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollAnchor {
    /// A fresh anchor assumes the view opens pinned to the bottom
    pub fn new() -> Self {
        Self {
            at_bottom: true,
            last_user_scroll: None,
        }
    }

    /// Whether the viewport was at the bottom at the last scroll event
    pub fn at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Whether a user scroll happened within the debounce window
    pub fn user_scrolling(&self, now: Instant) -> bool {
        self.last_user_scroll
            .is_some_and(|at| now.duration_since(at) < USER_SCROLL_DEBOUNCE)
    }

    /// Record a user-initiated scroll event: recompute `at_bottom` from the
    /// geometry and restart the debounce window.
    pub fn on_scroll(&mut self, viewport: Viewport, now: Instant) {
        self.at_bottom = viewport.is_at_bottom(BOTTOM_THRESHOLD);
        self.last_user_scroll = Some(now);
    }

    /// Decide what to do with the viewport after the thread content changed
    pub fn on_content_changed(&self, now: Instant) -> ScrollCommand {
        if self.at_bottom && !self.user_scrolling(now) {
            ScrollCommand::AnimateToBottom
        } else {
            ScrollCommand::Hold
        }
    }

    /// A different peer's thread just got its first content: pin to the
    /// bottom instantly so the smooth scroll cannot race the thread switch.
    pub fn on_thread_opened(&mut self) -> ScrollCommand {
        self.at_bottom = true;
        self.last_user_scroll = None;
        ScrollCommand::JumpToBottom
    }
}
