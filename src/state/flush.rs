use std::time::{Duration, Instant};

use tracing::debug;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    PendingFlush { deadline: Instant },
    Flushing { manual_queued: bool },
    FlushFailed,
}

/// What the caller should do after a manual save request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManualSave {
    FlushNow,
    /// A flush is in flight; another one follows it if still needed.
    Queued,
}

/// What the caller should do after a flush resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUp {
    None,
    FlushNow,
    Rearmed,
}

/// File-level autosave debounce with at most one flush in flight.
///
/// Deadlines are plain `Instant`s; the driver sleeps until [`deadline`] and
/// then asks [`is_due`].
///
/// [`deadline`]: FlushScheduler::deadline
/// [`is_due`]: FlushScheduler::is_due
#[derive(Clone, Debug)]
pub struct FlushScheduler {
    delay: Duration,
    state: FlushState,
}

impl Default for FlushScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}

impl FlushScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: FlushState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> FlushState {
        self.state
    }

    pub fn is_flushing(&self) -> bool {
        matches!(self.state, FlushState::Flushing { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            FlushState::PendingFlush { deadline } => Some(deadline),
            _ => None,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Debounce: every edit restarts the timer, except while flushing.
    pub fn note_edit(&mut self, now: Instant) {
        match self.state {
            FlushState::Flushing { .. } => {}
            FlushState::Idle | FlushState::PendingFlush { .. } | FlushState::FlushFailed => {
                self.arm(now);
            }
        }
    }

    pub fn request_manual(&mut self) -> ManualSave {
        match self.state {
            FlushState::Flushing { .. } => {
                self.state = FlushState::Flushing {
                    manual_queued: true,
                };
                ManualSave::Queued
            }
            FlushState::Idle | FlushState::PendingFlush { .. } | FlushState::FlushFailed => {
                ManualSave::FlushNow
            }
        }
    }

    /// Returns false when a flush is already in flight.
    pub fn begin(&mut self) -> bool {
        if self.is_flushing() {
            return false;
        }
        self.state = FlushState::Flushing {
            manual_queued: false,
        };
        debug!("flush started");
        true
    }

    pub fn resolve_success(&mut self, still_dirty: bool, now: Instant) -> FollowUp {
        let manual_queued = matches!(
            self.state,
            FlushState::Flushing {
                manual_queued: true
            }
        );
        self.state = FlushState::Idle;

        if !still_dirty {
            return FollowUp::None;
        }
        if manual_queued {
            return FollowUp::FlushNow;
        }
        self.arm(now);
        FollowUp::Rearmed
    }

    /// Never retries by itself. Edits that arrived mid-flight still get the
    /// debounce they would have armed outside a flush.
    pub fn resolve_failure(&mut self, edited_in_flight: bool, now: Instant) -> FollowUp {
        if edited_in_flight {
            self.arm(now);
            FollowUp::Rearmed
        } else {
            self.state = FlushState::FlushFailed;
            FollowUp::None
        }
    }

    /// Disarms a pending timer. An in-flight flush keeps its state.
    pub fn cancel(&mut self) {
        if let FlushState::PendingFlush { .. } = self.state {
            self.state = FlushState::Idle;
        }
    }

    fn arm(&mut self, now: Instant) {
        self.state = FlushState::PendingFlush {
            deadline: now + self.delay,
        };
    }
}
