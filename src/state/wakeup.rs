use std::time::Instant;

/// What the driver must do to make its one armed timer match the session's
/// next deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Retarget<H> {
    /// Timer to cancel before anything else.
    pub cancel: Option<H>,
    /// Deadline to arm a new timer for.
    pub arm: Option<Instant>,
}

/// The single timer a driver keeps for a session, keyed by its deadline.
///
/// `H` is whatever handle cancels the timer (a task handle in the UI).
#[derive(Clone, Debug)]
pub struct WakeupSlot<H> {
    armed: Option<(Instant, H)>,
}

impl<H> Default for WakeupSlot<H> {
    fn default() -> Self {
        Self { armed: None }
    }
}

impl<H> WakeupSlot<H> {
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|(deadline, _)| *deadline)
    }

    /// An unchanged deadline keeps the armed timer; anything else replaces it.
    pub fn retarget(&mut self, next: Option<Instant>) -> Retarget<H> {
        if next.is_some() && self.deadline() == next {
            return Retarget {
                cancel: None,
                arm: None,
            };
        }
        Retarget {
            cancel: self.armed.take().map(|(_, handle)| handle),
            arm: next,
        }
    }

    pub fn arm(&mut self, deadline: Instant, handle: H) {
        self.armed = Some((deadline, handle));
    }

    /// The armed timer went off; it no longer needs cancelling.
    pub fn fired(&mut self) {
        self.armed = None;
    }
}
