//! Leading-and-trailing throttle over an explicit clock.
//!
//! The state machine never sleeps or spawns; it tells its caller whether to
//! run now, to arm a timer, or to drop the call. Time is a [`Duration`]
//! since an arbitrary origin supplied by the host (`performance.now()` in a
//! browser, a counter in tests).

use std::time::Duration;

/// What the caller should do with one incoming call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the handler now.
    Run,
    /// Arm a single timer for the given delay; run when it fires.
    Schedule(Duration),
    /// A timer is already armed; this call folds into it.
    Coalesced,
}

#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last_run: Option<Duration>,
    pending: bool,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether a trailing run is armed.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record a run that happened outside [`Throttle::call`] (e.g. the
    /// initial pass on attach), opening a new window at `now`.
    pub fn mark_run(&mut self, now: Duration) {
        self.last_run = Some(now);
    }

    pub fn call(&mut self, now: Duration) -> Decision {
        if self.pending {
            return Decision::Coalesced;
        }
        let elapsed = self.last_run.map(|t| now.saturating_sub(t));
        match elapsed {
            Some(e) if e < self.interval => {
                self.pending = true;
                Decision::Schedule(self.interval - e)
            }
            _ => {
                self.last_run = Some(now);
                Decision::Run
            }
        }
    }

    /// The armed timer fired. Returns `false` when nothing was pending,
    /// in which case the caller must not run.
    pub fn fire(&mut self, now: Duration) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        self.last_run = Some(now);
        true
    }

    /// Disarm the trailing run.
    pub fn cancel(&mut self) {
        self.pending = false;
    }
}
