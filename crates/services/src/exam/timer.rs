use tracing::debug;

/// Result of one tick of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer is not running; the tick was ignored.
    Idle,
    Running { remaining: u32 },
    /// Remaining time reached zero on this tick. Reported once.
    Expired,
}

/// Pure countdown driven by external one-second ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CountdownTimer {
    initial: u32,
    remaining: u32,
    running: bool,
    expired: bool,
}

impl CountdownTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting down from `initial_seconds`.
    ///
    /// Returns `false` without effect if the timer is already running or has expired.
    pub fn start(&mut self, initial_seconds: u32) -> bool {
        if self.running || self.expired {
            return false;
        }
        self.initial = initial_seconds;
        self.remaining = initial_seconds;
        self.running = true;
        debug!(initial_seconds, "timer started");
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            self.expired = true;
            debug!("timer expired");
            return TickOutcome::Expired;
        }
        TickOutcome::Running {
            remaining: self.remaining,
        }
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[must_use]
    pub fn elapsed(&self) -> u32 {
        self.initial - self.remaining
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expired
    }
}

/// Formats seconds as `HH:MM:SS`. Hours are not wrapped.
#[must_use]
pub fn format_hms(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}
