use arrayvec::ArrayVec;

/// Something a clock tick reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ClockEvent {
    /// One second elapsed; `remaining` seconds are left.
    Tick { remaining: u32 },
    /// The countdown reached zero. Reported once per start.
    Expired,
}

/// Events of a single tick: a `Tick`, possibly followed by `Expired`.
pub type ClockEvents = ArrayVec<ClockEvent, 2>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum ClockState {
    Idle,
    Running { remaining: u32 },
    Stopped { remaining: u32 },
    Expired,
}

/// Cooperative per-round countdown.
///
/// The host's scheduler calls [`RoundClock::tick`] once per second; the clock
/// never schedules anything by itself, so there is at most one outstanding
/// callback per round, owned by the host.
///
/// # Example
///
/// ```
/// use heirloom_engine::{ClockEvent, RoundClock};
///
/// let mut clock = RoundClock::new();
/// clock.start(2);
///
/// assert_eq!(clock.tick().as_slice(), [ClockEvent::Tick { remaining: 1 }]);
/// assert_eq!(
///     clock.tick().as_slice(),
///     [ClockEvent::Tick { remaining: 0 }, ClockEvent::Expired]
/// );
/// assert!(clock.tick().is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct RoundClock {
    state: ClockState,
    elapsed_secs: u32,
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundClock {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ClockState::Idle,
            elapsed_secs: 0,
        }
    }

    #[must_use]
    pub const fn state(&self) -> ClockState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// Seconds left; zero unless running or stopped mid-count.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        match self.state {
            ClockState::Running { remaining } | ClockState::Stopped { remaining } => remaining,
            ClockState::Idle | ClockState::Expired => 0,
        }
    }

    /// Seconds ticked since the clock was created, across restarts.
    #[must_use]
    pub const fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    /// (Re)starts the countdown. A zero limit counts as one second.
    pub fn start(&mut self, limit_secs: u32) {
        self.state = ClockState::Running {
            remaining: limit_secs.max(1),
        };
    }

    /// Advances one second.
    ///
    /// Returns nothing unless the clock is running.
    pub fn tick(&mut self) -> ClockEvents {
        let mut events = ClockEvents::new();
        let ClockState::Running { remaining } = self.state else {
            return events;
        };
        let remaining = remaining.saturating_sub(1);
        self.elapsed_secs = self.elapsed_secs.saturating_add(1);
        events.push(ClockEvent::Tick { remaining });
        if remaining == 0 {
            self.state = ClockState::Expired;
            events.push(ClockEvent::Expired);
        } else {
            self.state = ClockState::Running { remaining };
        }
        events
    }

    /// Cancels future ticks. Idempotent; harmless after expiration.
    pub fn stop(&mut self) {
        if let ClockState::Running { remaining } = self.state {
            self.state = ClockState::Stopped { remaining };
        }
    }

    /// Deducts `secs` from a running countdown, never going below one second.
    ///
    /// Returns the new remaining time, or `None` when the clock is not running.
    pub fn apply_penalty(&mut self, secs: u32) -> Option<u32> {
        let ClockState::Running { remaining } = &mut self.state else {
            return None;
        };
        *remaining = remaining.saturating_sub(secs).max(1);
        Some(*remaining)
    }
}
