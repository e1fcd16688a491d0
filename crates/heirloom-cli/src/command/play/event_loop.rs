use std::{
    io,
    time::{Duration, Instant},
};

use crossterm::event::{self, Event as TerminalEvent};

/// Events the interactive round reacts to.
#[derive(Debug, Clone, derive_more::IsVariant, derive_more::From)]
pub(super) enum PlayEvent {
    /// One second of the round clock.
    Tick,
    /// Key presses, resizes and other terminal events.
    Terminal(TerminalEvent),
}

/// Fixed-rate tick source multiplexed with terminal input.
///
/// Terminal events that are already queued are returned before a due tick,
/// so input typed just before a deadline is applied before the clock moves.
#[derive(Debug)]
pub(super) struct EventLoop {
    tick_interval: Duration,
    last_tick: Instant,
}

impl EventLoop {
    pub(super) fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            last_tick: Instant::now(),
        }
    }

    /// Restarts the tick phase, e.g. after a round starts.
    pub(super) fn reset(&mut self) {
        self.last_tick = Instant::now();
    }

    /// Blocks until the next tick is due or a terminal event arrives.
    pub(super) fn next(&mut self) -> io::Result<PlayEvent> {
        loop {
            if event::poll(Duration::ZERO)? {
                return Ok(event::read()?.into());
            }

            let now = Instant::now();
            let next_tick_at = self.last_tick + self.tick_interval;
            if now >= next_tick_at {
                self.last_tick = if now.duration_since(next_tick_at) >= self.tick_interval {
                    now
                } else {
                    next_tick_at
                };
                return Ok(PlayEvent::Tick);
            }

            if event::poll(next_tick_at.saturating_duration_since(now))? {
                return Ok(event::read()?.into());
            }
        }
    }
}
