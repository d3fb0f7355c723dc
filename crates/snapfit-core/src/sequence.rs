//! Completion sequencing: seating progress and the cutaway reveal

use std::collections::BTreeSet;
use std::time::Duration;

use crate::assembly::Assembly;
use crate::plug::PlugState;
use crate::socket::{Plugged, SocketId};

/// Counts `plugged` notifications until every tracked socket is filled
#[derive(Debug, Clone, Default)]
pub struct SeatingProgress {
    pending: BTreeSet<SocketId>,
    total: usize,
    completed: bool,
}

impl SeatingProgress {
    pub fn new(sockets: impl IntoIterator<Item = SocketId>) -> Self {
        let pending: BTreeSet<SocketId> = sockets.into_iter().collect();
        Self {
            total: pending.len(),
            pending,
            completed: false,
        }
    }

    /// Track the home socket (first compatible socket) of every active plug
    pub fn for_active_plugs(assembly: &Assembly) -> Self {
        Self::new(
            assembly
                .plugs()
                .iter()
                .filter(|p| p.state() != PlugState::Disabled)
                .filter_map(|p| p.sockets().first().copied()),
        )
    }

    /// Record a notification. Returns true exactly once, when the last
    /// tracked socket is filled.
    pub fn on_plugged(&mut self, event: &Plugged) -> bool {
        if !self.pending.remove(&event.socket) || self.completed {
            return false;
        }
        if self.pending.is_empty() {
            self.completed = true;
            return true;
        }
        false
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.completed
    }
}

/// Cut plane distance the reveal starts from
pub const CUTAWAY_START: f64 = -0.2;
/// Cut plane advance per step
pub const CUTAWAY_INCREMENT: f64 = 0.002;
/// Time between two steps
pub const CUTAWAY_INTERVAL: Duration = Duration::from_millis(20);
/// Wait before the first step
pub const CUTAWAY_DELAY: Duration = Duration::from_millis(500);

/// Animates the cut plane distance from [`CUTAWAY_START`] up to 0.
///
/// Driven by wall-clock deltas so it works the same under a frame loop and a
/// fixed-step simulation.
#[derive(Debug, Clone)]
pub struct CutawayReveal {
    value: f64,
    start: f64,
    increment: f64,
    interval: Duration,
    elapsed: Duration,
    next_step_at: Duration,
    steps: u32,
    total_steps: u32,
}

impl Default for CutawayReveal {
    fn default() -> Self {
        Self::new(CUTAWAY_START, CUTAWAY_INCREMENT, CUTAWAY_INTERVAL, CUTAWAY_DELAY)
    }
}

impl CutawayReveal {
    pub fn new(start: f64, increment: f64, interval: Duration, delay: Duration) -> Self {
        let total_steps = if start < 0.0 && increment > 0.0 {
            (-start / increment).round().max(1.0) as u32
        } else {
            0
        };
        Self {
            value: start.min(0.0),
            start,
            increment,
            interval,
            elapsed: Duration::ZERO,
            next_step_at: delay,
            steps: 0,
            total_steps,
        }
    }

    /// Advance the clock. Returns the new cut plane distance if it moved.
    pub fn tick(&mut self, delta: Duration) -> Option<f64> {
        if self.is_finished() {
            return None;
        }
        self.elapsed += delta;

        let before = self.steps;
        while self.elapsed >= self.next_step_at && !self.is_finished() {
            self.steps += 1;
            self.next_step_at += self.interval;
        }
        if self.steps == before {
            return None;
        }

        self.value = if self.is_finished() {
            0.0
        } else {
            (self.start + self.increment * f64::from(self.steps)).min(0.0)
        };
        Some(self.value)
    }

    /// Current cut plane distance
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of steps taken so far
    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }

    pub fn is_finished(&self) -> bool {
        self.steps >= self.total_steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plug::PlugId;

    fn plugged(socket: usize) -> Plugged {
        Plugged {
            socket: SocketId(socket),
            plug: PlugId(socket),
        }
    }

    #[test]
    fn test_completion_reported_once() {
        let mut progress = SeatingProgress::new([SocketId(0), SocketId(1)]);
        assert_eq!(progress.total(), 2);
        assert!(!progress.on_plugged(&plugged(0)));
        assert!(!progress.on_plugged(&plugged(0)));
        assert_eq!(progress.remaining(), 1);

        // untracked sockets are ignored
        assert!(!progress.on_plugged(&plugged(7)));

        assert!(progress.on_plugged(&plugged(1)));
        assert!(progress.is_complete());
        assert!(!progress.on_plugged(&plugged(1)));
    }

    #[test]
    fn test_for_active_plugs() {
        use crate::plug::PlugParams;
        use crate::socket::SocketParams;
        use crate::xfo::Xfo;

        let mut assembly = Assembly::new("progress");
        let a = assembly.add_socket("a", SocketParams::default(), Xfo::IDENTITY);
        let b = assembly.add_socket("b", SocketParams::default(), Xfo::IDENTITY);
        let pa = assembly.add_plug("aPlug", PlugParams::default(), Xfo::IDENTITY);
        let pb = assembly.add_plug("bPlug", PlugParams::default(), Xfo::IDENTITY);
        assembly.add_connectable_socket(pa, a);
        assembly.add_connectable_socket(pb, b);
        assembly.add_connectable_socket(pb, a);
        assembly.activate_plug(pa);

        let progress = SeatingProgress::for_active_plugs(&assembly);
        assert_eq!(progress.total(), 1);
        assert_eq!(SeatingProgress::new([a, b]).remaining(), 2);
    }

    #[test]
    fn test_reveal_waits_for_delay() {
        let mut reveal = CutawayReveal::default();
        assert_eq!(reveal.value(), -0.2);
        assert_eq!(reveal.tick(Duration::from_millis(499)), None);

        let value = reveal.tick(Duration::from_millis(1)).unwrap();
        assert!((value - -0.198).abs() < 1e-12);
        assert_eq!(reveal.tick(Duration::from_millis(10)), None);
        assert!(reveal.tick(Duration::from_millis(10)).is_some());
        assert_eq!(reveal.steps(), 2);
    }

    #[test]
    fn test_reveal_reaches_zero_and_stops() {
        let mut reveal = CutawayReveal::default();
        assert_eq!(reveal.total_steps(), 100);

        let mut ticks = 0;
        while !reveal.is_finished() {
            reveal.tick(CUTAWAY_INTERVAL);
            ticks += 1;
            assert!(reveal.value() <= 0.0);
            assert!(ticks < 1000);
        }
        assert_eq!(reveal.value(), 0.0);
        assert_eq!(reveal.tick(Duration::from_secs(1)), None);
        assert_eq!(reveal.value(), 0.0);
    }

    #[test]
    fn test_reveal_catches_up_on_long_frame() {
        let mut reveal = CutawayReveal::default();
        let value = reveal.tick(Duration::from_millis(500 + 20 * 9)).unwrap();
        assert_eq!(reveal.steps(), 10);
        assert!((value - -0.18).abs() < 1e-12);
    }
}
