//! Lamport clock shared by every replica.
//!
//! A replica mints node ids from `clock + 1`. Remote operations merge the
//! clock to `max(local, remote) + 1`, so any id minted afterwards is
//! strictly greater than every id this replica has seen. The `Ordered`
//! merge policy relies on that property.
//!
//! Complexity:
//! - tick: O(1)
//! - update: O(1)

use std::cmp::Ordering;

use serde::Deserialize;
use serde::Serialize;

/// A Lamport clock for partial ordering of events.
///
/// Serializes as a bare integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LamportClock {
    time: u64,
}

impl LamportClock {
    /// Create a new clock starting at 0.
    pub fn new() -> LamportClock {
        return LamportClock { time: 0 };
    }

    /// Create a clock with a specific starting time.
    pub fn with_time(time: u64) -> LamportClock {
        return LamportClock { time };
    }

    /// Get the current time.
    #[inline]
    pub fn time(&self) -> u64 {
        return self.time;
    }

    /// The time the next local event will carry, without advancing.
    #[inline]
    pub fn peek(&self) -> u64 {
        return self.time + 1;
    }

    /// Increment the clock for a local event.
    /// Returns the new time.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.time += 1;
        return self.time;
    }

    /// Update the clock upon receiving an event with the given timestamp.
    /// Sets local time to max(local, remote) + 1.
    /// Returns the new time.
    #[inline]
    pub fn update(&mut self, remote_time: u64) -> u64 {
        self.time = self.time.max(remote_time) + 1;
        return self.time;
    }
}

impl PartialOrd for LamportClock {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl Ord for LamportClock {
    fn cmp(&self, other: &Self) -> Ordering {
        return self.time.cmp(&other.time);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamport_tick() {
        let mut clock = LamportClock::new();
        assert_eq!(clock.time(), 0);
        assert_eq!(clock.peek(), 1);

        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.time(), 2);
    }

    #[test]
    fn lamport_update() {
        let mut clock = LamportClock::new();
        clock.tick(); // time = 1

        // Receive an event stamped 5
        assert_eq!(clock.update(5), 6);
        assert_eq!(clock.time(), 6);

        // Older events still advance the clock
        assert_eq!(clock.update(3), 7);
        assert_eq!(clock.time(), 7);
    }

    #[test]
    fn lamport_ordering() {
        let a = LamportClock::with_time(5);
        let b = LamportClock::with_time(10);

        assert!(a < b);
        assert!(b > a);
        assert_eq!(a, LamportClock::with_time(5));
    }

    #[test]
    fn serializes_as_integer() {
        let clock = LamportClock::with_time(12);
        assert_eq!(serde_json::to_string(&clock).unwrap(), "12");
        let back: LamportClock = serde_json::from_str("12").unwrap();
        assert_eq!(back, clock);
    }
}
