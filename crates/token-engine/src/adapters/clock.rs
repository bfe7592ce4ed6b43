//! Logical clock backed by an atomic counter.

use crate::ports::outbound::LogicalClock;
use shared_types::Tick;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter starting at 0; the first `tick` returns 1.
#[derive(Debug, Default)]
pub struct AtomicLogicalClock {
    current: AtomicU64,
}

impl AtomicLogicalClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from a previously observed tick.
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            current: AtomicU64::new(tick),
        }
    }
}

impl LogicalClock for AtomicLogicalClock {
    fn tick(&self) -> Tick {
        self.current.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn now(&self) -> Tick {
        self.current.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_ticks_are_monotonic() {
        let clock = AtomicLogicalClock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.now(), 2);
    }

    #[test]
    fn test_resume() {
        let clock = AtomicLogicalClock::starting_at(41);
        assert_eq!(clock.tick(), 42);
    }

    #[test]
    fn test_concurrent_ticks_are_unique() {
        let clock = Arc::new(AtomicLogicalClock::new());
        let mut ticks: Vec<Tick> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    let clock = Arc::clone(&clock);
                    s.spawn(move || (0..250).map(|_| clock.tick()).collect::<Vec<_>>())
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap())
                .collect()
        });
        ticks.sort_unstable();
        ticks.dedup();
        assert_eq!(ticks.len(), 1_000);
    }
}
