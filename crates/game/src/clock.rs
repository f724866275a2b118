//! Fixed-rate tick clock.
//!
//! Real time is fed in with [`TickClock::advance`]; whole ticks are drained
//! from an accumulator and each fires every subscriber once, in
//! subscription order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vantage_physics::Tick;

/// Receives tick notifications.
pub trait TickListener: Send {
    fn on_tick(&mut self, tick: Tick);
}

/// Key a subscriber registers under. Subscribing twice under the same key is
/// a no-op.
pub type SubscriberId = u64;

/// Fixed-rate tick source.
pub struct TickClock {
    tick_duration: Duration,
    accumulator: Duration,
    tick: Tick,
    /// Upper bound on ticks fired by one `advance`, so a long stall does not
    /// turn into a burst of catch-up ticks.
    max_ticks_per_advance: u32,
    subscribers: Vec<(SubscriberId, Arc<Mutex<dyn TickListener>>)>,
}

impl TickClock {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_duration: Duration::from_secs(1) / tick_rate.max(1),
            accumulator: Duration::ZERO,
            tick: 0,
            max_ticks_per_advance: 8,
            subscribers: Vec::new(),
        }
    }

    pub fn with_max_ticks_per_advance(mut self, max: u32) -> Self {
        self.max_ticks_per_advance = max.max(1);
        self
    }

    /// Register a listener. Returns false if `id` is already subscribed.
    pub fn subscribe(&mut self, id: SubscriberId, listener: Arc<Mutex<dyn TickListener>>) -> bool {
        if self.is_subscribed(id) {
            return false;
        }
        self.subscribers.push((id, listener));
        true
    }

    /// Remove a listener. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(subscriber, _)| *subscriber != id);
        self.subscribers.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriberId) -> bool {
        self.subscribers.iter().any(|(subscriber, _)| *subscriber == id)
    }

    /// Add elapsed real time and fire every whole tick it covers.
    ///
    /// Returns the number of ticks fired.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut fired = 0;
        while self.accumulator >= self.tick_duration {
            if fired == self.max_ticks_per_advance {
                log::warn!(
                    "tick clock fell behind, dropping {:?} of accumulated time",
                    self.accumulator
                );
                self.accumulator = Duration::ZERO;
                break;
            }

            self.accumulator -= self.tick_duration;
            self.tick += 1;
            fired += 1;

            for (_, listener) in &self.subscribers {
                let mut listener = listener.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                listener.on_tick(self.tick);
            }
        }
        fired
    }

    /// Last tick fired.
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Fraction of the next tick already accumulated (0.0..1.0), for
    /// interpolating visuals between ticks.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.tick_duration.as_secs_f32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        ticks: Vec<Tick>,
    }

    impl TickListener for Counter {
        fn on_tick(&mut self, tick: Tick) {
            self.ticks.push(tick);
        }
    }

    #[test]
    fn test_fires_whole_ticks() {
        let mut clock = TickClock::new(30);
        let counter = Arc::new(Mutex::new(Counter::default()));
        clock.subscribe(1, counter.clone());

        assert_eq!(clock.advance(Duration::from_millis(20)), 0);
        assert_eq!(clock.advance(Duration::from_millis(20)), 1);
        assert_eq!(clock.advance(Duration::from_millis(70)), 2);

        assert_eq!(counter.lock().unwrap().ticks, vec![1, 2, 3]);
        assert_eq!(clock.tick(), 3);
    }

    #[test]
    fn test_duplicate_subscribe_is_ignored() {
        let mut clock = TickClock::new(10);
        let counter = Arc::new(Mutex::new(Counter::default()));

        assert!(clock.subscribe(1, counter.clone()));
        assert!(!clock.subscribe(1, counter.clone()));
        clock.advance(Duration::from_millis(100));

        assert_eq!(counter.lock().unwrap().ticks.len(), 1);
    }

    #[test]
    fn test_no_callback_after_unsubscribe() {
        let mut clock = TickClock::new(10);
        let counter = Arc::new(Mutex::new(Counter::default()));

        clock.subscribe(1, counter.clone());
        clock.advance(Duration::from_millis(100));
        assert!(clock.unsubscribe(1));
        assert!(!clock.unsubscribe(1));
        clock.advance(Duration::from_millis(300));

        assert_eq!(counter.lock().unwrap().ticks, vec![1]);

        // Resubscribing works again
        assert!(clock.subscribe(1, counter.clone()));
        clock.advance(Duration::from_millis(100));
        assert_eq!(counter.lock().unwrap().ticks, vec![1, 5]);
    }

    #[test]
    fn test_catch_up_is_bounded() {
        let mut clock = TickClock::new(10).with_max_ticks_per_advance(3);
        assert_eq!(clock.advance(Duration::from_secs(5)), 3);
        assert!(clock.alpha() < 1.0);
    }
}
