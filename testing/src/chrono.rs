//! A manually driven clock for deterministic timestamps.

use gatecore::TsSource;
use std::sync::{
    Arc,
    atomic::{
        AtomicI64,
        Ordering,
    },
};

#[derive(Clone, Debug, Default)]
pub struct ManualClock(Arc<AtomicI64>);

impl ManualClock {
    pub fn new(timestamp: i64) -> Self {
        Self(Arc::new(AtomicI64::new(timestamp)))
    }

    pub fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_timestamp(&self, timestamp: i64) {
        self.0.store(timestamp, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) -> i64 {
        self.0.fetch_add(secs, Ordering::SeqCst) + secs
    }

    /// A timestamp source that follows this clock.
    pub fn source(&self) -> impl Fn() -> i64 + Send + Sync + 'static {
        let inner = self.0.clone();
        move || inner.load(Ordering::SeqCst)
    }

    pub fn ts_source(&self) -> TsSource {
        Arc::new(self.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock() {
        let clock = ManualClock::new(100);
        let source = clock.source();
        let shared = clock.ts_source();
        assert_eq!(source(), 100);
        assert_eq!(clock.advance(20), 120);
        assert_eq!(source(), 120);
        clock.set_timestamp(5);
        assert_eq!(shared(), 5);
        assert_eq!(clock.now(), 5);
    }
}
