use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;

/// Delivery reports collected from librdkafka's callback thread.
#[derive(Debug, Default)]
pub struct DeliveryTracker {
    delivered: AtomicU64,
    failed: AtomicU64,
    first_failure: OnceLock<String>,
}

impl DeliveryTracker {
    pub fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self, reason: String) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let _ = self.first_failure.set(reason);
    }

    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn first_failure(&self) -> Option<&str> {
        self.first_failure.get().map(String::as_str)
    }
}
