//! Wall clock used for instrumentation timestamps.

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds.
    fn now_millis(&self) -> u64;
}

/// System clock using the OS time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Clock advancing by one millisecond on every reading.
#[cfg(test)]
pub struct StepClock {
    timestamp: std::sync::atomic::AtomicU64,
}

#[cfg(test)]
impl StepClock {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp: std::sync::atomic::AtomicU64::new(timestamp),
        }
    }
}

#[cfg(test)]
impl Clock for StepClock {
    fn now_millis(&self) -> u64 {
        self.timestamp
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }
}
