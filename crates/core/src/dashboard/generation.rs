use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Monotonic request counter standing in for cancellation: only the newest ticket is current.
#[derive(Debug, Clone, Default)]
pub struct RequestGeneration {
    current: Arc<AtomicU64>,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new request, making every earlier ticket stale.
    pub fn issue(&self) -> RequestTicket {
        let value = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket {
            value,
            current: Arc::clone(&self.current),
        }
    }

    pub fn current(&self) -> u64 {
        self.current.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct RequestTicket {
    value: u64,
    current: Arc<AtomicU64>,
}

impl RequestTicket {
    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::SeqCst) == self.value
    }
}
