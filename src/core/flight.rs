use crate::core::error::ConcurrencyFailure;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Allows at most one operation of a kind to run at a time.
///
/// A second caller is turned away immediately instead of queueing.
#[derive(Debug, Clone)]
pub struct SingleFlight {
    operation: &'static str,
    busy: Arc<AtomicBool>,
}

impl SingleFlight {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn try_begin(&self) -> Result<FlightGuard, ConcurrencyFailure> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| FlightGuard {
                busy: Arc::clone(&self.busy),
            })
            .map_err(|_| ConcurrencyFailure {
                operation: self.operation,
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the flight when dropped, whatever the outcome.
#[derive(Debug)]
pub struct FlightGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}
