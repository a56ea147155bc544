//! Per-request execution context: the clock and the cost meter.

use crate::errors::{KeyManagerError, Result};

/// Cost units charged by the engine.
pub mod cost {
    pub const STORAGE_READ: u64 = 100;
    pub const STORAGE_WRITE: u64 = 500;
    pub const ALLOWED_CALL_ENTRY: u64 = 20;
    pub const ALLOWED_DATA_KEY_ENTRY: u64 = 10;
    pub const SIGNATURE_RECOVERY: u64 = 3_000;
    pub const NONCE_UPDATE: u64 = 500;
}

/// Bounds the work a single request may perform.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostMeter {
    limit: u64,
    used: u64,
}

impl CostMeter {
    pub fn new(limit: u64) -> Self {
        Self { limit, used: 0 }
    }

    pub fn unlimited() -> Self {
        Self::new(u64::MAX)
    }

    pub fn charge(&mut self, units: u64) -> Result<()> {
        let required = self.used.saturating_add(units);
        if required > self.limit {
            return Err(KeyManagerError::BudgetExceeded {
                limit: self.limit,
                required,
            });
        }
        self.used = required;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestContext {
    /// Seconds since the unix epoch, used for relay call validity windows.
    pub timestamp: u64,
    pub meter: CostMeter,
}

impl RequestContext {
    pub fn new(timestamp: u64, cost_limit: u64) -> Self {
        Self {
            timestamp,
            meter: CostMeter::new(cost_limit),
        }
    }

    pub fn unmetered(timestamp: u64) -> Self {
        Self {
            timestamp,
            meter: CostMeter::unlimited(),
        }
    }
}
