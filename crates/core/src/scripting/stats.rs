//! Process-wide invocation counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::executor::Classification;

/// Counters updated once per finished invocation.
#[derive(Debug)]
pub struct GatewayStats {
    started_at: DateTime<Utc>,
    started: Instant,
    success: AtomicU64,
    script_error: AtomicU64,
    timeout: AtomicU64,
    not_found: AtomicU64,
    server_error: AtomicU64,
}

/// Point-in-time copy of [`GatewayStats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub started_at: DateTime<Utc>,
    pub uptime_secs: u64,
    pub total: u64,
    pub success: u64,
    pub script_error: u64,
    pub timeout: u64,
    pub not_found: u64,
    pub server_error: u64,
}

impl GatewayStats {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            started: Instant::now(),
            success: AtomicU64::new(0),
            script_error: AtomicU64::new(0),
            timeout: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            server_error: AtomicU64::new(0),
        }
    }

    pub fn record(&self, classification: Classification) {
        self.counter(classification).fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let success = self.success.load(Ordering::Relaxed);
        let script_error = self.script_error.load(Ordering::Relaxed);
        let timeout = self.timeout.load(Ordering::Relaxed);
        let not_found = self.not_found.load(Ordering::Relaxed);
        let server_error = self.server_error.load(Ordering::Relaxed);
        StatsSnapshot {
            started_at: self.started_at,
            uptime_secs: self.started.elapsed().as_secs(),
            total: success + script_error + timeout + not_found + server_error,
            success,
            script_error,
            timeout,
            not_found,
            server_error,
        }
    }

    fn counter(&self, classification: Classification) -> &AtomicU64 {
        match classification {
            Classification::Success => &self.success,
            Classification::ScriptError => &self.script_error,
            Classification::Timeout => &self.timeout,
            Classification::NotFound => &self.not_found,
            Classification::ServerError => &self.server_error,
        }
    }
}

impl Default for GatewayStats {
    fn default() -> Self {
        Self::new()
    }
}
