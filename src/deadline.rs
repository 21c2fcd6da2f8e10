//! Wall-clock budget tracking.

use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Tracks elapsed time against a fixed budget.
///
/// The monitor is disarmed until [`start`](DeadlineMonitor::start) is
/// called; a disarmed monitor never reports expiry.
#[derive(Debug, Clone)]
pub struct DeadlineMonitor {
    budget: Duration,
    started_at: Option<Instant>,
}

impl DeadlineMonitor {
    pub fn new(budget: Duration) -> Result<Self> {
        if budget.is_zero() {
            return Err(Error::invalid_argument("time budget must be positive"));
        }
        Ok(Self {
            budget,
            started_at: None,
        })
    }

    pub fn from_secs(secs: u64) -> Result<Self> {
        Self::new(Duration::from_secs(secs))
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Arms the monitor. Later calls keep the first start instant.
    pub fn start(&mut self) {
        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
        }
    }

    pub fn is_armed(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since [`start`](DeadlineMonitor::start), zero if not armed.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map_or(Duration::ZERO, |t| t.elapsed())
    }

    pub fn is_expired(&self) -> bool {
        self.started_at
            .is_some_and(|t| t.elapsed() >= self.budget)
    }
}
