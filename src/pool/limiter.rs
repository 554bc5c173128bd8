use std::time::{Duration, Instant};

use crossbeam_channel::{after, select};
use parking_lot::Mutex;

use crate::{
    foundation::error::{RigError, RigResult},
    pool::cancel::CancelToken,
};

/// Global start rate for a pool's jobs.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum RateLimit {
    #[default]
    Unlimited,
    /// At most this many job starts per second across all workers.
    PerSecond(f64),
}

impl RateLimit {
    /// `None` means unlimited.
    pub fn from_per_second(rate: Option<f64>) -> Self {
        rate.map_or(Self::Unlimited, Self::PerSecond)
    }

    pub fn validate(&self) -> RigResult<()> {
        match *self {
            Self::Unlimited => Ok(()),
            Self::PerSecond(r) if r.is_finite() && r > 0.0 => Ok(()),
            Self::PerSecond(r) => Err(RigError::validation(format!(
                "rate limit must be a positive number of jobs per second, got {r}"
            ))),
        }
    }

    fn interval(&self) -> Option<Duration> {
        match *self {
            Self::Unlimited => None,
            Self::PerSecond(r) => Some(Duration::from_secs_f64(1.0 / r)),
        }
    }
}

/// Evenly spaced start slots shared by every worker of one pool.
#[derive(Debug)]
pub(crate) struct RateLimiter {
    interval: Option<Duration>,
    next: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub(crate) fn new(limit: RateLimit) -> RigResult<Self> {
        limit.validate()?;
        Ok(Self {
            interval: limit.interval(),
            next: Mutex::new(None),
        })
    }

    /// Block until the caller's start slot arrives or `cancel` fires.
    pub(crate) fn acquire(&self, cancel: &CancelToken) -> RigResult<()> {
        let Some(interval) = self.interval else {
            return Ok(());
        };

        let now = Instant::now();
        let slot = {
            let mut next = self.next.lock();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + interval);
            slot
        };

        let wait = slot.saturating_duration_since(now);
        if wait.is_zero() {
            return cancel.check("rate limiter wait");
        }
        select! {
            recv(cancel.done()) -> _ => Err(RigError::cancelled("rate limiter wait")),
            recv(after(wait)) -> _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/limiter.rs"]
mod tests;
