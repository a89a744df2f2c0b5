//! Cancellation/deadline propagation for repository and cache calls.
//!
//! The design notes call for replacing implicit async task spawning with an
//! explicit deadline threaded through every I/O boundary. A [`Deadline`] is
//! cheap to copy and carries no I/O of its own; adapters are expected to
//! race their underlying call against [`Deadline::remaining`] (typically via
//! `tokio::time::timeout`) and return [`crate::error::StoreError::DeadlineExceeded`]
//! if it elapses first.

use std::time::{Duration, Instant};

/// A point in time after which a call must abort and report a timeout.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// No deadline: the call may take as long as it needs.
    pub fn none() -> Self {
        Self { at: None }
    }

    /// A deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self {
            at: Some(Instant::now() + timeout),
        }
    }

    /// Time remaining before the deadline, or `None` if there is no deadline
    /// or it has already passed (in which case the caller should treat the
    /// remaining duration as zero and fail immediately).
    pub fn remaining(&self) -> Option<Duration> {
        match self.at {
            None => None,
            Some(at) => Some(at.saturating_duration_since(Instant::now())),
        }
    }

    /// Whether the deadline has already elapsed.
    pub fn is_expired(&self) -> bool {
        matches!(self.at, Some(at) if Instant::now() >= at)
    }
}

impl Default for Deadline {
    fn default() -> Self {
        Self::none()
    }
}
