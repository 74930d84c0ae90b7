//! One-shot deadlines for `select!` loops

use std::time::Duration;
use tokio::time::Instant;

/// A cancellable one-shot timer.
///
/// Arming replaces any pending deadline, so at most one is outstanding.
#[derive(Debug, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start the timer `after` from now
    pub fn arm(&mut self, after: Duration) {
        self.at = Some(Instant::now() + after);
    }

    pub fn cancel(&mut self) {
        self.at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Resolves when the deadline passes, then disarms. Pending forever while disarmed.
    ///
    /// Cancel safe: dropping the future leaves the deadline armed.
    pub async fn fired(&mut self) {
        match self.at {
            Some(at) => {
                tokio::time::sleep_until(at).await;
                self.at = None;
            }
            None => std::future::pending().await,
        }
    }
}
