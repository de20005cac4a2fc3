//! Backoff between push channel connection attempts.
//!
//! After a drop the bridge waits 1 s, then doubles the wait after every
//! failed attempt until it reaches 30 s, where it stays.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::push::{PushClient, PushConnection};

/// How long to wait between connection attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Wait before the first attempt after a drop.
    pub first_delay: Duration,
    /// No single wait is longer than this.
    pub ceiling: Duration,
    /// The wait is multiplied by this after each failed attempt.
    pub factor: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            first_delay: Duration::from_secs(1),
            ceiling: Duration::from_secs(30),
            factor: 2,
        }
    }
}

impl ReconnectPolicy {
    /// Fresh wait sequence starting at [`Self::first_delay`].
    pub fn backoff(&self) -> Backoff {
        Backoff {
            next: self.first_delay.min(self.ceiling),
            policy: *self,
        }
    }
}

/// Endless sequence of waits produced by a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    policy: ReconnectPolicy,
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        let current = self.next;
        self.next = current
            .checked_mul(self.policy.factor)
            .unwrap_or(self.policy.ceiling)
            .min(self.policy.ceiling);
        Some(current)
    }
}

/// Retry [`PushClient::connect`] until it succeeds or `cancel` fires.
/// Returns `None` on cancellation.
pub async fn reconnect_loop(
    client: &PushClient,
    policy: &ReconnectPolicy,
    cancel: &CancellationToken,
) -> Option<PushConnection> {
    for (attempt, delay) in (1u32..).zip(policy.backoff()) {
        // Wait first: the caller has just seen a failure.
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(push_url = client.push_url(), "Reconnect cancelled");
                return None;
            }
            _ = tokio::time::sleep(delay) => {}
        }

        tracing::info!(
            push_url = client.push_url(),
            attempt,
            delay_ms = delay.as_millis() as u64,
            "Reconnecting to push channel",
        );

        tokio::select! {
            _ = cancel.cancelled() => return None,
            result = client.connect() => match result {
                Ok(conn) => {
                    tracing::info!(attempt, "Reconnected to push channel");
                    return Some(conn);
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Push reconnect attempt failed");
                }
            }
        }
    }
    None
}
