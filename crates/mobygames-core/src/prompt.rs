//! User interaction during a rate-limit backoff
//!
//! When MobyGames reports that the hourly quota is spent the client asks
//! the host whether to sit out the rate window or give up.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};

/// What the user chose when the quota was exceeded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateLimitDecision {
    /// Sleep until the window expires and retry the request
    #[default]
    Wait,
    /// Abandon the request and disable the scraper for the session
    Cancel,
}

/// Details shown to the user alongside the wait/cancel choice
#[derive(Debug, Clone)]
pub struct RateLimitNotice {
    /// Earliest moment a retry is expected to succeed
    pub retry_at: DateTime<Local>,
    /// Recommended wait from now
    pub wait: Duration,
    /// Retries already spent on this request
    pub retry: u32,
    pub max_retries: u32,
    /// Message decoded from the 429 body
    pub server_message: String,
    /// Time the user has to answer before [`RateLimitDecision::default`] applies
    pub answer_within: Duration,
}

impl RateLimitNotice {
    /// Dialog text in the form the launcher shows it
    pub fn message(&self) -> String {
        format!(
            "You've exceeded the max rate limit of 360 requests/hour. \
             Respect the website and wait at least till {}.",
            self.retry_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

/// Presents the wait/cancel choice to the user
///
/// The client stops waiting for an answer after `notice.answer_within`
/// and proceeds with [`RateLimitDecision::default`].
#[async_trait]
pub trait UserPrompt: Send + Sync {
    async fn confirm_rate_limit_wait(&self, notice: &RateLimitNotice) -> RateLimitDecision;
}

/// Headless prompt that always waits out the window
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysWait;

#[async_trait]
impl UserPrompt for AlwaysWait {
    async fn confirm_rate_limit_wait(&self, notice: &RateLimitNotice) -> RateLimitDecision {
        tracing::info!(retry_at = %notice.retry_at, retry = notice.retry, "Waiting out rate window");
        RateLimitDecision::Wait
    }
}

/// Headless prompt that never waits
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverWait;

#[async_trait]
impl UserPrompt for NeverWait {
    async fn confirm_rate_limit_wait(&self, _notice: &RateLimitNotice) -> RateLimitDecision {
        RateLimitDecision::Cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice() -> RateLimitNotice {
        RateLimitNotice {
            retry_at: Local::now(),
            wait: Duration::from_secs(960),
            retry: 0,
            max_retries: 3,
            server_message: "Too many requests".to_string(),
            answer_within: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_default_decision_is_wait() {
        assert_eq!(RateLimitDecision::default(), RateLimitDecision::Wait);
    }

    #[tokio::test]
    async fn test_headless_prompts() {
        assert_eq!(AlwaysWait.confirm_rate_limit_wait(&notice()).await, RateLimitDecision::Wait);
        assert_eq!(NeverWait.confirm_rate_limit_wait(&notice()).await, RateLimitDecision::Cancel);
    }

    #[test]
    fn test_notice_message_mentions_quota() {
        assert!(notice().message().contains("360 requests/hour"));
    }
}
