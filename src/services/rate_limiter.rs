//! Rate limiter for login attempts
//!
//! Slows brute force attacks by limiting failed logins per account and
//! requests per client IP over sliding windows.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

const MAX_ACCOUNT_ATTEMPTS: usize = 5;
const ACCOUNT_WINDOW_MINUTES: i64 = 15;
const MAX_IP_REQUESTS: usize = 10;
const IP_WINDOW_MINUTES: i64 = 1;

#[derive(Default)]
struct Windows {
    by_account: HashMap<String, Vec<DateTime<Utc>>>,
    by_ip: HashMap<IpAddr, Vec<DateTime<Utc>>>,
}

/// Login rate limiter with sliding windows per account and per IP
pub struct LoginRateLimiter {
    windows: RwLock<Windows>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(Windows::default()),
        }
    }

    /// Whether the account has too many recent failed attempts
    pub async fn is_account_limited(&self, account: &str) -> bool {
        let cutoff = Utc::now() - Duration::minutes(ACCOUNT_WINDOW_MINUTES);
        let mut windows = self.windows.write().await;
        let attempts = windows.by_account.entry(account.to_lowercase()).or_default();
        attempts.retain(|t| *t > cutoff);
        attempts.len() >= MAX_ACCOUNT_ATTEMPTS
    }

    /// Record a failed login against the account
    pub async fn record_failed_attempt(&self, account: &str) {
        let mut windows = self.windows.write().await;
        windows
            .by_account
            .entry(account.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget the account's failures (called on successful login)
    pub async fn clear_account(&self, account: &str) {
        let mut windows = self.windows.write().await;
        windows.by_account.remove(&account.to_lowercase());
    }

    /// Whether the IP has sent too many recent login requests
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);
        let mut windows = self.windows.write().await;
        let requests = windows.by_ip.entry(ip).or_default();
        requests.retain(|t| *t > cutoff);
        requests.len() >= MAX_IP_REQUESTS
    }

    /// Record a login request from the IP
    pub async fn record_ip_request(&self, ip: IpAddr) {
        let mut windows = self.windows.write().await;
        windows.by_ip.entry(ip).or_default().push(Utc::now());
    }

    /// Drop entries that have aged out of their windows.
    /// Called periodically from a background task.
    pub async fn cleanup(&self) {
        let now = Utc::now();
        let account_cutoff = now - Duration::minutes(ACCOUNT_WINDOW_MINUTES);
        let ip_cutoff = now - Duration::minutes(IP_WINDOW_MINUTES);

        let mut windows = self.windows.write().await;
        windows.by_account.retain(|_, times| {
            times.retain(|t| *t > account_cutoff);
            !times.is_empty()
        });
        windows.by_ip.retain(|_, times| {
            times.retain(|t| *t > ip_cutoff);
            !times.is_empty()
        });
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
