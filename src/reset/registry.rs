use chrono::Duration;
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;
use std::sync::Arc;

use super::clock::Clock;
use super::store::{ResetCodeStore, ResetEntry};
use super::ResetError;
use crate::models::normalize_email;

pub const DEFAULT_CODE_TTL_MINUTES: i64 = 10;

lazy_static! {
    // Issued codes are always exactly six ASCII digits.
    static ref RESET_CODE_REGEX: Regex = Regex::new(r"^[0-9]{6}$").unwrap();
}

type CodeGenerator = Arc<dyn Fn() -> String + Send + Sync>;

/// Uniformly random code in `100000..=999999`.
pub fn random_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Issues, validates and consumes one-time reset codes.
///
/// Expiry is checked lazily against the injected [`Clock`] whenever a code is
/// validated; there are no per-entry timers. [`purge_expired`](Self::purge_expired)
/// exists only to reclaim memory from codes nobody came back for.
pub struct ResetCodeRegistry {
    store: Arc<dyn ResetCodeStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    generate: CodeGenerator,
}

impl ResetCodeRegistry {
    pub fn new(store: Arc<dyn ResetCodeStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            store,
            clock,
            ttl,
            generate: Arc::new(random_code),
        }
    }

    /// Replaces the random code source, e.g. with a fixed sequence in tests.
    pub fn with_code_generator<F>(mut self, generate: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.generate = Arc::new(generate);
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Generates a fresh code for `email`, replacing any outstanding one.
    pub async fn issue(&self, email: &str) -> Result<String, ResetError> {
        let code = (self.generate)();
        let email = normalize_email(email);
        self.store
            .set(ResetEntry {
                email: email.clone(),
                code: code.clone(),
                issued_at: self.clock.now(),
            })
            .await?;
        log::debug!("issued reset code for {}", email);
        Ok(code)
    }

    /// True iff `code` is the live, unexpired code for `email`. Does not consume it.
    pub async fn validate(&self, email: &str, code: &str) -> Result<bool, ResetError> {
        if !RESET_CODE_REGEX.is_match(code) {
            return Ok(false);
        }
        let email = normalize_email(email);
        let entry = match self.store.get(&email).await? {
            Some(entry) => entry,
            None => return Ok(false),
        };

        if self.is_expired(&entry) {
            // Compare-and-delete: a concurrent re-issue must not be wiped.
            self.store.delete_if_code(&email, &entry.code).await?;
            log::debug!("reset code for {} expired", email);
            return Ok(false);
        }

        Ok(entry.code == code)
    }

    /// An entry whose expiry is past the representable range never expires.
    fn is_expired(&self, entry: &ResetEntry) -> bool {
        match entry.issued_at.checked_add_signed(self.ttl) {
            Some(expires_at) => self.clock.now() >= expires_at,
            None => false,
        }
    }

    /// Removes the code for `email`, whatever it is.
    pub async fn consume(&self, email: &str) -> Result<(), ResetError> {
        self.store.delete(&normalize_email(email)).await?;
        Ok(())
    }

    /// Drops every expired entry. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<usize, ResetError> {
        match self.clock.now().checked_sub_signed(self.ttl) {
            Some(cutoff) => Ok(self.store.purge_issued_before(cutoff).await?),
            None => Ok(0),
        }
    }

    /// Runs [`purge_expired`](Self::purge_expired) every `every` (at least one second) on the
    /// current runtime.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        every: std::time::Duration,
    ) -> tokio::task::JoinHandle<()> {
        let every = every.max(std::time::Duration::from_secs(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                match self.purge_expired().await {
                    Ok(0) => {}
                    Ok(removed) => log::info!("purged {} expired reset codes", removed),
                    Err(e) => log::error!("reset code sweep failed: {}", e),
                }
            }
        })
    }
}
