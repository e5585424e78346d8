use serde::Serialize;
use std::sync::Arc;

use super::{EmailError, EmailMessage, EmailSender};

/// Why a single provider failed during a dispatch.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

/// Outcome of [`EmailDispatcher::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryResult {
    /// A provider accepted the message. `failures` lists providers tried before it.
    Delivered {
        provider: String,
        failures: Vec<ProviderFailure>,
    },
    /// Every configured provider failed.
    AllProvidersFailed { failures: Vec<ProviderFailure> },
    /// No provider is configured.
    NotConfigured,
}

impl DeliveryResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryResult::Delivered { .. })
    }
}

/// Ordered fallback chain of email providers.
#[derive(Clone, Default)]
pub struct EmailDispatcher {
    senders: Vec<Arc<dyn EmailSender>>,
}

impl EmailDispatcher {
    pub fn new(senders: Vec<Arc<dyn EmailSender>>) -> Self {
        Self { senders }
    }

    /// Appends a sender to the end of the chain.
    pub fn with_sender(mut self, sender: Arc<dyn EmailSender>) -> Self {
        self.senders.push(sender);
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.senders.is_empty()
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.senders.iter().map(|s| s.name().to_string()).collect()
    }

    /// Tries each sender once, in order, stopping at the first success.
    pub async fn send(&self, message: &EmailMessage) -> DeliveryResult {
        if self.senders.is_empty() {
            log::warn!(
                "no email provider configured; dropping message {:?} to {}",
                message.subject,
                message.to
            );
            return DeliveryResult::NotConfigured;
        }

        let mut failures = Vec::new();
        for sender in &self.senders {
            match sender.send(message).await {
                Ok(()) => {
                    log::info!(
                        "email {:?} to {} delivered via {}",
                        message.subject,
                        message.to,
                        sender.name()
                    );
                    return DeliveryResult::Delivered {
                        provider: sender.name().to_string(),
                        failures,
                    };
                }
                Err(err) => {
                    log::warn!(
                        "email provider {} failed for {}: {}",
                        sender.name(),
                        message.to,
                        err
                    );
                    failures.push(failure(sender.name(), &err));
                }
            }
        }

        log::error!(
            "all {} email providers failed for {}",
            failures.len(),
            message.to
        );
        DeliveryResult::AllProvidersFailed { failures }
    }
}

fn failure(provider: &str, err: &EmailError) -> ProviderFailure {
    ProviderFailure {
        provider: provider.to_string(),
        reason: err.to_string(),
    }
}
