//! Outbound email.
//!
//! An [`EmailDispatcher`] holds an ordered list of [`EmailSender`]s and tries them in turn
//! until one accepts the message. Delivery problems never surface as errors to callers;
//! they get a [`DeliveryResult`] describing what happened.

pub mod dispatcher;
pub mod http_api;
pub mod smtp;

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

pub use dispatcher::{DeliveryResult, EmailDispatcher, ProviderFailure};
pub use http_api::HttpApiSender;
pub use smtp::SmtpSender;

/// A plain-text message with an optional HTML alternative.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            text: text.into(),
            html: None,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// Could not build the message (bad address, bad header).
    InvalidMessage(String),
    /// Network or TLS failure before the provider answered.
    Transport(String),
    /// The provider answered and refused the message.
    Rejected { status: u16, detail: String },
}

impl fmt::Display for EmailError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EmailError::InvalidMessage(msg) => write!(f, "invalid message: {}", msg),
            EmailError::Transport(msg) => write!(f, "transport error: {}", msg),
            EmailError::Rejected { status, detail } => {
                write!(f, "rejected with status {}: {}", status, detail)
            }
        }
    }
}

impl std::error::Error for EmailError {}

/// One delivery provider.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Short provider name used in logs and delivery results.
    fn name(&self) -> &str;

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

/// Message sent to a user who asked to reset their password.
pub fn password_reset_message(to: &str, name: &str, code: &str, ttl_minutes: i64) -> EmailMessage {
    let text = format!(
        "Hello {},\n\n\
         We received a request to reset the password for your account.\n\n\
         Your reset code is: {}\n\n\
         The code expires in {} minutes. If you did not request a reset, you can ignore this email.\n",
        name, code, ttl_minutes
    );
    let html = format!(
        "<p>Hello {},</p>\
         <p>We received a request to reset the password for your account.</p>\
         <p>Your reset code is: <strong>{}</strong></p>\
         <p>The code expires in {} minutes. If you did not request a reset, you can ignore this email.</p>",
        escape_html(name),
        escape_html(code),
        ttl_minutes
    );
    EmailMessage::new(to, "Your password reset code", text).with_html(html)
}

/// Escapes user-supplied text for an HTML body or attribute.
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Forwards a contact-form submission to the shop inbox.
pub fn contact_message(inbox: &str, from_name: &str, from_email: &str, body: &str) -> EmailMessage {
    EmailMessage::new(
        inbox,
        format!("Contact form: {}", from_name),
        format!("From: {} <{}>\n\n{}", from_name, from_email, body),
    )
}
