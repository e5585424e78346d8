use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

use super::{EmailError, EmailMessage, EmailSender};

const SMTP_TIMEOUT: Duration = Duration::from_secs(10);
/// Port for implicit TLS. Any other port negotiates STARTTLS.
const IMPLICIT_TLS_PORT: u16 = 465;

/// Fallback provider: an authenticated SMTP relay.
#[derive(Clone)]
pub struct SmtpSender {
    host: String,
    port: u16,
    username: String,
    password: String,
    from: String,
}

impl SmtpSender {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
            password: password.into(),
            from: from.into(),
        }
    }

    fn transport(&self) -> Result<SmtpTransport, EmailError> {
        let builder = if self.port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&self.host)
        } else {
            SmtpTransport::starttls_relay(&self.host)
        }
        .map_err(|e| EmailError::Transport(format!("failed to create SMTP transport: {}", e)))?;

        let builder = if self.username.is_empty() {
            builder
        } else {
            builder.credentials(Credentials::new(
                self.username.clone(),
                self.password.clone(),
            ))
        };

        Ok(builder.port(self.port).timeout(Some(SMTP_TIMEOUT)).build())
    }
}

/// Builds the MIME message: plain text, or multipart/alternative when HTML is present.
pub(crate) fn build_message(from: &str, message: &EmailMessage) -> Result<Message, EmailError> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| EmailError::InvalidMessage(format!("invalid from address: {}", e)))?;
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|e| EmailError::InvalidMessage(format!("invalid to address: {}", e)))?;

    let builder = Message::builder()
        .from(from)
        .to(to)
        .subject(message.subject.clone());

    let built = match &message.html {
        Some(html) => builder.multipart(MultiPart::alternative_plain_html(
            message.text.clone(),
            html.clone(),
        )),
        None => builder
            .header(ContentType::TEXT_PLAIN)
            .body(message.text.clone()),
    };
    built.map_err(|e| EmailError::InvalidMessage(e.to_string()))
}

#[async_trait]
impl EmailSender for SmtpSender {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let email = build_message(&self.from, message)?;
        let mailer = self.transport()?;

        // lettre's SmtpTransport is blocking; keep it off the async workers.
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| EmailError::Transport(format!("SMTP task failed: {}", e)))?
            .map(|_| ())
            .map_err(|e| {
                if e.is_permanent() {
                    EmailError::Rejected {
                        status: 550,
                        detail: e.to_string(),
                    }
                } else {
                    EmailError::Transport(e.to_string())
                }
            })
    }
}
