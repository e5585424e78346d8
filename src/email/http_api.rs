use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use super::{EmailError, EmailMessage, EmailSender};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_DETAIL_LEN: usize = 300;

/// Primary provider: a transactional email HTTPS API that accepts a JSON body and a
/// bearer API key (the Resend `POST /emails` shape).
pub struct HttpApiSender {
    client: reqwest::Client,
    url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<&'a str>,
}

impl HttpApiSender {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| EmailError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpApiSender {
    fn name(&self) -> &str {
        "http-api"
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), EmailError> {
        let body = SendEmailBody {
            from: &self.from,
            to: [message.to.as_str()],
            subject: &message.subject,
            text: &message.text,
            html: message.html.as_deref(),
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| EmailError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let mut detail = response.text().await.unwrap_or_default();
        if detail.len() > MAX_DETAIL_LEN {
            let mut cut = MAX_DETAIL_LEN;
            while !detail.is_char_boundary(cut) {
                cut -= 1;
            }
            detail.truncate(cut);
        }
        Err(EmailError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}
