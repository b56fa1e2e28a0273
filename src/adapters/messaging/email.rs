//! Email delivery through an HTTP mail relay

use crate::adapters::messaging::traits::EmailSender;
use crate::config::{EmailConfig, SecretString};
use crate::domain::{QueueWatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Mailbox<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MailPayload<'a> {
    from: Mailbox<'a>,
    to: [Mailbox<'a>; 1],
    subject: &'a str,
    html: &'a str,
}

/// Posts a JSON mail payload to a relay endpoint
pub struct HttpMailRelay {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
    from_address: String,
    from_name: String,
}

impl HttpMailRelay {
    /// Create a relay client from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the endpoint or sender address is
    /// missing, or the HTTP client cannot be built.
    pub fn new(config: &EmailConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            QueueWatchError::Configuration("notification.email.endpoint is required".to_string())
        })?;
        let from_address = config.from_address.clone().ok_or_else(|| {
            QueueWatchError::Configuration(
                "notification.email.from_address is required".to_string(),
            )
        })?;

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                QueueWatchError::Configuration(format!("Failed to build mail relay client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            from_address,
            from_name: config.from_name.clone(),
        })
    }
}

#[async_trait]
impl EmailSender for HttpMailRelay {
    async fn send_email(&self, to: &str, subject: &str, html_body: &str) -> bool {
        if to.trim().is_empty() {
            tracing::warn!("Email recipient missing, skipping");
            return false;
        }

        let payload = MailPayload {
            from: Mailbox {
                email: &self.from_address,
                name: Some(&self.from_name),
            },
            to: [Mailbox {
                email: to,
                name: None,
            }],
            subject,
            html: html_body,
        };

        let mut request = self.client.post(&self.endpoint).json(&payload);
        if let Some(api_key) = &self.api_key {
            let key: &str = api_key.expose_secret().as_ref();
            request = request.bearer_auth(key);
        }

        match request.send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(subject = %subject, "Email sent");
                true
            }
            Ok(response) => {
                tracing::warn!(status = response.status().as_u16(), "Mail relay rejected message");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Mail relay request failed");
                false
            }
        }
    }
}

/// Sender used when email is not configured
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send_email(&self, _to: &str, subject: &str, _html_body: &str) -> bool {
        tracing::info!(subject = %subject, "Email not configured, skipping");
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use mockito::Matcher;

    fn config(endpoint: String) -> EmailConfig {
        EmailConfig {
            enabled: true,
            endpoint: Some(endpoint),
            api_key: Some(secret_string("relay-key".to_string())),
            from_address: Some("noreply@example.com".to_string()),
            ..EmailConfig::default()
        }
    }

    #[tokio::test]
    async fn test_relay_posts_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/send")
            .match_header("authorization", "Bearer relay-key")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "to": [{"email": "patient@example.com"}],
                "subject": "門診提醒",
            })))
            .with_status(202)
            .create_async()
            .await;

        let relay = HttpMailRelay::new(&config(format!("{}/send", server.url()))).unwrap();
        assert!(relay.send_email("patient@example.com", "門診提醒", "<p>hi</p>").await);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_relay_failure_is_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/send")
            .with_status(500)
            .create_async()
            .await;

        let relay = HttpMailRelay::new(&config(format!("{}/send", server.url()))).unwrap();
        assert!(!relay.send_email("patient@example.com", "s", "b").await);
    }

    #[test]
    fn test_relay_requires_endpoint() {
        let mut email = config("http://localhost/send".to_string());
        email.endpoint = None;
        assert!(HttpMailRelay::new(&email).is_err());
    }

    #[tokio::test]
    async fn test_disabled_sender() {
        assert!(!DisabledEmailSender.send_email("a@b.c", "s", "b").await);
    }
}
