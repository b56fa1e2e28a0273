//! LINE Messaging API push client

use crate::adapters::messaging::traits::InstantMessenger;
use crate::config::{secret_string, LineConfig, SecretString};
use crate::domain::{DeliveryReport, QueueWatchError, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use secrecy::ExposeSecret;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct TextMessage<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: [TextMessage<'a>; 1],
}

/// Push client for the LINE Messaging API
pub struct LineMessagingClient {
    client: Client,
    api_url: String,
    channel_access_token: SecretString,
}

impl LineMessagingClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &LineConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                QueueWatchError::Configuration(format!("Failed to build LINE client: {e}"))
            })?;

        let channel_access_token = config
            .channel_access_token
            .clone()
            .unwrap_or_else(|| secret_string(String::new()));

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            channel_access_token,
        })
    }
}

#[async_trait]
impl InstantMessenger for LineMessagingClient {
    async fn send_message(&self, user_id: &str, text: &str) -> DeliveryReport {
        if self.channel_access_token.expose_secret().is_empty() {
            tracing::warn!("No LINE channel access token configured, skipping");
            return DeliveryReport::failed(None, "LINE channel access token not configured");
        }
        if user_id.trim().is_empty() {
            return DeliveryReport::failed(None, "LINE user id missing");
        }

        let payload = PushRequest {
            to: user_id,
            messages: [TextMessage { kind: "text", text }],
        };

        let token: &str = self.channel_access_token.expose_secret().as_ref();
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status().as_u16();
                if status == 200 {
                    tracing::debug!(status, "LINE message pushed");
                    DeliveryReport::delivered(Some(status))
                } else {
                    let body = response.text().await.unwrap_or_default();
                    tracing::warn!(status, body = %body, "LINE push rejected");
                    DeliveryReport::failed(Some(status), format!("HTTP {status}: {body}"))
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "LINE push failed");
                DeliveryReport::failed(None, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn config(server_url: &str, token: Option<&str>) -> LineConfig {
        LineConfig {
            enabled: true,
            channel_access_token: token.map(|t| secret_string(t.to_string())),
            api_url: format!("{server_url}/v2/bot/message/push"),
            timeout_seconds: 5,
        }
    }

    #[tokio::test]
    async fn test_push_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/bot/message/push")
            .match_header("authorization", "Bearer channel-token")
            .match_body(Matcher::Json(serde_json::json!({
                "to": "U1234",
                "messages": [{"type": "text", "text": "還剩 5 號"}]
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client =
            LineMessagingClient::new(&config(&server.url(), Some("channel-token"))).unwrap();
        let report = client.send_message("U1234", "還剩 5 號").await;

        assert!(report.success);
        assert_eq!(report.status_code, Some(200));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_push_rejected_reports_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v2/bot/message/push")
            .with_status(400)
            .with_body(r#"{"message":"The property, 'to', in the request body is invalid"}"#)
            .create_async()
            .await;

        let client =
            LineMessagingClient::new(&config(&server.url(), Some("channel-token"))).unwrap();
        let report = client.send_message("bad", "hi").await;

        assert!(!report.success);
        assert_eq!(report.status_code, Some(400));
        assert!(report.error_message.unwrap().contains("invalid"));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v2/bot/message/push")
            .with_status(503)
            .expect(1)
            .create_async()
            .await;

        let client =
            LineMessagingClient::new(&config(&server.url(), Some("channel-token"))).unwrap();
        let report = client.send_message("U1234", "hi").await;

        assert!(!report.success);
        assert_eq!(report.status_code, Some(503));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_token_skips_request() {
        let server = mockito::Server::new_async().await;
        let client = LineMessagingClient::new(&config(&server.url(), None)).unwrap();

        let report = client.send_message("U1234", "hi").await;

        assert!(!report.success);
        assert!(report.status_code.is_none());
    }
}
