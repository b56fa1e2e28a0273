//! Outbound message transport traits

use crate::domain::DeliveryReport;
use async_trait::async_trait;

/// Sends HTML email
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one message; `false` on any failure, including an unconfigured sender
    async fn send_email(&self, to: &str, subject: &str, html_body: &str) -> bool;
}

/// Sends instant messages to a user id
#[async_trait]
pub trait InstantMessenger: Send + Sync {
    /// Push one text message and report the transport outcome
    async fn send_message(&self, user_id: &str, text: &str) -> DeliveryReport;
}
