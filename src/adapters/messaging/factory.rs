//! Messaging collaborator factory

use crate::adapters::messaging::email::{DisabledEmailSender, HttpMailRelay};
use crate::adapters::messaging::line::LineMessagingClient;
use crate::adapters::messaging::traits::{EmailSender, InstantMessenger};
use crate::config::NotificationConfig;
use crate::domain::Result;
use std::sync::Arc;

/// Create the email sender for the configuration
///
/// A disabled email section yields a [`DisabledEmailSender`].
pub fn create_email_sender(config: &NotificationConfig) -> Result<Arc<dyn EmailSender>> {
    if config.email.enabled {
        tracing::info!("Creating HTTP mail relay sender");
        Ok(Arc::new(HttpMailRelay::new(&config.email)?))
    } else {
        Ok(Arc::new(DisabledEmailSender))
    }
}

/// Create the LINE push client
///
/// Without a channel token every send reports failure, which the engine logs.
pub fn create_instant_messenger(config: &NotificationConfig) -> Result<Arc<dyn InstantMessenger>> {
    Ok(Arc::new(LineMessagingClient::new(&config.line)?))
}
