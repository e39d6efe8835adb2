//! Newsletter subscribe and unsubscribe.

use std::sync::Arc;

use shared::{domain::TopicId, protocol::SubscriptionRequest};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    error::GatewayError,
    gateway::ContentGateway,
    identity::is_valid_email,
    sink::{PresentationSink, ToastKind},
};

pub const SUBSCRIBED_MESSAGE: &str = "Thank you for subscribing to CurioDaily!";
pub const ALREADY_SUBSCRIBED_MESSAGE: &str =
    "This email is already subscribed. You can update your topic preferences instead.";
pub const UNSUBSCRIBED_MESSAGE: &str = "You have been unsubscribed.";
pub const UNSUBSCRIBE_FAILED_MESSAGE: &str =
    "An error occurred while trying to unsubscribe. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionForm {
    pub name: String,
    pub email: String,
    pub topic_ids: Vec<TopicId>,
}

impl SubscriptionForm {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(FieldError {
                field: "name",
                message: "Please enter your name.",
            });
        }
        if !is_valid_email(self.email.trim()) {
            errors.push(FieldError {
                field: "email",
                message: "Please enter a valid email address.",
            });
        }
        if self.topic_ids.is_empty() {
            errors.push(FieldError {
                field: "topics",
                message: "Please select at least one topic.",
            });
        }
        errors
    }

    fn to_request(&self) -> SubscriptionRequest {
        SubscriptionRequest {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            topic_ids: self.topic_ids.clone(),
            is_active: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    Subscribed,
    AlreadySubscribed,
}

#[derive(Debug, Error)]
pub enum SubscriptionError {
    #[error("subscription form has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
    #[error("subscription failed: {0}")]
    Gateway(#[from] GatewayError),
}

pub struct SubscriptionFlow {
    gateway: Arc<dyn ContentGateway>,
    sink: Arc<dyn PresentationSink>,
}

impl SubscriptionFlow {
    pub fn new(gateway: Arc<dyn ContentGateway>, sink: Arc<dyn PresentationSink>) -> Self {
        Self { gateway, sink }
    }

    pub async fn subscribe(
        &self,
        form: &SubscriptionForm,
    ) -> Result<SubscribeOutcome, SubscriptionError> {
        let errors = form.validate();
        if !errors.is_empty() {
            for error in &errors {
                self.sink.show_field_error(error.field, error.message);
            }
            return Err(SubscriptionError::Invalid(errors));
        }

        match self.gateway.subscribe(&form.to_request()).await {
            Ok(()) => {
                info!(topics = form.topic_ids.len(), "subscription created");
                self.sink.show_toast(SUBSCRIBED_MESSAGE, ToastKind::Success);
                Ok(SubscribeOutcome::Subscribed)
            }
            Err(err) if is_already_subscribed(&err) => {
                info!("email already subscribed");
                self.sink
                    .show_toast(ALREADY_SUBSCRIBED_MESSAGE, ToastKind::Info);
                Ok(SubscribeOutcome::AlreadySubscribed)
            }
            Err(err) => {
                warn!(error = %err, "subscription failed");
                let message = format!(
                    "An error occurred: {}",
                    err.user_message("Subscription failed")
                );
                self.sink.show_toast(&message, ToastKind::Error);
                Err(err.into())
            }
        }
    }

    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<(), GatewayError> {
        match self.gateway.unsubscribe(subscription_id).await {
            Ok(()) => {
                info!("subscription cancelled");
                self.sink.show_toast(UNSUBSCRIBED_MESSAGE, ToastKind::Success);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "unsubscribe failed");
                self.sink
                    .show_toast(UNSUBSCRIBE_FAILED_MESSAGE, ToastKind::Error);
                Err(err)
            }
        }
    }
}

fn is_already_subscribed(err: &GatewayError) -> bool {
    err.status() == Some(400)
        && err
            .detail()
            .is_some_and(|detail| detail.to_ascii_lowercase().contains("already"))
}

#[cfg(test)]
#[path = "tests/subscription_tests.rs"]
mod tests;
