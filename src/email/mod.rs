//! Outgoing mail.
//!
//! There is no delivery backend yet: [`LogMailer`] writes each message to
//! the log and keeps a copy in `email_logs` for recipients with a profile.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use crate::models::EmailLog;
use crate::store::{Store, StoreError};

pub mod templates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct LogMailer {
    store: Arc<dyn Store>,
}

impl LogMailer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), StoreError> {
        tracing::info!(to = %message.to, subject = %message.subject, "Sending email");
        tracing::debug!(body = %message.text, "Email body");

        let Some(profile) = self.store.find_profile_by_email(&message.to).await? else {
            return Ok(());
        };

        self.store
            .insert_email_log(&EmailLog {
                user_id: profile.id,
                email: message.to.clone(),
                subject: message.subject.clone(),
                content: message.html.clone(),
                sent_at: Utc::now(),
            })
            .await
    }
}
