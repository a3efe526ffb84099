// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resident email notifications.
//!
//! Delivery is best-effort. The fan-out logs every failure and keeps going;
//! nothing here is ever reported back to the request that triggered it.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::WardNumber;
use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;

const RESEND_API_URL: &str = "https://api.resend.com/emails";
const MAX_CONCURRENT_SENDS: usize = 10;

/// A rendered outbound email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Outbound email transport.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError>;
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

/// Resend HTTP API client. Without an API key every send is logged and dropped.
pub struct ResendMailer {
    http_client: reqwest::Client,
    api_key: Option<String>,
    from: String,
}

impl ResendMailer {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key,
            from,
        }
    }
}

#[async_trait]
impl EmailSender for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), AppError> {
        let Some(api_key) = &self.api_key else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                "Email delivery disabled (no RESEND_API_KEY), dropping message"
            );
            return Ok(());
        };

        let body = ResendRequest {
            from: &self.from,
            to: [&message.to],
            subject: &message.subject,
            text: &message.text,
        };

        let response = self
            .http_client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Email(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::Email(format!("Resend returned {}: {}", status, text)));
        }

        Ok(())
    }
}

/// Pickup-completed notice for one resident.
pub fn pickup_completed_email(
    to: &str,
    name: Option<&str>,
    ward: WardNumber,
    date: &str,
    time_slot: &str,
) -> EmailMessage {
    let greeting = match name {
        Some(name) if !name.trim().is_empty() => format!("Hello {},", name.trim()),
        _ => "Hello,".to_string(),
    };

    EmailMessage {
        to: to.to_string(),
        subject: format!("Ward {} waste pickup completed", ward),
        text: format!(
            "{greeting}\n\nWaste collection for Ward {ward} scheduled on {date} \
             ({time_slot}) has been completed.\n\nThank you for keeping your ward clean."
        ),
    }
}

/// Counts from one notification fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub recipients: u32,
    pub sent: u32,
    pub failed: u32,
    pub skipped_no_email: u32,
}

/// Email every active resident of `ward` that the pickup is done.
///
/// Per-recipient failures are logged and counted; they never stop the
/// remaining sends. A failed resident lookup ends the fan-out with an empty
/// summary.
pub async fn notify_ward_residents(
    db: &FirestoreDb,
    mailer: Arc<dyn EmailSender>,
    ward: WardNumber,
    date: &str,
    time_slot: &str,
) -> NotificationSummary {
    let residents = match db.list_active_residents_in_ward(ward).await {
        Ok(residents) => residents,
        Err(e) => {
            tracing::error!(ward, error = %e, "Failed to load ward residents for notification");
            return NotificationSummary::default();
        }
    };

    let mut summary = NotificationSummary {
        recipients: residents.len() as u32,
        ..Default::default()
    };

    let messages: Vec<EmailMessage> = residents
        .iter()
        .filter_map(|r| {
            let email = r.email.as_deref().filter(|e| !e.trim().is_empty());
            if email.is_none() {
                summary.skipped_no_email += 1;
            }
            email.map(|to| pickup_completed_email(to, r.name.as_deref(), ward, date, time_slot))
        })
        .collect();

    let results: Vec<bool> = stream::iter(messages)
        .map(|message| {
            let mailer = mailer.clone();
            async move {
                match mailer.send(&message).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            ward,
                            to = %message.to,
                            error = %e,
                            "Failed to send pickup notification"
                        );
                        false
                    }
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_SENDS)
        .collect()
        .await;

    summary.sent = results.iter().filter(|ok| **ok).count() as u32;
    summary.failed = results.len() as u32 - summary.sent;

    tracing::info!(
        ward,
        date,
        recipients = summary.recipients,
        sent = summary.sent,
        failed = summary.failed,
        "Pickup notification fan-out finished"
    );

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_completed_email() {
        let msg = pickup_completed_email(
            "a@example.com",
            Some("Asha"),
            5,
            "2024-01-10",
            "8:00 AM - 10:00 AM",
        );
        assert_eq!(msg.to, "a@example.com");
        assert_eq!(msg.subject, "Ward 5 waste pickup completed");
        assert!(msg.text.starts_with("Hello Asha,"));
        assert!(msg.text.contains("2024-01-10"));
        assert!(msg.text.contains("8:00 AM - 10:00 AM"));
    }

    #[test]
    fn test_pickup_completed_email_without_name() {
        let msg = pickup_completed_email("a@example.com", Some("  "), 5, "2024-01-10", "9 AM");
        assert!(msg.text.starts_with("Hello,"));
    }

    #[tokio::test]
    async fn test_disabled_mailer_drops_silently() {
        let mailer = ResendMailer::new(None, "noreply@example.com".to_string());
        let msg = pickup_completed_email("a@example.com", None, 1, "2024-01-10", "9 AM");
        assert!(mailer.send(&msg).await.is_ok());
    }
}
