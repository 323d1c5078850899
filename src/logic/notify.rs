//! Notification Dispatcher
//!
//! Emails an assembled alert to a comma-separated recipient list. The
//! transport is long-lived and built once per process; delivery failures are
//! surfaced as typed errors and downgraded to a warning by the orchestrator.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Body, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use super::data_uri;
use crate::config::SmtpConfig;
use crate::error::PipelineError;
use crate::models::Alert;

/// Boundary trait so the pipeline can run against a stub in tests.
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Deliver the alert to every recipient in the delimited list.
    async fn send_alert(&self, alert: &Alert, recipients: &str) -> Result<(), PipelineError>;
}

struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    username: String,
}

/// SMTP dispatcher. `None` inner state means mail is disabled; sending then
/// fails with a configuration message rather than silently no-opping.
pub struct SmtpNotifier {
    mailer: Option<Mailer>,
}

/// Standard implicit-TLS SMTP port; anything else negotiates STARTTLS.
const SMTPS_PORT: u16 = 465;

impl SmtpNotifier {
    pub fn new(config: Option<SmtpConfig>) -> Self {
        let Some(smtp) = config else {
            tracing::warn!(
                "SMTP environment variables are not fully configured. Email notifications will be disabled."
            );
            return Self { mailer: None };
        };

        let builder = if smtp.port == SMTPS_PORT {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
        };

        let mailer = match builder {
            Ok(builder) => Some(Mailer {
                transport: builder
                    .port(smtp.port)
                    .credentials(Credentials::new(smtp.username.clone(), smtp.password))
                    .build(),
                username: smtp.username,
            }),
            Err(e) => {
                tracing::warn!("Failed to create SMTP transport: {}. Email notifications will be disabled.", e);
                None
            }
        };

        Self { mailer }
    }
}

#[async_trait]
impl AlertNotifier for SmtpNotifier {
    async fn send_alert(&self, alert: &Alert, recipients: &str) -> Result<(), PipelineError> {
        let mailer = self.mailer.as_ref().ok_or_else(|| {
            PipelineError::Notification("SMTP service is not configured on the server.".to_string())
        })?;

        let from: Mailbox = format!("\"Edge Guardian Alert\" <{}>", mailer.username)
            .parse()
            .map_err(|e| PipelineError::Notification(format!("Invalid sender address: {}", e)))?;

        let mut builder = Message::builder().from(from).subject(subject_for(alert));

        // The list is untyped free text; a malformed address is rejected
        // here by the transport layer, not validated upstream.
        for recipient in recipients.split(',').map(str::trim).filter(|r| !r.is_empty()) {
            let mailbox: Mailbox = recipient.parse().map_err(|e| {
                PipelineError::Notification(format!("Invalid recipient address: {}", e))
            })?;
            builder = builder.to(mailbox);
        }

        let html = alert_email_html(alert);

        // Inline the incident image when the reference is a data URI; a
        // plain URL is already reachable from the recipient's client.
        let email = if data_uri::is_data_uri(&alert.image_url) {
            let image = data_uri::decode(&alert.image_url)
                .map_err(|e| PipelineError::Notification(e.to_string()))?;
            let content_type = ContentType::parse(&image.content_type).map_err(|_| {
                PipelineError::Notification("Invalid incident image content type".to_string())
            })?;

            builder.multipart(
                MultiPart::related()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    )
                    .singlepart(
                        Attachment::new_inline("incidentImage".to_string())
                            .body(Body::new(image.bytes), content_type),
                    ),
            )
        } else {
            builder.header(ContentType::TEXT_HTML).body(html)
        }
        .map_err(|e| PipelineError::Notification(format!("Failed to build email: {}", e)))?;

        mailer.transport.send(email).await.map_err(|e| {
            tracing::error!("Error sending email: {}", e);
            PipelineError::Notification("Failed to send email via SMTP.".to_string())
        })?;

        tracing::info!(alert_id = %alert.id, "Notification email sent");
        Ok(())
    }
}

fn subject_for(alert: &Alert) -> String {
    format!(
        "❗ Emergency Alert: {} Detected",
        alert.draft.emergency_type.title_label()
    )
}

/// Severity badge color: high is red, medium amber, anything else green.
fn severity_color(severity: &str) -> &'static str {
    match severity.to_lowercase().as_str() {
        "high" => "#dc2626",
        "medium" => "#f59e0b",
        _ => "#22c55e",
    }
}

fn alert_email_html(alert: &Alert) -> String {
    let location = if alert.draft.location_details.is_empty() {
        &alert.location
    } else {
        &alert.draft.location_details
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Emergency Alert: {emergency_type}</title>
</head>
<body style="font-family: -apple-system, 'Segoe UI', Roboto, Helvetica, Arial, sans-serif; margin: 0; background-color: #f8f9fa; color: #343a40;">
    <div style="max-width: 600px; margin: 20px auto; background-color: #ffffff; border-radius: 8px; border: 1px solid #dee2e6;">
        <div style="background-color: #343a40; color: #ffffff; padding: 20px; text-align: center;">
            <h1 style="margin: 0; font-size: 24px;">Emergency Alert</h1>
        </div>
        <div style="padding: 20px;">
            <p style="font-size: 18px; font-weight: 500;">{message}</p>
            <div style="background-color: #f1f3f5; padding: 15px; border-radius: 6px; margin-bottom: 10px;">
                <strong>Severity</strong><br>
                <span style="padding: 5px 10px; border-radius: 9999px; color: #ffffff; font-weight: 600; text-transform: capitalize; background-color: {severity_color};">{severity}</span>
            </div>
            <div style="background-color: #f1f3f5; padding: 15px; border-radius: 6px; margin-bottom: 10px;">
                <strong>Emergency Type</strong><br>
                <span style="text-transform: capitalize;">{emergency_type}</span>
            </div>
            <div style="background-color: #f1f3f5; padding: 15px; border-radius: 6px; margin-bottom: 10px;">
                <strong>Location</strong><br>
                {location}
            </div>
            <div style="background-color: #f1f3f5; padding: 15px; border-radius: 6px; margin-bottom: 10px;">
                <strong>Recommended Actions</strong><br>
                {actions}
            </div>
            <div style="text-align: center; margin-top: 20px;">
                <strong>Incident Image</strong><br>
                <img src="cid:incidentImage" alt="Incident Image" style="max-width: 100%; border-radius: 6px;">
            </div>
        </div>
        <div style="background-color: #f1f3f5; padding: 15px; text-align: center; font-size: 12px; color: #6c757d;">
            This is an automated alert from Edge Guardian.
        </div>
    </div>
</body>
</html>"#,
        emergency_type = alert.draft.emergency_type.label(),
        message = alert.draft.alert_message,
        severity = alert.draft.severity,
        severity_color = severity_color(&alert.draft.severity),
        location = location,
        actions = alert.draft.recommended_actions,
    )
}
