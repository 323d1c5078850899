//! Alert Pipeline Orchestrator
//!
//! Sequences validate → classify → decide → generate → assemble → notify,
//! converting every failure mode into a single well-typed outcome. Nothing
//! propagates past this boundary untyped, and no state is carried between
//! invocations.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::classifier::ImageClassifier;
use super::data_uri;
use super::decision::{self, IncidentDecision};
use super::generation::AlertGenerator;
use super::notify::AlertNotifier;
use crate::error::PipelineError;
use crate::models::Alert;

/// Pipeline input, as submitted by the dashboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAlertRequest {
    pub image_data_uri: String,
    pub location: String,
    /// Optional comma-separated recipient list; notification is skipped
    /// entirely when absent or blank.
    #[serde(default)]
    pub recipient_emails: Option<String>,
}

/// Pipeline outcome. Exactly one of three shapes per invocation:
/// no-incident informational, alert with success message (possibly carrying
/// a notification warning), or failure with no alert.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertOutcome {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_no_incident: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
}

impl AlertOutcome {
    fn no_incident() -> Self {
        Self {
            success: true,
            message: "No incident was detected in the provided image.".to_string(),
            is_no_incident: Some(true),
            alert: None,
        }
    }

    fn alert_generated(alert: Alert) -> Self {
        Self {
            success: true,
            message: "Alert generated successfully.".to_string(),
            is_no_incident: None,
            alert: Some(alert),
        }
    }

    fn notification_failed(alert: Alert) -> Self {
        Self {
            success: true,
            message: "Alert generated, but failed to send email notification. Please check your SMTP configuration."
                .to_string(),
            is_no_incident: None,
            alert: Some(alert),
        }
    }

    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            is_no_incident: None,
            alert: None,
        }
    }
}

/// The orchestrator. Collaborators are injected by the composition root;
/// each invocation is independent and stateless beyond its locals.
pub struct AlertPipeline {
    classifier: Arc<dyn ImageClassifier>,
    generator: Arc<dyn AlertGenerator>,
    notifier: Arc<dyn AlertNotifier>,
}

impl AlertPipeline {
    pub fn new(
        classifier: Arc<dyn ImageClassifier>,
        generator: Arc<dyn AlertGenerator>,
        notifier: Arc<dyn AlertNotifier>,
    ) -> Self {
        Self {
            classifier,
            generator,
            notifier,
        }
    }

    /// Run one pipeline invocation. Never fails at the type level: every
    /// error is folded into the outcome message.
    pub async fn run(&self, request: GenerateAlertRequest) -> AlertOutcome {
        match self.execute(request).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!("Alert pipeline failed: {}", err);
                AlertOutcome::failure(err.to_string())
            }
        }
    }

    async fn execute(&self, request: GenerateAlertRequest) -> Result<AlertOutcome, PipelineError> {
        // Validating: field-level input checks first, then required external
        // configuration, all before any I/O.
        if request.image_data_uri.trim().is_empty() {
            return Err(PipelineError::Validation("Please provide an image.".to_string()));
        }
        if request.location.trim().is_empty() {
            return Err(PipelineError::Validation("Location is required.".to_string()));
        }
        self.classifier.check_configuration()?;

        let image = data_uri::decode(&request.image_data_uri)?;

        // Classifying: single attempt, no retries at any layer.
        let scores = self
            .classifier
            .classify(image.bytes, &image.content_type)
            .await?;

        // Deciding
        let label = match decision::decide(&scores) {
            IncidentDecision::NoIncident => {
                tracing::info!("No incident detected");
                return Ok(AlertOutcome::no_incident());
            }
            IncidentDecision::Incident { label } => label,
        };
        tracing::info!(label = %label, "Incident detected, generating alert");

        // Generating: the classification label is deliberately not passed
        // on; the generator re-examines the image independently.
        let draft = self
            .generator
            .generate_alert(&request.image_data_uri, &request.location)
            .await?;

        // Assembling: no failure path.
        let alert = Alert::assemble(
            draft,
            Utc::now(),
            &request.image_data_uri,
            &request.location,
        );

        // Notifying: only with a recipient list, and a failure here degrades
        // the message without revoking the alert.
        let recipients = request
            .recipient_emails
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty());

        if let Some(recipients) = recipients {
            if let Err(err) = self.notifier.send_alert(&alert, recipients).await {
                tracing::warn!("Failed to send notification email: {}", err);
                return Ok(AlertOutcome::notification_failed(alert));
            }
        }

        Ok(AlertOutcome::alert_generated(alert))
    }
}
