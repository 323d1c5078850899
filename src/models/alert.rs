//! Alert model
//!
//! [`AlertDraft`] is the schema-validated output of the generation step;
//! [`Alert`] is the assembled record handed back to the caller. Wire names
//! are camelCase to match the dashboard contract.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Emergency category derived by the model from the image.
///
/// Closed three-way enum; anything else in the generation output is a
/// schema-validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmergencyType {
    #[serde(rename = "fire")]
    Fire,
    #[serde(rename = "road accident")]
    RoadAccident,
    #[serde(rename = "other")]
    Other,
}

impl EmergencyType {
    pub fn label(&self) -> &'static str {
        match self {
            EmergencyType::Fire => "fire",
            EmergencyType::RoadAccident => "road accident",
            EmergencyType::Other => "other",
        }
    }

    /// Label with the first letter capitalized, for mail subjects.
    pub fn title_label(&self) -> String {
        let label = self.label();
        let mut chars = label.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

/// Generator output, before assembly into a full [`Alert`].
///
/// Severity is deliberately free text (informally low/medium/high); the
/// reference behavior compares it case-sensitively downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDraft {
    pub alert_message: String,
    pub severity: String,
    /// Step-by-step guide produced by the recommended-actions tool.
    pub recommended_actions: String,
    pub emergency_type: EmergencyType,
    /// Human-readable place description from the location tool, distinct
    /// from the raw device location.
    pub location_details: String,
}

/// Assembled alert record. Immutable once created; the caller owns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    #[serde(flatten)]
    pub draft: AlertDraft,
    pub id: String,
    /// Capture time, milliseconds since epoch.
    pub timestamp: i64,
    /// The original image reference (data URI or URL), as submitted.
    pub image_url: String,
    /// Raw device-supplied location string.
    pub location: String,
}

impl Alert {
    /// Assemble a full alert from a generated draft. Pure apart from the
    /// random id suffix; no failure path.
    ///
    /// The id is epoch-millis plus four random bytes in hex. Uniqueness is
    /// best-effort, which is acceptable for display-list keys.
    pub fn assemble(
        draft: AlertDraft,
        captured_at: DateTime<Utc>,
        image_url: &str,
        location: &str,
    ) -> Self {
        let millis = captured_at.timestamp_millis();
        let mut suffix = [0u8; 4];
        rand::thread_rng().fill_bytes(&mut suffix);

        Self {
            draft,
            id: format!("{}-{}", millis, hex::encode(suffix)),
            timestamp: millis,
            image_url: image_url.to_string(),
            location: location.to_string(),
        }
    }
}
