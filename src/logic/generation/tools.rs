//! Generator tools
//!
//! The model drives these, not the orchestrator: a tool is a named,
//! schema-typed callable the model may invoke zero or more times while
//! producing the alert.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::client::{ChatApi, ChatMessage, ChatRequest};
use crate::error::PipelineError;

/// A callable the model may invoke during generation.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the arguments the model must supply.
    fn parameters(&self) -> serde_json::Value;
    async fn call(&self, arguments: serde_json::Value) -> Result<String, PipelineError>;
}

// ============================================================================
// RECOMMENDED ACTIONS
// ============================================================================

/// Rule-based action guide. Deliberately deterministic so the text for a
/// given (type, severity) pair is always identical.
///
/// The `high` comparison is exact and case-sensitive, matching the observed
/// reference behavior ("High" takes the non-high branch).
pub fn next_actions(emergency_type: &str, severity: &str) -> &'static str {
    if emergency_type == "road accident" {
        if severity == "high" {
            "1. Call emergency services (e.g., 911) immediately. 2. Do not move injured individuals unless they are in immediate danger. 3. Secure the scene by turning on hazard lights. 4. Provide first aid if you are trained and it is safe to do so."
        } else {
            "1. Assess the situation for any injuries. 2. Move vehicles to a safe location if possible. 3. Exchange insurance and contact information with other parties. 4. Document the scene with photos."
        }
    } else if emergency_type == "fire" {
        "1. Evacuate the area immediately. 2. Activate the nearest fire alarm. 3. Call the fire department from a safe location. 4. Close doors behind you to slow the spread of fire. Do not use elevators."
    } else {
        "1. Assess the situation for immediate dangers. 2. Call for help if needed. 3. Provide assistance to others if it is safe to do so. 4. Follow instructions from emergency personnel when they arrive."
    }
}

pub struct NextActionsTool;

#[derive(Debug, Deserialize)]
struct NextActionsArgs {
    #[serde(rename = "emergencyType")]
    emergency_type: String,
    severity: String,
}

#[async_trait]
impl Tool for NextActionsTool {
    fn name(&self) -> &str {
        "getNextActions"
    }

    fn description(&self) -> &str {
        "Generates a detailed, step-by-step guide of actions, precautions, and guidance based on the emergency type and severity."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "emergencyType": {
                    "type": "string",
                    "description": "The type of emergency detected."
                },
                "severity": {
                    "type": "string",
                    "description": "The severity of the emergency."
                }
            },
            "required": ["emergencyType", "severity"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, PipelineError> {
        let args: NextActionsArgs = serde_json::from_value(arguments).map_err(|e| {
            PipelineError::Generation(format!("invalid getNextActions arguments: {}", e))
        })?;

        tracing::debug!(
            emergency_type = %args.emergency_type,
            severity = %args.severity,
            "getNextActions tool called"
        );

        Ok(next_actions(&args.emergency_type, &args.severity).to_string())
    }
}

// ============================================================================
// LOCATION DETAILS
// ============================================================================

/// Turns raw device coordinates into a descriptive place name via a
/// secondary model call. A reverse-geocoding API would slot in here; the
/// reference uses a creative-temperature generation instead.
pub struct LocationDetailsTool {
    client: Arc<dyn ChatApi>,
}

/// Elevated from deterministic to favor varied, natural phrasing.
const LOCATION_TEMPERATURE: f32 = 0.7;

impl LocationDetailsTool {
    pub fn new(client: Arc<dyn ChatApi>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct LocationDetailsArgs {
    #[serde(rename = "deviceLocation")]
    device_location: String,
}

#[async_trait]
impl Tool for LocationDetailsTool {
    fn name(&self) -> &str {
        "getLocationDetails"
    }

    fn description(&self) -> &str {
        "Provides a descriptive summary of a location based on coordinates."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "deviceLocation": {
                    "type": "string",
                    "description": "The coordinates of the device."
                }
            },
            "required": ["deviceLocation"]
        })
    }

    async fn call(&self, arguments: serde_json::Value) -> Result<String, PipelineError> {
        let args: LocationDetailsArgs = serde_json::from_value(arguments).map_err(|e| {
            PipelineError::Generation(format!("invalid getLocationDetails arguments: {}", e))
        })?;

        let prompt = format!(
            "Convert the following coordinates into a plausible, descriptive, human-readable address. \
             For example, \"near the old town square\" or \"on the corner of Main St and 2nd Ave\". \
             Coordinates: {}",
            args.device_location
        );

        let request = ChatRequest {
            model: self.client.model().to_string(),
            messages: vec![ChatMessage::user_text(&prompt)],
            tools: None,
            temperature: Some(LOCATION_TEMPERATURE),
            response_format: None,
        };

        // A failed secondary call fails the tool invocation, which fails the
        // whole generation; never degrade silently.
        let message = self.client.chat(request).await?.into_message()?;
        message.content.filter(|text| !text.is_empty()).ok_or_else(|| {
            PipelineError::Generation("location description call returned no text".to_string())
        })
    }
}
