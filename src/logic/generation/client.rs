//! Generation API client
//!
//! Thin client for an OpenAI-compatible chat-completions surface (the
//! default configuration points at Gemini's compatibility endpoint). Wire
//! types cover exactly what the generator needs: multimodal user content,
//! tool declarations, tool calls and JSON-object response format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

// ============================================================================
// WIRE TYPES
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn system(text: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: Some(MessageContent::Text(text.to_string())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user_text(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(MessageContent::Text(text.to_string())),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// User turn carrying both the instruction text and the image reference.
    pub fn user_with_image(text: &str, image_url: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: Some(MessageContent::Parts(vec![
                ContentPart::Text {
                    text: text.to_string(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_url.to_string(),
                    },
                },
            ])),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant turn echoing the tool calls the model requested.
    pub fn assistant_tool_calls(calls: Vec<ToolCall>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: None,
            tool_calls: Some(calls),
            tool_call_id: None,
        }
    }

    /// Tool result turn answering one tool call.
    pub fn tool_result(call_id: &str, output: &str) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(MessageContent::Text(output.to_string())),
            tool_calls: None,
            tool_call_id: Some(call_id.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's arguments
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API delivers them
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[allow(dead_code)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl ChatResponse {
    /// First-choice message, or a generation error when the response is
    /// empty.
    pub fn into_message(mut self) -> Result<ResponseMessage, PipelineError> {
        if self.choices.is_empty() {
            return Err(PipelineError::Generation(
                "the model returned no choices".to_string(),
            ));
        }
        Ok(self.choices.remove(0).message)
    }
}

// ============================================================================
// CLIENT
// ============================================================================

/// Seam for the chat API so the generator's tool loop is testable with a
/// scripted fake.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PipelineError>;

    /// Model name requests should carry.
    fn model(&self) -> &str;
}

/// Real client. Long-lived, created once per process and shared.
pub struct GenerationClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    http: reqwest::Client,
}

impl GenerationClient {
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        http: reqwest::Client,
    ) -> Self {
        Self {
            base_url,
            api_key,
            model,
            http,
        }
    }
}

#[async_trait]
impl ChatApi for GenerationClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PipelineError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PipelineError::Generation(
                "the generation service is not configured (missing API key)".to_string(),
            )
        })?;

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach generation service: {}", e);
                PipelineError::Generation(format!("could not reach the generation service: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Generation service error ({}): {}", status, body);
            return Err(PipelineError::Generation(format!(
                "the generation service returned status {}",
                status.as_u16()
            )));
        }

        response.json().await.map_err(|e| {
            tracing::error!("Failed to parse generation response: {}", e);
            PipelineError::Generation("unexpected response from the generation service".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_multimodal_user_content() {
        let request = ChatRequest {
            model: "gemini-2.0-flash".to_string(),
            messages: vec![ChatMessage::user_with_image(
                "Generate the alert.",
                "data:image/jpeg;base64,AAAA",
            )],
            tools: None,
            temperature: None,
            response_format: Some(ResponseFormat::json_object()),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["content"][1]["type"], "image_url");
        assert_eq!(
            value["messages"][0]["content"][1]["image_url"]["url"],
            "data:image/jpeg;base64,AAAA"
        );
        assert_eq!(value["response_format"]["type"], "json_object");
        // Unset optionals must not appear on the wire
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn tool_result_message_carries_call_id() {
        let msg = ChatMessage::tool_result("call_1", "done");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value["role"], "tool");
        assert_eq!(value["tool_call_id"], "call_1");
    }
}
