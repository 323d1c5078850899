//! Tool-Augmented Alert Generator
//!
//! One schema-constrained model invocation produces the alert draft. During
//! that invocation the model may call two tools: a location-description tool
//! (secondary model call) and a rule-based recommended-actions tool. The
//! generator owns the generic tool-invocation loop; the orchestrator never
//! calls tools directly.

pub mod client;
pub mod tools;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::models::AlertDraft;
use client::{
    ChatApi, ChatMessage, ChatRequest, FunctionDefinition, ResponseFormat, ToolDefinition,
};
use tools::{LocationDetailsTool, NextActionsTool, Tool};

/// Boundary trait so the pipeline and handlers can run against stubs.
#[async_trait]
pub trait AlertGenerator: Send + Sync {
    /// Produce a schema-valid alert draft for an incident image.
    async fn generate_alert(
        &self,
        image_url: &str,
        device_location: &str,
    ) -> Result<AlertDraft, PipelineError>;

    /// Concise summary of a free-text incident report (no tools).
    async fn summarize_report(&self, incident_report: &str) -> Result<String, PipelineError>;
}

/// Upper bound on tool-call rounds per generation; exceeding it is a
/// generation failure.
const MAX_TOOL_ROUNDS: usize = 5;

const ALERT_SYSTEM_PROMPT: &str = "You are an AI assistant designed to generate real-time emergency alerts with contextual information. \
An emergency has been detected in an image. Your task is to: \
1. Analyze the image to determine the type of emergency ('fire', 'road accident', or 'other'). \
2. Generate a concise and informative alert message based on the image. \
3. Determine the severity of the incident (low, medium, high). \
4. Use the getLocationDetails tool to get a descriptive summary of the incident location. \
5. Use the getNextActions tool to provide a detailed, step-by-step guide of actions to take. \
Respond with a single JSON object with exactly these fields: \
alertMessage (string), severity (string), recommendedActions (string), \
emergencyType (one of \"fire\", \"road accident\", \"other\"), locationDetails (string).";

/// Real generator over a chat API with tool calling.
pub struct LlmAlertGenerator {
    client: Arc<dyn ChatApi>,
    tools: Vec<Arc<dyn Tool>>,
}

impl LlmAlertGenerator {
    pub fn new(client: Arc<dyn ChatApi>) -> Self {
        let tools: Vec<Arc<dyn Tool>> = vec![
            Arc::new(NextActionsTool),
            Arc::new(LocationDetailsTool::new(client.clone())),
        ];
        Self { client, tools }
    }

    fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|tool| ToolDefinition {
                kind: "function".to_string(),
                function: FunctionDefinition {
                    name: tool.name().to_string(),
                    description: tool.description().to_string(),
                    parameters: tool.parameters(),
                },
            })
            .collect()
    }

    fn find_tool(&self, name: &str) -> Result<&Arc<dyn Tool>, PipelineError> {
        self.tools
            .iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| {
                PipelineError::Generation(format!("the model called an unknown tool: {}", name))
            })
    }

    /// Generic invocation loop: send, execute requested tool calls, feed the
    /// results back, repeat until the model emits its final output.
    async fn run_tool_loop(
        &self,
        mut messages: Vec<ChatMessage>,
    ) -> Result<String, PipelineError> {
        for _round in 0..MAX_TOOL_ROUNDS {
            let request = ChatRequest {
                model: self.client.model().to_string(),
                messages: messages.clone(),
                tools: Some(self.tool_definitions()),
                temperature: None,
                response_format: Some(ResponseFormat::json_object()),
            };

            let message = self.client.chat(request).await?.into_message()?;

            let calls = message.tool_calls.unwrap_or_default();
            if calls.is_empty() {
                return message.content.filter(|c| !c.is_empty()).ok_or_else(|| {
                    PipelineError::Generation("the model returned an empty response".to_string())
                });
            }

            messages.push(ChatMessage::assistant_tool_calls(calls.clone()));
            for call in calls {
                let tool = self.find_tool(&call.function.name)?;
                let arguments: serde_json::Value = serde_json::from_str(&call.function.arguments)
                    .map_err(|e| {
                    PipelineError::Generation(format!(
                        "invalid arguments for tool {}: {}",
                        call.function.name, e
                    ))
                })?;

                tracing::debug!(tool = %call.function.name, "executing tool call");
                let output = tool.call(arguments).await?;
                messages.push(ChatMessage::tool_result(&call.id, &output));
            }
        }

        Err(PipelineError::Generation(
            "tool-call limit exceeded".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct SummaryOutput {
    summary: String,
}

#[async_trait]
impl AlertGenerator for LlmAlertGenerator {
    async fn generate_alert(
        &self,
        image_url: &str,
        device_location: &str,
    ) -> Result<AlertDraft, PipelineError> {
        let user_text = format!("Device Location: {}\n\nGenerate the alert.", device_location);
        let messages = vec![
            ChatMessage::system(ALERT_SYSTEM_PROMPT),
            ChatMessage::user_with_image(&user_text, image_url),
        ];

        let output = self.run_tool_loop(messages).await?;

        // Schema enforcement: the final output must deserialize into the
        // draft shape; there is no field-level fallback.
        serde_json::from_str(&output).map_err(|e| {
            tracing::error!("Generation output failed schema validation: {}", e);
            PipelineError::Generation(
                "the model returned output that does not match the alert schema".to_string(),
            )
        })
    }

    async fn summarize_report(&self, incident_report: &str) -> Result<String, PipelineError> {
        let prompt = format!(
            "You are an expert at summarizing incident reports. Please provide a concise summary \
             of the following incident report, highlighting the key details. Respond with a single \
             JSON object with one field: summary (string).\n\nIncident Report:\n{}",
            incident_report
        );

        let request = ChatRequest {
            model: self.client.model().to_string(),
            messages: vec![ChatMessage::user_text(&prompt)],
            tools: None,
            temperature: None,
            response_format: Some(ResponseFormat::json_object()),
        };

        let message = self.client.chat(request).await?.into_message()?;
        let content = message.content.filter(|c| !c.is_empty()).ok_or_else(|| {
            PipelineError::Generation("the model returned an empty response".to_string())
        })?;

        let output: SummaryOutput = serde_json::from_str(&content).map_err(|_| {
            PipelineError::Generation(
                "the model returned output that does not match the summary schema".to_string(),
            )
        })?;

        Ok(output.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::client::ChatResponse;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Chat API fake that replays a scripted response queue and records
    /// every request it was sent.
    struct ScriptedApi {
        responses: Mutex<VecDeque<serde_json::Value>>,
        requests: Mutex<Vec<serde_json::Value>>,
    }

    impl ScriptedApi {
        fn new(responses: Vec<serde_json::Value>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn recorded_requests(&self) -> Vec<serde_json::Value> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatApi for ScriptedApi {
        fn model(&self) -> &str {
            "test-model"
        }

        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, PipelineError> {
            self.requests
                .lock()
                .unwrap()
                .push(serde_json::to_value(&request).unwrap());

            let raw = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("scripted response queue exhausted");
            Ok(serde_json::from_value(raw).unwrap())
        }
    }

    fn final_message(content: serde_json::Value) -> serde_json::Value {
        json!({
            "choices": [{
                "message": { "content": content.to_string(), "tool_calls": null },
                "finish_reason": "stop"
            }]
        })
    }

    fn tool_call_message(calls: serde_json::Value) -> serde_json::Value {
        json!({
            "choices": [{
                "message": { "content": null, "tool_calls": calls },
                "finish_reason": "tool_calls"
            }]
        })
    }

    fn valid_draft_json() -> serde_json::Value {
        json!({
            "alertMessage": "Major fire at a warehouse",
            "severity": "high",
            "recommendedActions": "1. Evacuate the area immediately.",
            "emergencyType": "fire",
            "locationDetails": "near the old mill district"
        })
    }

    #[tokio::test]
    async fn direct_schema_valid_output_is_accepted() {
        let api = ScriptedApi::new(vec![final_message(valid_draft_json())]);
        let generator = LlmAlertGenerator::new(api.clone());

        let draft = generator
            .generate_alert("data:image/jpeg;base64,AAAA", "51.5,-0.1")
            .await
            .unwrap();

        assert_eq!(draft.severity, "high");
        assert_eq!(draft.emergency_type, crate::models::EmergencyType::Fire);

        // The single request declared both tools to the model
        let requests = api.recorded_requests();
        assert_eq!(requests.len(), 1);
        let tool_names: Vec<&str> = requests[0]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["function"]["name"].as_str().unwrap())
            .collect();
        assert!(tool_names.contains(&"getNextActions"));
        assert!(tool_names.contains(&"getLocationDetails"));
    }

    #[tokio::test]
    async fn tool_calls_are_executed_and_fed_back() {
        let api = ScriptedApi::new(vec![
            // Round 1: the model asks for both tools
            tool_call_message(json!([
                {
                    "id": "call_actions",
                    "type": "function",
                    "function": {
                        "name": "getNextActions",
                        "arguments": "{\"emergencyType\":\"fire\",\"severity\":\"high\"}"
                    }
                },
                {
                    "id": "call_location",
                    "type": "function",
                    "function": {
                        "name": "getLocationDetails",
                        "arguments": "{\"deviceLocation\":\"51.5,-0.1\"}"
                    }
                }
            ])),
            // Nested call made by the location tool itself
            final_message_text("near the old mill district"),
            // Round 2: final structured output
            final_message(valid_draft_json()),
        ]);
        let generator = LlmAlertGenerator::new(api.clone());

        let draft = generator
            .generate_alert("data:image/jpeg;base64,AAAA", "51.5,-0.1")
            .await
            .unwrap();
        assert_eq!(draft.alert_message, "Major fire at a warehouse");

        let requests = api.recorded_requests();
        assert_eq!(requests.len(), 3);

        // The location tool's secondary call runs at creative temperature
        let nested = &requests[1];
        assert!((nested["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);

        // The second loop request replays the assistant tool calls followed
        // by one tool-result message per call
        let roles: Vec<&str> = requests[2]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "user", "assistant", "tool", "tool"]);
        let actions_result = &requests[2]["messages"][3];
        assert_eq!(actions_result["tool_call_id"], "call_actions");
        assert!(
            actions_result["content"]
                .as_str()
                .unwrap()
                .starts_with("1. Call emergency services")
        );
    }

    fn final_message_text(text: &str) -> serde_json::Value {
        json!({
            "choices": [{
                "message": { "content": text, "tool_calls": null },
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn schema_invalid_output_is_generation_failure() {
        let api = ScriptedApi::new(vec![final_message(json!({
            "alertMessage": "m",
            "severity": "low"
        }))]);
        let generator = LlmAlertGenerator::new(api);

        let err = generator
            .generate_alert("data:image/jpeg;base64,AAAA", "loc")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Generation(_)));
        assert!(err.to_string().starts_with("AI alert generation failed:"));
    }

    #[tokio::test]
    async fn unknown_tool_is_generation_failure() {
        let api = ScriptedApi::new(vec![tool_call_message(json!([
            {
                "id": "call_1",
                "type": "function",
                "function": { "name": "launchDrone", "arguments": "{}" }
            }
        ]))]);
        let generator = LlmAlertGenerator::new(api);

        let err = generator
            .generate_alert("data:image/jpeg;base64,AAAA", "loc")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown tool"));
    }

    #[tokio::test]
    async fn endless_tool_calls_hit_the_round_limit() {
        let looping_call = tool_call_message(json!([
            {
                "id": "call_n",
                "type": "function",
                "function": {
                    "name": "getNextActions",
                    "arguments": "{\"emergencyType\":\"other\",\"severity\":\"low\"}"
                }
            }
        ]));
        let api = ScriptedApi::new(vec![looping_call; 6]);
        let generator = LlmAlertGenerator::new(api);

        let err = generator
            .generate_alert("data:image/jpeg;base64,AAAA", "loc")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("tool-call limit exceeded"));
    }

    #[tokio::test]
    async fn summarize_parses_summary_output() {
        let api = ScriptedApi::new(vec![final_message(json!({
            "summary": "Two-vehicle collision, no injuries reported."
        }))]);
        let generator = LlmAlertGenerator::new(api.clone());

        let summary = generator
            .summarize_report("Long report text ...")
            .await
            .unwrap();
        assert_eq!(summary, "Two-vehicle collision, no injuries reported.");

        // Summarization never declares tools
        let requests = api.recorded_requests();
        assert!(requests[0].get("tools").is_none());
    }
}
