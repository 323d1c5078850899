//! Classification Gateway
//!
//! Wraps the external image-classification endpoint (an Edge Impulse
//! deployment behind a tunnel). One attempt per invocation; retry policy, if
//! any, belongs to the caller.

use async_trait::async_trait;
use reqwest::multipart;

use crate::error::PipelineError;
use crate::models::ClassificationScores;

/// Boundary trait so the pipeline can run against a stub in tests.
#[async_trait]
pub trait ImageClassifier: Send + Sync {
    /// Fail fast when the gateway cannot operate, before any network I/O.
    fn check_configuration(&self) -> Result<(), PipelineError> {
        Ok(())
    }

    /// Classify raw image bytes into a labeled score distribution.
    async fn classify(
        &self,
        image: Vec<u8>,
        content_type: &str,
    ) -> Result<ClassificationScores, PipelineError>;
}

/// Real gateway over HTTP multipart upload.
pub struct HttpClassifier {
    endpoint: Option<String>,
    client: reqwest::Client,
}

impl HttpClassifier {
    pub fn new(endpoint: Option<String>, client: reqwest::Client) -> Self {
        Self { endpoint, client }
    }

    fn endpoint(&self) -> Result<&str, PipelineError> {
        self.endpoint.as_deref().ok_or_else(|| {
            tracing::error!("Missing classification endpoint configuration");
            PipelineError::Configuration(
                "The image analysis service is not configured. Please set the EDGE_IMPULSE_API_URL environment variable."
                    .to_string(),
            )
        })
    }
}

#[async_trait]
impl ImageClassifier for HttpClassifier {
    fn check_configuration(&self) -> Result<(), PipelineError> {
        self.endpoint().map(|_| ())
    }

    async fn classify(
        &self,
        image: Vec<u8>,
        content_type: &str,
    ) -> Result<ClassificationScores, PipelineError> {
        let endpoint = self.endpoint()?;

        let part = multipart::Part::bytes(image)
            .file_name("image.jpg")
            .mime_str(content_type)
            .map_err(|_| PipelineError::Validation("Invalid data URI".to_string()))?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(endpoint)
            // The tunnel in front of the deployment interstitials browsers;
            // this header opts out for API clients.
            .header("Bypass-Tunnel-Reminder", "true")
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach analysis service: {}", e);
                PipelineError::AnalysisUnreachable
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Analysis service error ({}): {}", status, body);
            return Err(PipelineError::AnalysisStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!("Failed to read analysis response: {}", e);
            PipelineError::AnalysisUnreachable
        })?;

        ClassificationScores::parse_body(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_endpoint_is_configuration_error() {
        let classifier = HttpClassifier::new(None, reqwest::Client::new());
        let err = classifier.check_configuration().unwrap_err();
        assert!(matches!(err, PipelineError::Configuration(_)));
        assert!(err.to_string().contains("EDGE_IMPULSE_API_URL"));
    }

    #[test]
    fn configured_endpoint_passes_check() {
        let classifier = HttpClassifier::new(
            Some("http://localhost:8000/classify".to_string()),
            reqwest::Client::new(),
        );
        assert!(classifier.check_configuration().is_ok());
    }
}
