//! Classification result types
//!
//! Wire envelope from the analysis service plus the ordered score list the
//! incident decision consumes. Label order is preserved from the response
//! document because the decision's tie-break keeps the earlier-seen label.

use serde::Deserialize;

use crate::error::PipelineError;

/// Response envelope: `{ "result": { "classification": { <label>: <score> } } }`
#[derive(Debug, Deserialize)]
pub struct AnalysisEnvelope {
    pub result: Option<AnalysisResult>,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisResult {
    // serde_json's preserve_order keeps the document's label order here
    pub classification: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Labeled confidence scores, in response-document order.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationScores(Vec<(String, f64)>);

impl ClassificationScores {
    pub fn new(scores: Vec<(String, f64)>) -> Self {
        Self(scores)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(label, score)| (label.as_str(), *score))
    }

    /// Parse a raw response body into scores.
    ///
    /// An empty body, a missing envelope, an empty mapping, or a non-numeric
    /// score are all malformed-response errors; they must not be read as
    /// "zero confidence everywhere".
    pub fn parse_body(body: &str) -> Result<Self, PipelineError> {
        if body.is_empty() {
            return Err(PipelineError::AnalysisEmptyResponse);
        }

        let envelope: AnalysisEnvelope =
            serde_json::from_str(body).map_err(|_| PipelineError::AnalysisUnexpectedShape)?;

        let classification = envelope
            .result
            .and_then(|r| r.classification)
            .ok_or(PipelineError::AnalysisUnexpectedShape)?;

        if classification.is_empty() {
            return Err(PipelineError::AnalysisUnexpectedShape);
        }

        let mut scores = Vec::with_capacity(classification.len());
        for (label, value) in classification {
            let score = value
                .as_f64()
                .ok_or(PipelineError::AnalysisUnexpectedShape)?;
            scores.push((label, score));
        }

        Ok(Self::new(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_body_in_document_order() {
        let body = r#"{"result":{"classification":{"No_Incident":0.1,"fire":0.9}}}"#;
        let scores = ClassificationScores::parse_body(body).unwrap();

        let labels: Vec<&str> = scores.iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["No_Incident", "fire"]);
    }

    #[test]
    fn empty_body_is_empty_response_error() {
        let err = ClassificationScores::parse_body("").unwrap_err();
        assert!(matches!(err, PipelineError::AnalysisEmptyResponse));
    }

    #[test]
    fn missing_classification_is_shape_error() {
        let err = ClassificationScores::parse_body(r#"{"result":{}}"#).unwrap_err();
        assert!(matches!(err, PipelineError::AnalysisUnexpectedShape));
    }

    #[test]
    fn non_json_body_is_shape_error() {
        let err = ClassificationScores::parse_body("<html>busy</html>").unwrap_err();
        assert!(matches!(err, PipelineError::AnalysisUnexpectedShape));
    }

    #[test]
    fn empty_mapping_is_shape_error() {
        let err =
            ClassificationScores::parse_body(r#"{"result":{"classification":{}}}"#).unwrap_err();
        assert!(matches!(err, PipelineError::AnalysisUnexpectedShape));
    }

    #[test]
    fn non_numeric_score_is_shape_error() {
        let body = r#"{"result":{"classification":{"fire":"hot"}}}"#;
        let err = ClassificationScores::parse_body(body).unwrap_err();
        assert!(matches!(err, PipelineError::AnalysisUnexpectedShape));
    }
}
