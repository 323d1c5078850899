//! Incident Decision
//!
//! Pure gate between classification and generation. Input: labeled scores.
//! Output: incident / no incident. No I/O, deterministic.

use crate::models::ClassificationScores;

/// Sentinel classification label meaning "nothing of interest detected".
pub const NO_INCIDENT_LABEL: &str = "No_Incident";

/// Outcome of scanning the score distribution.
///
/// The winning label is carried for logging only; the generator re-derives
/// the emergency type from the image itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncidentDecision {
    NoIncident,
    Incident { label: String },
}

/// Max-score scan with strictly-greater comparison.
///
/// The running maximum starts at zero with the sentinel as the running
/// winner, so an empty or all-non-positive score set resolves to
/// `NoIncident`, and ties keep the earlier-seen label.
pub fn decide(scores: &ClassificationScores) -> IncidentDecision {
    let mut best_label = NO_INCIDENT_LABEL.to_string();
    let mut best_score = 0.0_f64;

    for (label, score) in scores.iter() {
        if score > best_score {
            best_score = score;
            best_label = label.to_string();
        }
    }

    if best_label == NO_INCIDENT_LABEL {
        IncidentDecision::NoIncident
    } else {
        IncidentDecision::Incident { label: best_label }
    }
}
