//! Data models

pub mod alert;
pub mod classification;

pub use alert::{Alert, AlertDraft, EmergencyType};
pub use classification::ClassificationScores;
