//! Configuration module

use std::env;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// Image classification endpoint (Edge Impulse deployment).
    /// `None` means unconfigured; the pipeline fails fast at request time
    /// instead of falling back.
    pub classifier_url: Option<String>,

    /// Generation API (OpenAI-compatible chat completions surface)
    pub generation_base_url: String,
    pub generation_api_key: Option<String>,
    pub generation_model: String,

    /// Outbound mail. `None` when any of host/port/user/pass is missing;
    /// notification then fails at send time, never silently no-ops.
    pub smtp: Option<SmtpConfig>,
}

/// SMTP transport settings
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(9002),

            classifier_url: env::var("EDGE_IMPULSE_API_URL").ok().filter(|u| !u.is_empty()),

            generation_base_url: env::var("GENERATION_API_BASE_URL").unwrap_or_else(|_| {
                "https://generativelanguage.googleapis.com/v1beta/openai".to_string()
            }),

            generation_api_key: env::var("GENERATION_API_KEY").ok().filter(|k| !k.is_empty()),

            generation_model: env::var("GENERATION_MODEL")
                .unwrap_or_else(|_| "gemini-2.0-flash".to_string()),

            smtp: SmtpConfig::from_env(),
        }
    }
}

impl SmtpConfig {
    /// All four SMTP variables must be present for mail to be enabled.
    fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok().filter(|v| !v.is_empty())?;
        let port = env::var("SMTP_PORT").ok().and_then(|p| p.parse().ok())?;
        let username = env::var("SMTP_USER").ok().filter(|v| !v.is_empty())?;
        let password = env::var("SMTP_PASS").ok().filter(|v| !v.is_empty())?;

        Some(Self {
            host,
            port,
            username,
            password,
        })
    }
}
