use anyhow::{Result, anyhow};
use std::env;

pub const DEFAULT_CALENDAR_API_URL: &str = "https://www.googleapis.com/calendar/v3";
pub const DEFAULT_CLOUD_IDENTITY_API_URL: &str = "https://cloudidentity.googleapis.com/v1";

/// Upper bound on concurrent per-member calendar requests. Overrides may
/// lower it but never raise it.
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub access_token: Option<String>,
    pub calendar_api_url: String,
    pub cloud_identity_api_url: String,
    pub max_concurrency: usize,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let access_token = env::var("GOG_ACCESS_TOKEN")
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let calendar_api_url = env::var("GOG_CALENDAR_API_URL")
            .unwrap_or_else(|_| DEFAULT_CALENDAR_API_URL.to_string());
        let cloud_identity_api_url = env::var("GOG_CLOUD_IDENTITY_API_URL")
            .unwrap_or_else(|_| DEFAULT_CLOUD_IDENTITY_API_URL.to_string());
        let max_concurrency = env::var("GOG_MAX_CONCURRENCY")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_CONCURRENCY)
            .clamp(1, DEFAULT_MAX_CONCURRENCY);
        let request_timeout_secs = env::var("GOG_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        Self {
            access_token,
            calendar_api_url: calendar_api_url.trim_end_matches('/').to_string(),
            cloud_identity_api_url: cloud_identity_api_url.trim_end_matches('/').to_string(),
            max_concurrency,
            request_timeout_secs,
        }
    }
}

impl AppConfig {
    /// Returns the configured OAuth access token or an error explaining how
    /// to provide one.
    pub fn access_token(&self) -> Result<&str> {
        self.access_token.as_deref().ok_or(anyhow!(
            "No access token configured. Set GOG_ACCESS_TOKEN or pass --access-token"
        ))
    }
}
