//! Authenticated HTTP client shared by the Google API wrappers
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Clone)]
pub struct GoogleClient {
    client: Client,
    access_token: String,
}

impl GoogleClient {
    pub fn new(access_token: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            access_token: access_token.to_string(),
        })
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let builder = self
            .client
            .get(url)
            .query(query)
            .bearer_auth(&self.access_token);
        self.execute(builder).await
    }

    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let builder = self
            .client
            .post(url)
            .bearer_auth(&self.access_token)
            .json(body);
        self.execute(builder).await
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let res = builder.send().await.context("HTTP request failed")?;
        let status = res.status();
        tracing::debug!("Google API response status: {}", status);

        if status == StatusCode::TOO_MANY_REQUESTS {
            anyhow::bail!("Rate limited by Google API. Please try again later.");
        }

        let text = res.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!(extract_error_message(&text, status));
        }

        let parsed: T = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse Google API response: {}", text))?;
        Ok(parsed)
    }
}

/// Google APIs wrap failures as `{"error": {"code": 400, "message": "..."}}`
fn extract_error_message(body: &str, status: StatusCode) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let error = parsed.as_ref().and_then(|v| v.get("error"));

    if let Some(message) = error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        let code = error
            .and_then(|e| e.get("code"))
            .and_then(|c| c.as_i64())
            .unwrap_or(status.as_u16() as i64);
        let reason = error
            .and_then(|e| e.get("errors"))
            .and_then(|e| e.as_array())
            .and_then(|e| e.first())
            .and_then(|e| e.get("reason"))
            .and_then(|r| r.as_str());

        return match reason {
            Some(reason) => format!("Google API error {} ({}): {}", code, reason, message),
            None => format!("Google API error {}: {}", code, message),
        };
    }

    format!("HTTP {} error: {}", status, body)
}
