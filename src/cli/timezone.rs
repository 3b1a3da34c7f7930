use anyhow::Result;
use chrono::Utc;
use serde_json::json;

use crate::core::AppConfig;
use crate::google::{CalendarApi, GoogleClient};

pub async fn run(config: &AppConfig, json: bool) -> Result<()> {
    let client = GoogleClient::new(config.access_token()?, config.request_timeout_secs)?;
    let calendar = CalendarApi::new(client, &config.calendar_api_url);
    let tz = calendar.primary_timezone().await?;
    let now = Utc::now().with_timezone(&tz);

    if json {
        println!(
            "{}",
            json!({
                "timezone": tz.name(),
                "now": now.to_rfc3339(),
            })
        );
    } else {
        println!("{}  {}", tz.name(), now.format("%Y-%m-%d %H:%M %Z"));
    }
    Ok(())
}
