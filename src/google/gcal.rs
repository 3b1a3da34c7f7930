//! Google Calendar API v3: event listing, free/busy and calendar metadata
use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use super::client::GoogleClient;
use crate::team::{EventsSource, FreeBusySource, MemberIdentity};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateTime {
    /// Set for all-day events (`YYYY-MM-DD`)
    pub date: Option<String>,
    /// Set for timed events (RFC3339)
    pub date_time: Option<String>,
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub email: Option<String>,
    #[serde(rename = "self", default)]
    pub is_self: bool,
    pub response_status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    pub summary: Option<String>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    pub start: Option<EventDateTime>,
    pub end: Option<EventDateTime>,
    #[serde(default)]
    pub attendees: Vec<EventAttendee>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsListResponse {
    #[serde(default)]
    pub items: Vec<Event>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEntry {
    pub id: String,
    pub time_zone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FreeBusyRequestItem {
    pub id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyRequest {
    pub time_min: String,
    pub time_max: String,
    pub items: Vec<FreeBusyRequestItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimePeriod {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FreeBusyError {
    pub domain: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FreeBusyCalendar {
    #[serde(default)]
    pub busy: Vec<TimePeriod>,
    #[serde(default)]
    pub errors: Vec<FreeBusyError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreeBusyResponse {
    #[serde(default)]
    pub calendars: HashMap<String, FreeBusyCalendar>,
}

pub struct CalendarApi {
    client: GoogleClient,
    base_url: String,
}

impl CalendarApi {
    pub fn new(client: GoogleClient, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up the IANA timezone configured on the account's primary calendar
    pub async fn primary_timezone(&self) -> Result<Tz> {
        let url = format!("{}/calendars/primary", self.base_url);
        let entry: CalendarEntry = self.client.get_json(&url, &[]).await?;
        let name = entry
            .time_zone
            .filter(|tz| !tz.is_empty())
            .ok_or(anyhow!("Calendar {} has no timezone set", entry.id))?;
        name.parse::<Tz>()
            .map_err(|e| anyhow!("Invalid calendar timezone {:?}: {}", name, e))
    }

    /// List single (expanded) events ordered by start time. Only the first
    /// page is fetched so `max_results` caps the number of events returned.
    pub async fn list_events(
        &self,
        calendar_id: &str,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<Event>> {
        tracing::debug!("Listing events for calendar: {}", calendar_id);
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );
        let query = [
            ("singleEvents", "true".to_string()),
            ("orderBy", "startTime".to_string()),
            ("timeMin", time_min.to_string()),
            ("timeMax", time_max.to_string()),
            ("maxResults", max_results.to_string()),
        ];
        let resp: EventsListResponse = self.client.get_json(&url, &query).await?;
        tracing::debug!("Retrieved {} events for {}", resp.items.len(), calendar_id);
        Ok(resp.items)
    }

    pub async fn query_freebusy(
        &self,
        calendar_ids: &[String],
        time_min: &str,
        time_max: &str,
    ) -> Result<FreeBusyResponse> {
        let url = format!("{}/freeBusy", self.base_url);
        let body = FreeBusyRequest {
            time_min: time_min.to_string(),
            time_max: time_max.to_string(),
            items: calendar_ids
                .iter()
                .map(|id| FreeBusyRequestItem { id: id.clone() })
                .collect(),
        };
        self.client.post_json(&url, &body).await
    }
}

#[async_trait]
impl EventsSource for CalendarApi {
    async fn list_events(
        &self,
        member: &MemberIdentity,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<Event>> {
        CalendarApi::list_events(self, member, time_min, time_max, max_results).await
    }
}

#[async_trait]
impl FreeBusySource for CalendarApi {
    async fn query_freebusy(
        &self,
        members: &[MemberIdentity],
        time_min: &str,
        time_max: &str,
    ) -> Result<FreeBusyResponse> {
        CalendarApi::query_freebusy(self, members, time_min, time_max).await
    }
}
