//! Test utilities for integration tests
#![allow(dead_code)]
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::TimeZone;
use chrono_tz::UTC;

use gog::core::AppConfig;
use gog::google::gcal::{Event, EventAttendee, EventDateTime, FreeBusyResponse};
use gog::team::{EventsSource, FreeBusySource, MemberIdentity, MembershipResolver};
use gog::timerange::TimeRange;

/// Config pointing both API base URLs at a mock server
pub fn test_config(server_url: &str) -> AppConfig {
    AppConfig {
        access_token: Some(String::from("test_token")),
        calendar_api_url: format!("{}/calendar/v3", server_url),
        cloud_identity_api_url: format!("{}/v1", server_url),
        max_concurrency: 10,
        request_timeout_secs: 5,
    }
}

pub fn test_range() -> TimeRange {
    TimeRange {
        from: UTC.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap(),
        to: UTC.with_ymd_and_hms(2026, 1, 6, 0, 0, 0).unwrap(),
        tz: UTC,
    }
}

pub fn timed_event(id: &str, summary: &str, start: &str, end: &str) -> Event {
    Event {
        id: id.to_string(),
        summary: Some(summary.to_string()),
        status: Some(String::from("confirmed")),
        start: Some(EventDateTime {
            date_time: Some(start.to_string()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(end.to_string()),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn declined(mut event: Event) -> Event {
    event.attendees.push(EventAttendee {
        email: None,
        is_self: true,
        response_status: Some(String::from("declined")),
    });
    event
}

pub fn private(mut event: Event) -> Event {
    event.visibility = Some(String::from("private"));
    event
}

/// The two-member standup scenario: alice and bob share `ev1`, bob also
/// has `ev2` in the afternoon.
pub fn standup_calendars() -> FakeCalendars {
    let standup = timed_event(
        "ev1",
        "Daily Standup",
        "2026-01-05T09:00:00Z",
        "2026-01-05T09:30:00Z",
    );
    FakeCalendars::default()
        .with("alice@x.com", vec![standup.clone()])
        .with(
            "bob@x.com",
            vec![
                standup,
                timed_event(
                    "ev2",
                    "Bob's 1:1",
                    "2026-01-05T14:00:00Z",
                    "2026-01-05T15:00:00Z",
                ),
            ],
        )
}

pub fn members(emails: &[&str]) -> Vec<MemberIdentity> {
    emails.iter().map(|e| e.to_string()).collect()
}

/// In-memory calendars that track how many requests are in flight
#[derive(Default)]
pub struct FakeCalendars {
    pub calendars: HashMap<String, Vec<Event>>,
    pub failing: HashMap<String, String>,
    pub latency: Option<Duration>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl FakeCalendars {
    pub fn with(mut self, member: &str, events: Vec<Event>) -> Self {
        self.calendars.insert(member.to_string(), events);
        self
    }

    pub fn failing(mut self, member: &str, error: &str) -> Self {
        self.failing.insert(member.to_string(), error.to_string());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventsSource for FakeCalendars {
    async fn list_events(
        &self,
        member: &MemberIdentity,
        _time_min: &str,
        _time_max: &str,
        max_results: u32,
    ) -> Result<Vec<Event>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = self.failing.get(member) {
            return Err(anyhow!(err.clone()));
        }
        Ok(self
            .calendars
            .get(member)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .take(max_results as usize)
            .collect())
    }
}

pub struct FakeGroups {
    pub groups: HashMap<String, Vec<MemberIdentity>>,
}

impl FakeGroups {
    pub fn new(group: &str, members: Vec<MemberIdentity>) -> Self {
        let mut groups = HashMap::new();
        groups.insert(group.to_string(), members);
        Self { groups }
    }
}

#[async_trait]
impl MembershipResolver for FakeGroups {
    async fn resolve_members(&self, group: &str) -> Result<Vec<MemberIdentity>> {
        self.groups
            .get(group)
            .cloned()
            .ok_or(anyhow!("Failed to find group {:?}: not found", group))
    }
}

pub struct FakeFreeBusy {
    pub response: Option<FreeBusyResponse>,
    pub calls: AtomicUsize,
}

impl FakeFreeBusy {
    pub fn ok(json: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Some(serde_json::from_str(json).unwrap()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            response: None,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FreeBusySource for FakeFreeBusy {
    async fn query_freebusy(
        &self,
        _members: &[MemberIdentity],
        _time_min: &str,
        _time_max: &str,
    ) -> Result<FreeBusyResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or(anyhow!("Google API error 500: backend error"))
    }
}
