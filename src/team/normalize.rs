//! Per-event filtering and display formatting, independent of the network
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use super::{BUSY_PLACEHOLDER, TeamEvent};
use crate::google::gcal::Event;
use crate::timerange::start_of_day;

/// Turn a raw calendar event into a `TeamEvent` owned by `member`, or
/// `None` when it should be dropped.
///
/// Checks run in a fixed order: declined events go first, then private
/// and confidential titles are masked, and only then is the (lowercased)
/// query matched, so a masked event can never match on its hidden title.
pub fn normalize_event(raw: &Event, member: &str, query_lower: &str, tz: Tz) -> Option<TeamEvent> {
    let declined = raw
        .attendees
        .iter()
        .any(|a| a.is_self && a.response_status.as_deref() == Some("declined"));
    if declined {
        return None;
    }

    let summary = match raw.visibility.as_deref() {
        Some("private") | Some("confidential") => BUSY_PLACEHOLDER.to_string(),
        _ => raw.summary.clone().unwrap_or_default(),
    };

    if !query_lower.is_empty() && !summary.to_lowercase().contains(query_lower) {
        return None;
    }

    let (start, end) = format_event_time(raw, tz);
    Some(TeamEvent {
        who: member.to_string(),
        id: raw.id.clone(),
        start,
        end,
        summary,
        status: raw.status.clone().filter(|s| !s.is_empty()),
        sort_key: event_sort_key(raw, tz),
    })
}

/// Display strings for an event's start and end: the date for all-day
/// events, `HH:MM` in `tz` for timed ones. Missing or unparseable values
/// become empty strings.
pub fn format_event_time(raw: &Event, tz: Tz) -> (String, String) {
    let Some(start) = raw.start.as_ref() else {
        return (String::new(), String::new());
    };

    if let Some(date) = start.date.as_deref().filter(|d| !d.is_empty()) {
        let end = raw
            .end
            .as_ref()
            .and_then(|e| e.date.clone())
            .unwrap_or_default();
        return (date.to_string(), end);
    }

    let clock = |value: Option<&str>| {
        value
            .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
            .map(|t| t.with_timezone(&tz).format("%H:%M").to_string())
            .unwrap_or_default()
    };
    (
        clock(start.date_time.as_deref()),
        clock(raw.end.as_ref().and_then(|e| e.date_time.as_deref())),
    )
}

/// Instant used to order events. All-day events sort at midnight of their
/// date in `tz`; events without a usable start sort first.
pub fn event_sort_key(raw: &Event, tz: Tz) -> DateTime<Utc> {
    let Some(start) = raw.start.as_ref() else {
        return DateTime::<Utc>::MIN_UTC;
    };
    if let Some(t) = start
        .date_time
        .as_deref()
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
    {
        return t.with_timezone(&Utc);
    }
    if let Some(date) = start
        .date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    {
        return start_of_day(tz, date).with_timezone(&Utc);
    }
    DateTime::<Utc>::MIN_UTC
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::google::gcal::{EventAttendee, EventDateTime};
    use chrono::TimeZone;
    use chrono_tz::UTC;

    fn timed(id: &str, summary: &str, start: &str, end: &str) -> Event {
        Event {
            id: id.to_string(),
            summary: Some(summary.to_string()),
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

    fn all_day(id: &str, date: &str, end: &str) -> Event {
        Event {
            id: id.to_string(),
            summary: Some("Offsite".to_string()),
            start: Some(EventDateTime {
                date: Some(date.to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date: Some(end.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_timed_event() {
        let mut raw = timed("ev1", "Daily Standup", "2026-01-05T09:00:00Z", "2026-01-05T09:30:00Z");
        raw.status = Some("confirmed".to_string());
        let ev = normalize_event(&raw, "alice@x.com", "", UTC).unwrap();
        assert_eq!(ev.who, "alice@x.com");
        assert_eq!(ev.id, "ev1");
        assert_eq!(ev.start, "09:00");
        assert_eq!(ev.end, "09:30");
        assert_eq!(ev.summary, "Daily Standup");
        assert_eq!(ev.status.as_deref(), Some("confirmed"));
        assert_eq!(ev.sort_key, Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap());
    }

    #[test]
    fn test_declined_events_are_dropped() {
        let mut raw = timed("ev1", "Standup", "2026-01-05T09:00:00Z", "2026-01-05T09:30:00Z");
        raw.attendees = vec![
            EventAttendee {
                email: Some("bob@x.com".to_string()),
                is_self: false,
                response_status: Some("accepted".to_string()),
            },
            EventAttendee {
                email: Some("alice@x.com".to_string()),
                is_self: true,
                response_status: Some("declined".to_string()),
            },
        ];
        assert!(normalize_event(&raw, "alice@x.com", "", UTC).is_none());
        assert!(normalize_event(&raw, "alice@x.com", "standup", UTC).is_none());
    }

    #[test]
    fn test_other_attendee_declining_keeps_event() {
        let mut raw = timed("ev1", "Standup", "2026-01-05T09:00:00Z", "2026-01-05T09:30:00Z");
        raw.attendees = vec![EventAttendee {
            email: Some("bob@x.com".to_string()),
            is_self: false,
            response_status: Some("declined".to_string()),
        }];
        assert!(normalize_event(&raw, "alice@x.com", "", UTC).is_some());
    }

    #[test]
    fn test_private_events_are_masked_before_query() {
        let mut raw = timed("ev1", "Secret Interview", "2026-01-05T09:00:00Z", "2026-01-05T10:00:00Z");
        raw.visibility = Some("private".to_string());

        let ev = normalize_event(&raw, "alice@x.com", "", UTC).unwrap();
        assert_eq!(ev.summary, BUSY_PLACEHOLDER);

        assert!(normalize_event(&raw, "alice@x.com", "interview", UTC).is_none());

        raw.visibility = Some("confidential".to_string());
        assert!(normalize_event(&raw, "alice@x.com", "secret", UTC).is_none());
    }

    #[test]
    fn test_query_is_case_insensitive_substring() {
        let raw = timed("ev1", "Weekly Design Review", "2026-01-05T09:00:00Z", "2026-01-05T10:00:00Z");
        assert!(normalize_event(&raw, "a@x.com", "design review", UTC).is_some());
        assert!(normalize_event(&raw, "a@x.com", "review design", UTC).is_none());
        assert!(normalize_event(&raw, "a@x.com", "planning", UTC).is_none());
    }

    #[test]
    fn test_format_all_day_event() {
        let raw = all_day("ev2", "2026-01-05", "2026-01-06");
        assert_eq!(
            format_event_time(&raw, UTC),
            ("2026-01-05".to_string(), "2026-01-06".to_string())
        );
    }

    #[test]
    fn test_format_uses_range_timezone() {
        let raw = timed("ev1", "Standup", "2026-01-05T09:00:00Z", "2026-01-05T09:30:00Z");
        let (start, end) = format_event_time(&raw, chrono_tz::Europe::Berlin);
        assert_eq!(start, "10:00");
        assert_eq!(end, "10:30");
    }

    #[test]
    fn test_missing_start_sorts_first() {
        let raw = Event {
            id: "ev3".to_string(),
            ..Default::default()
        };
        assert_eq!(format_event_time(&raw, UTC), (String::new(), String::new()));
        assert_eq!(event_sort_key(&raw, UTC), DateTime::<Utc>::MIN_UTC);
        let ev = normalize_event(&raw, "a@x.com", "", UTC).unwrap();
        assert_eq!(ev.summary, "");
    }

    #[test]
    fn test_unparseable_times_become_empty() {
        let raw = timed("ev1", "Broken", "not-a-time", "also-not");
        assert_eq!(format_event_time(&raw, UTC), (String::new(), String::new()));
        assert_eq!(event_sort_key(&raw, UTC), DateTime::<Utc>::MIN_UTC);
    }

    #[test]
    fn test_all_day_sorts_at_local_midnight() {
        let raw = all_day("ev2", "2026-01-05", "2026-01-06");
        assert_eq!(
            event_sort_key(&raw, UTC),
            Utc.with_ymd_and_hms(2026, 1, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            event_sort_key(&raw, chrono_tz::America::New_York),
            Utc.with_ymd_and_hms(2026, 1, 5, 5, 0, 0).unwrap()
        );
    }
}
