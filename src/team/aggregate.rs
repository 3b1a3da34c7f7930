//! Bounded fan-out over group members' calendars, followed by a
//! deterministic sort and merge-by-id.
use std::collections::HashMap;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::normalize::normalize_event;
use super::{AggregateOptions, Aggregation, EventsSource, MemberIdentity, TeamEvent};
use crate::core::config::DEFAULT_MAX_CONCURRENCY;
use crate::timerange::TimeRange;

/// Events tagged with the position of the member that reported them so
/// ties on start time resolve in member order
#[derive(Default)]
struct Collected {
    events: Vec<(usize, TeamEvent)>,
    warnings: Vec<(usize, String)>,
}

/// Fetch every member's events with at most `opts.concurrency` requests
/// in flight (never more than `DEFAULT_MAX_CONCURRENCY`), then sort by start time and (unless disabled) merge events
/// sharing an id.
///
/// A failed member is reported as `"<member>: <error>"` in the returned
/// warnings and the rest of the fan-out carries on. Cancelling `cancel`
/// makes queued members skip and in-flight requests abort; the call still
/// returns whatever was collected.
pub async fn aggregate_team_events(
    source: Arc<dyn EventsSource>,
    members: &[MemberIdentity],
    range: &TimeRange,
    opts: &AggregateOptions,
    cancel: &CancellationToken,
) -> Aggregation {
    let (time_min, time_max) = range.format_rfc3339();
    let query_lower = opts.query.to_lowercase();
    let permits = opts.concurrency.clamp(1, DEFAULT_MAX_CONCURRENCY);
    let semaphore = Arc::new(Semaphore::new(permits));
    let collected = Arc::new(Mutex::new(Collected::default()));

    let mut tasks = JoinSet::new();
    for (idx, member) in members.iter().enumerate() {
        let source = source.clone();
        let semaphore = semaphore.clone();
        let collected = collected.clone();
        let cancel = cancel.clone();
        let member = member.clone();
        let time_min = time_min.clone();
        let time_max = time_max.clone();
        let query_lower = query_lower.clone();
        let max_results = opts.max_per_member;
        let tz = range.tz;

        tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    collected.lock().await.warnings.push((idx, format!("{}: cancelled", member)));
                    return;
                }
                permit = semaphore.acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(e) => {
                        collected.lock().await.warnings.push((idx, format!("{}: {}", member, e)));
                        return;
                    }
                },
            };

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(anyhow!("cancelled")),
                res = source.list_events(&member, &time_min, &time_max, max_results) => res,
            };

            match fetched {
                Ok(items) => {
                    let events: Vec<(usize, TeamEvent)> = items
                        .iter()
                        .filter_map(|raw| normalize_event(raw, &member, &query_lower, tz))
                        .map(|ev| (idx, ev))
                        .collect();
                    tracing::debug!(
                        "{}: {} of {} events kept",
                        member,
                        events.len(),
                        items.len()
                    );
                    collected.lock().await.events.extend(events);
                }
                Err(e) => {
                    tracing::warn!("Failed to list events for {}: {}", member, e);
                    collected
                        .lock()
                        .await
                        .warnings
                        .push((idx, format!("{}: {}", member, e)));
                }
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            tracing::error!("Calendar fetch task failed: {}", e);
            collected
                .lock()
                .await
                .warnings
                .push((usize::MAX, format!("calendar fetch task failed: {}", e)));
        }
    }

    let Collected {
        mut events,
        mut warnings,
    } = std::mem::take(&mut *collected.lock().await);

    // Member order first so the stable sort below breaks start-time ties by it
    events.sort_by_key(|(idx, _)| *idx);
    warnings.sort_by_key(|(idx, _)| *idx);

    let mut events: Vec<TeamEvent> = events.into_iter().map(|(_, ev)| ev).collect();
    sort_team_events(&mut events);
    let events = if opts.dedup {
        dedupe_team_events(events)
    } else {
        events
    };

    Aggregation {
        events,
        warnings: warnings.into_iter().map(|(_, w)| w).collect(),
    }
}

/// Stable ascending sort by start instant
pub fn sort_team_events(events: &mut [TeamEvent]) {
    events.sort_by_key(|ev| ev.sort_key);
}

/// Collapse events sharing an id into the first occurrence, appending the
/// other owners to its `who`. Expects sorted input so merged entries keep
/// the position of their earliest occurrence.
pub fn dedupe_team_events(events: Vec<TeamEvent>) -> Vec<TeamEvent> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<TeamEvent> = Vec::with_capacity(events.len());

    for ev in events {
        match seen.get(&ev.id) {
            Some(&idx) => {
                let canonical = &mut result[idx];
                for who in ev.who.split(", ") {
                    if !canonical.who.split(", ").any(|w| w == who) {
                        canonical.who.push_str(", ");
                        canonical.who.push_str(who);
                    }
                }
            }
            None => {
                seen.insert(ev.id.clone(), result.len());
                result.push(ev);
            }
        }
    }
    result
}
