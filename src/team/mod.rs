//! Team calendar: a group's calendar activity merged into one view, either
//! as itemized events or as per-member busy blocks.
pub mod aggregate;
pub mod freebusy;
pub mod normalize;

use std::sync::Arc;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::google::gcal::{Event, FreeBusyResponse};
use crate::timerange::TimeRange;

pub use aggregate::{aggregate_team_events, dedupe_team_events, sort_team_events};
pub use freebusy::{format_busy_blocks, team_freebusy};
pub use normalize::{event_sort_key, format_event_time, normalize_event};

/// Email address of one group member
pub type MemberIdentity = String;

/// Summary shown in place of the title of private and confidential events
pub const BUSY_PLACEHOLDER: &str = "(busy)";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamEvent {
    /// Comma-joined members holding this event, in first-seen order
    pub who: String,
    pub id: String,
    pub start: String,
    pub end: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip)]
    pub sort_key: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BusyBlock {
    pub email: MemberIdentity,
    pub busy: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AggregateOptions {
    pub query: String,
    pub max_per_member: u32,
    pub dedup: bool,
    pub concurrency: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            query: String::new(),
            max_per_member: 100,
            dedup: true,
            concurrency: crate::core::config::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

/// Result of the events fan-out. Warnings name members whose calendars
/// could not be read; their events are missing from `events`.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub events: Vec<TeamEvent>,
    pub warnings: Vec<String>,
}

#[async_trait]
pub trait MembershipResolver: Send + Sync {
    async fn resolve_members(&self, group: &str) -> Result<Vec<MemberIdentity>>;
}

#[async_trait]
pub trait EventsSource: Send + Sync {
    async fn list_events(
        &self,
        member: &MemberIdentity,
        time_min: &str,
        time_max: &str,
        max_results: u32,
    ) -> Result<Vec<Event>>;
}

#[async_trait]
pub trait FreeBusySource: Send + Sync {
    async fn query_freebusy(
        &self,
        members: &[MemberIdentity],
        time_min: &str,
        time_max: &str,
    ) -> Result<FreeBusyResponse>;
}

#[derive(Debug, Clone)]
pub enum TeamView {
    Events(Aggregation),
    FreeBusy(Vec<BusyBlock>),
}

#[derive(Debug, Clone)]
pub struct TeamReport {
    pub group: String,
    pub range: TimeRange,
    pub members: Vec<MemberIdentity>,
    pub view: TeamView,
}

/// Resolve the group's members and build either the events or the
/// free/busy view. Only the membership lookup and the batched free/busy
/// call are fatal; per-member event failures end up as warnings.
#[allow(clippy::too_many_arguments)]
pub async fn run_team(
    resolver: &dyn MembershipResolver,
    events: Arc<dyn EventsSource>,
    freebusy: &dyn FreeBusySource,
    group: &str,
    range: &TimeRange,
    opts: &AggregateOptions,
    freebusy_mode: bool,
    cancel: &CancellationToken,
) -> Result<TeamReport> {
    let group = group.trim();
    if group.is_empty() {
        bail!("Group email required");
    }

    let members = resolver.resolve_members(group).await?;
    tracing::info!("Group {} has {} user members", group, members.len());

    let view = if members.is_empty() {
        if freebusy_mode {
            TeamView::FreeBusy(vec![])
        } else {
            TeamView::Events(Aggregation::default())
        }
    } else if freebusy_mode {
        TeamView::FreeBusy(team_freebusy(freebusy, &members, range).await?)
    } else {
        TeamView::Events(aggregate_team_events(events, &members, range, opts, cancel).await)
    };

    Ok(TeamReport {
        group: group.to_string(),
        range: range.clone(),
        members,
        view,
    })
}
