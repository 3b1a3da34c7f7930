use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::core::AppConfig;
use crate::google::{CalendarApi, GoogleClient, GroupsApi};
use crate::output::{print_team_report, print_warnings};
use crate::team::{AggregateOptions, TeamReport, TeamView, run_team};
use crate::timerange::{TimeRange, TimeRangeFlags};

#[derive(clap::Args, Clone, Debug)]
pub struct TeamArgs {
    /// Google Group email, e.g. engineering@company.com
    pub group: String,

    /// Show only busy blocks (single API call)
    #[arg(long, action, default_value = "false")]
    pub freebusy: bool,

    /// Filter events by title (case-insensitive substring)
    #[arg(long, short = 'q', default_value = "")]
    pub query: String,

    /// Max events per member calendar
    #[arg(long, default_value = "100")]
    pub max: u32,

    /// Show each member's copy of shared events
    #[arg(long, action, default_value = "false")]
    pub no_dedup: bool,

    /// Start: RFC3339, YYYY-MM-DD, today/tomorrow/yesterday/now or +3d (default: now)
    #[arg(long, conflicts_with_all = ["today", "week", "days"])]
    pub from: Option<String>,

    /// End: same formats as --from (default: start + 7 days)
    #[arg(long, conflicts_with_all = ["today", "week", "days"])]
    pub to: Option<String>,

    /// Today only, in the calendar's timezone
    #[arg(long, action, default_value = "false", conflicts_with_all = ["week", "days"])]
    pub today: bool,

    /// This week, Monday to Sunday
    #[arg(long, action, default_value = "false", conflicts_with = "days")]
    pub week: bool,

    /// The next N days starting today
    #[arg(long)]
    pub days: Option<u32>,
}

impl TeamArgs {
    fn range_flags(&self) -> TimeRangeFlags {
        TimeRangeFlags {
            from: self.from.clone(),
            to: self.to.clone(),
            today: self.today,
            week: self.week,
            days: self.days,
        }
    }
}

/// Resolve the time window against the account's calendar timezone and
/// aggregate the group's calendars.
pub async fn build_report(
    config: &AppConfig,
    args: &TeamArgs,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<TeamReport> {
    if args.group.trim().is_empty() {
        bail!("Group email required");
    }

    let client = GoogleClient::new(config.access_token()?, config.request_timeout_secs)?;
    let calendar = Arc::new(CalendarApi::new(client.clone(), &config.calendar_api_url));
    let groups = GroupsApi::new(client, &config.cloud_identity_api_url);

    let tz = calendar
        .primary_timezone()
        .await
        .context("Failed to resolve calendar timezone")?;
    let range = TimeRange::resolve(&args.range_flags(), tz, now)?;
    tracing::debug!("Resolved time range {:?}", range.format_rfc3339());

    let opts = AggregateOptions {
        query: args.query.clone(),
        max_per_member: args.max,
        dedup: !args.no_dedup,
        concurrency: config.max_concurrency,
    };

    run_team(
        &groups,
        calendar.clone(),
        calendar.as_ref(),
        &args.group,
        &range,
        &opts,
        args.freebusy,
        cancel,
    )
    .await
}

pub async fn run(config: &AppConfig, args: TeamArgs, json: bool) -> Result<()> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling outstanding requests");
                cancel.cancel();
            }
        })
    };

    let report = build_report(config, &args, Utc::now(), &cancel).await;
    interrupt.abort();
    let report = report?;

    if let TeamView::Events(agg) = &report.view {
        print_warnings(&agg.warnings);
    }
    print_team_report(&report, json)
}
