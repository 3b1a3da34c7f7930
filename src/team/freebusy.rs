use anyhow::{Result, anyhow};
use chrono::DateTime;
use chrono_tz::Tz;

use super::{BusyBlock, FreeBusySource, MemberIdentity};
use crate::google::gcal::FreeBusyResponse;
use crate::timerange::TimeRange;

/// Busy blocks for all members from a single batched free/busy query.
/// There is no partial result: a failed query fails the whole view.
pub async fn team_freebusy(
    source: &dyn FreeBusySource,
    members: &[MemberIdentity],
    range: &TimeRange,
) -> Result<Vec<BusyBlock>> {
    let (time_min, time_max) = range.format_rfc3339();
    let resp = source
        .query_freebusy(members, &time_min, &time_max)
        .await
        .map_err(|e| anyhow!("Free/busy query failed: {}", e))?;
    Ok(format_busy_blocks(members, &resp, range.tz))
}

/// One `BusyBlock` per member present in the response, in member order,
/// with intervals rendered as `HH:MM-HH:MM` in `tz`. Intervals whose
/// bounds cannot be parsed are skipped.
pub fn format_busy_blocks(
    members: &[MemberIdentity],
    resp: &FreeBusyResponse,
    tz: Tz,
) -> Vec<BusyBlock> {
    members
        .iter()
        .filter_map(|email| {
            let cal = resp.calendars.get(email)?;
            let busy = cal
                .busy
                .iter()
                .filter_map(|period| {
                    let start = DateTime::parse_from_rfc3339(&period.start).ok()?;
                    let end = DateTime::parse_from_rfc3339(&period.end).ok()?;
                    Some(format!(
                        "{}-{}",
                        start.with_timezone(&tz).format("%H:%M"),
                        end.with_timezone(&tz).format("%H:%M")
                    ))
                })
                .collect();
            Some(BusyBlock {
                email: email.clone(),
                busy,
                errors: cal.errors.iter().map(|e| e.reason.clone()).collect(),
            })
        })
        .collect()
}
