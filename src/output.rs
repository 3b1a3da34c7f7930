//! Output formatting for CLI commands.
//!
//! Everything is rendered either as pretty JSON on stdout or as an aligned
//! text table. Diagnostics ("No events found", warnings) go to stderr so
//! stdout stays parseable.
use anyhow::Result;
use serde_json::json;

use crate::google::groups::{MembershipsPage, member_role};
use crate::team::{BusyBlock, TeamEvent, TeamReport, TeamView};

const SUMMARY_WIDTH: usize = 40;

/// Replace characters that would break table columns
pub fn sanitize_tab(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

/// Shorten `s` to at most `max_len` characters, ending with `...` when cut
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return s.chars().take(max_len).collect();
    }
    let head: String = s.chars().take(max_len - 3).collect();
    format!("{}...", head)
}

/// Left-aligned columns separated by two spaces
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let format_row = |cells: Vec<&str>| {
        let last = cells.len().saturating_sub(1);
        let line: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if i == last {
                    c.to_string()
                } else {
                    format!("{:<width$}", c, width = widths[i])
                }
            })
            .collect();
        line.join("  ")
    };

    let mut out = format_row(headers.to_vec());
    out.push('\n');
    for row in rows {
        out.push_str(&format_row(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    out
}

pub fn team_events_table(events: &[TeamEvent]) -> String {
    let rows: Vec<Vec<String>> = events
        .iter()
        .map(|ev| {
            vec![
                sanitize_tab(&ev.who),
                sanitize_tab(&ev.start),
                sanitize_tab(&ev.end),
                sanitize_tab(&truncate(&ev.summary, SUMMARY_WIDTH)),
            ]
        })
        .collect();
    render_table(&["WHO", "START", "END", "SUMMARY"], &rows)
}

pub fn freebusy_table(blocks: &[BusyBlock]) -> String {
    let rows: Vec<Vec<String>> = blocks
        .iter()
        .map(|b| {
            let busy = if !b.errors.is_empty() {
                format!("error: {}", b.errors.join(", "))
            } else if b.busy.is_empty() {
                "(free)".to_string()
            } else {
                b.busy.join(", ")
            };
            vec![sanitize_tab(&b.email), sanitize_tab(&busy)]
        })
        .collect();
    render_table(&["WHO", "BUSY BLOCKS"], &rows)
}

pub fn team_report_json(report: &TeamReport) -> Result<String> {
    let (time_min, time_max) = report.range.format_rfc3339();
    let mut value = json!({
        "group": report.group,
        "timeMin": time_min,
        "timeMax": time_max,
        "timezone": report.range.tz.name(),
    });
    match &report.view {
        TeamView::Events(agg) => value["events"] = serde_json::to_value(&agg.events)?,
        TeamView::FreeBusy(blocks) => value["freebusy"] = serde_json::to_value(blocks)?,
    }
    Ok(serde_json::to_string_pretty(&value)?)
}

pub fn print_team_report(report: &TeamReport, json: bool) -> Result<()> {
    if json {
        println!("{}", team_report_json(report)?);
        return Ok(());
    }

    if report.members.is_empty() {
        eprintln!("No user members in group {}", report.group);
        return Ok(());
    }

    match &report.view {
        TeamView::Events(agg) if agg.events.is_empty() => eprintln!("No events found"),
        TeamView::Events(agg) => print!("{}", team_events_table(&agg.events)),
        TeamView::FreeBusy(blocks) => print!("{}", freebusy_table(blocks)),
    }
    Ok(())
}

/// Per-member failures are reported but never fail the command
pub fn print_warnings(warnings: &[String]) {
    for w in warnings {
        eprintln!("Warning: {}", w);
    }
}

pub fn members_json(page: &MembershipsPage) -> Result<String> {
    let members: Vec<_> = page
        .memberships
        .iter()
        .filter_map(|m| {
            let key = m.preferred_member_key.as_ref()?;
            Some(json!({
                "email": key.id,
                "role": member_role(&m.roles),
                "type": m.kind,
            }))
        })
        .collect();
    Ok(serde_json::to_string_pretty(&json!({
        "members": members,
        "nextPageToken": page.next_page_token,
    }))?)
}

pub fn print_members(group: &str, page: &MembershipsPage, json: bool) -> Result<()> {
    if json {
        println!("{}", members_json(page)?);
        return Ok(());
    }

    if page.memberships.is_empty() {
        eprintln!("No members in group {}", group);
        return Ok(());
    }

    let rows: Vec<Vec<String>> = page
        .memberships
        .iter()
        .filter_map(|m| {
            let key = m.preferred_member_key.as_ref()?;
            Some(vec![
                sanitize_tab(&key.id),
                member_role(&m.roles).to_string(),
                sanitize_tab(&m.kind),
            ])
        })
        .collect();
    print!("{}", render_table(&["EMAIL", "ROLE", "TYPE"], &rows));

    if let Some(token) = page.next_page_token.as_deref().filter(|t| !t.is_empty()) {
        eprintln!("# Next page: --page {}", token);
    }
    Ok(())
}
