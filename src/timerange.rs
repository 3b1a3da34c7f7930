//! Timezone-aware resolution of the `--from/--to/--today/--week/--days`
//! flags into a concrete `[from, to)` window.
use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Window used when no end is given
const DEFAULT_SPAN_DAYS: i64 = 7;

#[derive(Debug, Clone, Default)]
pub struct TimeRangeFlags {
    pub from: Option<String>,
    pub to: Option<String>,
    pub today: bool,
    pub week: bool,
    pub days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeRange {
    pub from: DateTime<Tz>,
    pub to: DateTime<Tz>,
    pub tz: Tz,
}

impl TimeRange {
    pub fn resolve(flags: &TimeRangeFlags, tz: Tz, now: DateTime<Utc>) -> Result<Self> {
        let now = now.with_timezone(&tz);
        let today = now.date_naive();

        let (from, to) = if flags.today {
            let from = start_of_day(tz, today);
            (from, start_of_day(tz, today + Duration::days(1)))
        } else if flags.week {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (
                start_of_day(tz, monday),
                start_of_day(tz, monday + Duration::days(7)),
            )
        } else if let Some(days) = flags.days {
            if days == 0 {
                bail!("--days must be at least 1");
            }
            (
                start_of_day(tz, today),
                start_of_day(tz, add_days(today, days as u64)?),
            )
        } else {
            let from = match flags.from.as_deref() {
                Some(v) => parse_time_expr(v, tz, now)?,
                None => now,
            };
            let to = match flags.to.as_deref() {
                Some(v) => parse_time_expr(v, tz, now)?,
                None => from
                    .checked_add_signed(Duration::days(DEFAULT_SPAN_DAYS))
                    .ok_or(anyhow!("Time offset out of range"))?,
            };
            (from, to)
        };

        if to <= from {
            bail!(
                "Invalid time range: end {} is not after start {}",
                to.to_rfc3339(),
                from.to_rfc3339()
            );
        }

        Ok(Self { from, to, tz })
    }

    /// `(timeMin, timeMax)` as sent to the Calendar API
    pub fn format_rfc3339(&self) -> (String, String) {
        (self.from.to_rfc3339(), self.to.to_rfc3339())
    }
}

/// Local midnight of `date`. Zones that skip midnight on a DST change get
/// the first valid instant after it.
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    tz.from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            tz.from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight))
}

/// Accepts RFC3339, `YYYY-MM-DD`, `now`, `today`, `tomorrow`, `yesterday`
/// or a signed offset such as `+3d`, `-2h`, `1w`, `30m`.
pub fn parse_time_expr(value: &str, tz: Tz, now: DateTime<Tz>) -> Result<DateTime<Tz>> {
    let value = value.trim();
    let today = now.date_naive();

    match value.to_lowercase().as_str() {
        "" => bail!("Empty time value"),
        "now" => return Ok(now),
        "today" => return Ok(start_of_day(tz, today)),
        "tomorrow" => return Ok(start_of_day(tz, today + Duration::days(1))),
        "yesterday" => return Ok(start_of_day(tz, today - Duration::days(1))),
        _ => {}
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&tz));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(start_of_day(tz, date));
    }
    if let Some(offset) = parse_relative(value)? {
        return now
            .checked_add_signed(offset)
            .ok_or(anyhow!("Time offset out of range: {}", value));
    }

    Err(anyhow!(
        "Unrecognized time {:?}: expected RFC3339, YYYY-MM-DD, today/tomorrow/yesterday/now or an offset like +3d",
        value
    ))
}

fn add_days(date: NaiveDate, days: u64) -> Result<NaiveDate> {
    date.checked_add_days(Days::new(days))
        .ok_or(anyhow!("Time offset out of range: {} days", days))
}

/// `Ok(None)` when `value` is not an offset expression at all
fn parse_relative(value: &str) -> Result<Option<Duration>> {
    let Some(first) = value.as_bytes().first() else {
        return Ok(None);
    };
    let (negative, rest) = match first {
        b'+' => (false, &value[1..]),
        b'-' => (true, &value[1..]),
        _ => (false, value),
    };
    let Some(unit) = rest.chars().last() else {
        return Ok(None);
    };
    let digits = &rest[..rest.len() - unit.len_utf8()];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let constructor = match unit {
        'm' => Duration::try_minutes,
        'h' => Duration::try_hours,
        'd' => Duration::try_days,
        'w' => Duration::try_weeks,
        _ => return Ok(None),
    };
    let duration = digits
        .parse::<i64>()
        .ok()
        .and_then(constructor)
        .ok_or(anyhow!("Time offset out of range: {}", value))?;
    Ok(Some(if negative { -duration } else { duration }))
}
