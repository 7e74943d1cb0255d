use anyhow::Context;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};

/// Marketplaces report in JST; rank history dates follow that calendar.
pub const DEFAULT_OFFSET_HOURS: i32 = 9;

pub fn today_at_offset(now_utc: DateTime<Utc>, offset_hours: i32) -> anyhow::Result<NaiveDate> {
    let offset = FixedOffset::east_opt(offset_hours * 3600)
        .with_context(|| format!("invalid UTC offset: {offset_hours}h"))?;
    Ok(now_utc.with_timezone(&offset).date_naive())
}

/// First date (exclusive) of a window covering the last `days` calendar days up to `today`.
///
/// Windows reaching past the calendar's start clamp to `NaiveDate::MIN`.
pub fn window_floor(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .unwrap_or(NaiveDate::MIN)
}
