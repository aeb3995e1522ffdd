//! Wall-clock helpers.
//!
//! Exchange timestamps are milliseconds since the Unix epoch. Local rendering
//! uses a flat hour offset from UTC (no timezone database, no DST).

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Current time as **milliseconds** since Unix epoch.
#[inline]
pub fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

/// Render `ts_ms` in the zone `UTC+offset_hours`.
///
/// Returns `("YYYY-MM-DD HH:MM:SS", "UTC+7")`. An offset outside ±23h or a
/// timestamp chrono cannot represent falls back to UTC / the epoch.
pub fn format_local_time(ts_ms: i64, offset_hours: i32) -> (String, String) {
    let utc = DateTime::<Utc>::from_timestamp_millis(ts_ms).unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
    let offset = offset_hours
        .checked_mul(3600)
        .and_then(FixedOffset::east_opt)
        .unwrap_or_else(|| Utc.fix());
    let local = utc.with_timezone(&offset);

    let sign = if offset_hours >= 0 { '+' } else { '-' };
    (
        local.format("%Y-%m-%d %H:%M:%S").to_string(),
        format!("UTC{sign}{}", offset_hours.unsigned_abs()),
    )
}
