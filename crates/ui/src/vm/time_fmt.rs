use chrono::{DateTime, Utc};

#[must_use]
pub fn format_datetime(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M UTC").to_string()
}

#[must_use]
pub fn format_date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Signed percentage-point change, e.g. `+12%`, `-20%`, `0%`.
#[must_use]
pub fn format_trend(trend: i32) -> String {
    if trend > 0 {
        format!("+{trend}%")
    } else {
        format!("{trend}%")
    }
}
