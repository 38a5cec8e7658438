//! Duration phrases to day counts and back

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Day count used when no `<number> <unit>` phrase can be found
pub const DEFAULT_TOTAL_DAYS: u64 = 21;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(days?|weeks?|months?|years?)").expect("duration regex is valid")
});

fn unit_days(unit: &str) -> f64 {
    match unit.trim_end_matches('s') {
        "day" => 1.0,
        "week" => 7.0,
        "month" => 30.0,
        _ => 365.0,
    }
}

/// Convert the first `<number> <unit>` phrase in `text` to a whole day count
///
/// Units are case-insensitive; month = 30 days, year = 365 days. Text with
/// no such phrase yields [`DEFAULT_TOTAL_DAYS`].
pub fn normalize_to_days(text: &str) -> u64 {
    let lowered = text.to_lowercase();
    let Some(caps) = DURATION_RE.captures(&lowered) else {
        debug!(%text, "normalize_to_days: no duration found, using default");
        return DEFAULT_TOTAL_DAYS;
    };

    let quantity: f64 = caps[1].parse().unwrap_or(0.0);
    let days = (quantity * unit_days(&caps[2])).round() as u64;
    debug!(%text, days, "normalize_to_days: parsed");
    days
}

/// Human label for a day count, truncating to the largest fitting unit
pub fn format_days(days: u64) -> String {
    if days < 7 {
        format!("{} days", days)
    } else if days < 30 {
        format!("{} weeks", days / 7)
    } else if days < 365 {
        format!("{} months", days / 30)
    } else {
        format!("{} years", days / 365)
    }
}
