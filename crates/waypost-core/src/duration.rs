//! Duration strings used in `waypost.toml` ("10s", "500ms", "2m").

use std::time::Duration;

/// Longest duration accepted anywhere in the config (one year).
pub const MAX_DURATION: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Parse a duration string like "5s", "500ms", "1m".
///
/// A bare number is read as seconds. Values above [`MAX_DURATION`] are
/// rejected so they can never overflow an `Instant`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let parsed = if let Some(ms) = s.strip_suffix("ms") {
        ms.parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        secs.parse::<u64>().ok().map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    };
    parsed.filter(|d| *d <= MAX_DURATION)
}
