//! Session-time entry filter.

use chrono::NaiveDateTime;
use chrono_tz::Tz;

use crate::config::SessionConfig;

/// Whether a bar timestamp falls inside the configured session window.
///
/// The window is inclusive on both ends. With a configured timezone the
/// naive timestamp is interpreted as UTC and converted before comparing
/// time-of-day; otherwise the raw clock time is used.
pub fn in_session(ts: NaiveDateTime, cfg: &SessionConfig) -> bool {
    if !cfg.enabled {
        return true;
    }
    let time = match cfg.timezone.as_deref().and_then(|name| name.parse::<Tz>().ok()) {
        Some(tz) => ts.and_utc().with_timezone(&tz).time(),
        None => ts.time(),
    };
    cfg.start <= time && time <= cfg.end
}
