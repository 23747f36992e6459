// Timestamp normalization into a fixed civil timezone.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use tracing::warn;

use crate::error::{GraphError, Result};

pub const DEFAULT_TIMEZONE: &str = "Asia/Taipei";

/// Format the Graph API uses for `created_time` and `timestamp` (`+0000` offsets).
const GRAPH_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Format of the snapshot `scan_time` field.
pub const SCAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|e| GraphError::Config(format!("unknown timezone {name:?}: {e}")))
}

/// Convert an API timestamp to wall-clock time in `tz`. The zone's offset
/// rules at that instant apply, so DST is resolved per timestamp.
pub fn to_civil(raw: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let parsed = DateTime::parse_from_str(raw, GRAPH_TIMESTAMP_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw));

    match parsed {
        Ok(instant) => {
            let local = instant.with_timezone(&tz);
            Some(local.with_timezone(&local.offset().fix()))
        }
        Err(e) => {
            warn!(raw, error = %e, "Unparseable timestamp, leaving it unset");
            None
        }
    }
}

/// Current wall-clock time in `tz`, rendered for `scan_time`.
pub fn now_in(tz: Tz) -> String {
    Utc::now()
        .with_timezone(&tz)
        .format(SCAN_TIME_FORMAT)
        .to_string()
}
