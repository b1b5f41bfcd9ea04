/*!
Shared utility functions for the KDC protocol.
*/

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// How long ago `timestamp_ms` was, relative to `now_ms`.
///
/// Timestamps from the future count as zero age.
pub fn timestamp_age(timestamp_ms: u64, now_ms: u64) -> Duration {
    Duration::from_millis(now_ms.saturating_sub(timestamp_ms))
}

/// Render bytes for a log line, escaping anything non-printable
pub fn printable(payload: &[u8]) -> String {
    payload.escape_ascii().to_string()
}
