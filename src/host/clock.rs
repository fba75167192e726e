//! Wall-clock access.

use chrono::Utc;

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_is_milliseconds_since_epoch() {
        // 2020-01-01T00:00:00Z
        assert!(timestamp_millis() > 1_577_836_800_000);
    }
}
