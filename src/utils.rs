//! Shared utility functions
//! Common helpers used across the codebase

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one day
pub const MS_PER_DAY: u64 = 86_400_000;

/// Get current Unix timestamp in milliseconds
/// Consistent implementation used throughout the codebase
#[inline]
#[must_use]
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp() {
        let ts = current_timestamp_ms();
        // Should be after 2024
        assert!(ts > 1_704_067_200_000);
    }
}
