//! Activity-tracking consumer
//! Attributes one point per inbound guild message, creating the entry on
//! first sight. Independent of the command consumer; both talk to the
//! ledger only through its public operations.

use crate::error::Result;
use crate::ledger::PointsLedger;
use crate::utils::current_timestamp_ms;

/// Awards points for plain guild activity
#[derive(Clone)]
pub struct ActivityTracker {
    ledger: PointsLedger,
}

impl ActivityTracker {
    pub fn new(ledger: PointsLedger) -> Self {
        Self { ledger }
    }

    /// Record one inbound guild message from a user. The dispatcher is
    /// expected to have filtered out bot/self and direct messages already.
    pub fn record_message(&self, guild_id: &str, user_id: &str) -> Result<()> {
        self.ledger
            .ensure_exists(guild_id, user_id, current_timestamp_ms())?;
        self.ledger.increment(guild_id, user_id)?;
        tracing::debug!(guild = guild_id, user = user_id, "Attributed activity point");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PointsStore;
    use tempfile::tempdir;

    #[test]
    fn test_messages_accumulate_points() {
        let dir = tempdir().unwrap();
        let ledger = PointsLedger::new(PointsStore::open(dir.path().join("points.db")).unwrap());
        let tracker = ActivityTracker::new(ledger.clone());

        for _ in 0..3 {
            tracker.record_message("g1", "u4").unwrap();
        }
        assert_eq!(ledger.get("g1", "u4").unwrap().points, 3);
    }

    #[test]
    fn test_rejects_malformed_ids() {
        let dir = tempdir().unwrap();
        let ledger = PointsLedger::new(PointsStore::open(dir.path().join("points.db")).unwrap());
        let tracker = ActivityTracker::new(ledger);

        assert!(tracker.record_message("g1", "").is_err());
    }
}
