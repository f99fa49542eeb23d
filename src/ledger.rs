//! Points ledger - persistent per-guild, per-user scores
//! One record per (guild, user) pair; mutated one inbound event at a time

use crate::error::{LedgerError, Result};
use crate::store::PointsStore;
use serde::{Deserialize, Serialize};

const POINTS_TREE: &str = "points";

/// Separator between the guild and user components of a storage key.
/// Ids containing it are rejected so keys stay collision-free.
pub const KEY_SEPARATOR: char = '-';

/// One points record, keyed by guild + user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointsEntry {
    pub user_id: String,
    pub guild_id: String,
    pub points: i64,
    /// Unix timestamp (ms) of entry creation; read only by cleanup
    pub last_seen: u64,
}

/// Derive the storage key for a (guild, user) pair.
/// Rejects empty ids and ids containing the separator.
pub fn entry_key(guild_id: &str, user_id: &str) -> Result<String> {
    for (label, id) in [("guild id", guild_id), ("user id", user_id)] {
        if id.is_empty() {
            return Err(LedgerError::InvalidArgument(format!("empty {label}")));
        }
        if id.contains(KEY_SEPARATOR) {
            return Err(LedgerError::InvalidArgument(format!(
                "{label} contains '{KEY_SEPARATOR}': {id}"
            )));
        }
    }
    Ok(format!("{guild_id}{KEY_SEPARATOR}{user_id}"))
}

/// The points ledger. Owns its backing store; callers only ever see
/// copies of stored entries.
#[derive(Clone)]
pub struct PointsLedger {
    store: PointsStore,
}

impl PointsLedger {
    pub fn new(store: PointsStore) -> Self {
        Self { store }
    }

    /// Create the entry for this pair if it does not exist yet, with zero
    /// points and `last_seen = now_ms`. An existing entry is left completely
    /// untouched (touch only on create). Idempotent.
    pub fn ensure_exists(&self, guild_id: &str, user_id: &str, now_ms: u64) -> Result<()> {
        let key = entry_key(guild_id, user_id)?;
        let entry = PointsEntry {
            user_id: user_id.to_string(),
            guild_id: guild_id.to_string(),
            points: 0,
            last_seen: now_ms,
        };
        let created = self.store.create_if_absent(POINTS_TREE, &key, &entry)?;
        if created {
            tracing::debug!(guild = guild_id, user = user_id, "Created points entry");
        }
        Ok(())
    }

    /// Add 1 to the pair's points.
    /// Precondition: the entry exists (call `ensure_exists` first);
    /// returns `NotFound` otherwise rather than auto-creating.
    pub fn increment(&self, guild_id: &str, user_id: &str) -> Result<()> {
        self.add_delta(guild_id, user_id, 1).map(|_| ())
    }

    /// Add a signed delta to the pair's points and return the new total.
    /// Same precondition as `increment`.
    pub fn add_delta(&self, guild_id: &str, user_id: &str, delta: i64) -> Result<i64> {
        let key = entry_key(guild_id, user_id)?;
        let updated = self
            .store
            .update(POINTS_TREE, &key, |old: Option<PointsEntry>| {
                old.map(|mut entry| {
                    // No bound on points; saturate instead of overflowing
                    entry.points = entry.points.saturating_add(delta);
                    entry
                })
            })?;
        match updated {
            Some(entry) => Ok(entry.points),
            None => Err(LedgerError::NotFound(key)),
        }
    }

    /// Look up a single entry. No side effects.
    pub fn get(&self, guild_id: &str, user_id: &str) -> Result<PointsEntry> {
        let key = entry_key(guild_id, user_id)?;
        self.store
            .get(POINTS_TREE, &key)?
            .ok_or(LedgerError::NotFound(key))
    }

    /// Leaderboard: the guild's entries sorted by points descending, at most
    /// `n` of them. Equal points order by ascending user id so output is
    /// reproducible. Snapshot of ledger state at call time.
    pub fn top_n(&self, guild_id: &str, n: usize) -> Result<Vec<PointsEntry>> {
        let mut entries: Vec<PointsEntry> = self
            .store
            .get_all(POINTS_TREE)?
            .into_iter()
            .filter(|e: &PointsEntry| e.guild_id == guild_id)
            .collect();
        entries.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        entries.truncate(n);
        Ok(entries)
    }

    /// Remove the guild's entries for users who have left the guild or have
    /// not been seen within `stale_after_ms`. Membership is decided by the
    /// injected `is_still_member` predicate; a departed user is removed even
    /// if recently seen. Returns the number of entries removed.
    pub fn cleanup<F>(
        &self,
        guild_id: &str,
        now_ms: u64,
        stale_after_ms: u64,
        is_still_member: F,
    ) -> Result<usize>
    where
        F: Fn(&str) -> bool,
    {
        let stale: Vec<PointsEntry> = self
            .store
            .get_all(POINTS_TREE)?
            .into_iter()
            .filter(|e: &PointsEntry| e.guild_id == guild_id)
            .filter(|e| {
                !is_still_member(&e.user_id)
                    || now_ms.saturating_sub(e.last_seen) > stale_after_ms
            })
            .collect();

        for entry in &stale {
            let key = entry_key(&entry.guild_id, &entry.user_id)?;
            self.store.delete(POINTS_TREE, &key)?;
        }

        if !stale.is_empty() {
            tracing::info!(
                guild = guild_id,
                removed = stale.len(),
                "Cleaned up stale points entries"
            );
        }
        Ok(stale.len())
    }

    /// Total number of stored entries, all guilds included
    pub fn entry_count(&self) -> Result<usize> {
        self.store.count(POINTS_TREE)
    }

    /// Database size info: (bytes on disk, record count)
    pub fn size_info(&self) -> (u64, u64) {
        self.store.size_info()
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
