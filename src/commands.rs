//! Command-handling consumer
//! Parses prefixed chat commands (`points`, `leaderboard`, `give`,
//! `cleanup`) and turns ledger results into plain-text replies. Live
//! community state is injected behind the `Roster` trait so this stays
//! testable without a chat connection.

use crate::config::BotConfig;
use crate::error::Result;
use crate::ledger::PointsLedger;
use crate::utils::current_timestamp_ms;

/// Live community roster, supplied per guild by the dispatcher
pub trait Roster {
    /// Whether the user is currently a member of the guild
    fn is_member(&self, user_id: &str) -> bool;
    /// Whether the user owns the guild (the only privileged check)
    fn is_owner(&self, user_id: &str) -> bool;
    /// Human-readable name for display; falls back to the raw id
    fn display_name(&self, user_id: &str) -> String {
        user_id.to_string()
    }
}

/// Split a prefixed message into a lowercased command name and argument
/// tokens. Returns None for content that does not start with the prefix.
pub fn parse_command<'a>(prefix: &str, content: &'a str) -> Option<(String, Vec<&'a str>)> {
    if prefix.is_empty() || !content.starts_with(prefix) {
        return None;
    }
    let mut parts = content.split_whitespace();
    let command = parts.next()?.strip_prefix(prefix)?.to_lowercase();
    if command.is_empty() {
        return None;
    }
    Some((command, parts.collect()))
}

/// Executes chat commands against the ledger
#[derive(Clone)]
pub struct CommandHandler {
    ledger: PointsLedger,
    config: BotConfig,
}

impl CommandHandler {
    pub fn new(ledger: PointsLedger, config: BotConfig) -> Self {
        Self { ledger, config }
    }

    /// Execute one parsed command on behalf of `author_id` and return the
    /// reply text. Unrecognized commands return None so the dispatcher can
    /// ignore them.
    pub fn handle(
        &self,
        guild_id: &str,
        author_id: &str,
        command: &str,
        args: &[&str],
        roster: &dyn Roster,
    ) -> Result<Option<String>> {
        match command {
            "points" => self.points(guild_id, author_id).map(Some),
            "leaderboard" => self.leaderboard(guild_id, roster).map(Some),
            "give" => self.give(guild_id, author_id, args, roster).map(Some),
            "cleanup" => self.cleanup(guild_id, roster).map(Some),
            _ => Ok(None),
        }
    }

    fn points(&self, guild_id: &str, author_id: &str) -> Result<String> {
        match self.ledger.get(guild_id, author_id) {
            Ok(entry) => Ok(format!("You currently have {} points!", entry.points)),
            Err(e) if e.is_not_found() => Ok("You don't have any points yet!".to_string()),
            Err(e) => Err(e),
        }
    }

    fn leaderboard(&self, guild_id: &str, roster: &dyn Roster) -> Result<String> {
        let top = self.ledger.top_n(guild_id, self.config.leaderboard_size)?;
        let mut reply = format!("Leaderboard - top {} points leaders!", self.config.leaderboard_size);
        for entry in &top {
            reply.push_str(&format!(
                "\n{}: {} points",
                roster.display_name(&entry.user_id),
                entry.points
            ));
        }
        Ok(reply)
    }

    fn give(
        &self,
        guild_id: &str,
        author_id: &str,
        args: &[&str],
        roster: &dyn Roster,
    ) -> Result<String> {
        if !roster.is_owner(author_id) {
            return Ok("You're not the boss of me, you can't do that!".to_string());
        }
        let Some(target_id) = args.first() else {
            return Ok("You must mention someone or give their ID!".to_string());
        };
        let points_to_add = match args.get(1).and_then(|a| a.parse::<i64>().ok()) {
            Some(n) if n != 0 => n,
            _ => return Ok("You didn't tell me how many points to give...".to_string()),
        };

        self.ledger
            .ensure_exists(guild_id, target_id, current_timestamp_ms())?;
        let total = self.ledger.add_delta(guild_id, target_id, points_to_add)?;

        Ok(format!(
            "{} has received {} points and now has {} points.",
            roster.display_name(target_id),
            points_to_add,
            total
        ))
    }

    fn cleanup(&self, guild_id: &str, roster: &dyn Roster) -> Result<String> {
        let removed = self.ledger.cleanup(
            guild_id,
            current_timestamp_ms(),
            self.config.stale_after_ms(),
            |user_id| roster.is_member(user_id),
        )?;
        Ok(format!("Removed {removed} old users' points."))
    }
}
