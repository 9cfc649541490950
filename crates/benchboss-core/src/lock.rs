// Game-start lock evaluation.
//
// A player's slot is frozen once their real-world game for the viewed date
// has started, and every slot is frozen for dates before today. Schedule
// failures fail open: the player stays editable.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, warn};

use crate::player::{Player, PlayerId};
use crate::schedule::GameSchedule;

/// Decides lock state for players against a schedule, in the viewer's timezone.
pub struct LockEvaluator<'a> {
    schedule: &'a dyn GameSchedule,
    tz: FixedOffset,
}

impl<'a> LockEvaluator<'a> {
    pub fn new(schedule: &'a dyn GameSchedule, tz: FixedOffset) -> Self {
        LockEvaluator { schedule, tz }
    }

    /// The calendar date of `now` in the viewer's timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    pub fn is_past(&self, date: NaiveDate, now: DateTime<Utc>) -> bool {
        date < self.today(now)
    }

    /// Whether `player` is locked for `date` at instant `now`.
    pub fn is_locked(&self, player: &Player, date: NaiveDate, now: DateTime<Utc>) -> bool {
        if self.is_past(date, now) {
            return true;
        }
        if player.team.trim().is_empty() {
            return false;
        }
        match self.schedule.game_on(&player.team, date) {
            Ok(Some(game)) => game.start <= now,
            Ok(None) => false,
            Err(e) => {
                warn!(
                    "treating player {} as unlocked for {}: {}",
                    player.id, date, e
                );
                false
            }
        }
    }

    /// Batched `is_locked`: the ids of every locked player in `players`.
    pub fn locked_players<'p>(
        &self,
        players: impl IntoIterator<Item = &'p Player>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> HashSet<PlayerId> {
        players
            .into_iter()
            .filter(|p| self.is_locked(p, date, now))
            .map(|p| p.id)
            .collect()
    }

    /// Compute a lock snapshot for `players` on `date`.
    pub fn snapshot<'p>(
        &self,
        players: impl IntoIterator<Item = &'p Player>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> LockSnapshot {
        let locked = self.locked_players(players, date, now);
        debug!("computed lock snapshot for {}: {} locked", date, locked.len());
        LockSnapshot {
            date,
            computed_at: now,
            date_is_past: self.is_past(date, now),
            locked,
        }
    }
}

/// Lock state for one date, computed at one instant. Derived and never
/// persisted; recomputed when stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockSnapshot {
    pub date: NaiveDate,
    pub computed_at: DateTime<Utc>,
    pub date_is_past: bool,
    pub locked: HashSet<PlayerId>,
}

impl LockSnapshot {
    /// A snapshot with nothing locked, for dates with no schedule context.
    pub fn unlocked(date: NaiveDate, computed_at: DateTime<Utc>) -> Self {
        LockSnapshot {
            date,
            computed_at,
            date_is_past: false,
            locked: HashSet::new(),
        }
    }

    pub fn is_locked(&self, player: PlayerId) -> bool {
        self.date_is_past || self.locked.contains(&player)
    }

    /// Whether this snapshot should be recomputed at `now`.
    pub fn is_stale(&self, date: NaiveDate, now: DateTime<Utc>, max_age: Duration) -> bool {
        if date != self.date {
            return true;
        }
        match (now - self.computed_at).to_std() {
            Ok(age) => age >= max_age,
            // computed_at is in the future (clock moved backwards)
            Err(_) => true,
        }
    }
}
