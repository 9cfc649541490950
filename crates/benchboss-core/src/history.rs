// Historical roster membership, for resolving players who have since left.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::player::{Player, PlayerId};
use crate::store::StoreError;

/// One continuous spell of a player on a team's roster. `left` is the last
/// rostered day, inclusive; `None` while still rostered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterStint {
    pub player: Player,
    pub joined: NaiveDate,
    pub left: Option<NaiveDate>,
}

impl RosterStint {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.joined <= date && self.left.map_or(true, |left| date <= left)
    }
}

pub trait RosterHistory: Send + Sync {
    /// The player as rostered by `team` on `date`, if they were.
    fn player_as_of(&self, team: &str, player: PlayerId, date: NaiveDate) -> Result<Option<Player>, StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRosterHistory {
    stints: Mutex<HashMap<String, Vec<RosterStint>>>,
}

impl MemoryRosterHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, team: &str, stint: RosterStint) {
        self.stints().entry(team.to_string()).or_default().push(stint);
    }

    fn stints(&self) -> MutexGuard<'_, HashMap<String, Vec<RosterStint>>> {
        self.stints.lock().expect("roster history mutex poisoned")
    }
}

impl RosterHistory for MemoryRosterHistory {
    fn player_as_of(&self, team: &str, player: PlayerId, date: NaiveDate) -> Result<Option<Player>, StoreError> {
        Ok(self.stints().get(team).and_then(|stints| {
            stints
                .iter()
                .find(|s| s.player.id == player && s.covers(date))
                .map(|s| s.player.clone())
        }))
    }
}
