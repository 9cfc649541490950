// Real-world game schedule lookup.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One scheduled real-world game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub game_id: u64,
    /// Official game date.
    pub date: NaiveDate,
    /// Puck-drop instant.
    pub start: DateTime<Utc>,
    pub home: String,
    pub away: String,
}

impl GameInfo {
    pub fn involves(&self, team: &str) -> bool {
        self.home.eq_ignore_ascii_case(team) || self.away.eq_ignore_ascii_case(team)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("schedule data unavailable: {0}")]
    Unavailable(String),

    #[error("ambiguous schedule: team {team} has {count} games on {date}")]
    Ambiguous {
        team: String,
        date: NaiveDate,
        count: usize,
    },
}

/// Source of game schedule data.
pub trait GameSchedule: Send + Sync {
    /// Games involving `team` on `date`.
    fn games_on(&self, team: &str, date: NaiveDate) -> Result<Vec<GameInfo>, ScheduleError>;

    /// The first game involving `team` starting at or after `after`.
    fn next_game(&self, team: &str, after: DateTime<Utc>) -> Result<Option<GameInfo>, ScheduleError>;

    /// The single game for `team` on `date`, if any. More than one game is
    /// reported as ambiguous.
    fn game_on(&self, team: &str, date: NaiveDate) -> Result<Option<GameInfo>, ScheduleError> {
        let mut games = self.games_on(team, date)?;
        match games.len() {
            0 => Ok(None),
            1 => Ok(games.pop()),
            count => Err(ScheduleError::Ambiguous {
                team: team.to_string(),
                date,
                count,
            }),
        }
    }

    /// Whether `team` plays on `date`. Lookup failures count as "no game".
    fn has_game_on(&self, team: &str, date: NaiveDate) -> bool {
        matches!(self.games_on(team, date), Ok(games) if !games.is_empty())
    }

    /// Batched `has_game_on`: the subset of `teams` that play on `date`.
    fn teams_with_games_on(&self, teams: &[&str], date: NaiveDate) -> HashSet<String> {
        teams
            .iter()
            .filter(|team| self.has_game_on(team, date))
            .map(|team| team.to_uppercase())
            .collect()
    }
}

/// Schedule held in memory, indexed by date.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchedule {
    by_date: HashMap<NaiveDate, Vec<GameInfo>>,
}

impl InMemorySchedule {
    pub fn new(games: impl IntoIterator<Item = GameInfo>) -> Self {
        let mut by_date: HashMap<NaiveDate, Vec<GameInfo>> = HashMap::new();
        for game in games {
            by_date.entry(game.date).or_default().push(game);
        }
        for games in by_date.values_mut() {
            games.sort_by_key(|g| (g.start, g.game_id));
        }
        InMemorySchedule { by_date }
    }

    pub fn game_count(&self) -> usize {
        self.by_date.values().map(Vec::len).sum()
    }
}

impl GameSchedule for InMemorySchedule {
    fn games_on(&self, team: &str, date: NaiveDate) -> Result<Vec<GameInfo>, ScheduleError> {
        Ok(self
            .by_date
            .get(&date)
            .map(|games| games.iter().filter(|g| g.involves(team)).cloned().collect())
            .unwrap_or_default())
    }

    fn next_game(&self, team: &str, after: DateTime<Utc>) -> Result<Option<GameInfo>, ScheduleError> {
        Ok(self
            .by_date
            .values()
            .flatten()
            .filter(|g| g.involves(team) && g.start >= after)
            .min_by_key(|g| g.start)
            .cloned())
    }
}
