// Player identity, normalized positions, and availability status.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slot::SlotKind;

/// Stable identifier for a rostered player (the upstream league's player id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returned when a raw position string cannot be mapped to a [`Position`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized position `{raw}`")]
pub struct UnknownPosition {
    pub raw: String,
}

/// Real-world hockey positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Center,
    LeftWing,
    RightWing,
    Defense,
    Goalie,
}

impl Position {
    /// Parse a free-text position into a [`Position`].
    ///
    /// Case, whitespace, `_`, `-` and `.` are ignored, so "Left Wing",
    /// "left_wing" and "LW" all resolve to `LeftWing`. Multi-position values
    /// such as "C/LW" or "C, RW" use the first listed position.
    pub fn parse(raw: &str) -> Result<Self, UnknownPosition> {
        let first = raw
            .split(['/', ','])
            .next()
            .unwrap_or_default();
        let key: String = first
            .chars()
            .filter(|c| !c.is_whitespace() && !matches!(c, '_' | '-' | '.'))
            .flat_map(char::to_uppercase)
            .collect();

        match key.as_str() {
            "C" | "CENTER" | "CENTRE" => Ok(Position::Center),
            "LW" | "L" | "LEFTWING" | "LEFTWINGER" => Ok(Position::LeftWing),
            "RW" | "R" | "RIGHTWING" | "RIGHTWINGER" => Ok(Position::RightWing),
            "D" | "DEF" | "DEFENSE" | "DEFENCE" | "DEFENSEMAN" | "DEFENCEMAN" | "LD" | "RD" => {
                Ok(Position::Defense)
            }
            "G" | "GK" | "GOALIE" | "GOALTENDER" | "GOALKEEPER" => Ok(Position::Goalie),
            _ => Err(UnknownPosition {
                raw: raw.to_string(),
            }),
        }
    }

    /// The positional slot kind this position fills.
    pub fn slot_kind(&self) -> SlotKind {
        match self {
            Position::Center => SlotKind::C,
            Position::LeftWing => SlotKind::LW,
            Position::RightWing => SlotKind::RW,
            Position::Defense => SlotKind::D,
            Position::Goalie => SlotKind::G,
        }
    }

    pub fn is_skater(&self) -> bool {
        !matches!(self, Position::Goalie)
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Center => "C",
            Position::LeftWing => "LW",
            Position::RightWing => "RW",
            Position::Defense => "D",
            Position::Goalie => "G",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

/// Availability designation reported by the league.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerStatus {
    #[default]
    Active,
    DayToDay,
    Injured,
    LongTermInjured,
    Suspended,
}

impl PlayerStatus {
    /// Parse a status label. Unknown or empty labels are treated as `Active`.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "DTD" | "DAYTODAY" | "DAY-TO-DAY" | "QUESTIONABLE" => PlayerStatus::DayToDay,
            "IR" | "INJURED" | "OUT" | "O" => PlayerStatus::Injured,
            "LTIR" | "IR-LT" | "LONGTERMINJURED" => PlayerStatus::LongTermInjured,
            "SUSP" | "SUSPENDED" => PlayerStatus::Suspended,
            _ => PlayerStatus::Active,
        }
    }

    /// Whether this is an official injured/suspended designation.
    /// `DayToDay` is a display label only.
    pub fn is_official_ir(&self) -> bool {
        matches!(
            self,
            PlayerStatus::Injured | PlayerStatus::LongTermInjured | PlayerStatus::Suspended
        )
    }

    /// Short badge for display; empty for active players.
    pub fn badge(&self) -> &'static str {
        match self {
            PlayerStatus::Active => "",
            PlayerStatus::DayToDay => "DTD",
            PlayerStatus::Injured => "IR",
            PlayerStatus::LongTermInjured => "LTIR",
            PlayerStatus::Suspended => "SUSP",
        }
    }
}

/// A player on a fantasy roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Position,
    /// Real-world team code (e.g. "TOR"). Empty when unknown.
    pub team: String,
    pub status: PlayerStatus,
    /// Official IR designation. Gates placement into IR slots independently
    /// of whatever status label is shown.
    pub ir_eligible: bool,
    /// Season fantasy point total, used to rank bench candidates when a
    /// saved lineup is repaired.
    #[serde(default)]
    pub season_points: f64,
}

impl Player {
    /// Build a player whose IR eligibility follows its official status.
    pub fn new(id: u64, name: &str, position: Position, team: &str, status: PlayerStatus) -> Self {
        Player {
            id: PlayerId(id),
            name: name.to_string(),
            position,
            team: team.to_string(),
            status,
            ir_eligible: status.is_official_ir(),
            season_points: 0.0,
        }
    }

    pub fn with_season_points(mut self, points: f64) -> Self {
        self.season_points = points;
        self
    }
}

/// The set of players currently on a team, keyed and iterated by id.
#[derive(Debug, Clone, Default)]
pub struct PlayerPool {
    players: BTreeMap<PlayerId, Player>,
}

impl PlayerPool {
    pub fn new(players: impl IntoIterator<Item = Player>) -> Self {
        PlayerPool {
            players: players.into_iter().map(|p| (p.id, p)).collect(),
        }
    }

    pub fn get(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn contains(&self, id: PlayerId) -> bool {
        self.players.contains_key(&id)
    }

    /// Players in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn insert(&mut self, player: Player) {
        self.players.insert(player.id, player);
    }
}

impl FromIterator<Player> for PlayerPool {
    fn from_iter<T: IntoIterator<Item = Player>>(iter: T) -> Self {
        PlayerPool::new(iter)
    }
}
