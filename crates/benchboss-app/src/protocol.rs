// Messages between the terminal front end and the app event loop.

use chrono::NaiveDate;
use serde::Serialize;

use benchboss_core::mutation::MoveTarget;
use benchboss_core::player::PlayerId;
use benchboss_core::session::EditMode;

/// A request from the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum UserCommand {
    /// Re-send the current lineup.
    Show,
    /// View another date.
    Navigate(NaiveDate),
    /// Step the viewed date by whole days.
    Shift(i64),
    /// Jump to the first day of the next scoring week.
    NextWeek,
    Move { player: PlayerId, target: MoveTarget },
    Optimize,
    SetMode(EditMode),
    /// The front end regained focus; refresh lock state now.
    Resume,
    Quit,
}

/// Everything shown for one lineup row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerRow {
    /// Slot label, or "BN" for bench rows.
    pub slot: String,
    pub player_id: Option<u64>,
    pub name: String,
    pub position: String,
    pub team: String,
    pub status: String,
    /// Slot kinds the player may fill, plus "IR" when designated.
    pub eligible: Vec<String>,
    pub locked: bool,
    /// Historical player shown for context only.
    pub read_only: bool,
}

/// A rendered view of the lineup for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineupSnapshot {
    pub team: String,
    pub date: NaiveDate,
    pub week: Option<u32>,
    /// The scoring week containing today.
    pub current_week: Option<u32>,
    pub is_past: bool,
    pub mode: String,
    pub starters: Vec<PlayerRow>,
    pub ir: Vec<PlayerRow>,
    pub bench: Vec<PlayerRow>,
    pub warnings: Vec<String>,
}

/// Which family of rejection a move hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionKind {
    InvalidPlacement,
    Locked,
}

/// Update pushed from the event loop to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum UiUpdate {
    Lineup(Box<LineupSnapshot>),
    Rejected { kind: RejectionKind, message: String },
    /// A snapshot write did not land; the shown lineup is still current.
    PersistWarning(String),
    /// Input or storage problem that left the lineup untouched.
    Error(String),
}
