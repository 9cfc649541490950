// The Lineup aggregate: slot map plus ordered bench.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::player::{PlayerId, PlayerPool};
use crate::slot::{FantasySlot, Placement, SlotKind};

/// Number of starter slots in a full lineup.
pub const MAX_STARTERS: usize = FantasySlot::STARTERS.len();
/// Number of injured-reserve slots.
pub const MAX_IR: usize = FantasySlot::IR.len();

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineupError {
    #[error("player {0} appears more than once in the lineup")]
    DuplicatePlayer(PlayerId),

    #[error("slot {0} is assigned more than once")]
    DuplicateSlot(FantasySlot),
}

/// Per-player state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    Starter(FantasySlot),
    Bench,
    Ir(FantasySlot),
}

/// Non-blocking problems surfaced alongside a lineup. None of these stop a
/// lineup from being shown or edited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineupWarning {
    /// An IR slot holds a player whose official IR designation has cleared.
    IrIneligible { player: PlayerId, slot: FantasySlot },
    /// A saved player could not be resolved, even historically, and was left out.
    DataGap { player: PlayerId },
}

impl fmt::Display for LineupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineupWarning::IrIneligible { player, slot } => write!(
                f,
                "player {player} in {slot} is no longer designated injured or suspended"
            ),
            LineupWarning::DataGap { player } => {
                write!(f, "player {player} could not be resolved and was omitted")
            }
        }
    }
}

/// One team's lineup at one point in time.
///
/// Starters and IR players are the occupants of `slots`; everyone else on
/// the roster is on the ordered `bench`. Each slot holds at most one player
/// by construction, and `check_invariants` guarantees each player appears
/// in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "LineupRecord", try_from = "LineupRecord")]
pub struct Lineup {
    slots: BTreeMap<FantasySlot, PlayerId>,
    bench: Vec<PlayerId>,
}

/// Where a player was taken from, so it can be put back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Slot(FantasySlot),
    Bench(usize),
}

impl Origin {
    pub(crate) fn placement(&self) -> Placement {
        match self {
            Origin::Slot(slot) => Placement::Slot(*slot),
            Origin::Bench(_) => Placement::Bench,
        }
    }
}

impl Lineup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a lineup from explicit slot assignments and bench order.
    pub fn from_parts(
        slots: impl IntoIterator<Item = (FantasySlot, PlayerId)>,
        bench: Vec<PlayerId>,
    ) -> Result<Self, LineupError> {
        let mut map = BTreeMap::new();
        for (slot, player) in slots {
            if map.insert(slot, player).is_some() {
                return Err(LineupError::DuplicateSlot(slot));
            }
        }
        let lineup = Lineup { slots: map, bench };
        lineup.check_invariants()?;
        Ok(lineup)
    }

    /// Every player appears in exactly one place.
    pub fn check_invariants(&self) -> Result<(), LineupError> {
        let mut seen = HashSet::new();
        for id in self.slots.values().chain(self.bench.iter()) {
            if !seen.insert(*id) {
                return Err(LineupError::DuplicatePlayer(*id));
            }
        }
        Ok(())
    }

    pub fn occupant(&self, slot: FantasySlot) -> Option<PlayerId> {
        self.slots.get(&slot).copied()
    }

    pub fn slot_of(&self, player: PlayerId) -> Option<FantasySlot> {
        self.slots
            .iter()
            .find(|(_, id)| **id == player)
            .map(|(slot, _)| *slot)
    }

    pub fn bench_index(&self, player: PlayerId) -> Option<usize> {
        self.bench.iter().position(|id| *id == player)
    }

    pub fn placement_of(&self, player: PlayerId) -> Option<Placement> {
        if let Some(slot) = self.slot_of(player) {
            return Some(Placement::Slot(slot));
        }
        self.bench_index(player).map(|_| Placement::Bench)
    }

    pub fn state_of(&self, player: PlayerId) -> Option<PlayerState> {
        match self.placement_of(player)? {
            Placement::Slot(slot) if slot.is_ir() => Some(PlayerState::Ir(slot)),
            Placement::Slot(slot) => Some(PlayerState::Starter(slot)),
            Placement::Bench => Some(PlayerState::Bench),
        }
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.placement_of(player).is_some()
    }

    /// Occupied slots in display order.
    pub fn slots(&self) -> impl Iterator<Item = (FantasySlot, PlayerId)> + '_ {
        self.slots.iter().map(|(slot, id)| (*slot, *id))
    }

    /// Starters in slot order.
    pub fn starters(&self) -> Vec<PlayerId> {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.is_starter())
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn ir(&self) -> Vec<PlayerId> {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.is_ir())
            .map(|(_, id)| *id)
            .collect()
    }

    pub fn bench(&self) -> &[PlayerId] {
        &self.bench
    }

    /// Player -> slot for every starter and IR player. Bench players are absent.
    pub fn slot_assignments(&self) -> BTreeMap<PlayerId, FantasySlot> {
        self.slots.iter().map(|(slot, id)| (*id, *slot)).collect()
    }

    /// All players: slot occupants in slot order, then the bench in order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.slots
            .values()
            .chain(self.bench.iter())
            .copied()
            .collect()
    }

    pub fn starter_count(&self) -> usize {
        self.slots.keys().filter(|s| s.is_starter()).count()
    }

    pub fn ir_count(&self) -> usize {
        self.slots.keys().filter(|s| s.is_ir()).count()
    }

    pub fn len(&self) -> usize {
        self.slots.len() + self.bench.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Empty starter slots of `kind`, in fill order.
    pub fn open_slots(&self, kind: SlotKind) -> Vec<FantasySlot> {
        kind.slots()
            .iter()
            .copied()
            .filter(|slot| !self.slots.contains_key(slot))
            .collect()
    }

    pub fn first_open_ir_slot(&self) -> Option<FantasySlot> {
        FantasySlot::IR
            .iter()
            .copied()
            .find(|slot| !self.slots.contains_key(slot))
    }

    /// Problems worth telling the manager about without changing anything.
    pub fn audit(&self, pool: &PlayerPool) -> Vec<LineupWarning> {
        self.slots
            .iter()
            .filter(|(slot, _)| slot.is_ir())
            .filter_map(|(slot, id)| {
                let player = pool.get(*id)?;
                (!player.ir_eligible).then_some(LineupWarning::IrIneligible {
                    player: *id,
                    slot: *slot,
                })
            })
            .collect()
    }

    /// Drop every player for which `keep` returns false. Returns the removed ids.
    pub fn retain_players(&mut self, mut keep: impl FnMut(PlayerId) -> bool) -> Vec<PlayerId> {
        let mut removed = Vec::new();
        self.slots.retain(|_, id| {
            let k = keep(*id);
            if !k {
                removed.push(*id);
            }
            k
        });
        self.bench.retain(|id| {
            let k = keep(*id);
            if !k {
                removed.push(*id);
            }
            k
        });
        removed
    }

    // ------------------------------------------------------------------
    // Crate-internal mutation primitives
    // ------------------------------------------------------------------

    /// Remove a player from wherever it sits.
    pub(crate) fn take(&mut self, player: PlayerId) -> Option<Origin> {
        if let Some(slot) = self.slot_of(player) {
            self.slots.remove(&slot);
            return Some(Origin::Slot(slot));
        }
        let idx = self.bench_index(player)?;
        self.bench.remove(idx);
        Some(Origin::Bench(idx))
    }

    /// Put `player` in `slot`, returning whoever was displaced.
    pub(crate) fn assign(&mut self, slot: FantasySlot, player: PlayerId) -> Option<PlayerId> {
        self.slots.insert(slot, player)
    }

    pub(crate) fn push_bench(&mut self, player: PlayerId) {
        self.bench.push(player);
    }

    /// Insert onto the bench at `idx`, clamped to the bench length.
    pub(crate) fn insert_bench(&mut self, idx: usize, player: PlayerId) {
        let idx = idx.min(self.bench.len());
        self.bench.insert(idx, player);
    }
}

/// Serialized shape of a lineup. Deserialization goes through
/// `Lineup::from_parts`, so a stored record can never yield a lineup that
/// breaks the invariant.
#[derive(Debug, Serialize, Deserialize)]
struct LineupRecord {
    #[serde(default)]
    slots: Vec<SlotEntry>,
    #[serde(default)]
    bench: Vec<PlayerId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SlotEntry {
    slot: FantasySlot,
    player: PlayerId,
}

impl From<Lineup> for LineupRecord {
    fn from(lineup: Lineup) -> Self {
        LineupRecord {
            slots: lineup
                .slots
                .into_iter()
                .map(|(slot, player)| SlotEntry { slot, player })
                .collect(),
            bench: lineup.bench,
        }
    }
}

impl TryFrom<LineupRecord> for Lineup {
    type Error = LineupError;

    fn try_from(record: LineupRecord) -> Result<Self, Self::Error> {
        Lineup::from_parts(
            record.slots.into_iter().map(|e| (e.slot, e.player)),
            record.bench,
        )
    }
}
