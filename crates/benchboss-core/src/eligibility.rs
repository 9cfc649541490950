// Slot eligibility rules.
//
// Pure functions: no side effects and no failure modes.

use std::collections::BTreeSet;

use crate::player::{Player, Position};
use crate::slot::{FantasySlot, Placement, SlotKind};

/// Slot kinds a position may occupy: its own kind, plus UTIL for skaters.
pub fn kinds_for_position(position: Position) -> &'static [SlotKind] {
    match position {
        Position::Center => &[SlotKind::C, SlotKind::Util],
        Position::LeftWing => &[SlotKind::LW, SlotKind::Util],
        Position::RightWing => &[SlotKind::RW, SlotKind::Util],
        Position::Defense => &[SlotKind::D, SlotKind::Util],
        Position::Goalie => &[SlotKind::G],
    }
}

/// The set of starter slot kinds `player` may occupy.
pub fn eligible_slots(player: &Player) -> BTreeSet<SlotKind> {
    kinds_for_position(player.position).iter().copied().collect()
}

/// Whether `player` may occupy the concrete `slot`.
///
/// IR slots look only at the official IR flag, never at the display status.
pub fn can_fill(player: &Player, slot: FantasySlot) -> bool {
    match slot.kind() {
        Some(kind) => kinds_for_position(player.position).contains(&kind),
        None => player.ir_eligible,
    }
}

/// Whether `player` may be placed at `placement`. The bench accepts anyone.
pub fn is_valid_placement(player: &Player, placement: Placement) -> bool {
    match placement {
        Placement::Bench => true,
        Placement::Slot(slot) => can_fill(player, slot),
    }
}
