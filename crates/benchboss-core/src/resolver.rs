// Initial slot assignment and saved-lineup repair.

use std::cmp::Ordering;

use tracing::{debug, info};

use crate::eligibility::can_fill;
use crate::lineup::{Lineup, MAX_STARTERS};
use crate::player::{Player, PlayerId, PlayerPool};
use crate::slot::{FantasySlot, SlotKind};

/// Kind order for refilling a short saved lineup. Goalie and defense are the
/// scarcest, so they are refilled first.
pub const REPAIR_PRIORITY: [SlotKind; 6] = [
    SlotKind::G,
    SlotKind::D,
    SlotKind::C,
    SlotKind::LW,
    SlotKind::RW,
    SlotKind::Util,
];

/// What a repair pass changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepairReport {
    /// Saved players no longer on the roster.
    pub dropped: Vec<PlayerId>,
    /// Rostered players the saved lineup had never seen; appended to bench.
    pub added: Vec<PlayerId>,
    /// Bench players promoted into empty starter slots.
    pub promoted: Vec<(PlayerId, FantasySlot)>,
}

impl RepairReport {
    pub fn is_empty(&self) -> bool {
        self.dropped.is_empty() && self.added.is_empty() && self.promoted.is_empty()
    }
}

/// Resolve the lineup for a roster: repair `existing` if there is one,
/// otherwise build a fresh assignment.
pub fn resolve_lineup(pool: &PlayerPool, existing: Option<&Lineup>) -> Lineup {
    match existing {
        Some(saved) => {
            let (lineup, report) = repair_lineup(saved, pool);
            if !report.is_empty() {
                info!(
                    "repaired saved lineup: {} dropped, {} added, {} promoted",
                    report.dropped.len(),
                    report.added.len(),
                    report.promoted.len()
                );
            }
            lineup
        }
        None => initial_lineup(pool),
    }
}

/// Deterministic cold-start assignment.
///
/// Players are taken in ascending id order. Officially injured or suspended
/// players fill IR-1..IR-3 (overflow to bench); everyone else fills the first
/// open slot of their position, then the single UTIL slot goes to the first
/// leftover skater. The rest sit on the bench in id order. Short or skewed
/// pools produce partial lineups.
pub fn initial_lineup(pool: &PlayerPool) -> Lineup {
    let mut lineup = Lineup::new();
    let mut bench: Vec<PlayerId> = Vec::new();
    let mut unplaced: Vec<&Player> = Vec::new();

    // 1. IR designations first
    for player in pool.iter() {
        if player.ir_eligible {
            match lineup.first_open_ir_slot() {
                Some(slot) => {
                    lineup.assign(slot, player.id);
                }
                None => bench.push(player.id),
            }
        } else {
            unplaced.push(player);
        }
    }

    // 2. Dedicated positional slots, first come first filled
    let mut leftovers: Vec<&Player> = Vec::new();
    for player in unplaced {
        match lineup.open_slots(player.position.slot_kind()).first() {
            Some(&slot) => {
                lineup.assign(slot, player.id);
            }
            None => leftovers.push(player),
        }
    }

    // 3. UTIL for the first leftover skater
    let mut util_taken = lineup.occupant(FantasySlot::Util).is_some();
    for player in leftovers {
        if !util_taken && can_fill(player, FantasySlot::Util) {
            lineup.assign(FantasySlot::Util, player.id);
            util_taken = true;
        } else {
            bench.push(player.id);
        }
    }

    // 4. Bench in pool order
    bench.sort();
    for id in bench {
        lineup.push_bench(id);
    }

    debug!(
        "initial lineup: {} starters, {} IR, {} bench",
        lineup.starter_count(),
        lineup.ir_count(),
        lineup.bench().len()
    );
    lineup
}

/// Reconcile a saved lineup with the current roster.
///
/// Players who left the roster are removed, players the saved lineup never
/// saw are appended to the bench (never auto-started), and empty starter
/// slots are refilled from the saved bench in [`REPAIR_PRIORITY`] order,
/// highest season point total first, until 13 starters or no candidates.
/// Players with an official IR designation are never promoted.
pub fn repair_lineup(saved: &Lineup, pool: &PlayerPool) -> (Lineup, RepairReport) {
    let mut lineup = saved.clone();
    let mut report = RepairReport {
        dropped: lineup.retain_players(|id| pool.contains(id)),
        ..RepairReport::default()
    };

    report.added = pool.ids().filter(|id| !lineup.contains(*id)).collect();

    for kind in REPAIR_PRIORITY {
        if lineup.starter_count() >= MAX_STARTERS {
            break;
        }
        for slot in lineup.open_slots(kind) {
            let Some(candidate) = best_bench_candidate(&lineup, pool, slot) else {
                break;
            };
            lineup.take(candidate);
            lineup.assign(slot, candidate);
            report.promoted.push((candidate, slot));
        }
    }

    for id in &report.added {
        lineup.push_bench(*id);
    }

    (lineup, report)
}

/// Highest season-points bench player who can fill `slot`; ties go to the
/// lower id.
fn best_bench_candidate(lineup: &Lineup, pool: &PlayerPool, slot: FantasySlot) -> Option<PlayerId> {
    lineup
        .bench()
        .iter()
        .filter_map(|id| pool.get(*id))
        .filter(|p| !p.ir_eligible && can_fill(p, slot))
        .max_by(|a, b| {
            a.season_points
                .partial_cmp(&b.season_points)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b.id.cmp(&a.id))
        })
        .map(|p| p.id)
}
