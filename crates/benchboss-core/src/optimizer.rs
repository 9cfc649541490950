// Greedy same-day lineup optimizer.
//
// Positional groups are filled independently from a ranked candidate list;
// there is no backtracking across groups, so a weak center is never benched
// to free a center slot for a stronger UTIL-only candidate.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::debug;

use crate::lineup::Lineup;
use crate::lock::LockSnapshot;
use crate::player::{Player, PlayerId, PlayerPool};
use crate::schedule::GameSchedule;
use crate::slot::{FantasySlot, SlotKind};

/// Positional kinds in fill order. UTIL is handled after all of these.
const FILL_ORDER: [SlotKind; 5] = [SlotKind::C, SlotKind::LW, SlotKind::RW, SlotKind::D, SlotKind::G];

/// Per-player, per-date projected fantasy points. Opaque to the engine.
#[derive(Debug, Clone, Default)]
pub struct Projections {
    points: HashMap<(PlayerId, NaiveDate), f64>,
}

impl Projections {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, player: PlayerId, date: NaiveDate, points: f64) {
        self.points.insert((player, date), points);
    }

    pub fn get(&self, player: PlayerId, date: NaiveDate) -> Option<f64> {
        self.points.get(&(player, date)).copied()
    }

    /// Projection for the date, zero when none was supplied.
    pub fn points_for(&self, player: PlayerId, date: NaiveDate) -> f64 {
        self.get(player, date).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl FromIterator<(PlayerId, NaiveDate, f64)> for Projections {
    fn from_iter<T: IntoIterator<Item = (PlayerId, NaiveDate, f64)>>(iter: T) -> Self {
        let mut projections = Projections::new();
        for (player, date, points) in iter {
            projections.insert(player, date, points);
        }
        projections
    }
}

/// Inputs the optimizer ranks against.
pub struct OptimizeContext<'a> {
    pub pool: &'a PlayerPool,
    pub date: NaiveDate,
    pub schedule: &'a dyn GameSchedule,
    pub projections: &'a Projections,
    pub locks: &'a LockSnapshot,
}

/// One ranked candidate.
#[derive(Debug, Clone)]
struct Candidate<'p> {
    player: &'p Player,
    has_game: bool,
    projected: f64,
}

/// Game today first, then projection descending, then id for stability.
fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    b.has_game
        .cmp(&a.has_game)
        .then_with(|| b.projected.partial_cmp(&a.projected).unwrap_or(Ordering::Equal))
        .then_with(|| a.player.id.cmp(&b.player.id))
}

/// Rebuild the starting lineup from `current`'s starters and bench.
///
/// IR slots are carried over untouched. Locked starters keep their slots
/// and locked bench players stay on the bench. Players with an official IR
/// designation are never started. Unplaced players keep their previous bench
/// order, followed by demoted starters in slot order.
pub fn auto_optimize(current: &Lineup, ctx: &OptimizeContext<'_>) -> Lineup {
    let mut next = Lineup::new();

    for (slot, id) in current.slots() {
        if slot.is_ir() || ctx.locks.is_locked(id) {
            next.assign(slot, id);
        }
    }

    let mut candidates: Vec<Candidate<'_>> = current
        .starters()
        .into_iter()
        .chain(current.bench().iter().copied())
        .filter(|id| !ctx.locks.is_locked(*id))
        .filter_map(|id| ctx.pool.get(id))
        .filter(|p| !p.ir_eligible)
        .map(|player| Candidate {
            player,
            has_game: ctx.schedule.has_game_on(&player.team, ctx.date),
            projected: ctx.projections.points_for(player.id, ctx.date),
        })
        .collect();
    candidates.sort_by(rank);

    let mut placed: HashSet<PlayerId> = HashSet::new();

    for kind in FILL_ORDER {
        for slot in next.open_slots(kind) {
            let best = candidates
                .iter()
                .find(|c| c.player.position.slot_kind() == kind && !placed.contains(&c.player.id));
            if let Some(c) = best {
                next.assign(slot, c.player.id);
                placed.insert(c.player.id);
            }
        }
    }

    if next.occupant(FantasySlot::Util).is_none() {
        let best = candidates
            .iter()
            .find(|c| c.player.position.is_skater() && !placed.contains(&c.player.id));
        if let Some(c) = best {
            next.assign(FantasySlot::Util, c.player.id);
            placed.insert(c.player.id);
        }
    }

    let benched: Vec<PlayerId> = current
        .bench()
        .iter()
        .copied()
        .chain(current.starters())
        .filter(|id| !next.contains(*id))
        .collect();
    for id in benched {
        next.push_bench(id);
    }

    debug!(
        "optimized lineup for {}: {} starters from {} candidates",
        ctx.date,
        next.starter_count(),
        candidates.len()
    );
    next
}
