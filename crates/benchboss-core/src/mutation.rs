// Lineup mutation: validated moves, swaps, and bench reordering.
//
// Every operation takes the current lineup by reference and returns a new
// value. A rejected move leaves the caller's lineup untouched.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::eligibility::{can_fill, is_valid_placement};
use crate::lineup::{Lineup, LineupWarning, Origin};
use crate::lock::LockSnapshot;
use crate::player::{Player, PlayerId, PlayerPool};
use crate::slot::{FantasySlot, Placement};

/// Where the manager dropped the moved player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    /// A specific slot, empty or occupied.
    Slot(FantasySlot),
    /// Another player's card; resolves to that player's current location.
    Player(PlayerId),
    /// The bench region in general.
    Bench,
}

/// Why a move was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectionReason {
    #[error("Locked: {date} is in the past")]
    PastDate { date: NaiveDate },

    #[error("Locked: lineups open once the draft is complete")]
    DraftPending,

    #[error("Locked: player {player}'s game has started")]
    Locked { player: PlayerId },

    #[error("Invalid Position: player {player} cannot play {target}")]
    InvalidPosition { player: PlayerId, target: Placement },

    #[error("Invalid Move: player {player} is not designated injured or suspended and cannot go to {slot}")]
    IneligibleForIr { player: PlayerId, slot: FantasySlot },

    #[error("player {0} is not on this lineup")]
    UnknownPlayer(PlayerId),
}

impl RejectionReason {
    /// Position or IR-eligibility mismatch.
    pub fn is_invalid_placement(&self) -> bool {
        matches!(
            self,
            RejectionReason::InvalidPosition { .. }
                | RejectionReason::IneligibleForIr { .. }
                | RejectionReason::UnknownPlayer(_)
        )
    }

    /// Game started, date past, or the lineup is not open yet.
    pub fn is_lock(&self) -> bool {
        matches!(
            self,
            RejectionReason::PastDate { .. }
                | RejectionReason::DraftPending
                | RejectionReason::Locked { .. }
        )
    }
}

/// Everything a move is validated against besides the lineup itself.
#[derive(Debug, Clone, Copy)]
pub struct MoveContext<'a> {
    pub pool: &'a PlayerPool,
    /// The date being edited.
    pub date: NaiveDate,
    /// Today in the viewer's timezone.
    pub today: NaiveDate,
    pub locks: &'a LockSnapshot,
    pub draft_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Moved into an empty slot or onto the bench.
    Direct,
    /// Two players exchanged locations.
    Swap,
    /// The displaced player could not take the mover's old spot and was benched.
    DegradedSwap,
    /// Bench order changed; no slot changed hands.
    BenchReorder,
    /// Dropped where it already was.
    NoOp,
}

/// Result of an accepted move.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub lineup: Lineup,
    pub kind: MoveKind,
    /// Non-blocking invariant problems found after the move.
    pub warnings: Vec<LineupWarning>,
}

/// Apply one move to `lineup`.
pub fn apply_move(
    lineup: &Lineup,
    player: PlayerId,
    target: MoveTarget,
    ctx: &MoveContext<'_>,
) -> Result<MoveOutcome, RejectionReason> {
    let result = try_move(lineup, player, target, ctx);
    match &result {
        Ok(outcome) => {
            debug!(
                "player {} moved {:?} -> {:?} ({:?})",
                player,
                lineup.state_of(player),
                outcome.lineup.state_of(player),
                outcome.kind
            );
            for warning in &outcome.warnings {
                warn!("lineup warning after move: {}", warning);
            }
        }
        Err(reason) => info!("rejected move of {} to {:?}: {}", player, target, reason),
    }
    result
}

fn try_move(
    lineup: &Lineup,
    player: PlayerId,
    target: MoveTarget,
    ctx: &MoveContext<'_>,
) -> Result<MoveOutcome, RejectionReason> {
    // 1. Time gates
    if ctx.date < ctx.today {
        return Err(RejectionReason::PastDate { date: ctx.date });
    }
    if !ctx.draft_complete {
        return Err(RejectionReason::DraftPending);
    }
    let mover = resolve_player(lineup, ctx.pool, player)?;
    if ctx.locks.is_locked(player) {
        return Err(RejectionReason::Locked { player });
    }

    // 2. Concrete target
    let (placement, occupant) = match target {
        MoveTarget::Slot(slot) => (Placement::Slot(slot), lineup.occupant(slot)),
        MoveTarget::Bench => (Placement::Bench, None),
        MoveTarget::Player(other) if other == player => return Ok(unchanged(lineup, ctx)),
        MoveTarget::Player(other) => {
            resolve_player(lineup, ctx.pool, other)?;
            match lineup.placement_of(other) {
                Some(Placement::Slot(slot)) => (Placement::Slot(slot), Some(other)),
                Some(Placement::Bench) if lineup.bench_index(player).is_some() => {
                    return Ok(reorder_bench(lineup, player, other, ctx));
                }
                Some(Placement::Bench) => (Placement::Bench, Some(other)),
                None => return Err(RejectionReason::UnknownPlayer(other)),
            }
        }
    };

    if lineup.placement_of(player) == Some(placement) && occupant.map_or(true, |o| o == player) {
        return Ok(unchanged(lineup, ctx));
    }
    if let Some(other) = occupant {
        if ctx.locks.is_locked(other) {
            return Err(RejectionReason::Locked { player: other });
        }
    }

    // 3. Placement validity
    if !is_valid_placement(mover, placement) {
        return Err(match placement {
            Placement::Slot(slot) if slot.is_ir() => RejectionReason::IneligibleForIr { player, slot },
            _ => RejectionReason::InvalidPosition {
                player,
                target: placement,
            },
        });
    }

    // 4/5. Relocate, swapping with any occupant
    let mut next = lineup.clone();
    let origin = next
        .take(player)
        .ok_or(RejectionReason::UnknownPlayer(player))?;

    let kind = match (placement, occupant) {
        (Placement::Slot(slot), None) => {
            next.assign(slot, player);
            MoveKind::Direct
        }
        (Placement::Bench, None) => {
            next.push_bench(player);
            MoveKind::Direct
        }
        (Placement::Slot(slot), Some(other)) => {
            next.take(other);
            next.assign(slot, player);
            place_displaced(&mut next, ctx.pool, other, origin)
        }
        (Placement::Bench, Some(other)) => {
            // Starter dropped on a bench card: mover takes that bench spot,
            // the bench player takes the vacated slot when it can.
            let idx = next.bench_index(other).unwrap_or(next.bench().len());
            next.take(other);
            next.insert_bench(idx, player);
            match origin {
                Origin::Slot(slot) if fits(ctx.pool, other, slot) => {
                    next.assign(slot, other);
                    MoveKind::Swap
                }
                _ => {
                    next.insert_bench(idx + 1, other);
                    MoveKind::Direct
                }
            }
        }
    };

    // 7. Surface, never auto-fix
    let warnings = next.audit(ctx.pool);
    Ok(MoveOutcome {
        lineup: next,
        kind,
        warnings,
    })
}

/// Put the displaced occupant back where the mover came from, or bench it.
fn place_displaced(next: &mut Lineup, pool: &PlayerPool, other: PlayerId, origin: Origin) -> MoveKind {
    match origin {
        Origin::Slot(slot) if fits(pool, other, slot) => {
            next.assign(slot, other);
            MoveKind::Swap
        }
        Origin::Slot(_) => {
            next.push_bench(other);
            MoveKind::DegradedSwap
        }
        Origin::Bench(idx) => {
            next.insert_bench(idx, other);
            MoveKind::Swap
        }
    }
}

fn fits(pool: &PlayerPool, player: PlayerId, slot: FantasySlot) -> bool {
    pool.get(player).is_some_and(|p| can_fill(p, slot))
}

/// Stable array move of `player` to `other`'s bench index.
fn reorder_bench(lineup: &Lineup, player: PlayerId, other: PlayerId, ctx: &MoveContext<'_>) -> MoveOutcome {
    let mut next = lineup.clone();
    let to = lineup.bench_index(other).unwrap_or(lineup.bench().len());
    next.take(player);
    next.insert_bench(to, player);
    MoveOutcome {
        warnings: next.audit(ctx.pool),
        lineup: next,
        kind: MoveKind::BenchReorder,
    }
}

fn unchanged(lineup: &Lineup, ctx: &MoveContext<'_>) -> MoveOutcome {
    MoveOutcome {
        lineup: lineup.clone(),
        kind: MoveKind::NoOp,
        warnings: lineup.audit(ctx.pool),
    }
}

fn resolve_player<'p>(lineup: &Lineup, pool: &'p PlayerPool, id: PlayerId) -> Result<&'p Player, RejectionReason> {
    if !lineup.contains(id) {
        return Err(RejectionReason::UnknownPlayer(id));
    }
    pool.get(id).ok_or(RejectionReason::UnknownPlayer(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerStatus, Position};
    use chrono::{TimeZone, Utc};

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn pool() -> PlayerPool {
        use Position::*;
        PlayerPool::new(vec![
            Player::new(1, "Center A", Center, "TOR", PlayerStatus::Active),
            Player::new(2, "Center B", Center, "MTL", PlayerStatus::Active),
            Player::new(3, "Defense A", Defense, "BOS", PlayerStatus::Active),
            Player::new(4, "Goalie A", Goalie, "VAN", PlayerStatus::Active),
            Player::new(5, "Hurt Wing", LeftWing, "TOR", PlayerStatus::Injured),
            Player::new(6, "Bench Wing", LeftWing, "EDM", PlayerStatus::Active),
            Player::new(7, "Bench Goalie", Goalie, "CGY", PlayerStatus::Active),
            Player::new(8, "Bench Center", Center, "SEA", PlayerStatus::Active),
        ])
    }

    fn lineup() -> Lineup {
        Lineup::from_parts(
            [
                (FantasySlot::C1, PlayerId(1)),
                (FantasySlot::Util, PlayerId(2)),
                (FantasySlot::D1, PlayerId(3)),
                (FantasySlot::G1, PlayerId(4)),
                (FantasySlot::Ir1, PlayerId(5)),
            ],
            vec![PlayerId(6), PlayerId(7), PlayerId(8)],
        )
        .unwrap()
    }

    fn no_locks() -> LockSnapshot {
        LockSnapshot::unlocked(d(17), Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap())
    }

    fn locks(ids: &[u64]) -> LockSnapshot {
        let mut snap = no_locks();
        snap.locked = ids.iter().map(|id| PlayerId(*id)).collect();
        snap
    }

    fn ctx<'a>(pool: &'a PlayerPool, locks: &'a LockSnapshot) -> MoveContext<'a> {
        MoveContext {
            pool,
            date: d(17),
            today: d(17),
            locks,
            draft_complete: true,
        }
    }

    fn mv(lineup: &Lineup, player: u64, target: MoveTarget) -> Result<MoveOutcome, RejectionReason> {
        let pool = pool();
        let locks = no_locks();
        apply_move(lineup, PlayerId(player), target, &ctx(&pool, &locks))
    }

    #[test]
    fn direct_move_into_empty_slot() {
        let out = mv(&lineup(), 8, MoveTarget::Slot(FantasySlot::C2)).unwrap();
        assert_eq!(out.kind, MoveKind::Direct);
        assert_eq!(out.lineup.occupant(FantasySlot::C2), Some(PlayerId(8)));
        assert_eq!(out.lineup.bench(), &[PlayerId(6), PlayerId(7)]);
    }

    #[test]
    fn starter_to_bench_region_appends() {
        let out = mv(&lineup(), 3, MoveTarget::Bench).unwrap();
        assert_eq!(out.kind, MoveKind::Direct);
        assert_eq!(out.lineup.occupant(FantasySlot::D1), None);
        assert_eq!(out.lineup.bench().last(), Some(&PlayerId(3)));
    }

    #[test]
    fn mutual_swap_exchanges_slots() {
        // C-1 <-> UTIL, both centers
        let out = mv(&lineup(), 1, MoveTarget::Slot(FantasySlot::Util)).unwrap();
        assert_eq!(out.kind, MoveKind::Swap);
        assert_eq!(out.lineup.occupant(FantasySlot::Util), Some(PlayerId(1)));
        assert_eq!(out.lineup.occupant(FantasySlot::C1), Some(PlayerId(2)));
    }

    #[test]
    fn drop_on_player_card_targets_their_slot() {
        let out = mv(&lineup(), 2, MoveTarget::Player(PlayerId(1))).unwrap();
        assert_eq!(out.kind, MoveKind::Swap);
        assert_eq!(out.lineup.occupant(FantasySlot::C1), Some(PlayerId(2)));
        assert_eq!(out.lineup.occupant(FantasySlot::Util), Some(PlayerId(1)));
    }

    #[test]
    fn swap_degrades_when_occupant_cannot_return() {
        // Defense A onto UTIL: Center B cannot play D-1, so it is benched
        let out = mv(&lineup(), 3, MoveTarget::Slot(FantasySlot::Util)).unwrap();
        assert_eq!(out.kind, MoveKind::DegradedSwap);
        assert_eq!(out.lineup.occupant(FantasySlot::Util), Some(PlayerId(3)));
        assert_eq!(out.lineup.occupant(FantasySlot::D1), None);
        assert_eq!(out.lineup.bench().last(), Some(&PlayerId(2)));
    }

    #[test]
    fn bench_player_swaps_into_occupied_slot() {
        let out = mv(&lineup(), 8, MoveTarget::Slot(FantasySlot::C1)).unwrap();
        assert_eq!(out.kind, MoveKind::Swap);
        assert_eq!(out.lineup.occupant(FantasySlot::C1), Some(PlayerId(8)));
        // Displaced starter takes the mover's bench position
        assert_eq!(out.lineup.bench(), &[PlayerId(6), PlayerId(7), PlayerId(1)]);
    }

    #[test]
    fn goalie_cannot_take_util() {
        let err = mv(&lineup(), 7, MoveTarget::Slot(FantasySlot::Util)).unwrap_err();
        assert_eq!(
            err,
            RejectionReason::InvalidPosition {
                player: PlayerId(7),
                target: Placement::Slot(FantasySlot::Util)
            }
        );
        assert!(err.is_invalid_placement());
    }

    #[test]
    fn healthy_player_rejected_from_ir() {
        let err = mv(&lineup(), 6, MoveTarget::Slot(FantasySlot::Ir2)).unwrap_err();
        assert!(matches!(err, RejectionReason::IneligibleForIr { .. }));
        assert!(err.is_invalid_placement());
        assert!(err.to_string().starts_with("Invalid Move"));
    }

    #[test]
    fn bench_reorder_is_stable_array_move() {
        let out = mv(&lineup(), 8, MoveTarget::Player(PlayerId(6))).unwrap();
        assert_eq!(out.kind, MoveKind::BenchReorder);
        assert_eq!(out.lineup.bench(), &[PlayerId(8), PlayerId(6), PlayerId(7)]);

        let out = mv(&lineup(), 6, MoveTarget::Player(PlayerId(8))).unwrap();
        assert_eq!(out.lineup.bench(), &[PlayerId(7), PlayerId(8), PlayerId(6)]);
    }

    #[test]
    fn starter_dropped_on_bench_card_swaps_when_eligible() {
        let out = mv(&lineup(), 1, MoveTarget::Player(PlayerId(8))).unwrap();
        assert_eq!(out.kind, MoveKind::Swap);
        assert_eq!(out.lineup.occupant(FantasySlot::C1), Some(PlayerId(8)));
        assert_eq!(out.lineup.bench(), &[PlayerId(6), PlayerId(7), PlayerId(1)]);
    }

    #[test]
    fn starter_dropped_on_ineligible_bench_card_just_benches() {
        let out = mv(&lineup(), 1, MoveTarget::Player(PlayerId(7))).unwrap();
        assert_eq!(out.kind, MoveKind::Direct);
        assert_eq!(out.lineup.occupant(FantasySlot::C1), None);
        assert_eq!(out.lineup.bench(), &[PlayerId(6), PlayerId(1), PlayerId(7), PlayerId(8)]);
    }

    #[test]
    fn locked_mover_rejected() {
        let pool = pool();
        let locks = locks(&[1]);
        let err = apply_move(&lineup(), PlayerId(1), MoveTarget::Bench, &ctx(&pool, &locks)).unwrap_err();
        assert_eq!(err, RejectionReason::Locked { player: PlayerId(1) });
        assert!(err.is_lock());
    }

    #[test]
    fn locked_occupant_cannot_be_swapped_out() {
        let pool = pool();
        let locks = locks(&[1]);
        let err = apply_move(
            &lineup(),
            PlayerId(8),
            MoveTarget::Slot(FantasySlot::C1),
            &ctx(&pool, &locks),
        )
        .unwrap_err();
        assert_eq!(err, RejectionReason::Locked { player: PlayerId(1) });
    }

    #[test]
    fn past_date_rejects_every_move() {
        let pool = pool();
        let locks = no_locks();
        let mut c = ctx(&pool, &locks);
        c.date = d(16);
        for (player, target) in [
            (8, MoveTarget::Slot(FantasySlot::C2)),
            (1, MoveTarget::Bench),
            (6, MoveTarget::Player(PlayerId(7))),
        ] {
            let err = apply_move(&lineup(), PlayerId(player), target, &c).unwrap_err();
            assert_eq!(err, RejectionReason::PastDate { date: d(16) });
        }
    }

    #[test]
    fn moves_blocked_until_draft_completes() {
        let pool = pool();
        let locks = no_locks();
        let mut c = ctx(&pool, &locks);
        c.draft_complete = false;
        let err = apply_move(&lineup(), PlayerId(8), MoveTarget::Slot(FantasySlot::C2), &c).unwrap_err();
        assert_eq!(err, RejectionReason::DraftPending);
        assert!(err.is_lock());
    }

    #[test]
    fn unknown_player_rejected() {
        let err = mv(&lineup(), 99, MoveTarget::Bench).unwrap_err();
        assert_eq!(err, RejectionReason::UnknownPlayer(PlayerId(99)));
    }

    #[test]
    fn dropping_in_place_is_a_noop() {
        let out = mv(&lineup(), 1, MoveTarget::Slot(FantasySlot::C1)).unwrap();
        assert_eq!(out.kind, MoveKind::NoOp);
        assert_eq!(out.lineup, lineup());
        let out = mv(&lineup(), 6, MoveTarget::Bench).unwrap();
        assert_eq!(out.kind, MoveKind::NoOp);
    }

    #[test]
    fn cleared_ir_player_warns_without_autofix() {
        let mut pool = pool();
        let mut recovered = pool.get(PlayerId(5)).unwrap().clone();
        recovered.status = PlayerStatus::Active;
        recovered.ir_eligible = false;
        pool.insert(recovered);
        let locks = no_locks();
        let out = apply_move(
            &lineup(),
            PlayerId(8),
            MoveTarget::Slot(FantasySlot::C2),
            &ctx(&pool, &locks),
        )
        .unwrap();
        assert_eq!(out.lineup.occupant(FantasySlot::Ir1), Some(PlayerId(5)));
        assert_eq!(
            out.warnings,
            vec![LineupWarning::IrIneligible {
                player: PlayerId(5),
                slot: FantasySlot::Ir1
            }]
        );
    }

    #[test]
    fn ir_player_can_be_activated() {
        let out = mv(&lineup(), 5, MoveTarget::Slot(FantasySlot::LW1)).unwrap();
        assert_eq!(out.kind, MoveKind::Direct);
        assert_eq!(out.lineup.occupant(FantasySlot::Ir1), None);
        assert_eq!(out.lineup.occupant(FantasySlot::LW1), Some(PlayerId(5)));
    }

    #[test]
    fn rejection_leaves_input_untouched() {
        let before = lineup();
        let _ = mv(&before, 7, MoveTarget::Slot(FantasySlot::Util));
        assert_eq!(before, lineup());
    }
}
