// One manager's editing session: the lineup on screen for one team and date.
//
// Every edit is applied synchronously to the in-memory lineup and returns a
// `WriteJob` for the caller to hand to the snapshot writer. The session never
// waits on storage for an edit.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use tracing::{debug, info};

use crate::calendar::LeagueCalendar;
use crate::history::RosterHistory;
use crate::lineup::{Lineup, LineupWarning};
use crate::lock::{LockEvaluator, LockSnapshot};
use crate::mutation::{apply_move, MoveContext, MoveKind, MoveTarget, RejectionReason};
use crate::optimizer::{auto_optimize, OptimizeContext, Projections};
use crate::persist::WriteJob;
use crate::player::{PlayerId, PlayerPool};
use crate::schedule::GameSchedule;
use crate::store::{SaveScope, SnapshotSource, SnapshotStore, StoreError};
use crate::view::{load_lineup_view, LineupView};

/// How edits to a future date are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    /// Edits become the standing lineup from the viewed date onward.
    #[default]
    Cascade,
    /// Edits apply to the viewed date only. Edits to today always cascade.
    PerDay,
}

/// Long-lived collaborators shared by every session for a team.
#[derive(Clone)]
pub struct SessionDeps {
    pub team: String,
    pub tz: FixedOffset,
    pub calendar: LeagueCalendar,
    pub schedule: Arc<dyn GameSchedule>,
    pub projections: Arc<Projections>,
    pub store: Arc<dyn SnapshotStore>,
    pub history: Arc<dyn RosterHistory>,
    /// How long a lock snapshot is trusted for display.
    pub lock_max_age: Duration,
}

/// An accepted edit.
#[derive(Debug, Clone)]
pub struct Applied {
    pub kind: Option<MoveKind>,
    pub warnings: Vec<LineupWarning>,
    /// `None` when nothing changed.
    pub job: Option<WriteJob>,
}

pub struct LineupSession {
    deps: SessionDeps,
    pool: PlayerPool,
    view: LineupView,
    locks: LockSnapshot,
    mode: EditMode,
}

impl LineupSession {
    /// Open a session on `date`. Returns the job that persists a freshly
    /// resolved or repaired lineup, if one is needed.
    pub fn open(
        deps: SessionDeps,
        pool: PlayerPool,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(Self, Option<WriteJob>), StoreError> {
        let today = LockEvaluator::new(deps.schedule.as_ref(), deps.tz).today(now);
        let view = load_lineup_view(deps.store.as_ref(), deps.history.as_ref(), &pool, &deps.team, date, today)?;
        let mut session = LineupSession {
            locks: LockSnapshot::unlocked(date, now),
            deps,
            pool,
            view,
            mode: EditMode::default(),
        };
        session.refresh_locks(now);
        let job = session.load_job(today);
        Ok((session, job))
    }

    pub fn team(&self) -> &str {
        &self.deps.team
    }

    pub fn date(&self) -> NaiveDate {
        self.view.date
    }

    pub fn lineup(&self) -> &Lineup {
        &self.view.lineup
    }

    pub fn view(&self) -> &LineupView {
        &self.view
    }

    pub fn locks(&self) -> &LockSnapshot {
        &self.locks
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditMode) {
        self.mode = mode;
    }

    pub fn calendar(&self) -> &LeagueCalendar {
        &self.deps.calendar
    }

    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.evaluator().today(now)
    }

    fn evaluator(&self) -> LockEvaluator<'_> {
        LockEvaluator::new(self.deps.schedule.as_ref(), self.deps.tz)
    }

    pub fn is_locked(&self, player: PlayerId) -> bool {
        self.locks.is_locked(player) || self.view.read_only.contains(&player)
    }

    /// Whether the displayed lock state is older than allowed.
    pub fn locks_stale(&self, now: DateTime<Utc>) -> bool {
        self.locks.is_stale(self.view.date, now, self.deps.lock_max_age)
    }

    /// Recompute lock state for everyone in the current view.
    pub fn refresh_locks(&mut self, now: DateTime<Utc>) {
        let snapshot = self.evaluator().snapshot(self.view.players.iter(), self.view.date, now);
        self.locks = snapshot;
    }

    /// Show another date.
    pub fn navigate(&mut self, date: NaiveDate, now: DateTime<Utc>) -> Result<Option<WriteJob>, StoreError> {
        let today = self.today(now);
        self.view = load_lineup_view(
            self.deps.store.as_ref(),
            self.deps.history.as_ref(),
            &self.pool,
            &self.deps.team,
            date,
            today,
        )?;
        self.refresh_locks(now);
        debug!("session for {} now showing {}", self.deps.team, date);
        Ok(self.load_job(today))
    }

    /// Move `player` to `target` on the viewed date.
    pub fn apply_move(
        &mut self,
        player: PlayerId,
        target: MoveTarget,
        now: DateTime<Utc>,
    ) -> Result<Applied, RejectionReason> {
        // Lock state must be exact at the instant of the edit
        self.refresh_locks(now);
        let today = self.today(now);
        if self.view.read_only.contains(&player) {
            return Err(RejectionReason::Locked { player });
        }

        let ctx = MoveContext {
            pool: &self.view.players,
            date: self.view.date,
            today,
            locks: &self.locks,
            draft_complete: self.deps.calendar.is_draft_complete(now),
        };
        let outcome = apply_move(&self.view.lineup, player, target, &ctx)?;

        let job = (outcome.kind != MoveKind::NoOp).then(|| self.edit_job(&outcome.lineup, today));
        self.view.lineup = outcome.lineup;
        self.view.warnings = outcome.warnings.clone();
        Ok(Applied {
            kind: Some(outcome.kind),
            warnings: outcome.warnings,
            job,
        })
    }

    /// Re-optimize the viewed date's lineup.
    pub fn auto_optimize(&mut self, now: DateTime<Utc>) -> Result<Applied, RejectionReason> {
        self.refresh_locks(now);
        let today = self.today(now);
        if self.view.date < today {
            return Err(RejectionReason::PastDate { date: self.view.date });
        }
        if !self.deps.calendar.is_draft_complete(now) {
            return Err(RejectionReason::DraftPending);
        }

        let ctx = OptimizeContext {
            pool: &self.view.players,
            date: self.view.date,
            schedule: self.deps.schedule.as_ref(),
            projections: &self.deps.projections,
            locks: &self.locks,
        };
        let next = auto_optimize(&self.view.lineup, &ctx);
        let job = (next != self.view.lineup).then(|| self.edit_job(&next, today));
        info!(
            "auto-optimized {} for {}: {}",
            self.deps.team,
            self.view.date,
            if job.is_some() { "lineup changed" } else { "no change" }
        );
        self.view.lineup = next;
        self.view.warnings = self.view.lineup.audit(&self.view.players);
        Ok(Applied {
            kind: None,
            warnings: self.view.warnings.clone(),
            job,
        })
    }

    fn edit_job(&self, lineup: &Lineup, today: NaiveDate) -> WriteJob {
        let date = self.view.date;
        let scope = match self.mode {
            EditMode::PerDay if date > today => SaveScope::Date(date),
            _ => SaveScope::Cascade { from: date },
        };
        self.job(lineup, scope, today)
    }

    /// Write-back for a view that was freshly resolved or repaired. A repair
    /// is written to the same kind of record it was read from.
    fn load_job(&self, today: NaiveDate) -> Option<WriteJob> {
        if !self.view.needs_save() {
            return None;
        }
        let date = self.view.date;
        let scope = match self.view.source {
            Some(SnapshotSource::Dated(_)) => SaveScope::Date(date),
            _ => SaveScope::Cascade { from: date },
        };
        Some(self.job(&self.view.lineup, scope, today))
    }

    fn job(&self, lineup: &Lineup, scope: SaveScope, today: NaiveDate) -> WriteJob {
        WriteJob {
            team: self.deps.team.clone(),
            lineup: lineup.clone(),
            scope,
            today,
        }
    }
}
