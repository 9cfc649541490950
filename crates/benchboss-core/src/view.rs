// Loading the lineup shown for a date.
//
// Past dates show the record as it was saved. Today and later dates go
// through the repair pass, or cold-start resolution when nothing is saved.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::history::RosterHistory;
use crate::lineup::{Lineup, LineupWarning};
use crate::player::{PlayerId, PlayerPool};
use crate::resolver::{initial_lineup, repair_lineup, RepairReport};
use crate::store::{SnapshotSource, SnapshotStore, StoreError};

/// Everything needed to display one team's lineup for one date.
#[derive(Debug, Clone)]
pub struct LineupView {
    pub date: NaiveDate,
    pub lineup: Lineup,
    /// Current roster plus any historical players the lineup references.
    pub players: PlayerPool,
    /// Historical players shown but not editable.
    pub read_only: HashSet<PlayerId>,
    pub warnings: Vec<LineupWarning>,
    pub is_past: bool,
    /// No snapshot existed; the lineup was freshly resolved and should be
    /// saved as the team's standing lineup.
    pub cold_start: bool,
    pub repair: RepairReport,
    /// Which stored record the lineup came from, if any.
    pub source: Option<SnapshotSource>,
}

impl LineupView {
    /// Whether this view differs from what the store holds and should be written back.
    pub fn needs_save(&self) -> bool {
        !self.is_past && (self.cold_start || !self.repair.is_empty())
    }
}

pub fn load_lineup_view(
    store: &dyn SnapshotStore,
    history: &dyn RosterHistory,
    pool: &PlayerPool,
    team: &str,
    date: NaiveDate,
    today: NaiveDate,
) -> Result<LineupView, StoreError> {
    let stored = store.load(team, date)?;
    let is_past = date < today;

    let mut view = LineupView {
        date,
        lineup: Lineup::new(),
        players: pool.clone(),
        read_only: HashSet::new(),
        warnings: Vec::new(),
        is_past,
        cold_start: false,
        repair: RepairReport::default(),
        source: stored.as_ref().map(|s| s.source),
    };

    match (stored.map(|s| s.lineup), is_past) {
        (Some(saved), true) => {
            view.lineup = saved;
            resolve_departed(&mut view, history, team);
        }
        (None, true) => {
            // Nothing was recorded for that day; show what the roster
            // resolves to without writing anything back.
            view.lineup = initial_lineup(pool);
        }
        (Some(saved), false) => {
            let (lineup, report) = repair_lineup(&saved, pool);
            view.lineup = lineup;
            view.repair = report;
        }
        (None, false) => {
            info!("no snapshot for team {} on {}; resolving fresh lineup", team, date);
            view.lineup = initial_lineup(pool);
            view.cold_start = true;
        }
    }

    view.warnings.extend(view.lineup.audit(&view.players));
    Ok(view)
}

/// Look up saved players who are no longer rostered. Found players are added
/// read-only; the rest are dropped with a `DataGap` warning.
fn resolve_departed(view: &mut LineupView, history: &dyn RosterHistory, team: &str) {
    let missing: Vec<PlayerId> = view
        .lineup
        .player_ids()
        .into_iter()
        .filter(|id| !view.players.contains(*id))
        .collect();

    let mut gaps: HashSet<PlayerId> = HashSet::new();
    for id in missing {
        match history.player_as_of(team, id, view.date) {
            Ok(Some(player)) => {
                view.players.insert(player);
                view.read_only.insert(id);
            }
            Ok(None) => {
                warn!("player {} in {} lineup for {} not found in roster history", id, team, view.date);
                gaps.insert(id);
            }
            Err(e) => {
                warn!("roster history lookup failed for player {}: {}", id, e);
                gaps.insert(id);
            }
        }
    }

    if !gaps.is_empty() {
        let removed = view.lineup.retain_players(|id| !gaps.contains(&id));
        view.warnings
            .extend(removed.into_iter().map(|player| LineupWarning::DataGap { player }));
    }
}
