// Per-day lineup snapshot storage with cascade semantics.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use thiserror::Error;

use crate::lineup::Lineup;

/// Which dates a save applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveScope {
    /// Standing intent: `from` and every later date without its own record.
    /// Replaces any cascade record effective after `from`.
    Cascade { from: NaiveDate },
    /// Exactly one date.
    Date(NaiveDate),
}

impl SaveScope {
    /// The earliest date this save touches.
    pub fn first_date(&self) -> NaiveDate {
        match self {
            SaveScope::Cascade { from } => *from,
            SaveScope::Date(date) => *date,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot for {date} is history and cannot be changed")]
    PastDate { date: NaiveDate },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Which record a load was answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotSource {
    Dated(NaiveDate),
    Cascade { effective_from: NaiveDate },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSnapshot {
    pub lineup: Lineup,
    pub source: SnapshotSource,
}

/// Persistent lineup snapshots keyed by team and date.
///
/// Loads prefer a date-specific record and otherwise fall back to the cascade
/// record with the latest effective date on or before the requested date.
/// Saves are whole-lineup replacements, so the last one to land wins.
pub trait SnapshotStore: Send + Sync {
    fn load(&self, team: &str, date: NaiveDate) -> Result<Option<StoredSnapshot>, StoreError>;

    /// Write `lineup`. Any scope reaching before `today` is refused.
    fn save(&self, team: &str, lineup: &Lineup, scope: SaveScope, today: NaiveDate) -> Result<(), StoreError>;

    fn load_lineup(&self, team: &str, date: NaiveDate) -> Result<Option<Lineup>, StoreError> {
        Ok(self.load(team, date)?.map(|s| s.lineup))
    }
}

/// Refuse writes that would rewrite history.
pub fn check_writable(scope: SaveScope, today: NaiveDate) -> Result<(), StoreError> {
    let date = scope.first_date();
    if date < today {
        return Err(StoreError::PastDate { date });
    }
    Ok(())
}

#[derive(Debug, Default)]
struct TeamSnapshots {
    dated: BTreeMap<NaiveDate, Lineup>,
    cascade: BTreeMap<NaiveDate, Lineup>,
}

impl TeamSnapshots {
    fn resolve(&self, date: NaiveDate) -> Option<StoredSnapshot> {
        if let Some(lineup) = self.dated.get(&date) {
            return Some(StoredSnapshot {
                lineup: lineup.clone(),
                source: SnapshotSource::Dated(date),
            });
        }
        self.cascade
            .range(..=date)
            .next_back()
            .map(|(from, lineup)| StoredSnapshot {
                lineup: lineup.clone(),
                source: SnapshotSource::Cascade { effective_from: *from },
            })
    }
}

/// In-process snapshot store.
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    teams: Mutex<HashMap<String, TeamSnapshots>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn teams(&self) -> MutexGuard<'_, HashMap<String, TeamSnapshots>> {
        self.teams.lock().expect("snapshot store mutex poisoned")
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self, team: &str, date: NaiveDate) -> Result<Option<StoredSnapshot>, StoreError> {
        Ok(self.teams().get(team).and_then(|t| t.resolve(date)))
    }

    fn save(&self, team: &str, lineup: &Lineup, scope: SaveScope, today: NaiveDate) -> Result<(), StoreError> {
        check_writable(scope, today)?;
        let mut teams = self.teams();
        let entry = teams.entry(team.to_string()).or_default();
        match scope {
            SaveScope::Cascade { from } => {
                entry.dated.remove(&from);
                // Later cascade records are superseded; earlier ones stay as history
                entry.cascade.retain(|effective_from, _| *effective_from < from);
                entry.cascade.insert(from, lineup.clone());
            }
            SaveScope::Date(date) => {
                entry.dated.insert(date, lineup.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlayerId;
    use crate::slot::FantasySlot;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn lineup(starter: u64) -> Lineup {
        Lineup::from_parts([(FantasySlot::C1, PlayerId(starter))], vec![PlayerId(100)]).unwrap()
    }

    #[test]
    fn cascade_covers_future_dates() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(1), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();
        for day in 17..25 {
            assert_eq!(store.load_lineup("t1", d(day)).unwrap(), Some(lineup(1)));
        }
        assert_eq!(store.load_lineup("t1", d(16)).unwrap(), None);
        assert_eq!(store.load_lineup("t2", d(17)).unwrap(), None);
    }

    #[test]
    fn scoped_save_touches_one_date() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(1), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();
        store.save("t1", &lineup(2), SaveScope::Date(d(20)), d(17)).unwrap();

        let snap = store.load("t1", d(20)).unwrap().unwrap();
        assert_eq!(snap.lineup, lineup(2));
        assert_eq!(snap.source, SnapshotSource::Dated(d(20)));
        assert_eq!(store.load_lineup("t1", d(19)).unwrap(), Some(lineup(1)));
        assert_eq!(store.load_lineup("t1", d(21)).unwrap(), Some(lineup(1)));
    }

    #[test]
    fn later_cascade_keeps_independent_future_edits() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(1), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();
        store.save("t1", &lineup(2), SaveScope::Date(d(20)), d(17)).unwrap();
        store.save("t1", &lineup(3), SaveScope::Cascade { from: d(18) }, d(17)).unwrap();

        assert_eq!(store.load_lineup("t1", d(17)).unwrap(), Some(lineup(1)));
        assert_eq!(store.load_lineup("t1", d(19)).unwrap(), Some(lineup(3)));
        assert_eq!(store.load_lineup("t1", d(20)).unwrap(), Some(lineup(2)));
    }

    #[test]
    fn earlier_cascade_supersedes_later_one() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(1), SaveScope::Cascade { from: d(15) }, d(15)).unwrap();
        store.save("t1", &lineup(2), SaveScope::Cascade { from: d(20) }, d(17)).unwrap();
        store.save("t1", &lineup(4), SaveScope::Date(d(22)), d(17)).unwrap();
        store.save("t1", &lineup(3), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();

        for day in [17, 20, 21, 30] {
            let snap = store.load("t1", d(day)).unwrap().unwrap();
            assert_eq!(snap.lineup, lineup(3));
            assert_eq!(snap.source, SnapshotSource::Cascade { effective_from: d(17) });
        }
        // Scoped records and history survive
        assert_eq!(store.load_lineup("t1", d(22)).unwrap(), Some(lineup(4)));
        assert_eq!(store.load_lineup("t1", d(16)).unwrap(), Some(lineup(1)));
    }

    #[test]
    fn cascade_replaces_dated_record_on_its_own_date() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(2), SaveScope::Date(d(18)), d(17)).unwrap();
        store.save("t1", &lineup(3), SaveScope::Cascade { from: d(18) }, d(17)).unwrap();
        let snap = store.load("t1", d(18)).unwrap().unwrap();
        assert_eq!(snap.lineup, lineup(3));
        assert_eq!(snap.source, SnapshotSource::Cascade { effective_from: d(18) });
    }

    #[test]
    fn past_dates_are_read_only() {
        let store = MemorySnapshotStore::new();
        store.save("t1", &lineup(1), SaveScope::Cascade { from: d(15) }, d(15)).unwrap();

        let err = store.save("t1", &lineup(2), SaveScope::Date(d(16)), d(17)).unwrap_err();
        assert!(matches!(err, StoreError::PastDate { date } if date == d(16)));
        let err = store.save("t1", &lineup(2), SaveScope::Cascade { from: d(16) }, d(17)).unwrap_err();
        assert!(matches!(err, StoreError::PastDate { .. }));

        // A new cascade from today leaves yesterday's view intact
        store.save("t1", &lineup(2), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();
        assert_eq!(store.load_lineup("t1", d(16)).unwrap(), Some(lineup(1)));
        assert_eq!(store.load_lineup("t1", d(17)).unwrap(), Some(lineup(2)));
    }

    #[test]
    fn last_save_wins() {
        let store = MemorySnapshotStore::new();
        for n in 1..=3 {
            store.save("t1", &lineup(n), SaveScope::Cascade { from: d(17) }, d(17)).unwrap();
        }
        assert_eq!(store.load_lineup("t1", d(30)).unwrap(), Some(lineup(3)));
    }
}
