// SQLite persistence for lineup snapshots and roster history.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use crate::history::RosterHistory;
use crate::lineup::Lineup;
use crate::player::{Player, PlayerId, PlayerPool};
use crate::store::{check_writable, SaveScope, SnapshotSource, SnapshotStore, StoredSnapshot, StoreError};

/// SQLite-backed snapshot store. Lineups are stored whole as JSON, keyed by
/// team and date (per-day records) or team and effective date (cascade
/// records).
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS lineup_snapshots (
                team_id    TEXT NOT NULL,
                date       TEXT NOT NULL,
                lineup     TEXT NOT NULL,
                saved_at   TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (team_id, date)
            );

            CREATE TABLE IF NOT EXISTS lineup_cascade (
                team_id        TEXT NOT NULL,
                effective_from TEXT NOT NULL,
                lineup         TEXT NOT NULL,
                saved_at       TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
                PRIMARY KEY (team_id, effective_from)
            );

            CREATE TABLE IF NOT EXISTS roster_history (
                team_id   TEXT NOT NULL,
                player_id INTEGER NOT NULL,
                joined    TEXT NOT NULL,
                left_on   TEXT,
                player    TEXT NOT NULL,
                PRIMARY KEY (team_id, player_id, joined)
            );
            ",
        )
        .context("failed to create database schema")?;

        conn.execute_batch(
            "CREATE INDEX IF NOT EXISTS idx_roster_history_open ON roster_history(team_id, left_on);",
        )
        .context("failed to create roster_history index")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock).
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // -----------------------------------------------------------------------
    // Lineup snapshots
    // -----------------------------------------------------------------------

    fn load_snapshot(&self, team: &str, date: NaiveDate) -> Result<Option<StoredSnapshot>> {
        let conn = self.conn();
        let key = date.to_string();

        let dated: Option<String> = conn
            .query_row(
                "SELECT lineup FROM lineup_snapshots WHERE team_id = ?1 AND date = ?2",
                params![team, key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query dated lineup")?;
        if let Some(json) = dated {
            return Ok(Some(StoredSnapshot {
                lineup: decode_lineup(&json)?,
                source: SnapshotSource::Dated(date),
            }));
        }

        let cascade: Option<(String, String)> = conn
            .query_row(
                "SELECT effective_from, lineup FROM lineup_cascade
                 WHERE team_id = ?1 AND effective_from <= ?2
                 ORDER BY effective_from DESC LIMIT 1",
                params![team, key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("failed to query cascade lineup")?;

        match cascade {
            Some((from, json)) => Ok(Some(StoredSnapshot {
                lineup: decode_lineup(&json)?,
                source: SnapshotSource::Cascade {
                    effective_from: parse_date(&from)?,
                },
            })),
            None => Ok(None),
        }
    }

    fn write_snapshot(&self, team: &str, lineup: &Lineup, scope: SaveScope) -> Result<()> {
        let json = serde_json::to_string(lineup).context("failed to serialize lineup")?;
        let mut conn = self.conn();

        match scope {
            SaveScope::Date(date) => {
                conn.execute(
                    "INSERT OR REPLACE INTO lineup_snapshots (team_id, date, lineup) VALUES (?1, ?2, ?3)",
                    params![team, date.to_string(), json],
                )
                .context("failed to save dated lineup")?;
            }
            SaveScope::Cascade { from } => {
                // A per-day record on the first cascaded date would shadow the
                // new standing lineup; later per-day records keep precedence.
                let tx = conn.transaction().context("failed to begin cascade save")?;
                tx.execute(
                    "DELETE FROM lineup_snapshots WHERE team_id = ?1 AND date = ?2",
                    params![team, from.to_string()],
                )
                .context("failed to clear dated lineup")?;
                // ISO dates compare correctly as text
                tx.execute(
                    "DELETE FROM lineup_cascade WHERE team_id = ?1 AND effective_from > ?2",
                    params![team, from.to_string()],
                )
                .context("failed to clear superseded cascade lineups")?;
                tx.execute(
                    "INSERT OR REPLACE INTO lineup_cascade (team_id, effective_from, lineup) VALUES (?1, ?2, ?3)",
                    params![team, from.to_string(), json],
                )
                .context("failed to save cascade lineup")?;
                tx.commit().context("failed to commit cascade save")?;
            }
        }
        debug!("saved lineup for {} ({:?})", team, scope);
        Ok(())
    }

    /// Number of stored lineup records for `team`, both kinds.
    pub fn snapshot_count(&self, team: &str) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM lineup_snapshots WHERE team_id = ?1)
                      + (SELECT COUNT(*) FROM lineup_cascade WHERE team_id = ?1)",
                params![team],
                |row| row.get(0),
            )
            .context("failed to count lineup records")?;
        Ok(count as usize)
    }

    // -----------------------------------------------------------------------
    // Roster history
    // -----------------------------------------------------------------------

    /// Bring roster history in line with the current roster. Newly rostered
    /// players open a stint on `today`; players no longer rostered have their
    /// open stint closed on the day before. Open stints refresh their stored
    /// player record.
    pub fn sync_roster(&self, team: &str, pool: &PlayerPool, today: NaiveDate) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin roster sync")?;

        let open: HashSet<PlayerId> = {
            let mut stmt = tx
                .prepare("SELECT player_id FROM roster_history WHERE team_id = ?1 AND left_on IS NULL")
                .context("failed to prepare open stint query")?;
            let ids = stmt
                .query_map(params![team], |row| row.get::<_, i64>(0))
                .context("failed to query open stints")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("failed to map open stint rows")?;
            ids.into_iter().map(|id| PlayerId(id as u64)).collect()
        };

        let mut joined = 0;
        for player in pool.iter() {
            let json = serde_json::to_string(player).context("failed to serialize player")?;
            if open.contains(&player.id) {
                tx.execute(
                    "UPDATE roster_history SET player = ?3
                     WHERE team_id = ?1 AND player_id = ?2 AND left_on IS NULL",
                    params![team, player.id.0 as i64, json],
                )
                .context("failed to refresh roster stint")?;
            } else {
                tx.execute(
                    "INSERT OR REPLACE INTO roster_history (team_id, player_id, joined, left_on, player)
                     VALUES (?1, ?2, ?3, NULL, ?4)",
                    params![team, player.id.0 as i64, today.to_string(), json],
                )
                .context("failed to open roster stint")?;
                joined += 1;
            }
        }

        let last_day = today.pred_opt().unwrap_or(today).to_string();
        let mut left = 0;
        for id in open.iter().filter(|id| !pool.contains(**id)) {
            tx.execute(
                "UPDATE roster_history SET left_on = ?3
                 WHERE team_id = ?1 AND player_id = ?2 AND left_on IS NULL",
                params![team, id.0 as i64, last_day],
            )
            .context("failed to close roster stint")?;
            left += 1;
        }

        tx.commit().context("failed to commit roster sync")?;
        if joined > 0 || left > 0 {
            info!("roster sync for {}: {} joined, {} left", team, joined, left);
        }
        Ok(())
    }

    fn stint_player(&self, team: &str, player: PlayerId, date: NaiveDate) -> Result<Option<Player>> {
        let conn = self.conn();
        let json: Option<String> = conn
            .query_row(
                "SELECT player FROM roster_history
                 WHERE team_id = ?1 AND player_id = ?2 AND joined <= ?3
                   AND (left_on IS NULL OR left_on >= ?3)
                 ORDER BY joined DESC LIMIT 1",
                params![team, player.0 as i64, date.to_string()],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query roster history")?;

        json.map(|j| serde_json::from_str(&j).context("failed to deserialize historical player"))
            .transpose()
    }
}

impl SnapshotStore for Database {
    fn load(&self, team: &str, date: NaiveDate) -> Result<Option<StoredSnapshot>, StoreError> {
        Ok(self.load_snapshot(team, date)?)
    }

    fn save(&self, team: &str, lineup: &Lineup, scope: SaveScope, today: NaiveDate) -> Result<(), StoreError> {
        check_writable(scope, today)?;
        Ok(self.write_snapshot(team, lineup, scope)?)
    }
}

impl RosterHistory for Database {
    fn player_as_of(&self, team: &str, player: PlayerId, date: NaiveDate) -> Result<Option<Player>, StoreError> {
        Ok(self.stint_player(team, player, date)?)
    }
}

fn decode_lineup(json: &str) -> Result<Lineup> {
    serde_json::from_str(json).context("failed to deserialize stored lineup")
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    s.parse::<NaiveDate>()
        .with_context(|| format!("invalid stored date {s:?}"))
}
