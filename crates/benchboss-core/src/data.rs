// CSV loading for rosters, the game schedule, and daily projections.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::DataPaths;
use crate::optimizer::Projections;
use crate::player::{Player, PlayerId, PlayerPool, PlayerStatus, Position};
use crate::schedule::{GameInfo, InMemorySchedule};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("validation error: {0}")]
    Validation(String),
}

/// Everything loaded from the data directory.
#[derive(Debug, Clone)]
pub struct LeagueData {
    pub pool: PlayerPool,
    pub schedule: InMemorySchedule,
    pub projections: Projections,
}

// ---------------------------------------------------------------------------
// Raw CSV rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawPlayer {
    id: u64,
    name: String,
    position: String,
    #[serde(default)]
    team: String,
    #[serde(default)]
    status: String,
    /// Explicit override of the status-derived IR flag.
    #[serde(default)]
    ir_eligible: Option<bool>,
    #[serde(default)]
    season_points: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    game_id: u64,
    date: NaiveDate,
    start: DateTime<Utc>,
    home: String,
    away: String,
}

#[derive(Debug, Deserialize)]
struct RawProjection {
    player_id: u64,
    date: NaiveDate,
    points: f64,
}

// ---------------------------------------------------------------------------
// Reader-based loaders
// ---------------------------------------------------------------------------

fn load_players_from_reader<R: Read>(rdr: R) -> Result<PlayerPool, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut pool = PlayerPool::default();
    for result in reader.deserialize::<RawPlayer>() {
        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping malformed player row: {}", e);
                continue;
            }
        };
        let position = match Position::parse(&raw.position) {
            Ok(position) => position,
            Err(e) => {
                warn!("skipping player {} '{}': {}", raw.id, raw.name, e);
                continue;
            }
        };
        if pool.contains(PlayerId(raw.id)) {
            warn!("duplicate player id {}, using latest row", raw.id);
        }
        let status = PlayerStatus::from_label(&raw.status);
        let mut player = Player::new(raw.id, &raw.name, position, &raw.team.to_uppercase(), status);
        if let Some(flag) = raw.ir_eligible {
            player.ir_eligible = flag;
        }
        match raw.season_points {
            Some(points) if !points.is_finite() => {
                warn!("player {} has non-finite season points, using 0", raw.id);
            }
            Some(points) => player.season_points = points,
            None => {}
        }
        pool.insert(player);
    }
    Ok(pool)
}

fn load_schedule_from_reader<R: Read>(rdr: R) -> Result<InMemorySchedule, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut games = Vec::new();
    let mut seen = HashSet::new();
    for result in reader.deserialize::<RawGame>() {
        match result {
            Ok(raw) => {
                if !seen.insert(raw.game_id) {
                    warn!("skipping duplicate game {}", raw.game_id);
                    continue;
                }
                games.push(GameInfo {
                    game_id: raw.game_id,
                    date: raw.date,
                    start: raw.start,
                    home: raw.home.to_uppercase(),
                    away: raw.away.to_uppercase(),
                });
            }
            Err(e) => {
                warn!("skipping malformed schedule row: {}", e);
            }
        }
    }
    Ok(InMemorySchedule::new(games))
}

fn load_projections_from_reader<R: Read>(rdr: R) -> Result<Projections, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut projections = Projections::new();
    for result in reader.deserialize::<RawProjection>() {
        match result {
            Ok(raw) => {
                if !raw.points.is_finite() {
                    warn!("skipping projection for player {} on {}: non-finite value", raw.player_id, raw.date);
                    continue;
                }
                projections.insert(PlayerId(raw.player_id), raw.date, raw.points);
            }
            Err(e) => {
                warn!("skipping malformed projection row: {}", e);
            }
        }
    }
    Ok(projections)
}

// ---------------------------------------------------------------------------
// Public path-based loaders
// ---------------------------------------------------------------------------

fn open(path: &Path) -> Result<std::fs::File, DataError> {
    std::fs::File::open(path).map_err(|e| DataError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn csv_err(path: &Path) -> impl FnOnce(csv::Error) -> DataError + '_ {
    move |e| DataError::Csv {
        path: path.display().to_string(),
        source: e,
    }
}

/// Load the team's roster.
pub fn load_players(path: &Path) -> Result<PlayerPool, DataError> {
    load_players_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load the real-world game schedule.
pub fn load_schedule(path: &Path) -> Result<InMemorySchedule, DataError> {
    load_schedule_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load per-player, per-date projected points.
pub fn load_projections(path: &Path) -> Result<Projections, DataError> {
    load_projections_from_reader(open(path)?).map_err(csv_err(path))
}

/// Load every data file named in the config. A missing projections file is
/// tolerated (every projection reads as zero); an empty roster is not.
pub fn load_all_from_paths(paths: &DataPaths) -> Result<LeagueData, DataError> {
    let pool = load_players(Path::new(&paths.players))?;
    if pool.is_empty() {
        return Err(DataError::Validation("player CSV produced zero valid rows".into()));
    }
    let schedule = load_schedule(Path::new(&paths.schedule))?;

    let projections_path = Path::new(&paths.projections);
    let projections = if projections_path.exists() {
        load_projections(projections_path)?
    } else {
        warn!("projections file {} not found; optimizing on schedule only", paths.projections);
        Projections::new()
    };

    info!(
        "loaded {} players, {} games, {} projections",
        pool.len(),
        schedule.game_count(),
        projections.len()
    );
    Ok(LeagueData {
        pool,
        schedule,
        projections,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
