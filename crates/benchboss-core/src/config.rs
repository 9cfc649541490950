// Configuration loading and parsing (benchboss.toml).

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::calendar::LeagueCalendar;
use crate::persist::RetryPolicy;

const CONFIG_FILE: &str = "benchboss.toml";
const MAX_PERSIST_RETRIES: u32 = 5;
const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub league: LeagueConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub data_paths: DataPaths,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub team_id: String,
    /// Viewer's offset from UTC, in minutes. Decides what "today" means and
    /// how game start times are compared.
    #[serde(default)]
    pub utc_offset_minutes: i32,
    pub season_start: NaiveDate,
    pub season_end: NaiveDate,
    #[serde(default)]
    pub draft_completed_at: Option<DateTime<Utc>>,
}

impl LeagueConfig {
    /// Out-of-range offsets are rejected by validation; UTC otherwise.
    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    pub fn calendar(&self) -> LeagueCalendar {
        LeagueCalendar::new(self.season_start, self.season_end, self.draft_completed_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub refresh_interval_secs: u64,
    pub persist_retries: u32,
    pub persist_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            refresh_interval_secs: 30,
            persist_retries: 1,
            persist_backoff_ms: 500,
        }
    }
}

impl EngineConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.persist_retries,
            backoff: Duration::from_millis(self.persist_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Explicit database file. Falls back to the platform data directory.
    pub path: Option<String>,
}

impl DatabaseConfig {
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return PathBuf::from(path);
        }
        directories::ProjectDirs::from("", "", "benchboss")
            .map(|dirs| dirs.data_dir().join("benchboss.db"))
            .unwrap_or_else(|| PathBuf::from("benchboss.db"))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataPaths {
    pub players: String,
    pub schedule: String,
    pub projections: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/benchboss.toml` relative to `base_dir`.
///
/// This does not copy defaults; prefer `load_config()`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;
    validate(&config)?;
    Ok(config)
}

/// Seed `config/benchboss.toml` from `defaults/` on first run. Returns the
/// path written, or `None` when a config file is already in place; an
/// existing file is never touched.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }
    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.is_file() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "no config/{CONFIG_FILE} or defaults/{CONFIG_FILE} under {}",
                base_dir.display()
            ),
        });
    }

    let copy_err = |e: std::io::Error| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    };
    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(copy_err)?;
    }
    std::fs::copy(&source, &target).map_err(copy_err)?;
    Ok(Some(target))
}

/// Load config relative to the current working directory, copying defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    if let Some(path) = ensure_config_file(&cwd)? {
        info!("created {} from defaults", path.display());
    }
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;
    if league.team_id.trim().is_empty() {
        return Err(invalid("league.team_id", "must not be empty"));
    }
    if league.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
        return Err(invalid(
            "league.utc_offset_minutes",
            format!("must be within ±{MAX_UTC_OFFSET_MINUTES}, got {}", league.utc_offset_minutes),
        ));
    }
    if league.season_end < league.season_start {
        return Err(invalid(
            "league.season_end",
            format!("{} is before season_start {}", league.season_end, league.season_start),
        ));
    }

    let engine = &config.engine;
    if engine.refresh_interval_secs == 0 {
        return Err(invalid("engine.refresh_interval_secs", "must be greater than 0"));
    }
    if engine.persist_retries > MAX_PERSIST_RETRIES {
        return Err(invalid(
            "engine.persist_retries",
            format!("must be at most {MAX_PERSIST_RETRIES}, got {}", engine.persist_retries),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Locate the workspace `defaults/` directory from the test's CWD.
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        cwd.ancestors()
            .find(|dir| dir.join("defaults").join(CONFIG_FILE).exists())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| panic!("Cannot locate defaults/ directory from CWD {:?}", cwd))
    }

    const VALID: &str = r#"
[league]
name = "Test League"
team_id = "team-7"
utc_offset_minutes = -300
season_start = "2026-10-07"
season_end = "2027-04-16"
draft_completed_at = "2026-10-05T01:00:00Z"

[engine]
refresh_interval_secs = 15

[data_paths]
players = "data/players.csv"
schedule = "data/schedule.csv"
projections = "data/projections.csv"
"#;

    fn write_config(name: &str, body: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), body).unwrap();
        tmp
    }

    #[test]
    fn load_valid_config() {
        let tmp = write_config("benchboss_config_valid", VALID);
        let config = load_config_from(&tmp).expect("config should load");

        assert_eq!(config.league.team_id, "team-7");
        assert_eq!(config.league.timezone(), FixedOffset::west_opt(5 * 3600).unwrap());
        assert_eq!(config.engine.refresh_interval(), Duration::from_secs(15));
        // Unset engine fields keep their defaults
        assert_eq!(config.engine.persist_retries, 1);
        assert!(config.database.path.is_none());
        assert_eq!(config.data_paths.players, "data/players.csv");
        assert_eq!(config.league.calendar().weeks()[0].start, config.league.season_start);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn load_default_config_file() {
        let root = project_root();
        let config = load_config_from_defaults(&root);
        assert!(!config.league.team_id.is_empty());
        assert_eq!(config.engine.refresh_interval_secs, 30);
    }

    fn load_config_from_defaults(root: &Path) -> Config {
        let text = fs::read_to_string(root.join("defaults").join(CONFIG_FILE)).unwrap();
        let config: Config = toml::from_str(&text).unwrap();
        validate(&config).unwrap();
        config
    }

    #[test]
    fn explicit_database_path_wins() {
        let db = DatabaseConfig {
            path: Some("/tmp/x.db".into()),
        };
        assert_eq!(db.resolved_path(), PathBuf::from("/tmp/x.db"));
        assert!(DatabaseConfig::default().resolved_path().ends_with("benchboss.db"));
    }

    #[test]
    fn rejects_empty_team_id() {
        let tmp = write_config("benchboss_config_team", &VALID.replace("\"team-7\"", "\"  \""));
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "league.team_id"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_inverted_season() {
        let tmp = write_config(
            "benchboss_config_season",
            &VALID.replace("season_end = \"2027-04-16\"", "season_end = \"2026-01-01\""),
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "league.season_end"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let tmp = write_config(
            "benchboss_config_refresh",
            &VALID.replace("refresh_interval_secs = 15", "refresh_interval_secs = 0"),
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_too_many_retries() {
        let tmp = write_config(
            "benchboss_config_retries",
            &VALID.replace("refresh_interval_secs = 15", "refresh_interval_secs = 15\npersist_retries = 9"),
        );
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { ref field, .. } if field == "engine.persist_retries"));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_out_of_range_offset() {
        let tmp = write_config("benchboss_config_offset", &VALID.replace("-300", "-1200"));
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn parse_error_for_invalid_toml() {
        let tmp = write_config("benchboss_config_parse", "[league\nname = ");
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn file_not_found_when_missing() {
        let tmp = std::env::temp_dir().join("benchboss_config_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = load_config_from(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn first_run_copies_default_config_once() {
        let tmp = std::env::temp_dir().join("benchboss_config_seed");
        let _ = fs::remove_dir_all(&tmp);
        let defaults_dir = tmp.join("defaults");
        fs::create_dir_all(&defaults_dir).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            defaults_dir.join(CONFIG_FILE),
        )
        .unwrap();

        let written = ensure_config_file(&tmp).expect("should succeed");
        assert_eq!(written, Some(tmp.join("config").join(CONFIG_FILE)));
        assert_eq!(load_config_from(&tmp).unwrap().league.team_id, "team-1");

        // A manager's edits survive later runs
        fs::write(tmp.join("config").join(CONFIG_FILE), "# custom\n").unwrap();
        assert_eq!(ensure_config_file(&tmp).expect("should succeed"), None);
        let content = fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap();
        assert_eq!(content, "# custom\n");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_defaults_is_an_error_only_without_config() {
        let tmp = std::env::temp_dir().join("benchboss_config_no_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();

        match ensure_config_file(&tmp).unwrap_err() {
            ConfigError::DefaultsCopyError { message } => {
                assert!(message.contains("defaults/benchboss.toml"));
            }
            other => panic!("expected DefaultsCopyError, got: {other}"),
        }

        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config").join(CONFIG_FILE), "# custom\n").unwrap();
        assert_eq!(ensure_config_file(&tmp).expect("should succeed"), None);

        let _ = fs::remove_dir_all(&tmp);
    }
}
