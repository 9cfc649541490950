// Benchboss entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Load config
// 3. Open database
// 4. Load roster, schedule and projections
// 5. Sync roster history and open the lineup session for today
// 6. Spawn the snapshot writer
// 7. Spawn app logic task
// 8. Read commands from stdin until quit
// 9. Cleanup on exit

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use benchboss_app::app::{self, AppState};
use benchboss_app::input::{self, InputError};
use benchboss_app::protocol::UserCommand;
use benchboss_app::render;
use benchboss_core::config;
use benchboss_core::data;
use benchboss_core::db::Database;
use benchboss_core::lock::LockEvaluator;
use benchboss_core::persist::{SnapshotWriter, StoreSink};
use benchboss_core::scheduler::RefreshScheduler;
use benchboss_core::session::{LineupSession, SessionDeps};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("Benchboss starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, team={}, season {}..{}",
        config.league.name, config.league.team_id, config.league.season_start, config.league.season_end
    );

    // 3. Open database
    let db_path = config.database.resolved_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path_str = db_path.to_string_lossy().into_owned();
    let db = Arc::new(Database::open(&db_path_str).context("failed to open database")?);
    info!("Database opened at {}", db_path_str);

    // 4. Load roster, schedule and projections
    let league = data::load_all_from_paths(&config.data_paths).context("failed to load league data")?;

    // 5. Sync roster history and open the lineup session for today
    let clock = app::system_clock();
    let now = clock();
    let tz = config.league.timezone();
    let today = LockEvaluator::new(&league.schedule, tz).today(now);
    let team = config.league.team_id.clone();
    db.sync_roster(&team, &league.pool, today)
        .context("failed to sync roster history")?;

    let deps = SessionDeps {
        team,
        tz,
        calendar: config.league.calendar(),
        schedule: Arc::new(league.schedule),
        projections: Arc::new(league.projections),
        store: db.clone(),
        history: db.clone(),
        lock_max_age: config.engine.refresh_interval(),
    };
    let (session, initial_job) =
        LineupSession::open(deps, league.pool, today, now).context("failed to load today's lineup")?;

    // 6. Spawn the snapshot writer
    let (warn_tx, warn_rx) = mpsc::channel(64);
    let (writer, writer_handle) = SnapshotWriter::spawn(
        Arc::new(StoreSink::new(db.clone())),
        config.engine.retry_policy(),
        warn_tx,
    );
    let state = AppState::new(session, writer, clock);
    state.submit(initial_job);

    // 7. Spawn app logic task
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, mut ui_rx) = mpsc::channel(256);
    let scheduler = RefreshScheduler::new(config.engine.refresh_interval());
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, warn_rx, ui_tx, scheduler, state).await {
            error!("Application loop error: {}", e);
        }
    });

    let json = std::env::args().skip(1).any(|arg| arg == "--json");
    let printer = tokio::spawn(async move {
        while let Some(update) = ui_rx.recv().await {
            if json {
                println!("{}", render::render_update_json(&update));
            } else {
                println!("{}", render::render_update(&update));
            }
        }
    });

    // 8. Read commands from stdin until quit
    info!("Application ready");
    if !json {
        println!("{}", input::HELP);
    }
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match input::parse_command(&line) {
            Ok(cmd) => {
                let quit = cmd == UserCommand::Quit;
                if cmd_tx.send(cmd).await.is_err() || quit {
                    break;
                }
            }
            Err(InputError::Empty) => {}
            Err(InputError::Help) => println!("{}", input::HELP),
            Err(e) => println!("! {e}"),
        }
    }
    drop(cmd_tx);

    // 9. Cleanup: let the app loop and writer drain (with timeout)
    let _ = tokio::time::timeout(Duration::from_secs(5), async {
        let _ = app_handle.await;
        let _ = writer_handle.await;
        let _ = printer.await;
    })
    .await;

    info!("Benchboss shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file so it does not interleave with the
/// interactive terminal output.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("benchboss.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("benchboss=info,benchboss_app=info,benchboss_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
