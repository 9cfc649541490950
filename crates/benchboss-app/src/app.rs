// Application state and orchestration logic.
//
// The event loop that applies user commands to the lineup session, hands the
// resulting writes to the snapshot writer, refreshes lock state on the
// polling cadence, and pushes UI updates to the terminal front end.

use std::sync::Arc;

use chrono::{DateTime, Duration as DayDelta, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use benchboss_core::eligibility::eligible_slots;
use benchboss_core::mutation::RejectionReason;
use benchboss_core::persist::{PersistWarning, SnapshotWriter, WriteJob};
use benchboss_core::player::{Player, PlayerId};
use benchboss_core::scheduler::{RefreshScheduler, RefreshSignal, RefreshTrigger};
use benchboss_core::session::{EditMode, LineupSession};
use benchboss_core::slot::FantasySlot;

use crate::protocol::{LineupSnapshot, PlayerRow, RejectionKind, UiUpdate, UserCommand};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Source of the current instant. Swappable so tests can pin time.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub session: LineupSession,
    writer: SnapshotWriter,
    clock: Clock,
}

impl AppState {
    pub fn new(session: LineupSession, writer: SnapshotWriter, clock: Clock) -> Self {
        AppState {
            session,
            writer,
            clock,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Queue a write. The lineup on screen never waits for it.
    pub fn submit(&self, job: Option<WriteJob>) {
        if let Some(job) = job {
            if !self.writer.submit(job) {
                warn!("snapshot writer has stopped; lineup change not queued");
            }
        }
    }

    /// Render the session's current view.
    pub fn snapshot(&self) -> LineupSnapshot {
        let session = &self.session;
        let view = session.view();
        let lineup = session.lineup();

        let row = |label: &str, id: Option<PlayerId>| -> PlayerRow {
            let player = id.and_then(|id| view.players.get(id));
            match (id, player) {
                (Some(id), Some(p)) => PlayerRow {
                    slot: label.to_string(),
                    player_id: Some(id.0),
                    name: p.name.clone(),
                    position: p.position.to_string(),
                    team: p.team.clone(),
                    status: p.status.badge().to_string(),
                    eligible: eligible_labels(p),
                    locked: session.is_locked(id),
                    read_only: view.read_only.contains(&id),
                },
                (Some(id), None) => PlayerRow {
                    slot: label.to_string(),
                    player_id: Some(id.0),
                    name: format!("#{id}"),
                    position: String::new(),
                    team: String::new(),
                    status: String::new(),
                    eligible: Vec::new(),
                    locked: true,
                    read_only: true,
                },
                (None, _) => PlayerRow {
                    slot: label.to_string(),
                    player_id: None,
                    name: String::new(),
                    position: String::new(),
                    team: String::new(),
                    status: String::new(),
                    eligible: Vec::new(),
                    locked: false,
                    read_only: false,
                },
            }
        };

        let slot_rows = |slots: &[FantasySlot]| -> Vec<PlayerRow> {
            slots.iter().map(|s| row(s.label(), lineup.occupant(*s))).collect()
        };

        LineupSnapshot {
            team: session.team().to_string(),
            date: session.date(),
            week: session.calendar().week_of(session.date()).map(|w| w.number),
            current_week: session
                .calendar()
                .current_week(session.today(self.now()))
                .map(|w| w.number),
            is_past: view.is_past,
            mode: match session.mode() {
                EditMode::Cascade => "cascade".into(),
                EditMode::PerDay => "per-day".into(),
            },
            starters: slot_rows(&FantasySlot::STARTERS),
            ir: slot_rows(&FantasySlot::IR),
            bench: lineup.bench().iter().map(|id| row("BN", Some(*id))).collect(),
            warnings: view.warnings.iter().map(|w| w.to_string()).collect(),
        }
    }
}

/// Slot kinds a player may be dropped on, as shown next to the row.
fn eligible_labels(player: &Player) -> Vec<String> {
    let mut labels: Vec<String> = eligible_slots(player)
        .iter()
        .map(|kind| kind.display_str().to_string())
        .collect();
    if player.ir_eligible {
        labels.push("IR".to_string());
    }
    labels
}

// ---------------------------------------------------------------------------
// Event loop
// ---------------------------------------------------------------------------

/// Run the event loop until `Quit` or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<UserCommand>,
    mut warn_rx: mpsc::Receiver<PersistWarning>,
    ui_tx: mpsc::Sender<UiUpdate>,
    mut scheduler: RefreshScheduler,
    mut state: AppState,
) -> anyhow::Result<()> {
    info!("Application event loop started");
    let signal = scheduler.signal();
    let mut warnings_open = true;

    send_lineup(&state, &ui_tx).await;

    loop {
        tokio::select! {
            // --- User commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UserCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        handle_user_command(&mut state, cmd, &ui_tx, &signal).await;
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }

            // --- Persistence warnings (only poll while the writer is alive) ---
            w = warn_rx.recv(), if warnings_open => {
                match w {
                    Some(w) => {
                        warn!("{}", w);
                        let _ = ui_tx.send(UiUpdate::PersistWarning(w.to_string())).await;
                    }
                    None => {
                        debug!("persist warning channel closed");
                        warnings_open = false;
                    }
                }
            }

            // --- Lock refresh ---
            trigger = scheduler.next() => {
                handle_refresh(&mut state, trigger, &ui_tx).await;
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

async fn handle_refresh(state: &mut AppState, trigger: RefreshTrigger, ui_tx: &mpsc::Sender<UiUpdate>) {
    let now = state.now();
    if trigger == RefreshTrigger::Interval && !state.session.locks_stale(now) {
        return;
    }
    let before = state.session.locks().locked.clone();
    state.session.refresh_locks(now);
    let changed = state.session.locks().locked != before;
    debug!("lock refresh ({:?}): changed={}", trigger, changed);
    if changed || trigger != RefreshTrigger::Interval {
        send_lineup(state, ui_tx).await;
    }
}

/// Handle a user command from the front end.
async fn handle_user_command(
    state: &mut AppState,
    cmd: UserCommand,
    ui_tx: &mpsc::Sender<UiUpdate>,
    signal: &RefreshSignal,
) {
    let now = state.now();
    match cmd {
        UserCommand::Show => send_lineup(state, ui_tx).await,
        UserCommand::Navigate(date) => navigate(state, date, ui_tx, signal).await,
        UserCommand::Shift(days) => {
            match state.session.date().checked_add_signed(DayDelta::days(days)) {
                Some(date) => navigate(state, date, ui_tx, signal).await,
                None => {
                    let _ = ui_tx.send(UiUpdate::Error("date out of range".into())).await;
                }
            }
        }
        UserCommand::NextWeek => {
            let date = state.session.date();
            match state.session.calendar().next_week_start(date) {
                Some(monday) => navigate(state, monday, ui_tx, signal).await,
                None => {
                    let _ = ui_tx
                        .send(UiUpdate::Error(format!("no scoring week after {date}")))
                        .await;
                }
            }
        }
        UserCommand::Move { player, target } => {
            info!("Move: {} -> {:?}", player, target);
            match state.session.apply_move(player, target, now) {
                Ok(applied) => {
                    state.submit(applied.job);
                    send_lineup(state, ui_tx).await;
                }
                Err(reason) => send_rejection(reason, ui_tx).await,
            }
        }
        UserCommand::Optimize => match state.session.auto_optimize(now) {
            Ok(applied) => {
                state.submit(applied.job);
                send_lineup(state, ui_tx).await;
            }
            Err(reason) => send_rejection(reason, ui_tx).await,
        },
        UserCommand::SetMode(mode) => {
            info!("Edit mode set to {:?}", mode);
            state.session.set_mode(mode);
            send_lineup(state, ui_tx).await;
        }
        UserCommand::Resume => signal.resumed(),
        UserCommand::Quit => {}
    }
}

async fn navigate(
    state: &mut AppState,
    date: chrono::NaiveDate,
    ui_tx: &mpsc::Sender<UiUpdate>,
    signal: &RefreshSignal,
) {
    let now = state.now();
    match state.session.navigate(date, now) {
        Ok(job) => {
            state.submit(job);
            signal.navigated();
        }
        Err(e) => {
            warn!("failed to load lineup for {}: {}", date, e);
            let _ = ui_tx.send(UiUpdate::Error(format!("could not load {date}: {e}"))).await;
        }
    }
}

async fn send_rejection(reason: RejectionReason, ui_tx: &mpsc::Sender<UiUpdate>) {
    let kind = if reason.is_lock() {
        RejectionKind::Locked
    } else {
        RejectionKind::InvalidPlacement
    };
    let _ = ui_tx
        .send(UiUpdate::Rejected {
            kind,
            message: reason.to_string(),
        })
        .await;
}

async fn send_lineup(state: &AppState, ui_tx: &mpsc::Sender<UiUpdate>) {
    let _ = ui_tx.send(UiUpdate::Lineup(Box::new(state.snapshot()))).await;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
