// Rendering of UI updates for the terminal, as text or JSON lines.

use std::fmt::Write;

use crate::protocol::{LineupSnapshot, PlayerRow, RejectionKind, UiUpdate};

/// One JSON object per line for lineup updates; other updates render as text.
pub fn render_update_json(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Lineup(snap) => serde_json::to_string(snap.as_ref())
            .unwrap_or_else(|e| format!("! failed to encode lineup: {e}")),
        other => render_update(other),
    }
}

pub fn render_update(update: &UiUpdate) -> String {
    match update {
        UiUpdate::Lineup(snap) => render_lineup(snap),
        UiUpdate::Rejected { kind, message } => {
            let tag = match kind {
                RejectionKind::InvalidPlacement => "invalid",
                RejectionKind::Locked => "locked",
            };
            format!("! [{tag}] {message}")
        }
        UiUpdate::PersistWarning(message) => format!("! [not saved] {message}"),
        UiUpdate::Error(message) => format!("! {message}"),
    }
}

pub fn render_lineup(snap: &LineupSnapshot) -> String {
    let mut out = String::new();
    let week = match (snap.week, snap.current_week) {
        (Some(w), Some(current)) if w == current => format!(" (week {w}, current)"),
        (Some(w), _) => format!(" (week {w})"),
        (None, _) => String::new(),
    };
    let state = if snap.is_past { "read-only" } else { snap.mode.as_str() };
    let _ = writeln!(out, "{} {}{} [{}]", snap.team, snap.date, week, state);

    section(&mut out, "Starters", &snap.starters);
    section(&mut out, "Injured Reserve", &snap.ir);
    if snap.bench.is_empty() {
        let _ = writeln!(out, "Bench: (empty)");
    } else {
        section(&mut out, "Bench", &snap.bench);
    }

    for w in &snap.warnings {
        let _ = writeln!(out, "warning: {w}");
    }
    out
}

fn section(out: &mut String, title: &str, rows: &[PlayerRow]) {
    let _ = writeln!(out, "{title}:");
    for row in rows {
        let _ = writeln!(out, "  {}", render_row(row));
    }
}

fn render_row(row: &PlayerRow) -> String {
    let Some(id) = row.player_id else {
        return format!("{:<5} -", row.slot);
    };
    let mut flags = Vec::new();
    if !row.status.is_empty() {
        flags.push(row.status.clone());
    }
    if row.read_only {
        flags.push("former".to_string());
    } else if row.locked {
        flags.push("locked".to_string());
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };
    format!(
        "{:<5} {:<24} {:<2} {:<3} #{}{}",
        row.slot, row.name, row.position, row.team, id, flags
    )
}
