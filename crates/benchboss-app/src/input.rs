// Line-oriented command parsing for the terminal front end.

use chrono::NaiveDate;
use thiserror::Error;

use benchboss_core::mutation::MoveTarget;
use benchboss_core::player::PlayerId;
use benchboss_core::session::EditMode;
use benchboss_core::slot::FantasySlot;

use crate::protocol::UserCommand;

pub const HELP: &str = "\
commands:
  show                      redraw the lineup
  date YYYY-MM-DD           view another date
  next | prev               step one day forward or back
  week                      jump to the start of the next scoring week
  move <player> <target>    target: slot (C-1, UTIL, IR-2), bench, or another player id
  optimize                  auto-fill starters for the viewed date
  mode cascade|day          save edits as the standing lineup or for this date only
  resume                    refresh lock state now
  quit";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("empty command")]
    Empty,
    #[error("unknown command `{0}` (try `help`)")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("`{0}` is not a date (expected YYYY-MM-DD)")]
    BadDate(String),
    #[error("`{0}` is not a player id")]
    BadPlayer(String),
    #[error("`{0}` is not a slot, `bench`, or a player id")]
    BadTarget(String),
    #[error("unknown mode `{0}` (expected `cascade` or `day`)")]
    BadMode(String),
    /// The user asked for the command list.
    #[error("help requested")]
    Help,
}

/// Parse one input line.
pub fn parse_command(line: &str) -> Result<UserCommand, InputError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(InputError::Empty);
    };
    let args: Vec<&str> = words.collect();

    match (verb.to_lowercase().as_str(), args.as_slice()) {
        ("show" | "s", []) => Ok(UserCommand::Show),
        ("date" | "d", [raw]) => raw
            .parse::<NaiveDate>()
            .map(UserCommand::Navigate)
            .map_err(|_| InputError::BadDate(raw.to_string())),
        ("date" | "d", _) => Err(InputError::Usage("date YYYY-MM-DD")),
        ("next" | "n", []) => Ok(UserCommand::Shift(1)),
        ("prev" | "p", []) => Ok(UserCommand::Shift(-1)),
        ("week" | "w", []) => Ok(UserCommand::NextWeek),
        ("move" | "mv", [player, target]) => Ok(UserCommand::Move {
            player: parse_player(player)?,
            target: parse_target(target)?,
        }),
        ("move" | "mv", _) => Err(InputError::Usage("move <player> <slot|bench|player>")),
        ("optimize" | "opt", []) => Ok(UserCommand::Optimize),
        ("mode", [raw]) => match raw.to_lowercase().as_str() {
            "cascade" => Ok(UserCommand::SetMode(EditMode::Cascade)),
            "day" | "per-day" => Ok(UserCommand::SetMode(EditMode::PerDay)),
            _ => Err(InputError::BadMode(raw.to_string())),
        },
        ("mode", _) => Err(InputError::Usage("mode cascade|day")),
        ("resume" | "r", []) => Ok(UserCommand::Resume),
        ("quit" | "q" | "exit", []) => Ok(UserCommand::Quit),
        ("help" | "?", _) => Err(InputError::Help),
        (other, _) => Err(InputError::UnknownCommand(other.to_string())),
    }
}

fn parse_player(raw: &str) -> Result<PlayerId, InputError> {
    raw.trim_start_matches('#')
        .parse::<u64>()
        .map(PlayerId)
        .map_err(|_| InputError::BadPlayer(raw.to_string()))
}

fn parse_target(raw: &str) -> Result<MoveTarget, InputError> {
    if raw.eq_ignore_ascii_case("bench") || raw.eq_ignore_ascii_case("bn") {
        return Ok(MoveTarget::Bench);
    }
    if let Some(slot) = FantasySlot::from_label(raw) {
        return Ok(MoveTarget::Slot(slot));
    }
    parse_player(raw)
        .map(MoveTarget::Player)
        .map_err(|_| InputError::BadTarget(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_moves() {
        assert_eq!(
            parse_command("move 8478402 C-2"),
            Ok(UserCommand::Move {
                player: PlayerId(8478402),
                target: MoveTarget::Slot(FantasySlot::C2)
            })
        );
        assert_eq!(
            parse_command("mv #12 util"),
            Ok(UserCommand::Move {
                player: PlayerId(12),
                target: MoveTarget::Slot(FantasySlot::Util)
            })
        );
        assert_eq!(
            parse_command("move 12 bench"),
            Ok(UserCommand::Move {
                player: PlayerId(12),
                target: MoveTarget::Bench
            })
        );
        assert_eq!(
            parse_command("move 12 40"),
            Ok(UserCommand::Move {
                player: PlayerId(12),
                target: MoveTarget::Player(PlayerId(40))
            })
        );
    }

    #[test]
    fn parses_navigation() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert_eq!(parse_command("date 2026-10-20"), Ok(UserCommand::Navigate(date)));
        assert_eq!(parse_command("  NEXT "), Ok(UserCommand::Shift(1)));
        assert_eq!(parse_command("prev"), Ok(UserCommand::Shift(-1)));
        assert_eq!(parse_command("week"), Ok(UserCommand::NextWeek));
    }

    #[test]
    fn parses_modes_and_simple_verbs() {
        assert_eq!(parse_command("mode day"), Ok(UserCommand::SetMode(EditMode::PerDay)));
        assert_eq!(parse_command("mode cascade"), Ok(UserCommand::SetMode(EditMode::Cascade)));
        assert_eq!(parse_command("optimize"), Ok(UserCommand::Optimize));
        assert_eq!(parse_command("resume"), Ok(UserCommand::Resume));
        assert_eq!(parse_command("q"), Ok(UserCommand::Quit));
    }

    #[test]
    fn reports_bad_input() {
        assert_eq!(parse_command("   "), Err(InputError::Empty));
        assert_eq!(parse_command("dance"), Err(InputError::UnknownCommand("dance".into())));
        assert_eq!(parse_command("date 10/20"), Err(InputError::BadDate("10/20".into())));
        assert_eq!(parse_command("move x C-1"), Err(InputError::BadPlayer("x".into())));
        assert_eq!(parse_command("move 1 C-9"), Err(InputError::BadTarget("C-9".into())));
        assert_eq!(parse_command("mode weekly"), Err(InputError::BadMode("weekly".into())));
        assert!(matches!(parse_command("move 1"), Err(InputError::Usage(_))));
    }
}
