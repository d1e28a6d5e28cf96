//! Command-line interface and REPL
//!
//! Line-based commands for driving the deck and the mapping registry
//! without a UI. The REPL runs on its own thread (rustyline blocks) and
//! forwards parsed commands to the event loop over a channel.

use rustyline::DefaultEditor;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::debug;

/// Preset subcommands (`preset <path> <action> [arg]`)
#[derive(Debug, Clone, PartialEq)]
pub enum PresetAction {
    Save(String),
    Load(String),
    Delete(String),
    Next,
    Random,
    Export(PathBuf),
    Import(PathBuf),
}

/// REPL commands
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Arm learn mode: the next hardware signal becomes the pending source
    Map,
    /// Arm unbind mode: the next touched control loses its bindings
    Unmap,
    /// Cancel pending learn and unbind modes
    Cancel,
    /// Simulate a user touch on a control (completes learn/unbind)
    Touch(Vec<String>),
    /// Set a fader value
    Set(Vec<String>, f64),
    /// Press a pad, confirm-button or confirm-switch
    Press(Vec<String>),
    /// Release a pad
    Release(Vec<String>),
    /// Toggle a switch
    Toggle(Vec<String>),
    /// Select an option on a selector
    Select(Vec<String>, usize),
    /// Switch the active page of a tabbed-pages control
    Page(Vec<String>, String),
    /// Preset operations
    Preset(Vec<String>, PresetAction),
    /// Print the deck snapshot and active mappings
    State,
    /// List available MIDI input ports
    Ports,
    /// Quit
    Exit,
}

/// Parse one REPL line. Returns `None` for blank lines, `Err` with a
/// usage message otherwise.
pub fn parse(line: &str) -> Option<Result<Command, String>> {
    let mut words = line.split_whitespace();
    let verb = words.next()?;
    let rest: Vec<&str> = words.collect();

    let cmd = match verb {
        "map" => Ok(Command::Map),
        "unmap" => Ok(Command::Unmap),
        "cancel" => Ok(Command::Cancel),
        "touch" => path_arg(&rest, "touch <path>").map(Command::Touch),
        "set" => match rest.as_slice() {
            [path, value] => match value.parse::<f64>() {
                Ok(v) => Ok(Command::Set(split_path(path), v)),
                Err(_) => Err(format!("invalid value '{}'", value)),
            },
            _ => Err("usage: set <path> <value>".into()),
        },
        "press" => path_arg(&rest, "press <path>").map(Command::Press),
        "release" => path_arg(&rest, "release <path>").map(Command::Release),
        "toggle" => path_arg(&rest, "toggle <path>").map(Command::Toggle),
        "select" => match rest.as_slice() {
            [path, index] => match index.parse::<usize>() {
                Ok(i) => Ok(Command::Select(split_path(path), i)),
                Err(_) => Err(format!("invalid index '{}'", index)),
            },
            _ => Err("usage: select <path> <index>".into()),
        },
        "page" => match rest.as_slice() {
            [path, name] => Ok(Command::Page(split_path(path), name.to_string())),
            _ => Err("usage: page <path> <name>".into()),
        },
        "preset" => parse_preset(&rest),
        "state" => Ok(Command::State),
        "ports" => Ok(Command::Ports),
        "exit" | "quit" => Ok(Command::Exit),
        other => Err(format!("unknown command '{}'", other)),
    };

    Some(cmd)
}

fn parse_preset(rest: &[&str]) -> Result<Command, String> {
    const USAGE: &str =
        "usage: preset <path> save|load|delete <id> | next | random | export|import <file>";

    let (path, action) = match rest {
        [path, action @ ..] if !action.is_empty() => (split_path(path), action),
        _ => return Err(USAGE.into()),
    };

    let action = match action {
        ["save", id] => PresetAction::Save(id.to_string()),
        ["load", id] => PresetAction::Load(id.to_string()),
        ["delete", id] => PresetAction::Delete(id.to_string()),
        ["next"] => PresetAction::Next,
        ["random"] => PresetAction::Random,
        ["export", file] => PresetAction::Export(PathBuf::from(file)),
        ["import", file] => PresetAction::Import(PathBuf::from(file)),
        _ => return Err(USAGE.into()),
    };

    Ok(Command::Preset(path, action))
}

fn path_arg(rest: &[&str], usage: &str) -> Result<Vec<String>, String> {
    match rest {
        [path] => Ok(split_path(path)),
        _ => Err(format!("usage: {}", usage)),
    }
}

/// Paths address nested controls: `mixer/vol` reaches into a group,
/// `pages/main/kick` into a tabbed-pages control.
fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Start the REPL on a dedicated thread, sending parsed commands over
/// the returned channel. The channel closes when the REPL exits.
pub fn spawn_repl() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to start REPL: {}", e);
                return;
            }
        };

        loop {
            let line = match rl.readline("deck> ") {
                Ok(line) => line,
                Err(_) => {
                    let _ = tx.blocking_send(Command::Exit);
                    break;
                }
            };

            let _ = rl.add_history_entry(line.as_str());

            match parse(&line) {
                None => continue,
                Some(Err(msg)) => eprintln!("{}", msg),
                Some(Ok(cmd)) => {
                    debug!("REPL command: {:?}", cmd);
                    let exit = cmd == Command::Exit;
                    if tx.blocking_send(cmd).is_err() || exit {
                        break;
                    }
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(line: &str) -> Command {
        parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_ok("map"), Command::Map);
        assert_eq!(parse_ok("unmap"), Command::Unmap);
        assert_eq!(parse_ok("cancel"), Command::Cancel);
        assert_eq!(parse_ok("state"), Command::State);
        assert_eq!(parse_ok("quit"), Command::Exit);
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(parse("   ").is_none());
        assert!(parse("").is_none());
    }

    #[test]
    fn test_parse_set_with_nested_path() {
        assert_eq!(
            parse_ok("set mixer/vol 0.75"),
            Command::Set(vec!["mixer".into(), "vol".into()], 0.75)
        );
    }

    #[test]
    fn test_parse_set_rejects_bad_value() {
        assert!(parse("set vol loud").unwrap().is_err());
        assert!(parse("set vol").unwrap().is_err());
    }

    #[test]
    fn test_parse_page() {
        assert_eq!(
            parse_ok("page pages main"),
            Command::Page(vec!["pages".into()], "main".into())
        );
    }

    #[test]
    fn test_parse_preset_actions() {
        assert_eq!(
            parse_ok("preset presets save warm"),
            Command::Preset(vec!["presets".into()], PresetAction::Save("warm".into()))
        );
        assert_eq!(
            parse_ok("preset presets random"),
            Command::Preset(vec!["presets".into()], PresetAction::Random)
        );
        assert_eq!(
            parse_ok("preset presets export out.json"),
            Command::Preset(
                vec!["presets".into()],
                PresetAction::Export(PathBuf::from("out.json"))
            )
        );
        assert!(parse("preset presets").unwrap().is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(parse("frobnicate").unwrap().is_err());
    }
}
