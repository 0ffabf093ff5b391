//! Line commands accepted by the interactive mode.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Select { path: PathBuf },
    Submit,
    Reset,
    Status,
    Help,
    Quit,
}

pub const HELP_TEXT: &str = "\
Commands:
  select <path>   choose an image (replaces the current one)
  submit          send the selected image for classification
  reset           discard the image and any result
  status          show the current selection and result
  help            show this message
  quit            exit";

/// `Ok(None)` for blank lines; `Err` carries a message for the user.
pub fn parse_command(line: &str) -> Result<Option<ReplCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "select" | "open" => {
            if rest.is_empty() {
                return Err("usage: select <path>".to_string());
            }
            ReplCommand::Select {
                path: PathBuf::from(rest),
            }
        }
        "submit" | "classify" => ReplCommand::Submit,
        "reset" | "retake" => ReplCommand::Reset,
        "status" => ReplCommand::Status,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => return Err(format!("unknown command '{other}'; type `help`")),
    };

    if !rest.is_empty() && !matches!(command, ReplCommand::Select { .. }) {
        return Err(format!("'{verb}' takes no arguments"));
    }

    Ok(Some(command))
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
