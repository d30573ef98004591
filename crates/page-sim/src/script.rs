//! Line-oriented commands understood by the simulator.

use std::time::Duration;

/// One stdin command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Client-side navigation to a new URL.
    Navigate(String),
    /// Change the document title.
    Title(String),
    /// A DOM mutation with no navigation.
    Mutate,
    /// Deliver a message to the agent and print the reply.
    Send(serde_json::Value),
    /// Read a storage key.
    Get(String),
    /// Let time pass.
    Sleep(Duration),
    /// Inject the agent again into the same page context.
    Inject,
    /// Page unload.
    Unload,
}

/// Parse one line.  Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb {
        "navigate" => Command::Navigate(required(verb, rest)?.to_owned()),
        "title" => Command::Title(rest.to_owned()),
        "mutate" => Command::Mutate,
        "send" => {
            let raw = required(verb, rest)?;
            Command::Send(serde_json::from_str(raw).map_err(|e| format!("send: invalid JSON: {e}"))?)
        }
        "get" => Command::Get(required(verb, rest)?.to_owned()),
        "sleep" => {
            let ms: u64 = required(verb, rest)?
                .parse()
                .map_err(|e| format!("sleep: {e}"))?;
            Command::Sleep(Duration::from_millis(ms))
        }
        "inject" => Command::Inject,
        "unload" => Command::Unload,
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(command))
}

fn required<'a>(verb: &str, rest: &'a str) -> Result<&'a str, String> {
    if rest.is_empty() {
        Err(format!("{verb}: missing argument"))
    } else {
        Ok(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_commands() {
        assert_eq!(
            parse_line("navigate https://docs.google.com/spreadsheets/d/X/edit").unwrap(),
            Some(Command::Navigate("https://docs.google.com/spreadsheets/d/X/edit".into()))
        );
        assert_eq!(
            parse_line(r#"send {"action": "ping"}"#).unwrap(),
            Some(Command::Send(json!({"action": "ping"})))
        );
        assert_eq!(
            parse_line("sleep 1500").unwrap(),
            Some(Command::Sleep(Duration::from_millis(1500)))
        );
        assert_eq!(parse_line("title").unwrap(), Some(Command::Title(String::new())));
        assert_eq!(parse_line("  unload  ").unwrap(), Some(Command::Unload));
    }

    #[test]
    fn skips_blank_and_comment_lines() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   # open the plan").unwrap(), None);
    }

    #[test]
    fn reports_bad_input() {
        assert!(parse_line("navigate").unwrap_err().contains("missing argument"));
        assert!(parse_line("send {oops").unwrap_err().contains("invalid JSON"));
        assert!(parse_line("sleep soon").is_err());
        assert!(parse_line("reload").unwrap_err().contains("unknown command"));
    }
}
