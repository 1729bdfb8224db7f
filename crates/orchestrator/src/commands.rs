//! Slash commands from customers and the operator.

use crate::error::OrchestratorError;

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A customer asking to forget their own record.
    ResetSelf,
    Pause(String),
    Resume(String),
    ResetCustomer(String),
    Status(String),
    Help,
}

const MAX_ID_LEN: usize = 64;

/// Parse `text` as a command.
///
/// Returns `None` for anything that is not a recognised command, so that
/// unknown slash text (like `/start`) flows through the normal conversation.
/// Operator commands are only recognised when `is_operator` is set; for the
/// operator a bare `/reset` is a usage error rather than a self-reset.
pub fn parse_command(text: &str, is_operator: bool) -> Option<Result<Command, OrchestratorError>> {
    let mut parts = text.split_whitespace();
    let head = parts.next()?;
    if !head.starts_with('/') {
        return None;
    }
    // Telegram appends the bot name in groups: /status@sales_bot
    let name = head
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let args: Vec<&str> = parts.collect();

    if !is_operator {
        return match name.as_str() {
            "reset" => Some(Ok(Command::ResetSelf)),
            _ => None,
        };
    }

    let build: fn(String) -> Command = match name.as_str() {
        "pause" => Command::Pause,
        "resume" => Command::Resume,
        "reset" => Command::ResetCustomer,
        "status" => Command::Status,
        "help" => return Some(Ok(Command::Help)),
        _ => return None,
    };

    Some(parse_target(&name, &args).map(build))
}

fn parse_target(command: &str, args: &[&str]) -> Result<String, OrchestratorError> {
    let usage = || OrchestratorError::InvalidCommand(format!("usage: /{} <customerId>", command));

    match args {
        [id] if is_valid_id(id) => Ok(id.to_string()),
        [id] => Err(OrchestratorError::InvalidCommand(format!(
            "'{}' is not a valid customer id",
            id
        ))),
        _ => Err(usage()),
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_commands() {
        assert_eq!(parse_command("/reset", false).unwrap().unwrap(), Command::ResetSelf);
        assert!(parse_command("/start", false).is_none());
        assert!(parse_command("/pause 123", false).is_none());
        assert!(parse_command("hello", false).is_none());
    }

    #[test]
    fn test_operator_commands() {
        assert_eq!(
            parse_command("/pause 123", true).unwrap().unwrap(),
            Command::Pause("123".into())
        );
        assert_eq!(
            parse_command("/RESUME -100200", true).unwrap().unwrap(),
            Command::Resume("-100200".into())
        );
        assert_eq!(
            parse_command("/status@sales_bot abc_1", true).unwrap().unwrap(),
            Command::Status("abc_1".into())
        );
        assert_eq!(
            parse_command("/reset 9", true).unwrap().unwrap(),
            Command::ResetCustomer("9".into())
        );
        assert_eq!(parse_command("/help", true).unwrap().unwrap(), Command::Help);
    }

    #[test]
    fn test_malformed_operator_commands() {
        for text in ["/pause", "/pause a b", "/reset", "/status ../etc", "/resume bad;id"] {
            assert!(
                matches!(
                    parse_command(text, true),
                    Some(Err(OrchestratorError::InvalidCommand(_)))
                ),
                "{} should be rejected",
                text
            );
        }
        let long = format!("/status {}", "x".repeat(65));
        assert!(matches!(parse_command(&long, true), Some(Err(_))));
    }
}
