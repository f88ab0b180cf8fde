//! `{"from_command": [argv…]}` resolution.

use std::process::Command;

use serde::Deserialize;

/// Any string field in a seed file may instead be given as the argv of a
/// command whose trimmed stdout supplies the value at load time.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrCommand {
    Literal(String),
    FromCommand { from_command: Vec<String> },
}

impl StringOrCommand {
    pub fn resolve(&self) -> Result<String, String> {
        match self {
            StringOrCommand::Literal(s) => Ok(s.clone()),
            StringOrCommand::FromCommand { from_command } => run_from_command(from_command),
        }
    }
}

fn run_from_command(argv: &[String]) -> Result<String, String> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| "from_command must not be empty".to_string())?;

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run {:?}: {}", argv, e))?;

    if !output.status.success() {
        return Err(format!(
            "command {:?} exited with {}",
            argv, output.status
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_resolves_to_itself() {
        let s = StringOrCommand::Literal("hunter2".into());
        assert_eq!(s.resolve().unwrap(), "hunter2");
    }

    #[test]
    fn from_command_resolves_to_trimmed_stdout() {
        let s = StringOrCommand::FromCommand {
            from_command: vec!["echo".into(), "hunter2".into()],
        };
        assert_eq!(s.resolve().unwrap(), "hunter2");
    }

    #[test]
    fn empty_argv_is_an_error() {
        let s = StringOrCommand::FromCommand {
            from_command: vec![],
        };
        assert!(s.resolve().is_err());
    }

    #[test]
    fn nonzero_exit_is_an_error() {
        let s = StringOrCommand::FromCommand {
            from_command: vec!["false".into()],
        };
        assert!(s.resolve().is_err());
    }

    #[test]
    fn deserializes_plain_string_as_literal() {
        let parsed: StringOrCommand = serde_json::from_str("\"plain\"").unwrap();
        assert!(matches!(parsed, StringOrCommand::Literal(s) if s == "plain"));
    }

    #[test]
    fn deserializes_from_command_object() {
        let parsed: StringOrCommand =
            serde_json::from_str(r#"{"from_command": ["echo", "hi"]}"#).unwrap();
        assert!(matches!(parsed, StringOrCommand::FromCommand { from_command } if from_command == vec!["echo", "hi"]));
    }
}
