//! Declared-command execution.
//!
//! [`CommandRunner`] turns a block's command template plus caller-supplied
//! positional arguments into one child-process invocation:
//!
//! ```text
//! CommandSpec ──► tokenize (shell-words for single strings)
//!             ──► substitute $N placeholders with args[N-1]
//!             ──► spawn child (cwd = document base dir, stdout captured)
//!             ──► decode stdout: JSON, or raw text passthrough
//! ```
//!
//! ## Rules
//! - Only tokens matching exactly `$<N>` (N ≥ 1) are substituted; every other
//!   token passes through literally.
//! - All tokens are string-coerced before invocation.
//! - Exit code and captured stdout are the only signals consulted; stderr is
//!   not part of the contract.
//! - Execution is bounded by the configured timeout; the child is killed when
//!   the bound is exceeded.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde_json::Value;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

use crate::blocks::CommandSpec;
use crate::error::ExecError;

use super::decode::Decoded;

/// Executes declared commands with positional-argument substitution.
///
/// Cheap to clone; one runner is shared by the registry's call path and every
/// polling source.
#[derive(Clone, Debug)]
pub struct CommandRunner {
    /// Working directory for every invocation (the document base directory).
    cwd: PathBuf,
    /// Execution bound; `None` = wait forever.
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// Creates a runner rooted at `cwd` with an optional execution bound.
    pub fn new(cwd: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            cwd: cwd.into(),
            timeout,
        }
    }

    /// Runs `command` with `args` substituted and returns the decoded stdout.
    pub async fn run(
        &self,
        command: &CommandSpec,
        args: &[Value],
    ) -> Result<Decoded, ExecError> {
        let tokens = resolve_command(command, args)?;
        let (program, rest) = tokens.split_first().ok_or(ExecError::EmptyCommand)?;
        debug!(program = %program, args = ?rest, cwd = %self.cwd.display(), "running command");

        let mut child = Command::new(program);
        child
            .args(rest)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(bound) => time::timeout(bound, child.output())
                .await
                .map_err(|_| ExecError::Timeout { timeout: bound })?,
            None => child.output().await,
        }
        .map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        let stdout = String::from_utf8(output.stdout).map_err(|_| ExecError::NonUtf8)?;
        if !output.status.success() {
            return Err(ExecError::Failed {
                code: output.status.code(),
                stdout,
            });
        }
        Ok(Decoded::parse(&stdout))
    }
}

/// Tokenizes `command` and substitutes `$N` placeholders with `args[N-1]`.
///
/// Single-string commands are split with shell-word rules (quoting-aware)
/// before substitution.
pub fn resolve_command(command: &CommandSpec, args: &[Value]) -> Result<Vec<String>, ExecError> {
    let tokens: Vec<String> = match command {
        CommandSpec::Tokens(values) => values.iter().map(coerce).collect(),
        CommandSpec::Line(line) => shell_words::split(line)?,
    };

    tokens
        .into_iter()
        .map(|token| match placeholder_index(&token) {
            Some(index) => args
                .get(index - 1)
                .map(coerce)
                .ok_or(ExecError::MissingArgument { index }),
            None => Ok(token),
        })
        .collect()
}

/// Returns `Some(N)` if the whole token is a positional placeholder `$N`.
fn placeholder_index(token: &str) -> Option<usize> {
    let digits = token.strip_prefix('$')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<usize>().ok().filter(|n| *n >= 1)
}

/// String-coerces a JSON value the way it appears on a command line.
///
/// Strings pass through without quotes; numbers, booleans, and compound
/// values use their JSON rendering.
fn coerce(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tokens(raw: &[Value]) -> CommandSpec {
        CommandSpec::Tokens(raw.to_vec())
    }

    #[test]
    fn test_substitutes_exact_placeholder_tokens_only() {
        let command = tokens(&[json!("echo"), json!("$1"), json!("literal")]);
        let resolved = resolve_command(&command, &[json!("hi")]).unwrap();
        assert_eq!(resolved, vec!["echo", "hi", "literal"]);
    }

    #[test]
    fn test_non_placeholder_dollar_tokens_pass_through() {
        let command = tokens(&[
            json!("echo"),
            json!("$"),
            json!("$x"),
            json!("$1x"),
            json!("a$1"),
            json!("$0"),
        ]);
        let resolved = resolve_command(&command, &[json!("unused")]).unwrap();
        assert_eq!(resolved, vec!["echo", "$", "$x", "$1x", "a$1", "$0"]);
    }

    #[test]
    fn test_arguments_are_string_coerced() {
        let command = tokens(&[json!("calc"), json!("$1"), json!("$2"), json!(7)]);
        let resolved = resolve_command(&command, &[json!(2.5), json!(true)]).unwrap();
        assert_eq!(resolved, vec!["calc", "2.5", "true", "7"]);
    }

    #[test]
    fn test_missing_argument_is_an_error() {
        let command = tokens(&[json!("echo"), json!("$2")]);
        let err = resolve_command(&command, &[json!("only-one")]).unwrap_err();
        assert!(matches!(err, ExecError::MissingArgument { index: 2 }));
    }

    #[test]
    fn test_single_string_commands_split_with_quoting() {
        let command = CommandSpec::Line(r#"grep "two words" $1"#.to_owned());
        let resolved = resolve_command(&command, &[json!("notes.txt")]).unwrap();
        assert_eq!(resolved, vec!["grep", "two words", "notes.txt"]);
    }

    #[test]
    fn test_unbalanced_quote_is_a_shell_error() {
        let command = CommandSpec::Line(r#"grep "unterminated"#.to_owned());
        let err = resolve_command(&command, &[]).unwrap_err();
        assert!(matches!(err, ExecError::Shell(_)));
    }

    #[tokio::test]
    async fn test_runs_command_and_decodes_json_stdout() {
        let runner = CommandRunner::new(std::env::temp_dir(), None);
        let command = tokens(&[json!("echo"), json!("[1, 2]")]);
        let decoded = runner.run(&command, &[]).await.unwrap();
        assert_eq!(decoded, Decoded::Structured(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_runs_command_and_passes_raw_text_through() {
        let runner = CommandRunner::new(std::env::temp_dir(), None);
        let command = tokens(&[json!("echo"), json!("plain"), json!("text")]);
        let decoded = runner.run(&command, &[]).await.unwrap();
        assert_eq!(decoded, Decoded::Raw("plain text\n".to_owned()));
    }

    #[tokio::test]
    async fn test_non_zero_exit_surfaces_as_failed() {
        let runner = CommandRunner::new(std::env::temp_dir(), None);
        let command = tokens(&[json!("false")]);
        let err = runner.run(&command, &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::Failed { .. }));
    }

    #[tokio::test]
    async fn test_hung_command_hits_the_bound() {
        let runner = CommandRunner::new(std::env::temp_dir(), Some(Duration::from_millis(100)));
        let command = tokens(&[json!("sleep"), json!("5")]);
        let err = runner.run(&command, &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_unknown_program_is_a_spawn_error() {
        let runner = CommandRunner::new(std::env::temp_dir(), None);
        let command = tokens(&[json!("definitely-not-a-real-program-xyz")]);
        let err = runner.run(&command, &[]).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }
}
