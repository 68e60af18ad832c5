//! Blocking subprocess runner shared by the command-based adapters.
//!
//! Runs a command to completion, optionally feeding it stdin, and parses
//! its stdout as JSON Lines.

use crate::evaluators::base::EvaluatorError;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;

pub struct CommandRunner;

impl CommandRunner {
    /// Run `command` and parse each non-empty stdout line as JSON.
    ///
    /// # Errors
    ///
    /// - `ExecutionError` if the command cannot be spawned or exits non-zero
    /// - `OutputParseError` if a stdout line is not valid JSON
    pub fn run_json_lines(
        command: &str,
        args: &[String],
        working_dir: Option<&Path>,
        input: Option<Vec<u8>>,
    ) -> Result<Vec<serde_json::Value>, EvaluatorError> {
        let stdout = Self::run(command, args, working_dir, input)?;
        parse_json_lines(&stdout)
    }

    /// Run `command` to completion and return its stdout.
    pub fn run(
        command: &str,
        args: &[String],
        working_dir: Option<&Path>,
        input: Option<Vec<u8>>,
    ) -> Result<String, EvaluatorError> {
        let mut cmd = Command::new(command);
        cmd.args(args)
            .stdin(if input.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| {
            EvaluatorError::ExecutionError(format!("Failed to spawn command '{command}': {e}"))
        })?;

        // Feed stdin from a separate thread so a chatty child cannot block on
        // a full stdout pipe while we are still writing.
        let writer = match (child.stdin.take(), input) {
            (Some(mut stdin), Some(input)) => {
                Some(thread::spawn(move || stdin.write_all(&input)))
            }
            _ => None,
        };

        let output = child.wait_with_output().map_err(|e| {
            EvaluatorError::ExecutionError(format!("Failed to wait for '{command}': {e}"))
        })?;

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Ok(Err(e)) => {
                    return Err(EvaluatorError::ExecutionError(format!(
                        "Failed to write stdin of '{command}': {e}"
                    )))
                }
                Err(_) => {
                    return Err(EvaluatorError::ExecutionError(format!(
                        "stdin writer for '{command}' panicked"
                    )))
                }
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EvaluatorError::ExecutionError(format!(
                "'{command}' exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn parse_json_lines(stdout: &str) -> Result<Vec<serde_json::Value>, EvaluatorError> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).map_err(|e| {
                EvaluatorError::OutputParseError(format!(
                    "Failed to parse JSON: {e} (line: {line})"
                ))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_lines() {
        let values = parse_json_lines("\n{\"num\":1}\n   \n{\"num\":2}\n").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[1]["num"], 2);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = parse_json_lines("{\"ok\":true}\nnot json\n");
        assert!(matches!(result, Err(EvaluatorError::OutputParseError(msg)) if msg.contains("not json")));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_echo_json() {
        let values = CommandRunner::run_json_lines(
            "echo",
            &[r#"{"type":"test","value":42}"#.to_string()],
            None,
            None,
        )
        .unwrap();

        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["type"], "test");
        assert_eq!(values[0]["value"], 42);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_pipes_stdin() {
        let out = CommandRunner::run("cat", &[], None, Some(b"{\"a\":1}\n".to_vec())).unwrap();
        assert_eq!(out, "{\"a\":1}\n");
    }

    #[test]
    fn test_run_invalid_command() {
        let result = CommandRunner::run("nonexistent-command-xyz", &[], None, None);
        assert!(
            matches!(result, Err(EvaluatorError::ExecutionError(msg)) if msg.contains("Failed to spawn command"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_run_non_zero_exit() {
        let result = CommandRunner::run("false", &[], None, None);
        assert!(matches!(result, Err(EvaluatorError::ExecutionError(msg)) if msg.contains("exited")));
    }
}
