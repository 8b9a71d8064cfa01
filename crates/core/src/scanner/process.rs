//! Subprocess plumbing and failure classification for the scanner binary.

use crate::error::{Result, VigilError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use vigil_api::ScanReport;

/// Node-style spawn failure text, e.g. `spawn /path/to/grype ENOENT`.
static SPAWN_ENOENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bspawn .+ ENOENT\b").expect("spawn ENOENT pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// Turn a non-zero exit into [`VigilError::ExitCodeNonZero`], carrying the
    /// message of the last structured log record on stderr.
    pub fn into_checked(self) -> Result<Self> {
        match self.code {
            Some(0) => Ok(self),
            code => Err(VigilError::ExitCodeNonZero {
                code: code.unwrap_or(-1),
                message: exit_message(&self.stderr),
            }),
        }
    }
}

/// Run `program` to completion. The child sees only the host `PATH` plus
/// `envs`; nothing else leaks in from the caller's environment.
pub async fn run<I, S>(program: &Path, args: I, envs: &[(&str, String)]) -> Result<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .env_clear()
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(path) = std::env::var_os("PATH") {
        cmd.env("PATH", path);
    }
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let output = cmd
        .output()
        .await
        .map_err(|err| classify_spawn_error(program, err))?;

    Ok(ProcessOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

pub fn classify_spawn_error(program: &Path, err: io::Error) -> VigilError {
    if err.kind() == io::ErrorKind::NotFound || SPAWN_ENOENT.is_match(&err.to_string()) {
        VigilError::ExecutableNotFound {
            path: program.to_path_buf(),
        }
    } else {
        VigilError::Io(err)
    }
}

#[derive(Deserialize)]
struct LogRecord {
    #[serde(alias = "message")]
    msg: Option<String>,
}

/// Message to report for a failed run: the `msg` field of the last stderr
/// line when it is a JSON log record, otherwise the line itself.
pub fn exit_message(stderr: &str) -> String {
    let Some(line) = last_line(stderr) else {
        return "no error output".to_string();
    };
    match serde_json::from_str::<LogRecord>(line) {
        Ok(LogRecord { msg: Some(msg) }) => msg,
        _ => line.to_string(),
    }
}

// Prefers newline-terminated lines; an unterminated tail is only used when it
// is a whole JSON record or nothing else is available.
fn last_line(text: &str) -> Option<&str> {
    let (complete, tail) = match text.rfind('\n') {
        Some(idx) => (&text[..idx], text[idx + 1..].trim()),
        None => ("", text.trim()),
    };
    if !tail.is_empty() && serde_json::from_str::<serde_json::Value>(tail).is_ok() {
        return Some(tail);
    }
    complete
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .or_else(|| (!tail.is_empty()).then_some(tail))
}

pub fn parse_report(stdout: &str) -> Result<ScanReport> {
    serde_json::from_str(stdout).map_err(|e| VigilError::MalformedOutput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_enoent_message_is_executable_not_found() {
        let err = io::Error::other("spawn /home/me/.vigil/grype ENOENT");
        let classified = classify_spawn_error(Path::new("/home/me/.vigil/grype"), err);
        match classified {
            VigilError::ExecutableNotFound { path } => {
                assert_eq!(path, Path::new("/home/me/.vigil/grype"))
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_not_found_kind_is_executable_not_found() {
        let err = io::Error::from(io::ErrorKind::NotFound);
        assert!(matches!(
            classify_spawn_error(Path::new("grype"), err),
            VigilError::ExecutableNotFound { .. }
        ));
    }

    #[test]
    fn test_other_spawn_errors_stay_io() {
        let err = io::Error::from(io::ErrorKind::PermissionDenied);
        assert!(matches!(
            classify_spawn_error(Path::new("grype"), err),
            VigilError::Io(_)
        ));
    }

    #[test]
    fn test_exit_message_reads_last_record() {
        let stderr = "{\"level\":\"info\",\"msg\":\"loading db\"}\n{\"level\":\"error\",\"msg\":\"db locked\"}\n";
        assert_eq!(exit_message(stderr), "db locked");
    }

    #[test]
    fn test_exit_message_skips_partial_tail() {
        let stderr = "{\"msg\":\"db locked\"}\n{\"msg\":\"trunc";
        assert_eq!(exit_message(stderr), "db locked");
    }

    #[test]
    fn test_exit_message_falls_back_to_raw_line() {
        assert_eq!(exit_message("panic: boom\n\n"), "panic: boom");
        assert_eq!(exit_message(""), "no error output");
    }

    #[test]
    fn test_nonzero_exit_is_classified() {
        let output = ProcessOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "{\"msg\":\"db locked\"}\n".to_string(),
        };
        match output.into_checked() {
            Err(VigilError::ExitCodeNonZero { code, message }) => {
                assert_eq!(code, 1);
                assert_eq!(message, "db locked");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_signal_exit_has_negative_code() {
        let output = ProcessOutput {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert!(matches!(
            output.into_checked(),
            Err(VigilError::ExitCodeNonZero { code: -1, .. })
        ));
    }

    #[test]
    fn test_malformed_output() {
        assert!(matches!(
            parse_report("not json"),
            Err(VigilError::MalformedOutput(_))
        ));
        assert!(matches!(
            parse_report("{\"matches\": 3}"),
            Err(VigilError::MalformedOutput(_))
        ));
        assert!(parse_report("{\"matches\": []}").unwrap().is_empty());
    }
}
