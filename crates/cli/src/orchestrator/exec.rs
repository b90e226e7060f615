// Path: crates/cli/src/orchestrator/exec.rs

use async_trait::async_trait;
use forklift_types::error::GovernanceError;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;

/// Captured result of one CLI invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs node CLI commands. Implementations must not interpret the output.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `program args...`, feeding `stdin` if given, and captures its output.
    /// Only a failure to spawn is an error; a non-zero exit is returned as output.
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, GovernanceError>;
}

/// Renders a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    let mut line = program.to_string();
    for arg in args {
        line.push(' ');
        if arg.contains(char::is_whitespace) || arg.is_empty() {
            line.push('"');
            line.push_str(arg);
            line.push('"');
        } else {
            line.push_str(arg);
        }
    }
    line
}

/// Turns a non-zero exit into [`GovernanceError::ExternalToolFailure`].
pub fn ensure_success(
    program: &str,
    args: &[String],
    output: CommandOutput,
) -> Result<CommandOutput, GovernanceError> {
    if output.success() {
        return Ok(output);
    }
    let stderr = if output.stderr.trim().is_empty() {
        output.stdout.trim().to_string()
    } else {
        output.stderr.trim().to_string()
    };
    Err(GovernanceError::ExternalToolFailure {
        command: display_command(program, args),
        code: output.code,
        stderr,
    })
}

/// [`CommandRunner`] backed by local subprocesses.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    /// Directory prepended to `PATH` for every invocation.
    tool_path: Option<PathBuf>,
}

impl ProcessRunner {
    pub fn new(tool_path: Option<PathBuf>) -> Self {
        Self { tool_path }
    }

    fn search_path(&self) -> Option<std::ffi::OsString> {
        let dir = self.tool_path.as_ref()?;
        let mut paths = vec![dir.clone()];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        std::env::join_paths(paths).ok()
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, GovernanceError> {
        let mut cmd = TokioCommand::new(program);
        cmd.args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(path) = self.search_path() {
            cmd.env("PATH", path);
        }

        tracing::debug!(target: "exec", command = %display_command(program, args), "Running");
        let spawn_failure = |e: std::io::Error| GovernanceError::ExternalToolFailure {
            command: display_command(program, args),
            code: None,
            stderr: e.to_string(),
        };
        let mut child = cmd.spawn().map_err(spawn_failure)?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input.as_bytes())
                .await
                .map_err(spawn_failure)?;
            pipe.write_all(b"\n").await.map_err(spawn_failure)?;
            // Dropping the pipe closes stdin so the child sees EOF.
        }

        let output = child.wait_with_output().await.map_err(spawn_failure)?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command_quotes_spaces() {
        let args = vec!["tx".to_string(), "Release v2".to_string(), String::new()];
        assert_eq!(display_command("simd", &args), r#"simd tx "Release v2" """#);
    }

    #[test]
    fn test_ensure_success_prefers_stderr() {
        let out = CommandOutput {
            code: Some(1),
            stdout: "partial".into(),
            stderr: "Error: key not found\n".into(),
        };
        match ensure_success("simd", &[], out) {
            Err(GovernanceError::ExternalToolFailure { code, stderr, .. }) => {
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "Error: key not found");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_captures_output_and_stdin() {
        let runner = ProcessRunner::default();
        let out = runner
            .run("cat", &[], Some("word list here"))
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "word list here");
    }

    #[tokio::test]
    async fn test_process_runner_spawn_failure() {
        let runner = ProcessRunner::default();
        let err = runner
            .run("definitely-not-a-real-binary-forklift", &[], None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GovernanceError::ExternalToolFailure { code: None, .. }
        ));
    }
}
