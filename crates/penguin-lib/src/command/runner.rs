use super::types::{CommandOutput, ShellCommand};
use std::future::Future;
use std::process::Stdio;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed with {status}{output}")]
    Failed {
        command: String,
        status: String,
        output: String,
    },
}

/// Executes external commands on behalf of the build steps.
///
/// Every step that shells out goes through this trait so that tests can
/// substitute a runner that records invocations instead of touching disks.
pub trait CommandRunner {
    fn execute(
        &self,
        command: &ShellCommand,
    ) -> impl Future<Output = Result<CommandOutput, CommandError>> + Send;
}

/// Runs commands as child processes of the current process.
#[derive(Clone, Debug, Default)]
pub struct SystemCommandRunner {
    /// Stream command output to the terminal instead of capturing it.
    pub verbose: bool,
    /// Discard command output entirely when streaming.
    pub quiet: bool,
    /// Extra environment variables for every spawned command.
    pub envs: Vec<(String, String)>,
}

impl SystemCommandRunner {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            envs: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }
}

fn render_failure_output(stdout: &[u8], stderr: &[u8]) -> String {
    let mut rendered = String::new();
    for stream in [stdout, stderr] {
        let text = String::from_utf8_lossy(stream);
        let text = text.trim();
        if !text.is_empty() {
            rendered.push('\n');
            rendered.push_str(text);
        }
    }
    rendered
}

impl CommandRunner for SystemCommandRunner {
    async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, CommandError> {
        if let Some(explanation) = &command.explanation {
            tracing::info!("{}", explanation);
        }
        tracing::debug!(command = %command, "Executing");

        let mut process = tokio::process::Command::new(&command.program);
        process
            .args(&command.args)
            .envs(self.envs.iter().map(|(key, value)| (key.as_str(), value.as_str())))
            .stdin(Stdio::null());

        let spawn_error = |source| CommandError::Spawn {
            command: command.to_string(),
            source,
        };

        if self.verbose {
            if self.quiet {
                process.stdout(Stdio::null()).stderr(Stdio::null());
            } else {
                process.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }

            let status = process.status().await.map_err(spawn_error)?;
            if !status.success() {
                return Err(CommandError::Failed {
                    command: command.to_string(),
                    status: status.to_string(),
                    output: String::new(),
                });
            }
            return Ok(CommandOutput::default());
        }

        let output = process.output().await.map_err(spawn_error)?;
        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                status: output.status.to_string(),
                output: render_failure_output(&output.stdout, &output.stderr),
            });
        }

        tracing::trace!(command = %command, "Finished");
        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Fails unless `program` can be found by the shell.
pub async fn require_tool<R: CommandRunner>(
    runner: &R,
    program: &str,
    explanation: &str,
) -> Result<(), CommandError> {
    let check = ShellCommand::tool_check(program, explanation);
    runner.execute(&check).await.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_runner_captures_stdout() {
        let runner = SystemCommandRunner::default();
        let output = runner
            .execute(&ShellCommand::new("sh").args(["-c", "echo penguin"]))
            .await
            .expect("echo should succeed");
        assert_eq!(output.stdout.trim(), "penguin");
    }

    #[tokio::test]
    async fn test_system_runner_reports_failure_with_output() {
        let runner = SystemCommandRunner::default();
        let err = runner
            .execute(&ShellCommand::new("sh").args(["-c", "echo broken >&2; exit 3"]))
            .await
            .expect_err("non-zero exit should fail");

        match err {
            CommandError::Failed { status, output, .. } => {
                assert!(status.contains('3'), "unexpected status: {status}");
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_system_runner_reports_missing_program() {
        let runner = SystemCommandRunner::default();
        let err = runner
            .execute(&ShellCommand::new("penguin-definitely-not-installed"))
            .await
            .expect_err("missing program should fail");
        assert!(matches!(err, CommandError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_system_runner_passes_environment() {
        let runner = SystemCommandRunner::default().with_env("PENGUIN_TEST_VALUE", "42");
        let output = runner
            .execute(&ShellCommand::new("sh").args(["-c", "echo $PENGUIN_TEST_VALUE"]))
            .await
            .expect("echo should succeed");
        assert_eq!(output.stdout.trim(), "42");
    }

    #[tokio::test]
    async fn test_require_tool() {
        let runner = SystemCommandRunner::default();
        assert!(require_tool(&runner, "sh", "Checking for sh").await.is_ok());
        assert!(
            require_tool(&runner, "penguin-definitely-not-installed", "Checking")
                .await
                .is_err()
        );
    }
}
