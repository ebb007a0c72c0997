//! Recording fakes shared by the unit tests.

use crate::command::{CommandError, CommandOutput, CommandRunner, ShellCommand};
use crate::download::{DownloadHandle, DownloadManager, DownloadStatus, RpcError};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Ordered record of every call the fakes received.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

pub struct RecordingRunner {
    log: EventLog,
    failing: Vec<String>,
}

impl RecordingRunner {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            failing: Vec::new(),
        }
    }

    /// Makes every command whose rendering contains `needle` fail.
    pub fn failing_on(mut self, needle: impl Into<String>) -> Self {
        self.failing.push(needle.into());
        self
    }
}

impl CommandRunner for RecordingRunner {
    async fn execute(&self, command: &ShellCommand) -> Result<CommandOutput, CommandError> {
        let rendered = command.to_string();
        self.log.push(format!("execute {rendered}"));

        if self.failing.iter().any(|needle| rendered.contains(needle)) {
            return Err(CommandError::Failed {
                command: rendered,
                status: "exit status: 2".to_string(),
                output: String::new(),
            });
        }
        Ok(CommandOutput::default())
    }
}

struct Script {
    statuses: VecDeque<DownloadStatus>,
    artifact: PathBuf,
}

/// Download manager that answers from per-URI scripts. A URI without a
/// script completes on the first poll and yields `/downloads/<last segment>`.
pub struct FakeDownloadManager {
    log: EventLog,
    scripts: Mutex<HashMap<String, Script>>,
    submitted: Mutex<Vec<String>>,
    fail_shutdown: bool,
}

impl FakeDownloadManager {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            scripts: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            fail_shutdown: false,
        }
    }

    pub fn with_statuses(self, uri: &str, statuses: Vec<DownloadStatus>) -> Self {
        let artifact = default_artifact(uri);
        self.with_script(uri, statuses, artifact)
    }

    pub fn with_artifact(self, uri: &str, artifact: impl Into<PathBuf>) -> Self {
        self.with_script(uri, Vec::new(), artifact.into())
    }

    pub fn with_failing_shutdown(mut self) -> Self {
        self.fail_shutdown = true;
        self
    }

    fn with_script(self, uri: &str, statuses: Vec<DownloadStatus>, artifact: PathBuf) -> Self {
        self.scripts.lock().unwrap().insert(
            uri.to_string(),
            Script {
                statuses: statuses.into(),
                artifact,
            },
        );
        self
    }

    fn uri_of(&self, handle: &DownloadHandle) -> String {
        let index: usize = handle
            .as_str()
            .trim_start_matches("gid-")
            .parse()
            .expect("fake handle");
        self.submitted.lock().unwrap()[index].clone()
    }
}

fn default_artifact(uri: &str) -> PathBuf {
    PathBuf::from("/downloads").join(uri.rsplit('/').next().unwrap_or(uri))
}

impl DownloadManager for FakeDownloadManager {
    async fn submit(&self, uri: &str) -> Result<DownloadHandle, RpcError> {
        self.log.push(format!("submit {uri}"));
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(uri.to_string());
        Ok(DownloadHandle::new(format!("gid-{}", submitted.len() - 1)))
    }

    async fn poll(&self, handle: &DownloadHandle) -> Result<DownloadStatus, RpcError> {
        self.log.push(format!("poll {handle}"));
        let uri = self.uri_of(handle);
        let status = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&uri)
            .and_then(|script| script.statuses.pop_front())
            .unwrap_or(DownloadStatus::Complete);
        Ok(status)
    }

    async fn locate_artifact(&self, handle: &DownloadHandle) -> Result<PathBuf, RpcError> {
        self.log.push(format!("locate {handle}"));
        let uri = self.uri_of(handle);
        let artifact = self
            .scripts
            .lock()
            .unwrap()
            .get(&uri)
            .map(|script| script.artifact.clone())
            .unwrap_or_else(|| default_artifact(&uri));
        Ok(artifact)
    }

    async fn shutdown(&self) -> Result<(), RpcError> {
        self.log.push("shutdown");
        if self.fail_shutdown {
            return Err(RpcError::Malformed {
                method: "aria2.shutdown".to_string(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}
