use eyre::{Result, bail};
use penguin_lib::config::{Config, FirstBuildPass, PackageSpec};
use penguin_lib::download::{DownloadHandle, DownloadManager, DownloadStatus, RpcError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Mutex;
use tempfile::TempDir;

pub fn create_test_config(packages: Vec<PackageSpec>) -> Config {
    Config {
        short_name: "lfs".to_string(),
        device: None,
        partitions: Vec::new(),
        build_user: None,
        first_build_pass: FirstBuildPass {
            installation_directory: "tools".into(),
            packages_directory: "sources".into(),
            packages,
        },
    }
}

pub fn setup_test_environment(config: &Config) -> Result<TempDir> {
    let temp_dir = tempfile::tempdir()?;
    write_config(temp_dir.path(), &serde_json::to_value(config)?)?;
    Ok(temp_dir)
}

pub fn write_config(dir: &Path, config: &serde_json::Value) -> Result<PathBuf> {
    let config_path = dir.join("config.json");
    std::fs::write(&config_path, serde_json::to_string_pretty(config)?)?;
    Ok(config_path)
}

/// Builds `<dir>/<archive_name>` (gzip-compressed tar) whose entries live
/// under `top_dir`, each file holding its own name.
pub fn make_archive(dir: &Path, archive_name: &str, top_dir: &str, files: &[&str]) -> Result<PathBuf> {
    let staging = dir.join(format!("{archive_name}.staging"));
    for file in files {
        let path = staging.join(top_dir).join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, file)?;
    }

    let archive = dir.join(archive_name);
    let status = Command::new("tar")
        .arg("--create")
        .arg("--gzip")
        .arg(format!("--file={}", archive.display()))
        .arg(format!("--directory={}", staging.display()))
        .arg(top_dir)
        .status()?;
    if !status.success() {
        bail!("tar failed to create {}", archive.display());
    }
    Ok(archive)
}

struct MirrorState {
    submitted: Vec<String>,
    polls: HashMap<String, usize>,
    shutdowns: usize,
}

/// Download manager serving prebuilt archives from the local disk. Every
/// download reports `active` for `active_polls` polls before completing.
pub struct LocalMirror {
    artifacts: HashMap<String, PathBuf>,
    failing: HashMap<String, String>,
    active_polls: usize,
    state: Mutex<MirrorState>,
}

impl LocalMirror {
    pub fn new(active_polls: usize) -> Self {
        Self {
            artifacts: HashMap::new(),
            failing: HashMap::new(),
            active_polls,
            state: Mutex::new(MirrorState {
                submitted: Vec::new(),
                polls: HashMap::new(),
                shutdowns: 0,
            }),
        }
    }

    pub fn serve(mut self, uri: &str, artifact: PathBuf) -> Self {
        self.artifacts.insert(uri.to_string(), artifact);
        self
    }

    pub fn fail(mut self, uri: &str, message: &str) -> Self {
        self.failing.insert(uri.to_string(), message.to_string());
        self
    }

    pub fn submitted(&self) -> Vec<String> {
        self.state.lock().unwrap().submitted.clone()
    }

    pub fn shutdowns(&self) -> usize {
        self.state.lock().unwrap().shutdowns
    }

    fn uri_of(&self, handle: &DownloadHandle) -> Result<String, RpcError> {
        let state = self.state.lock().unwrap();
        handle
            .as_str()
            .parse::<usize>()
            .ok()
            .and_then(|index| state.submitted.get(index).cloned())
            .ok_or_else(|| RpcError::Fault {
                method: "aria2.tellStatus".to_string(),
                code: 1,
                message: format!("GID {handle} is not found"),
            })
    }
}

impl DownloadManager for LocalMirror {
    async fn submit(&self, uri: &str) -> Result<DownloadHandle, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.submitted.push(uri.to_string());
        Ok(DownloadHandle::new((state.submitted.len() - 1).to_string()))
    }

    async fn poll(&self, handle: &DownloadHandle) -> Result<DownloadStatus, RpcError> {
        let uri = self.uri_of(handle)?;
        if let Some(message) = self.failing.get(&uri) {
            return Ok(DownloadStatus::Error(Some(message.clone())));
        }
        if !self.artifacts.contains_key(&uri) {
            return Ok(DownloadStatus::Error(Some("Resource not found".to_string())));
        }

        let mut state = self.state.lock().unwrap();
        let polls = state.polls.entry(uri).or_default();
        *polls += 1;
        if *polls > self.active_polls {
            Ok(DownloadStatus::Complete)
        } else {
            Ok(DownloadStatus::Active)
        }
    }

    async fn locate_artifact(&self, handle: &DownloadHandle) -> Result<PathBuf, RpcError> {
        let uri = self.uri_of(handle)?;
        self.artifacts
            .get(&uri)
            .cloned()
            .ok_or_else(|| RpcError::Malformed {
                method: "aria2.tellStatus".to_string(),
                reason: format!("{uri} has no files"),
            })
    }

    async fn shutdown(&self) -> Result<(), RpcError> {
        self.state.lock().unwrap().shutdowns += 1;
        Ok(())
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("penguin_lib=debug")
        .with_test_writer()
        .try_init();
}
