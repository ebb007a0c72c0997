use crate::command::{CommandRunner, require_tool};
use crate::config::PackageSpec;
use crate::download::{Aria2Client, DEFAULT_RPC_PORT, DownloadManager, launch_command};
use crate::error::PenguinError;
use crate::fetch::{FetchError, FetchMode, FetchOptions, fetch_packages};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the first build pass installs the toolchain and keeps its sources.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainLayout {
    pub installation_dir: PathBuf,
    pub packages_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct ManagerSettings {
    pub rpc_port: u16,
    pub rpc_secret: Option<String>,
    /// Time the manager gets to open its RPC endpoint before the first call.
    pub startup_delay: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            rpc_port: DEFAULT_RPC_PORT,
            rpc_secret: None,
            startup_delay: Duration::from_secs(2),
        }
    }
}

async fn create_directory(path: &Path) -> Result<(), PenguinError> {
    tracing::info!("Creating directory \"{}\".", path.display());
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| PenguinError::DirectoryCreation {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

pub async fn prepare_directories(layout: &ToolchainLayout) -> Result<(), PenguinError> {
    create_directory(&layout.installation_dir).await?;
    create_directory(&layout.packages_dir).await
}

/// Fetches `packages` into `base_dir` through a running manager and shuts
/// the manager down afterwards, whether or not the fetch succeeded.
pub async fn fetch_with_manager<M, R>(
    manager: &M,
    runner: &R,
    packages: &[PackageSpec],
    base_dir: &Path,
    options: &FetchOptions,
) -> Result<(), FetchError>
where
    M: DownloadManager,
    R: CommandRunner,
{
    let outcome = fetch_packages(
        manager,
        runner,
        packages,
        base_dir,
        FetchMode::Install,
        options,
    )
    .await;

    match manager.shutdown().await {
        Ok(()) => tracing::debug!("Download manager stopped"),
        Err(e) => tracing::warn!("Failed to stop the download manager: {}", e),
    }

    if let Err(e) = &outcome {
        tracing::error!(package = e.package(), "{}", e);
    }
    outcome
}

/// Runs the toolchain step of the first build pass: prepares its
/// directories, starts `aria2c`, fetches every package and stops `aria2c`.
pub async fn run_toolchain_step<R: CommandRunner>(
    runner: &R,
    layout: &ToolchainLayout,
    packages: &[PackageSpec],
    manager_settings: &ManagerSettings,
    fetch_options: &FetchOptions,
) -> Result<(), PenguinError> {
    prepare_directories(layout).await?;

    let client = Aria2Client::new(manager_settings.rpc_port, manager_settings.rpc_secret.clone())?;

    require_tool(runner, "aria2c", "Checking if aria2 is installed.").await?;
    runner
        .execute(&launch_command(
            manager_settings.rpc_port,
            &layout.packages_dir,
            manager_settings.rpc_secret.as_deref(),
        ))
        .await?;
    tokio::time::sleep(manager_settings.startup_delay).await;

    tracing::info!(
        "Fetching {} package(s) into \"{}\".",
        packages.len(),
        layout.packages_dir.display()
    );
    fetch_with_manager(
        &client,
        runner,
        packages,
        &layout.packages_dir,
        fetch_options,
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::download::DownloadStatus;
    use crate::testing::{EventLog, FakeDownloadManager, RecordingRunner};

    fn options() -> FetchOptions {
        FetchOptions {
            poll_interval: Duration::from_millis(1),
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[tokio::test]
    async fn test_manager_is_shut_down_after_success() {
        let log = EventLog::default();
        let manager = FakeDownloadManager::new(log.clone());
        let runner = RecordingRunner::new(log.clone());

        fetch_with_manager(
            &manager,
            &runner,
            &[PackageSpec::new("http://x/a.tar.gz")],
            Path::new("/work"),
            &options(),
        )
        .await
        .expect("fetch should succeed");

        assert_eq!(log.events().last().map(String::as_str), Some("shutdown"));
    }

    #[tokio::test]
    async fn test_manager_is_shut_down_after_failure() {
        let log = EventLog::default();
        let manager = FakeDownloadManager::new(log.clone())
            .with_statuses("http://x/a.tar.gz", vec![DownloadStatus::Error(None)]);
        let runner = RecordingRunner::new(log.clone());

        let err = fetch_with_manager(
            &manager,
            &runner,
            &[PackageSpec::new("http://x/a.tar.gz")],
            Path::new("/work"),
            &options(),
        )
        .await
        .expect_err("fetch should fail");

        assert!(matches!(err, FetchError::Download { .. }));
        assert_eq!(log.events().last().map(String::as_str), Some("shutdown"));
    }

    #[tokio::test]
    async fn test_shutdown_failure_does_not_hide_success() {
        let log = EventLog::default();
        let manager = FakeDownloadManager::new(log.clone()).with_failing_shutdown();
        let runner = RecordingRunner::new(log.clone());

        fetch_with_manager(
            &manager,
            &runner,
            &[PackageSpec::new("http://x/a.tar.gz")],
            Path::new("/work"),
            &options(),
        )
        .await
        .expect("shutdown failure is not fatal");
    }

    #[tokio::test]
    async fn test_prepare_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let layout = ToolchainLayout {
            installation_dir: temp_dir.path().join("lfs/tools"),
            packages_dir: temp_dir.path().join("lfs/sources"),
        };

        prepare_directories(&layout).await.expect("directories");

        assert!(layout.installation_dir.is_dir());
        assert!(layout.packages_dir.is_dir());
    }

    #[tokio::test]
    async fn test_toolchain_step_stops_when_aria2_is_missing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log = EventLog::default();
        let runner = RecordingRunner::new(log.clone()).failing_on("command -v aria2c");
        let layout = ToolchainLayout {
            installation_dir: temp_dir.path().join("tools"),
            packages_dir: temp_dir.path().join("sources"),
        };

        let err = run_toolchain_step(
            &runner,
            &layout,
            &[PackageSpec::new("http://x/a.tar.gz")],
            &ManagerSettings::default(),
            &options(),
        )
        .await
        .expect_err("aria2c is missing");

        assert!(matches!(err, PenguinError::Command(_)));
        assert!(!log.events().iter().any(|event| event.contains("--enable-rpc")));
    }
}
