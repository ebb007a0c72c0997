use super::archive::{derive_directory_name, extraction_command};
use crate::command::{CommandError, CommandRunner};
use crate::config::PackageSpec;
use crate::download::{DownloadHandle, DownloadManager, DownloadStatus, RpcError};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to download {package}: download manager reported status {status}")]
    Download {
        package: String,
        status: DownloadStatus,
    },

    #[error("Failed to extract {package}: {source}")]
    Extraction {
        package: String,
        #[source]
        source: CommandError,
    },

    #[error("Download manager protocol error while fetching {package}: {source}")]
    Protocol {
        package: String,
        #[source]
        source: RpcError,
    },

    #[error("Gave up on {package} after waiting {waited:?} for the download to finish")]
    Timeout { package: String, waited: Duration },

    #[error("Failed to create directory {path} for {package}: {source}")]
    DirectoryCreation {
        package: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FetchError {
    /// Display name of the package being processed when the error occurred.
    pub fn package(&self) -> &str {
        match self {
            Self::Download { package, .. }
            | Self::Extraction { package, .. }
            | Self::Protocol { package, .. }
            | Self::Timeout { package, .. }
            | Self::DirectoryCreation { package, .. } => package,
        }
    }
}

/// Distinguishes the top-level package list from the packages required by
/// another package. Only top-level packages are installed; there are no
/// install commands yet, so both modes currently fetch and unpack.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMode {
    Install,
    FetchOnly,
}

#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    pub poll_interval: Duration,
    /// Upper bound on how long a single download may stay active.
    pub timeout: Option<Duration>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            timeout: Some(Duration::from_secs(3600)),
        }
    }
}

async fn wait_for_completion<M: DownloadManager>(
    manager: &M,
    handle: &DownloadHandle,
    package: &str,
    options: &FetchOptions,
) -> Result<(), FetchError> {
    let started = Instant::now();
    loop {
        let status = manager
            .poll(handle)
            .await
            .map_err(|source| FetchError::Protocol {
                package: package.to_string(),
                source,
            })?;

        match status {
            DownloadStatus::Complete => return Ok(()),
            DownloadStatus::Active => {
                let waited = started.elapsed();
                if let Some(timeout) = options.timeout
                    && waited >= timeout
                {
                    return Err(FetchError::Timeout {
                        package: package.to_string(),
                        waited,
                    });
                }
                tracing::trace!(package, gid = %handle, "Download still active");
                tokio::time::sleep(options.poll_interval).await;
            }
            status => {
                tracing::warn!(
                    package,
                    gid = %handle,
                    status = status.as_str(),
                    waited = ?started.elapsed(),
                    "Download left the active state without completing"
                );
                return Err(FetchError::Download {
                    package: package.to_string(),
                    status,
                });
            }
        }
    }
}

/// Downloads and unpacks one package into `base_dir`. Returns the directory
/// its required packages go into, or `None` when it has none.
async fn fetch_package<M, R>(
    manager: &M,
    runner: &R,
    package: &PackageSpec,
    base_dir: &Path,
    mode: FetchMode,
    options: &FetchOptions,
) -> Result<Option<PathBuf>, FetchError>
where
    M: DownloadManager,
    R: CommandRunner,
{
    let name = package.display_name();
    let protocol_error = |source| FetchError::Protocol {
        package: name.to_string(),
        source,
    };

    tracing::info!(package = name, "Trying to get {}", name);
    let handle = manager
        .submit(&package.source)
        .await
        .map_err(protocol_error)?;
    wait_for_completion(manager, &handle, name, options).await?;
    let artifact = manager
        .locate_artifact(&handle)
        .await
        .map_err(protocol_error)?;
    tracing::debug!(package = name, artifact = %artifact.display(), "Downloaded");

    let explicit_dir = package
        .directory_name
        .as_ref()
        .map(|directory_name| base_dir.join(directory_name));

    let extraction = match &explicit_dir {
        Some(target) => {
            tracing::info!(package = name, "Creating directory \"{}\"", target.display());
            tokio::fs::create_dir_all(target)
                .await
                .map_err(|source| FetchError::DirectoryCreation {
                    package: name.to_string(),
                    path: target.clone(),
                    source,
                })?;
            extraction_command(&artifact, target, true)
        }
        None => extraction_command(&artifact, base_dir, false),
    };

    runner
        .execute(&extraction.explain(format!("Extracting {name}.")))
        .await
        .map_err(|source| FetchError::Extraction {
            package: name.to_string(),
            source,
        })?;

    if mode == FetchMode::Install {
        tracing::debug!(package = name, "No install commands configured");
    }

    if package.required_packages.is_empty() {
        return Ok(None);
    }

    let package_dir = match explicit_dir {
        Some(dir) => dir,
        None => {
            let derived = derive_directory_name(&artifact).ok_or_else(|| {
                protocol_error(RpcError::Malformed {
                    method: "aria2.tellStatus".to_string(),
                    reason: format!("artifact path {} has no file name", artifact.display()),
                })
            })?;
            base_dir.join(derived)
        }
    };
    Ok(Some(package_dir))
}

/// Fetches and unpacks `packages` in order, each one together with its
/// required packages before the next sibling is started.
///
/// Required packages are unpacked inside the directory of the package that
/// requires them. Directories are tracked on an explicit stack of base
/// paths, so the process working directory is never changed.
pub async fn fetch_packages<M, R>(
    manager: &M,
    runner: &R,
    packages: &[PackageSpec],
    base_dir: &Path,
    mode: FetchMode,
    options: &FetchOptions,
) -> Result<(), FetchError>
where
    M: DownloadManager,
    R: CommandRunner,
{
    let mut pending = vec![(packages.iter(), base_dir.to_path_buf(), mode)];

    while let Some((siblings, dir, mode)) = pending.last_mut() {
        let Some(package) = siblings.next() else {
            pending.pop();
            continue;
        };

        if let Some(package_dir) = fetch_package(manager, runner, package, dir, *mode, options).await? {
            tracing::debug!(
                package = package.display_name(),
                directory = %package_dir.display(),
                "Fetching {} required package(s)",
                package.required_packages.len()
            );
            pending.push((
                package.required_packages.iter(),
                package_dir,
                FetchMode::FetchOnly,
            ));
        }
    }

    Ok(())
}
