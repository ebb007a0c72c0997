use super::SystemError;
use nix::sys::stat::{Mode, umask};
use nix::unistd::geteuid;
use std::path::Path;

/// Fails unless the process runs with an effective user id of root.
pub fn ensure_root() -> Result<(), SystemError> {
    if !geteuid().is_root() {
        return Err(SystemError::NotRoot);
    }
    Ok(())
}

/// Sets the file creation mask to 022 and moves into `root`.
pub fn prepare_environment(root: &Path) -> Result<(), SystemError> {
    let previous = umask(Mode::from_bits_truncate(0o022));
    tracing::debug!(previous = ?previous, "Set umask to 022");

    std::env::set_current_dir(root).map_err(|source| SystemError::Environment {
        path: root.to_path_buf(),
        source,
    })?;
    tracing::info!("Working in \"{}\".", root.display());
    Ok(())
}

/// Environment every build command runs with.
pub fn build_environment(root: &Path) -> Vec<(String, String)> {
    vec![
        ("LC_ALL".to_string(), "POSIX".to_string()),
        ("LFS".to_string(), root.display().to_string()),
    ]
}
