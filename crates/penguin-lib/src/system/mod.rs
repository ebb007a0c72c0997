mod disk;
mod environment;
mod user;

pub use disk::{
    FileSystemKind, confirm_destructive_operation, partition_device, partition_disk,
    plan_partitioning, resolve_file_system,
};
pub use environment::{build_environment, ensure_root, prepare_environment};
pub use user::{
    PASSWD_PATH, UserIds, drop_privileges, find_user_ids, get_or_create_user, hand_over,
};

use crate::command::CommandError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SystemError {
    #[error("This script must be run as root.")]
    NotRoot,

    #[error("Repartitioning of \"{device}\" was not confirmed")]
    NotConfirmed { device: String },

    #[error("Failed to ask for confirmation: {0}")]
    Prompt(#[source] std::io::Error),

    #[error("The Root partition needs a \"file system\"")]
    MissingFileSystem,

    #[error("Unsupported Root file system {file_system:?}, expected ext4 or btrfs")]
    UnsupportedFileSystem { file_system: String },

    #[error("Failed to read users from {path}: {source}")]
    UserLookup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create the build user {user:?}")]
    UserCreation { user: String },

    #[error("Failed to change the owner of {path}: {source}")]
    Ownership {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("Failed to drop privileges: {0}")]
    Privileges(#[source] nix::Error),

    #[error("Failed to enter {path}: {source}")]
    Environment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Command(#[from] CommandError),
}
