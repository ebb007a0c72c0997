mod aria2;
mod manager;
mod types;

pub use aria2::{Aria2Client, DEFAULT_RPC_PORT, launch_command};
pub use manager::DownloadManager;
pub use types::{DownloadHandle, DownloadStatus, RpcError};
