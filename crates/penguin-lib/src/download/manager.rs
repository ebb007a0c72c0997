use super::types::{DownloadHandle, DownloadStatus, RpcError};
use std::future::Future;
use std::path::PathBuf;

/// An asynchronous download service that runs outside this process.
///
/// None of the operations block on the download itself: callers submit a
/// URI, poll its status on their own schedule and ask for the artifact once
/// the status is [`DownloadStatus::Complete`].
pub trait DownloadManager {
    /// Enqueues a download of `uri`.
    fn submit(&self, uri: &str) -> impl Future<Output = Result<DownloadHandle, RpcError>> + Send;

    /// Reports the current state of a submitted download.
    fn poll(
        &self,
        handle: &DownloadHandle,
    ) -> impl Future<Output = Result<DownloadStatus, RpcError>> + Send;

    /// Path of the first file retrieved for a completed download.
    ///
    /// Fails with [`RpcError::NotComplete`] when the download has not finished.
    fn locate_artifact(
        &self,
        handle: &DownloadHandle,
    ) -> impl Future<Output = Result<PathBuf, RpcError>> + Send;

    /// Asks the service to terminate.
    fn shutdown(&self) -> impl Future<Output = Result<(), RpcError>> + Send;
}
