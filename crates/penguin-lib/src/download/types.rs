use std::fmt;
use thiserror::Error;

/// Identifier of one in-flight download (an aria2 GID).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DownloadHandle(String);

impl DownloadHandle {
    pub fn new(gid: impl Into<String>) -> Self {
        Self(gid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DownloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadStatus {
    Active,
    Complete,
    /// The manager gave up on the download, with its reason if it reported one.
    Error(Option<String>),
    /// Any status the fetcher does not wait on (`waiting`, `paused`, `removed`, ...).
    Other(String),
}

impl DownloadStatus {
    pub fn parse(status: &str, error_message: Option<String>) -> Self {
        match status {
            "active" => Self::Active,
            "complete" => Self::Complete,
            "error" => Self::Error(error_message.filter(|message| !message.is_empty())),
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::Complete => "complete",
            Self::Error(_) => "error",
            Self::Other(status) => status,
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(Some(message)) => write!(f, "error ({message})"),
            status => f.write_str(status.as_str()),
        }
    }
}

#[derive(Error, Debug)]
pub enum RpcError {
    #[error("Download manager request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download manager rejected {method}: {message} (code {code})")]
    Fault {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Malformed reply to {method}: {reason}")]
    Malformed { method: String, reason: String },

    #[error("Download {handle} is not complete yet (status: {status})")]
    NotComplete {
        handle: DownloadHandle,
        status: DownloadStatus,
    },
}
