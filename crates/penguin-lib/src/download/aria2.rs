use super::manager::DownloadManager;
use super::types::{DownloadHandle, DownloadStatus, RpcError};
use crate::command::ShellCommand;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

pub const DEFAULT_RPC_PORT: u16 = 6800;

const STATUS_KEYS: [&str; 3] = ["status", "errorMessage", "files"];

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Vec<Value>,
}

#[derive(Deserialize)]
struct RpcReply<T> {
    result: Option<T>,
    error: Option<RpcFault>,
}

#[derive(Deserialize)]
struct RpcFault {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusReply {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    files: Vec<FileReply>,
}

#[derive(Deserialize)]
struct FileReply {
    path: String,
}

fn decode_reply<T: DeserializeOwned>(method: &str, body: &[u8]) -> Result<T, RpcError> {
    let reply: RpcReply<T> = serde_json::from_slice(body).map_err(|e| RpcError::Malformed {
        method: method.to_string(),
        reason: e.to_string(),
    })?;

    match reply {
        RpcReply {
            error: Some(fault), ..
        } => Err(RpcError::Fault {
            method: method.to_string(),
            code: fault.code,
            message: fault.message,
        }),
        RpcReply {
            result: Some(result),
            ..
        } => Ok(result),
        RpcReply { .. } => Err(RpcError::Malformed {
            method: method.to_string(),
            reason: "reply carries neither a result nor an error".to_string(),
        }),
    }
}

fn first_file(handle: &DownloadHandle, reply: StatusReply) -> Result<PathBuf, RpcError> {
    let status = DownloadStatus::parse(&reply.status, reply.error_message);
    if status != DownloadStatus::Complete {
        return Err(RpcError::NotComplete {
            handle: handle.clone(),
            status,
        });
    }

    reply
        .files
        .into_iter()
        .map(|file| file.path)
        .find(|path| !path.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| RpcError::Malformed {
            method: "aria2.tellStatus".to_string(),
            reason: format!("download {handle} reports no files"),
        })
}

/// Client for the JSON-RPC interface of a running `aria2c`.
pub struct Aria2Client {
    http: reqwest::Client,
    endpoint: String,
    secret: Option<String>,
    next_id: AtomicU64,
}

impl Aria2Client {
    pub fn new(port: u16, secret: Option<String>) -> Result<Self, RpcError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            endpoint: format!("http://127.0.0.1:{port}/jsonrpc"),
            secret,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Vec<Value>,
    ) -> Result<T, RpcError> {
        let mut full_params = Vec::with_capacity(params.len() + 1);
        if let Some(secret) = &self.secret {
            full_params.push(Value::String(format!("token:{secret}")));
        }
        full_params.extend(params);

        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params: full_params,
        };
        tracing::trace!(method, endpoint = %self.endpoint, "Calling download manager");

        // aria2 reports faults with a non-2xx status and a JSON-RPC error body.
        let body = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .bytes()
            .await?;

        decode_reply(method, &body)
    }

    async fn tell_status(&self, handle: &DownloadHandle) -> Result<StatusReply, RpcError> {
        self.call(
            "aria2.tellStatus",
            vec![json!(handle.as_str()), json!(STATUS_KEYS)],
        )
        .await
    }
}

impl DownloadManager for Aria2Client {
    async fn submit(&self, uri: &str) -> Result<DownloadHandle, RpcError> {
        let gid: String = self.call("aria2.addUri", vec![json!([uri])]).await?;
        tracing::debug!(uri, gid = %gid, "Download submitted");
        Ok(DownloadHandle::new(gid))
    }

    async fn poll(&self, handle: &DownloadHandle) -> Result<DownloadStatus, RpcError> {
        let reply = self.tell_status(handle).await?;
        Ok(DownloadStatus::parse(&reply.status, reply.error_message))
    }

    async fn locate_artifact(&self, handle: &DownloadHandle) -> Result<PathBuf, RpcError> {
        let reply = self.tell_status(handle).await?;
        first_file(handle, reply)
    }

    async fn shutdown(&self) -> Result<(), RpcError> {
        let _: String = self.call("aria2.shutdown", Vec::new()).await?;
        Ok(())
    }
}

/// Command that starts `aria2c` as a detached RPC daemon writing into `download_dir`.
pub fn launch_command(port: u16, download_dir: &Path, secret: Option<&str>) -> ShellCommand {
    let mut command = ShellCommand::new("aria2c")
        .args([
            "--enable-rpc=true".to_string(),
            format!("--rpc-listen-port={port}"),
            "--rpc-listen-all=false".to_string(),
            "--daemon=true".to_string(),
            "--auto-file-renaming=false".to_string(),
            "--allow-overwrite=true".to_string(),
            format!("--dir={}", download_dir.display()),
        ])
        .explain(format!(
            "Starting the download manager on port {port} (downloads go to \"{}\").",
            download_dir.display()
        ));

    if let Some(secret) = secret {
        command = command.arg(format!("--rpc-secret={secret}"));
    }
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_reply_returns_result() {
        let gid: String = decode_reply(
            "aria2.addUri",
            br#"{"id":1,"jsonrpc":"2.0","result":"2089b05ecca3d829"}"#,
        )
        .expect("valid reply");
        assert_eq!(gid, "2089b05ecca3d829");
    }

    #[test]
    fn test_decode_reply_surfaces_fault() {
        let err = decode_reply::<String>(
            "aria2.tellStatus",
            br#"{"id":2,"jsonrpc":"2.0","error":{"code":1,"message":"GID 0 is not found"}}"#,
        )
        .expect_err("fault reply");

        match err {
            RpcError::Fault {
                method,
                code,
                message,
            } => {
                assert_eq!(method, "aria2.tellStatus");
                assert_eq!(code, 1);
                assert_eq!(message, "GID 0 is not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_reply_rejects_garbage() {
        let err = decode_reply::<String>("aria2.addUri", b"<html>nope</html>").expect_err("garbage");
        assert!(matches!(err, RpcError::Malformed { .. }));
    }

    #[test]
    fn test_decode_reply_rejects_empty_envelope() {
        let err =
            decode_reply::<String>("aria2.addUri", br#"{"id":1,"jsonrpc":"2.0"}"#).expect_err("empty");
        assert!(matches!(err, RpcError::Malformed { .. }));
    }

    #[test]
    fn test_status_reply_maps_to_download_status() {
        let reply: StatusReply = decode_reply(
            "aria2.tellStatus",
            br#"{"id":3,"jsonrpc":"2.0","result":{"status":"error","errorMessage":"Resource not found","files":[]}}"#,
        )
        .expect("valid reply");
        assert_eq!(
            DownloadStatus::parse(&reply.status, reply.error_message),
            DownloadStatus::Error(Some("Resource not found".to_string()))
        );
    }

    #[test]
    fn test_first_file_of_completed_download() {
        let reply: StatusReply = decode_reply(
            "aria2.tellStatus",
            br#"{"id":4,"jsonrpc":"2.0","result":{"status":"complete","files":[{"index":"1","path":"/mnt/lfs/sources/binutils-2.21.tar.bz2"}]}}"#,
        )
        .expect("valid reply");

        let path = first_file(&DownloadHandle::new("abc"), reply).expect("complete download");
        assert_eq!(path, PathBuf::from("/mnt/lfs/sources/binutils-2.21.tar.bz2"));
    }

    #[test]
    fn test_first_file_before_completion_is_an_error() {
        let reply = StatusReply {
            status: "active".to_string(),
            error_message: None,
            files: vec![FileReply {
                path: "/tmp/partial".to_string(),
            }],
        };

        let err = first_file(&DownloadHandle::new("abc"), reply).expect_err("not complete");
        assert!(matches!(
            err,
            RpcError::NotComplete {
                status: DownloadStatus::Active,
                ..
            }
        ));
    }

    #[test]
    fn test_first_file_without_files_is_malformed() {
        let reply = StatusReply {
            status: "complete".to_string(),
            error_message: None,
            files: Vec::new(),
        };

        let err = first_file(&DownloadHandle::new("abc"), reply).expect_err("no files");
        assert!(matches!(err, RpcError::Malformed { .. }));
    }

    #[test]
    fn test_launch_command() {
        let command = launch_command(6800, Path::new("/mnt/lfs/sources"), None);
        assert_eq!(
            command.to_string(),
            "aria2c --enable-rpc=true --rpc-listen-port=6800 --rpc-listen-all=false \
             --daemon=true --auto-file-renaming=false --allow-overwrite=true \
             --dir=/mnt/lfs/sources"
        );
    }

    #[test]
    fn test_launch_command_with_secret() {
        let command = launch_command(6801, Path::new("/tmp"), Some("hunter2"));
        assert_eq!(command.args.last().map(String::as_str), Some("--rpc-secret=hunter2"));
    }

    #[test]
    fn test_client_endpoint() {
        let client = Aria2Client::new(6800, None).expect("client");
        assert_eq!(client.endpoint(), "http://127.0.0.1:6800/jsonrpc");
    }
}
