//! JSON-RPC client side of the Language Server Protocol.
//!
//! A background task owns the server's output stream. It routes responses
//! to the request that is waiting for them, answers the few requests a
//! server sends to its client, and counts published diagnostics so a
//! session can tell when the first analysis pass finished.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::codec::{read_message, write_message};
use crate::error::{HelperError, Result};

type Pending = Arc<Mutex<HashMap<i64, oneshot::Sender<Result<Value>>>>>;
type SharedWriter = Arc<tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>>;

#[derive(Debug, Clone)]
pub struct LspClientOptions {
    /// Answer for `workspace/configuration`, looked up by section.
    pub settings: Value,
    pub request_timeout: Duration,
}

pub struct LspClient {
    writer: SharedWriter,
    pending: Pending,
    next_id: AtomicI64,
    diagnostics: watch::Receiver<u64>,
    request_timeout: Duration,
    reader_task: JoinHandle<()>,
    child: Option<Child>,
    stderr_task: Option<JoinHandle<()>>,
}

impl LspClient {
    /// Attach to a server through an already open pair of streams.
    pub fn connect<R, W>(reader: R, writer: W, options: LspClientOptions) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer: SharedWriter = Arc::new(tokio::sync::Mutex::new(Box::new(writer)));
        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let (diagnostics_tx, diagnostics_rx) = watch::channel(0u64);

        let reader_task = tokio::spawn(reader_loop(
            BufReader::new(reader),
            Arc::clone(&writer),
            Arc::clone(&pending),
            diagnostics_tx,
            options.settings,
        ));

        Self {
            writer,
            pending,
            next_id: AtomicI64::new(1),
            diagnostics: diagnostics_rx,
            request_timeout: options.request_timeout,
            reader_task,
            child: None,
            stderr_task: None,
        }
    }

    /// Start `command` in `cwd` and talk to it over its stdio.
    pub fn spawn(command: &[String], cwd: &Path, options: LspClientOptions) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| HelperError::Config("language server command is empty".to_string()))?;

        info!(command = %command.join(" "), cwd = %cwd.display(), "starting language server");

        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HelperError::Lsp(format!("failed to start '{}': {}", program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HelperError::Lsp("failed to capture server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HelperError::Lsp("failed to capture server stdout".to_string()))?;

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(target: "lsp_stderr", "{}", line);
                }
            })
        });

        let mut client = Self::connect(stdout, stdin, options);
        client.child = Some(child);
        client.stderr_task = stderr_task;
        Ok(client)
    }

    /// Send a request and wait for its result.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending_table()?.insert(id, tx);

        let mut message = Map::new();
        message.insert("jsonrpc".to_string(), json!("2.0"));
        message.insert("id".to_string(), json!(id));
        message.insert("method".to_string(), json!(method));
        if !params.is_null() {
            message.insert("params".to_string(), params);
        }

        debug!(id, method, "-> request");
        if let Err(e) = self.send(&Value::Object(message)).await {
            self.forget(id);
            return Err(e);
        }

        match tokio::time::timeout(self.request_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(HelperError::Lsp(format!(
                "language server exited before answering {}",
                method
            ))),
            Err(_) => {
                self.forget(id);
                Err(HelperError::Timeout(format!("'{}' response", method)))
            }
        }
    }

    /// Send a notification (no response expected).
    pub async fn notify(&self, method: &str, params: Value) -> Result<()> {
        debug!(method, "-> notification");
        let mut message = Map::new();
        message.insert("jsonrpc".to_string(), json!("2.0"));
        message.insert("method".to_string(), json!(method));
        if !params.is_null() {
            message.insert("params".to_string(), params);
        }
        self.send(&Value::Object(message)).await
    }

    /// Number of `textDocument/publishDiagnostics` notifications seen.
    pub fn diagnostics_count(&self) -> u64 {
        *self.diagnostics.borrow()
    }

    /// Wait until the server has published diagnostics at least once.
    pub async fn wait_for_diagnostics(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.diagnostics.clone();
        // The watch guard borrows `rx`; release it before matching.
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|count| *count > 0))
            .await
            .map(|seen| seen.map(|_| ()));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(HelperError::Lsp(
                "language server exited during startup".to_string(),
            )),
            Err(_) => Err(HelperError::Timeout(
                "language server initialization".to_string(),
            )),
        }
    }

    /// `shutdown` request, `exit` notification, then make sure the process
    /// is gone.
    pub async fn shutdown(mut self) -> Result<()> {
        let result = self.request("shutdown", Value::Null).await;
        if let Err(e) = &result {
            warn!(error = %e, "language server did not acknowledge shutdown");
        }
        if let Err(e) = self.notify("exit", Value::Null).await {
            debug!(error = %e, "failed to send exit notification");
        }

        if let Some(mut child) = self.child.take() {
            match tokio::time::timeout(Duration::from_secs(1), child.wait()).await {
                Ok(Ok(status)) => debug!(%status, "language server exited"),
                _ => {
                    warn!("language server still running, killing it");
                    if let Err(e) = child.kill().await {
                        error!(error = %e, "failed to kill language server");
                    }
                }
            }
        }

        self.reader_task.abort();
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
        info!("language server shut down");
        result.map(|_| ())
    }

    async fn send(&self, message: &Value) -> Result<()> {
        let mut writer = self.writer.lock().await;
        write_message(&mut *writer, message).await
    }

    fn pending_table(&self) -> Result<std::sync::MutexGuard<'_, HashMap<i64, oneshot::Sender<Result<Value>>>>> {
        self.pending
            .lock()
            .map_err(|_| HelperError::Lsp("pending request table poisoned".to_string()))
    }

    fn forget(&self, id: i64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }
}

impl Drop for LspClient {
    fn drop(&mut self) {
        self.reader_task.abort();
        if let Some(task) = self.stderr_task.take() {
            task.abort();
        }
    }
}

async fn reader_loop<R>(
    mut reader: BufReader<R>,
    writer: SharedWriter,
    pending: Pending,
    diagnostics: watch::Sender<u64>,
    settings: Value,
) where
    R: AsyncRead + Unpin,
{
    loop {
        let message = match read_message(&mut reader).await {
            Ok(Some(message)) => message,
            Ok(None) => {
                debug!("language server closed its output");
                break;
            }
            Err(e) => {
                warn!(error = %e, "failed to read from language server");
                break;
            }
        };

        let method = message.get("method").and_then(Value::as_str);
        match (message.get("id"), method) {
            (Some(id), Some(method)) => {
                debug!(%id, method, "<- server request");
                let result = server_request_result(method, message.get("params"), &settings);
                let response = json!({"jsonrpc": "2.0", "id": id, "result": result});
                let mut writer = writer.lock().await;
                if let Err(e) = write_message(&mut *writer, &response).await {
                    warn!(error = %e, method, "failed to answer server request");
                }
            }
            (None, Some(method)) => handle_notification(method, message.get("params"), &diagnostics),
            (Some(id), None) => complete_request(&pending, id, &message),
            (None, None) => debug!("ignoring message without id or method"),
        }
    }

    if let Ok(mut pending) = pending.lock() {
        for (_, tx) in pending.drain() {
            let _ = tx.send(Err(HelperError::Lsp("language server exited".to_string())));
        }
    }
}

fn complete_request(pending: &Pending, id: &Value, message: &Value) {
    let Some(id) = id.as_i64() else {
        debug!(%id, "response with foreign id");
        return;
    };
    let Some(tx) = pending.lock().ok().and_then(|mut p| p.remove(&id)) else {
        debug!(id, "response for unknown or expired request");
        return;
    };

    let outcome = match message.get("error") {
        Some(error) => Err(HelperError::Lsp(format!(
            "{} (code {})",
            error.get("message").and_then(Value::as_str).unwrap_or("unknown error"),
            error.get("code").cloned().unwrap_or(Value::Null)
        ))),
        None => Ok(message.get("result").cloned().unwrap_or(Value::Null)),
    };
    debug!(id, ok = outcome.is_ok(), "<- response");
    let _ = tx.send(outcome);
}

fn handle_notification(method: &str, params: Option<&Value>, diagnostics: &watch::Sender<u64>) {
    match method {
        "window/logMessage" | "window/showMessage" => {
            let level = params.and_then(|p| p.get("type")).and_then(Value::as_i64).unwrap_or(4);
            let text = params
                .and_then(|p| p.get("message"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            match level {
                1 => error!(target: "lsp_server", "{}", text),
                2 => warn!(target: "lsp_server", "{}", text),
                3 => info!(target: "lsp_server", "{}", text),
                _ => debug!(target: "lsp_server", "{}", text),
            }
        }
        "textDocument/publishDiagnostics" => {
            diagnostics.send_modify(|count| *count += 1);
            let uri = params
                .and_then(|p| p.get("uri"))
                .and_then(Value::as_str)
                .unwrap_or_default();
            debug!(uri, "<- diagnostics");
        }
        other => debug!(method = other, "<- notification"),
    }
}

/// Result sent back for a server-to-client request.
pub fn server_request_result(method: &str, params: Option<&Value>, settings: &Value) -> Value {
    match method {
        "workspace/configuration" => {
            let items = params
                .and_then(|p| p.get("items"))
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            Value::Array(
                items
                    .iter()
                    .map(|item| match item.get("section").and_then(Value::as_str) {
                        Some(section) => settings_section(settings, section),
                        None => settings.clone(),
                    })
                    .collect(),
            )
        }
        // client/registerCapability, window/workDoneProgress/create, ...
        _ => Value::Null,
    }
}

/// Look up a dotted section (`python.analysis`) in the settings object.
pub fn settings_section(settings: &Value, section: &str) -> Value {
    section
        .split('.')
        .try_fold(settings, |value, key| value.get(key))
        .cloned()
        .unwrap_or(Value::Null)
}
