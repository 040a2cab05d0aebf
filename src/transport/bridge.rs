use super::{Socket, SocketEvent, Transport};
use crate::auth::SharedAuthStore;
use crate::config::BridgeConfig;
use crate::error::ProtocolError;
use ahash::AHashMap;
use async_trait::async_trait;
use izumie_schema::{BridgeCall, InboundFrame, Jid, OutboundFrame};
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const FRAME_CHANNEL_CAPACITY: usize = 64;

type PendingReplies = Arc<Mutex<AHashMap<u64, oneshot::Sender<Result<Value, String>>>>>;

/// Runs the protocol library as a sidecar process speaking NDJSON frames on stdin/stdout.
///
/// Every [`Transport::connect`] spawns a new process; dropping the socket kills it.
#[derive(Debug, Clone)]
pub struct BridgeTransport {
    cfg: BridgeConfig,
}

impl BridgeTransport {
    pub fn new(cfg: BridgeConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Transport for BridgeTransport {
    async fn connect(&self, auth: SharedAuthStore) -> Result<Box<dyn Socket>, ProtocolError> {
        let mut child = Command::new(&self.cfg.program)
            .args(&self.cfg.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ProtocolError::Spawn {
                program: self.cfg.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(ProtocolError::Closed)?;
        let stdout = child.stdout.take().ok_or(ProtocolError::Closed)?;
        let stderr = child.stderr.take().ok_or(ProtocolError::Closed)?;

        info!(
            program = %self.cfg.program,
            pid = child.id().unwrap_or_default(),
            "protocol bridge started"
        );

        let (frame_tx, frame_rx) = mpsc::channel::<OutboundFrame>(FRAME_CHANNEL_CAPACITY);
        // Unbounded so a slow consumer never stops the reader from resolving replies.
        let (event_tx, event_rx) = mpsc::unbounded_channel::<SocketEvent>();
        let pending: PendingReplies = Arc::default();

        let creds = match auth.load_creds().await {
            Ok(creds) => creds,
            Err(e) => {
                warn!(error = %e, "failed to load stored credentials; starting a fresh login");
                None
            }
        };
        frame_tx
            .send(OutboundFrame::Start {
                creds,
                browser: self.cfg.browser.clone(),
            })
            .await
            .map_err(|_| ProtocolError::Closed)?;

        let tasks = vec![
            tokio::spawn(write_frames(stdin, frame_rx)),
            tokio::spawn(read_frames(
                stdout,
                auth,
                event_tx,
                frame_tx.clone(),
                pending.clone(),
            )),
            tokio::spawn(forward_stderr(stderr)),
        ];

        Ok(Box::new(BridgeSocket {
            _child: child,
            events: event_rx,
            frames: frame_tx,
            pending,
            next_id: AtomicU64::new(1),
            timeout: self.cfg.request_timeout(),
            tasks,
        }))
    }
}

struct BridgeSocket {
    _child: Child,
    events: mpsc::UnboundedReceiver<SocketEvent>,
    frames: mpsc::Sender<OutboundFrame>,
    pending: PendingReplies,
    next_id: AtomicU64,
    timeout: Duration,
    tasks: Vec<JoinHandle<()>>,
}

impl BridgeSocket {
    async fn call(&self, call: BridgeCall) -> Result<Value, ProtocolError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let method = call.method();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(id, reply_tx);

        if self
            .frames
            .send(OutboundFrame::Request { id, call })
            .await
            .is_err()
        {
            self.pending.lock().await.remove(&id);
            return Err(ProtocolError::Closed);
        }

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(ProtocolError::Timeout {
                    method,
                    elapsed: self.timeout,
                })
            }
            Ok(Err(_)) => Err(ProtocolError::Closed),
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(ProtocolError::Rejected { method, message }),
        }
    }
}

#[async_trait]
impl Socket for BridgeSocket {
    async fn next_event(&mut self) -> Option<SocketEvent> {
        self.events.recv().await
    }

    async fn request_pairing_code(&self, phone: &str) -> Result<String, ProtocolError> {
        let value = self
            .call(BridgeCall::RequestPairingCode {
                phone: phone.to_string(),
            })
            .await?;
        match value {
            Value::String(code) => Ok(code),
            other => Err(ProtocolError::Rejected {
                method: "requestPairingCode",
                message: format!("expected a string code, got {other}"),
            }),
        }
    }

    async fn send_text(&self, jid: &Jid, text: &str) -> Result<(), ProtocolError> {
        self.call(BridgeCall::SendMessage {
            jid: jid.to_string(),
            text: text.to_string(),
        })
        .await
        .map(|_| ())
    }
}

impl Drop for BridgeSocket {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn write_frames(mut stdin: ChildStdin, mut frames: mpsc::Receiver<OutboundFrame>) {
    while let Some(frame) = frames.recv().await {
        let mut line = match serde_json::to_vec(&frame) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to encode bridge frame; dropping");
                continue;
            }
        };
        line.push(b'\n');
        if let Err(e) = stdin.write_all(&line).await {
            warn!(error = %e, "bridge stdin closed");
            break;
        }
        if let Err(e) = stdin.flush().await {
            warn!(error = %e, "bridge stdin flush failed");
            break;
        }
    }
}

async fn read_frames(
    stdout: ChildStdout,
    auth: SharedAuthStore,
    events: mpsc::UnboundedSender<SocketEvent>,
    frames: mpsc::Sender<OutboundFrame>,
    pending: PendingReplies,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "bridge stdout read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let frame = match serde_json::from_str::<InboundFrame>(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, line = %line, "ignoring malformed bridge frame");
                continue;
            }
        };

        match frame {
            InboundFrame::ConnectionUpdate(update) => {
                if events.send(SocketEvent::ConnectionUpdate(update)).is_err() {
                    break;
                }
            }
            InboundFrame::CredsUpdate { creds } => {
                if events.send(SocketEvent::CredsUpdate(creds)).is_err() {
                    break;
                }
            }
            InboundFrame::KeysGet { id, category, ids } => {
                let reply = match auth.get_keys(&category, &ids).await {
                    Ok(found) => key_result(id, serde_json::to_value(found).map_err(|e| e.to_string())),
                    Err(e) => key_result(id, Err(e.to_string())),
                };
                if frames.send(reply).await.is_err() {
                    break;
                }
            }
            InboundFrame::KeysSet { id, data } => {
                let reply = match auth.mutate_keys(&data).await {
                    Ok(()) => key_result(id, Ok(Value::Null)),
                    Err(e) => {
                        warn!(error = %e, "key store write failed");
                        key_result(id, Err(e.to_string()))
                    }
                };
                if frames.send(reply).await.is_err() {
                    break;
                }
            }
            InboundFrame::Response {
                id,
                ok,
                result,
                error,
            } => {
                let Some(waiter) = pending.lock().await.remove(&id) else {
                    debug!(id, "response for unknown or expired request");
                    continue;
                };
                let outcome = if ok {
                    Ok(result.unwrap_or(Value::Null))
                } else {
                    Err(error.unwrap_or_else(|| "unspecified bridge error".to_string()))
                };
                let _ = waiter.send(outcome);
            }
        }
    }

    // Wake callers still waiting on a reply.
    pending.lock().await.clear();
    debug!("protocol bridge output ended");
}

fn key_result(id: u64, outcome: Result<Value, String>) -> OutboundFrame {
    match outcome {
        Ok(data) => OutboundFrame::KeysResult {
            id,
            ok: true,
            data: (!data.is_null()).then_some(data),
            error: None,
        },
        Err(error) => OutboundFrame::KeysResult {
            id,
            ok: false,
            data: None,
            error: Some(error),
        },
    }
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(target: "izumie::bridge", "{line}");
    }
}
