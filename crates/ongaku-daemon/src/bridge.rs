//! Socket to the in-browser bridge.
//!
//! The bridge script connects to this socket and answers tab-enumeration and
//! page-capture requests. Requests and replies are correlated by `seq`; each
//! request gets at most one reply, and a request whose reply never arrives is
//! abandoned after a timeout, not cancelled.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use ongaku_scrape::PageSnapshot;

use crate::frame::{self, FrameError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// One open browser tab, as enumerated by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: u64,
    pub url: String,
    pub title: String,
}

/// Requests sent to the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "camelCase")]
pub enum BridgeCommand {
    ListTabs,
    CaptureTab { id: u64 },
    CaptureActive,
}

/// Replies from the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BridgeEvent {
    Tabs { tabs: Vec<TabInfo> },
    Page { page: Option<PageSnapshot> },
}

#[derive(Debug, Serialize, Deserialize)]
struct CommandFrame {
    seq: u64,
    #[serde(flatten)]
    cmd: BridgeCommand,
}

#[derive(Debug, Serialize, Deserialize)]
struct EventFrame {
    seq: u64,
    #[serde(flatten)]
    event: BridgeEvent,
}

#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("no browser bridge connected")]
    NotConnected,

    #[error("bridge request timed out")]
    Timeout,

    #[error("bridge connection closed")]
    Closed,

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Source of tabs and page snapshots. The live implementation talks to the
/// browser bridge; tests supply fixtures.
pub trait TabProvider: Send + Sync {
    /// All open tabs, in the browser's enumeration order.
    fn list_tabs(&self) -> impl Future<Output = Result<Vec<TabInfo>, BridgeError>> + Send;

    /// Capture a snapshot of one tab. `None` when the tab is gone.
    fn capture_tab(
        &self,
        id: u64,
    ) -> impl Future<Output = Result<Option<PageSnapshot>, BridgeError>> + Send;

    /// Capture a snapshot of the active tab.
    fn capture_active(
        &self,
    ) -> impl Future<Output = Result<Option<PageSnapshot>, BridgeError>> + Send;
}

#[derive(Clone, Default)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

#[derive(Default)]
struct BridgeInner {
    conn: RwLock<Option<mpsc::Sender<Vec<u8>>>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<BridgeEvent>>>,
    seq: AtomicU64,
}

impl Bridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept loop for the bridge socket. The newest connection wins.
    pub fn spawn_listener(&self, port: u16) -> tokio::task::JoinHandle<()> {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            let addr = format!("127.0.0.1:{port}");
            let listener = match TcpListener::bind(&addr).await {
                Ok(l) => l,
                Err(e) => {
                    error!("failed to bind bridge socket {addr}: {e}");
                    return;
                }
            };
            info!("bridge socket listening at {addr}");

            loop {
                match listener.accept().await {
                    Ok((stream, peer)) => {
                        info!("browser bridge connected from {peer}");
                        let (tx, rx) = mpsc::channel::<Vec<u8>>(32);
                        *inner.conn.write().await = Some(tx);

                        let inner = inner.clone();
                        tokio::spawn(async move {
                            handle_bridge(&inner, stream, rx).await;
                            info!("browser bridge disconnected");
                            let mut conn = inner.conn.write().await;
                            // A replacement connection may already be in place.
                            if conn.as_ref().is_some_and(|tx| tx.is_closed()) {
                                *conn = None;
                            }
                        });
                    }
                    Err(e) => warn!("bridge accept failed: {e}"),
                }
            }
        })
    }

    async fn request(&self, cmd: BridgeCommand) -> Result<BridgeEvent, BridgeError> {
        let tx = self
            .inner
            .conn
            .read()
            .await
            .clone()
            .ok_or(BridgeError::NotConnected)?;

        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        let (reply_tx, reply_rx) = oneshot::channel();
        self.inner.pending.lock().await.insert(seq, reply_tx);

        let encoded = frame::encode(&CommandFrame { seq, cmd })?;
        if tx.send(encoded).await.is_err() {
            self.inner.pending.lock().await.remove(&seq);
            return Err(BridgeError::NotConnected);
        }

        match tokio::time::timeout(REQUEST_TIMEOUT, reply_rx).await {
            Ok(Ok(event)) => Ok(event),
            Ok(Err(_)) => Err(BridgeError::Closed),
            Err(_) => {
                self.inner.pending.lock().await.remove(&seq);
                Err(BridgeError::Timeout)
            }
        }
    }
}

impl TabProvider for Bridge {
    async fn list_tabs(&self) -> Result<Vec<TabInfo>, BridgeError> {
        match self.request(BridgeCommand::ListTabs).await? {
            BridgeEvent::Tabs { tabs } => Ok(tabs),
            other => Err(BridgeError::Protocol(format!(
                "expected tab list, got {other:?}"
            ))),
        }
    }

    async fn capture_tab(&self, id: u64) -> Result<Option<PageSnapshot>, BridgeError> {
        match self.request(BridgeCommand::CaptureTab { id }).await? {
            BridgeEvent::Page { page } => Ok(page),
            other => Err(BridgeError::Protocol(format!(
                "expected page capture, got {other:?}"
            ))),
        }
    }

    async fn capture_active(&self) -> Result<Option<PageSnapshot>, BridgeError> {
        match self.request(BridgeCommand::CaptureActive).await? {
            BridgeEvent::Page { page } => Ok(page),
            other => Err(BridgeError::Protocol(format!(
                "expected page capture, got {other:?}"
            ))),
        }
    }
}

async fn handle_bridge(
    inner: &BridgeInner,
    stream: TcpStream,
    mut outgoing: mpsc::Receiver<Vec<u8>>,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut tmp = [0u8; 16 * 1024];
    let mut read_buf: Vec<u8> = Vec::new();

    loop {
        tokio::select! {
            queued = outgoing.recv() => {
                match queued {
                    Some(bytes) => {
                        if write_half.write_all(&bytes).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }

            result = read_half.read(&mut tmp) => {
                match result {
                    Ok(0) => break,
                    Ok(n) => {
                        read_buf.extend_from_slice(&tmp[..n]);
                        loop {
                            match frame::decode::<EventFrame>(&read_buf) {
                                Ok((reply, consumed)) => {
                                    read_buf.drain(..consumed);
                                    match inner.pending.lock().await.remove(&reply.seq) {
                                        Some(waiter) => {
                                            let _ = waiter.send(reply.event);
                                        }
                                        None => debug!(
                                            seq = reply.seq,
                                            "bridge reply with no waiter (request abandoned)"
                                        ),
                                    }
                                }
                                Err(FrameError::Incomplete) => break,
                                Err(e) => {
                                    warn!("bridge frame error: {e}");
                                    return;
                                }
                            }
                        }
                    }
                    Err(e) => {
                        warn!("bridge read error: {e}");
                        break;
                    }
                }
            }
        }
    }
}
