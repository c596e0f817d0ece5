//! Control socket: the message actions the popup/UI layer drives.
//!
//! Same framing as the bridge socket, request/response only: every request
//! gets exactly one reply, and a client that disconnects mid-request simply
//! abandons it.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use serde::{Deserialize, Serialize};

use ongaku_api::types::{StatusUpdate, SyncStatus, UserStatus};
use ongaku_api::{auth, ApiError, StatusClient};
use ongaku_core::{NowPlaying, UserIdentity};

use crate::bridge::TabProvider;
use crate::frame::{self, FrameError};
use crate::state::{Daemon, SharedDaemon};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    Login,
    Logout,
    IsLoggedIn,
    GetCurrentUser,
    SetStatus { status: String },
    SetPriority { priority: u32 },
    GetUserStatus,
    StartSlackSync,
    StopSlackSync,
    GetSlackSyncStatus,
    GetNowPlaying,
    FetchNowPlaying,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "reply", rename_all = "camelCase")]
pub enum Reply {
    Ack {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    LoggedIn {
        logged_in: bool,
    },
    CurrentUser {
        user: Option<UserIdentity>,
    },
    NowPlaying {
        #[serde(flatten)]
        state: NowPlaying,
    },
    UserStatus {
        #[serde(flatten)]
        status: UserStatus,
    },
    SyncStatus {
        #[serde(flatten)]
        status: SyncStatus,
    },
}

impl Reply {
    pub fn ok() -> Self {
        Reply::Ack {
            success: true,
            error: None,
        }
    }

    pub fn fail(error: impl Into<String>) -> Self {
        Reply::Ack {
            success: false,
            error: Some(error.into()),
        }
    }
}

pub async fn handle_request(daemon: &Daemon, req: Request) -> Reply {
    match req {
        Request::Login => handle_login(daemon).await,

        Request::Logout => match daemon.tokens.clear() {
            Ok(()) => {
                info!("logged out, token deleted");
                Reply::ok()
            }
            Err(e) => Reply::fail(e.to_string()),
        },

        Request::IsLoggedIn => Reply::LoggedIn {
            logged_in: is_logged_in(daemon).await,
        },

        Request::GetCurrentUser => Reply::CurrentUser {
            user: daemon.identity(),
        },

        Request::SetStatus { status } => {
            let result = match authed(daemon) {
                Ok((client, uid)) => {
                    client
                        .set_client_status(&uid, &StatusUpdate::manual(status))
                        .await
                }
                Err(e) => Err(e),
            };
            ack_reply(result)
        }

        Request::SetPriority { priority } => {
            let result = match authed(daemon) {
                Ok((client, uid)) => client.set_priority(&uid, priority).await,
                Err(e) => Err(e),
            };
            ack_reply(result)
        }

        Request::GetUserStatus => match authed(daemon) {
            Ok((client, uid)) => match client.user_status(&uid).await {
                Ok(status) => Reply::UserStatus { status },
                Err(e) => Reply::fail(e.to_string()),
            },
            Err(e) => Reply::fail(e.to_string()),
        },

        Request::StartSlackSync => {
            let result = match authed(daemon) {
                Ok((client, uid)) => client.start_slack_sync(&uid).await,
                Err(e) => Err(e),
            };
            ack_reply(result)
        }

        Request::StopSlackSync => {
            let result = match authed(daemon) {
                Ok((client, uid)) => client.stop_slack_sync(&uid).await,
                Err(e) => Err(e),
            };
            ack_reply(result)
        }

        Request::GetSlackSyncStatus => match authed(daemon) {
            Ok((client, uid)) => match client.slack_sync_status(&uid).await {
                Ok(status) => Reply::SyncStatus { status },
                Err(e) => Reply::fail(e.to_string()),
            },
            Err(e) => Reply::fail(e.to_string()),
        },

        Request::GetNowPlaying => Reply::NowPlaying {
            state: daemon.now_playing.read().await.clone(),
        },

        Request::FetchNowPlaying => {
            let page = daemon.bridge.capture_active().await.ok().flatten();
            let track = page.and_then(|p| ongaku_scrape::scrape(&daemon.matcher, &p));
            Reply::NowPlaying {
                state: NowPlaying::observed(track),
            }
        }
    }
}

async fn handle_login(daemon: &Daemon) -> Reply {
    match auth::login(
        &daemon.config.backend.origin,
        daemon.config.auth.callback_port,
    )
    .await
    {
        Ok(token) => match daemon.tokens.store(&token) {
            Ok(()) => {
                info!("login succeeded, token persisted");
                Reply::ok()
            }
            Err(e) => Reply::fail(format!("failed to persist token: {e}")),
        },
        // Covers the no-token redirect; nothing was persisted.
        Err(e) => Reply::fail(e.to_string()),
    }
}

async fn is_logged_in(daemon: &Daemon) -> bool {
    // Without a stored token the answer is known without a network call.
    let Ok(client) = daemon.authed_client() else {
        return false;
    };
    match client.current_user().await {
        Ok(user) => user.authenticated,
        // Network failure counts as logged out, not as a distinct error.
        Err(_) => false,
    }
}

fn authed(daemon: &Daemon) -> Result<(StatusClient, String), ApiError> {
    let identity = daemon
        .identity()
        .ok_or_else(|| ApiError::Auth("not logged in".into()))?;
    let client = daemon.authed_client()?;
    Ok((client, identity.uid))
}

fn ack_reply(result: Result<ongaku_api::types::Ack, ApiError>) -> Reply {
    match result {
        Ok(ack) if ack.success => Reply::ok(),
        Ok(ack) => Reply::fail(
            ack.error
                .or(ack.message)
                .unwrap_or_else(|| "backend reported failure".into()),
        ),
        Err(e) => Reply::fail(e.to_string()),
    }
}

pub fn spawn_listener(daemon: SharedDaemon, port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let addr = format!("127.0.0.1:{port}");
        let listener = match TcpListener::bind(&addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("failed to bind control socket {addr}: {e}");
                return;
            }
        };
        info!("control socket listening at {addr}");

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    debug!("control client connected from {peer}");
                    let daemon = daemon.clone();
                    tokio::spawn(async move {
                        handle_client(daemon, stream).await;
                    });
                }
                Err(e) => warn!("control accept failed: {e}"),
            }
        }
    })
}

async fn handle_client(daemon: SharedDaemon, stream: TcpStream) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut tmp = [0u8; 4096];
    let mut read_buf: Vec<u8> = Vec::new();

    loop {
        match read_half.read(&mut tmp).await {
            Ok(0) => break,
            Ok(n) => {
                read_buf.extend_from_slice(&tmp[..n]);
                loop {
                    match frame::decode::<Request>(&read_buf) {
                        Ok((request, consumed)) => {
                            read_buf.drain(..consumed);
                            debug!(?request, "control request");
                            let reply = handle_request(&daemon, request).await;
                            match frame::encode(&reply) {
                                Ok(bytes) => {
                                    if write_half.write_all(&bytes).await.is_err() {
                                        return;
                                    }
                                }
                                Err(e) => {
                                    warn!("failed to encode control reply: {e}");
                                    return;
                                }
                            }
                        }
                        Err(FrameError::Incomplete) => break,
                        Err(e) => {
                            warn!("control frame error: {e}");
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                warn!("control read error: {e}");
                break;
            }
        }
    }
}
