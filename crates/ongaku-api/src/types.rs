//! Wire types for the status backend.

use serde::{Deserialize, Serialize};

use ongaku_scrape::TrackObservation;

/// Body of `POST /api/set_client_status/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdate {
    /// Human-readable status line, e.g. `"Song – Artist"`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub playing: bool,
}

impl StatusUpdate {
    /// A manually-entered status with no track attached.
    pub fn manual(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            ..Default::default()
        }
    }
}

impl From<&TrackObservation> for StatusUpdate {
    fn from(obs: &TrackObservation) -> Self {
        Self {
            status: obs.status_line(),
            title: Some(obs.title.clone()),
            artist: obs.artist.clone(),
            source: Some(obs.source.as_str().to_string()),
            playing: obs.playing,
        }
    }
}

/// Generic backend acknowledgement: `{ success, message?, error? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// `GET /api/user` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub uid: Option<String>,
}

/// `GET /api/user/tokens` response: which provider accounts are connected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedTokens {
    #[serde(default)]
    pub slack: bool,
    #[serde(default)]
    pub spotify: bool,
}

/// `GET /api/user/status/{uid}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatus {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub emoji: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
}

/// `GET /sync/slack/status/{uid}` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub current_song: Option<String>,
    #[serde(default)]
    pub last_update: Option<String>,
    #[serde(default)]
    pub error_count: u32,
    #[serde(default)]
    pub error: Option<String>,
}
