//! Bearer-authenticated client for the status backend.

use reqwest::Client;

use crate::error::ApiError;
use crate::types::{Ack, ConnectedTokens, StatusUpdate, SyncStatus, UserInfo, UserStatus};

pub struct StatusClient {
    origin: String,
    token: Option<String>,
    http: Client,
}

impl StatusClient {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: normalize_origin(origin.into()),
            token: None,
            http: Client::new(),
        }
    }

    pub fn with_token(origin: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::new(origin)
        }
    }

    fn auth_header(&self) -> Result<String, ApiError> {
        self.token
            .as_deref()
            .map(|t| format!("Bearer {t}"))
            .ok_or_else(|| ApiError::Auth("no token stored".into()))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.origin)
    }

    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if resp.status().is_success() {
            Ok(resp)
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(ApiError::Api {
                status,
                message: body,
            })
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let resp = self
            .http
            .get(self.url(path))
            .header("Authorization", self.auth_header()?)
            .send()
            .await?;
        let resp = Self::check_response(resp).await?;
        resp.json::<T>().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let resp = self
            .http
            .post(self.url(path))
            .header("Authorization", self.auth_header()?)
            .json(body)
            .send()
            .await?;
        let resp = Self::check_response(resp).await?;
        resp.json::<T>().await.map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Report the current client status.
    pub async fn set_client_status(
        &self,
        uid: &str,
        update: &StatusUpdate,
    ) -> Result<Ack, ApiError> {
        self.post_json(&format!("/api/set_client_status/{uid}"), update)
            .await
    }

    /// Set the status priority.
    pub async fn set_priority(&self, uid: &str, priority: u32) -> Result<Ack, ApiError> {
        self.post_json(
            &format!("/api/set_priority/{uid}"),
            &serde_json::json!({ "priority": priority }),
        )
        .await
    }

    /// Current status projection for a user.
    pub async fn user_status(&self, uid: &str) -> Result<UserStatus, ApiError> {
        self.get_json(&format!("/api/user/status/{uid}")).await
    }

    /// Which provider accounts the user has connected.
    pub async fn user_tokens(&self) -> Result<ConnectedTokens, ApiError> {
        self.get_json("/api/user/tokens").await
    }

    /// The authenticated user, as the backend sees it. Doubles as the
    /// login probe: a failure means the stored token is not usable.
    pub async fn current_user(&self) -> Result<UserInfo, ApiError> {
        self.get_json("/api/user").await
    }

    pub async fn start_slack_sync(&self, uid: &str) -> Result<Ack, ApiError> {
        self.post_json(&format!("/sync/slack/start/{uid}"), &serde_json::json!({}))
            .await
    }

    pub async fn stop_slack_sync(&self, uid: &str) -> Result<Ack, ApiError> {
        self.post_json(&format!("/sync/slack/stop/{uid}"), &serde_json::json!({}))
            .await
    }

    pub async fn slack_sync_status(&self, uid: &str) -> Result<SyncStatus, ApiError> {
        self.get_json(&format!("/sync/slack/status/{uid}")).await
    }
}

fn normalize_origin(origin: String) -> String {
    origin.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_is_normalized() {
        let client = StatusClient::new("http://127.0.0.1:8888/");
        assert_eq!(
            client.url("/api/user/status/u1"),
            "http://127.0.0.1:8888/api/user/status/u1"
        );
    }

    #[test]
    fn test_auth_header_requires_token() {
        let bare = StatusClient::new("http://127.0.0.1:8888");
        assert!(matches!(bare.auth_header(), Err(ApiError::Auth(_))));

        let authed = StatusClient::with_token("http://127.0.0.1:8888", "tok123");
        assert_eq!(authed.auth_header().unwrap(), "Bearer tok123");
    }
}
