use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::storage::SessionStorage;
use super::{execute, fetch, EncodeSessionSnafu, Result, SupabaseClient};
use crate::model::{now, Timestamp, UserId};
use crate::prelude::*;

/// A session this close to expiry is treated as expired.
pub const EXPIRY_MARGIN_SECONDS: i64 = 90;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "bearer")]
    pub token_type: String,
    /// Lifetime of the access token in seconds, counted from issue.
    pub expires_in: i64,
    /// Unix timestamp of the access token's expiry.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: AuthUser,
}

fn bearer() -> String {
    "bearer".to_owned()
}

impl Session {
    /// Fills in `expires_at` from `expires_in` when the backend left it out.
    pub fn stamped(mut self, issued_at: Timestamp) -> Self {
        if self.expires_at.is_none() {
            self.expires_at = Some(issued_at.unix().saturating_add(self.expires_in));
        }
        self
    }

    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at.and_then(Timestamp::from_unix)
    }

    /// A session without a known expiry counts as expired, so it gets refreshed
    /// or dropped instead of being trusted forever.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at.saturating_sub(now.unix()) <= EXPIRY_MARGIN_SECONDS,
            None => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

/// Auth API of a project, borrowed from [SupabaseClient::auth].
#[derive(Debug, Clone, Copy, new)]
pub struct Auth<'a> {
    client: &'a SupabaseClient,
}

impl Auth<'_> {
    fn storage_key(&self) -> &str {
        &self.client.options().storage_key
    }

    /// Looks up the stored session.
    ///
    /// An expiring session is refreshed and stored again when automatic refresh
    /// is enabled; otherwise it is dropped. Stored data that doesn't decode as
    /// a session is removed.
    #[instrument(skip_all)]
    pub async fn get_session(&self, storage: &mut impl SessionStorage) -> Result<Option<Session>> {
        let options = self.client.options();
        if !options.persist_session {
            return Ok(None);
        }

        let key = self.storage_key();
        let Some(raw) = storage.get_item(key) else {
            return Ok(None);
        };

        let session = match serde_json::from_str::<Session>(&raw) {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "discarding a stored session that cannot be decoded");
                storage.remove_item(key);
                return Ok(None);
            }
        };

        if !session.is_expired(now()) {
            return Ok(Some(session));
        }

        if !options.auto_refresh_token {
            tracing::debug!(user = %session.user.id, "stored session expired");
            storage.remove_item(key);
            return Ok(None);
        }

        tracing::debug!(user = %session.user.id, "stored session is expiring, refreshing it");
        match self.refresh_session(&session.refresh_token).await {
            Ok(session) => {
                self.save(storage, &session)?;
                Ok(Some(session))
            }
            Err(err) => {
                if err.is_rejected() {
                    storage.remove_item(key);
                }
                Err(err)
            }
        }
    }

    /// Exchanges a refresh token for a new session.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    #[instrument(skip(self, storage, password))]
    pub async fn sign_in_with_password(
        &self,
        storage: &mut impl SessionStorage,
        email: &str,
        password: &str,
    ) -> Result<Session> {
        let session = self
            .token("password", json!({ "email": email, "password": password }))
            .await?;

        tracing::info!(user = %session.user.id, "signed in");
        self.save(storage, &session)?;

        Ok(session)
    }

    /// Forgets the stored session and revokes it with the backend. The session
    /// is removed from storage even when revoking fails.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, storage: &mut impl SessionStorage) -> Result<()> {
        let key = self.storage_key();
        let stored = storage.get_item(key);
        storage.remove_item(key);

        let Some(session) = stored.and_then(|raw| serde_json::from_str::<Session>(&raw).ok()) else {
            return Ok(());
        };

        let url = self.client.endpoint("auth/v1/logout")?;
        let request = self.client.authorized(Method::POST, url.clone(), &session);
        execute(request, &url).await?;

        tracing::info!(user = %session.user.id, "signed out");
        Ok(())
    }

    async fn token(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let url = self.client.endpoint("auth/v1/token")?;
        let request = self
            .client
            .request(Method::POST, url.clone())
            .query(&[("grant_type", grant_type)])
            .json(&body);

        let issued_at = now();
        let session: Session = fetch(request, &url).await?;
        Ok(session.stamped(issued_at))
    }

    fn save(&self, storage: &mut impl SessionStorage, session: &Session) -> Result<()> {
        if !self.client.options().persist_session {
            return Ok(());
        }

        let value = serde_json::to_string(session).context(EncodeSessionSnafu)?;
        storage.set_item(self.storage_key(), value);
        Ok(())
    }
}
