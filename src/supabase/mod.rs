use std::sync::Arc;

use once_cell::sync::Lazy;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use snafu::ResultExt as _;
use url::Url;

use crate::config::SupabaseConfig;

pub use error::*;

pub mod auth;
pub mod rest;
pub mod storage;

mod error;

pub mod prelude {
    pub use super::auth::{AuthUser, Session};
    pub use super::storage::{CookieStorage, MemoryStorage, SessionStorage};
    pub use super::{
        create_client, is_supabase_configured, supabase, AuthOptions, SupabaseClient,
        SupabaseError,
    };
}

/// Key the session is persisted under.
pub const STORAGE_KEY: &str = "tracker-auth";

/// How the auth client keeps track of sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOptions {
    /// Read and write the session through a [storage::SessionStorage].
    pub persist_session: bool,
    pub storage_key: String,
    /// Refresh an expiring session when it is looked up instead of dropping it.
    pub auto_refresh_token: bool,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            persist_session: true,
            storage_key: STORAGE_KEY.to_owned(),
            auto_refresh_token: true,
        }
    }
}

/// Handle to a hosted Supabase project. Cloning is cheap and every clone talks
/// to the same project with the same options.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    url: Url,
    key: String,
    options: AuthOptions,
    http: reqwest::Client,
}

impl SupabaseClient {
    pub fn new(url: Url, key: impl Into<String>, options: AuthOptions) -> Self {
        Self::with_http(url, key, options, reqwest::Client::new())
    }

    pub fn with_http(
        mut url: Url,
        key: impl Into<String>,
        options: AuthOptions,
        http: reqwest::Client,
    ) -> Self {
        // endpoints are joined relative to the project url
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        let inner = ClientInner {
            url,
            key: key.into(),
            options,
            http,
        };

        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn options(&self) -> &AuthOptions {
        &self.inner.options
    }

    pub fn auth(&self) -> auth::Auth<'_> {
        auth::Auth::new(self)
    }

    pub fn rest(&self) -> rest::Rest<'_> {
        rest::Rest::new(self)
    }

    pub(crate) fn endpoint(&self, path: &str) -> Result<Url> {
        self.inner.url.join(path).context(EndpointSnafu { path })
    }

    /// A request carrying the project key, authorized as the anonymous role.
    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.key)
            .bearer_auth(&self.inner.key)
    }

    /// A request carrying the project key, authorized as the session's user.
    pub(crate) fn authorized(
        &self,
        method: Method,
        url: Url,
        session: &auth::Session,
    ) -> RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.key)
            .bearer_auth(&session.access_token)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("url", &self.inner.url.as_str())
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Sends the request and decodes a JSON body, turning non-2xx statuses into
/// [SupabaseError::Rejected].
pub(crate) async fn fetch<T: DeserializeOwned>(request: RequestBuilder, url: &Url) -> Result<T> {
    let response = checked(request, url).await?;
    response.json().await.context(TransportSnafu { url: url.clone() })
}

/// Sends the request and discards the body.
pub(crate) async fn execute(request: RequestBuilder, url: &Url) -> Result<()> {
    checked(request, url).await.map(|_| ())
}

async fn checked(request: RequestBuilder, url: &Url) -> Result<reqwest::Response> {
    let response = request
        .send()
        .await
        .context(TransportSnafu { url: url.clone() })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    RejectedSnafu {
        url: url.clone(),
        status,
        message: error_message(status, &body),
    }
    .fail()
}

/// Builds a client when both the project url and the key are available.
pub fn create_client(config: &SupabaseConfig) -> Option<SupabaseClient> {
    let url = config.url.clone()?;
    let key = config.anon_key.as_deref().filter(|key| !key.is_empty())?;

    Some(SupabaseClient::new(url, key, AuthOptions::default()))
}

static SUPABASE: Lazy<Option<SupabaseClient>> = Lazy::new(|| match SupabaseConfig::from_env() {
    Ok(config) => create_client(&config),
    Err(err) => {
        tracing::warn!(error = %err, "backend configuration is invalid, continuing without a backend");
        None
    }
});

/// The process-wide client, built from the environment on first access.
pub fn supabase() -> Option<&'static SupabaseClient> {
    SUPABASE.as_ref()
}

pub fn is_supabase_configured() -> bool {
    supabase().is_some()
}
