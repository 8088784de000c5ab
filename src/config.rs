use std::net::SocketAddr;
use std::path::PathBuf;

use serde_with::{serde_as, NoneAsEmptyString};

use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::prelude::*;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

/// Connection settings for the hosted backend. Both values are optional, an
/// unset or empty variable leaves the backend unavailable.
#[serde_as]
#[derive(Clone, Default, Deserialize)]
pub struct SupabaseConfig {
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, rename = "supabase_url")]
    pub url: Option<Url>,
    #[serde_as(as = "NoneAsEmptyString")]
    #[serde(default, rename = "supabase_anon_key")]
    pub anon_key: Option<String>,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<SupabaseConfig, envy::Error> {
        envy::from_env::<SupabaseConfig>()
    }

    pub fn from_vars<I>(vars: I) -> Result<SupabaseConfig, envy::Error>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter(vars)
    }
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
