use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthBackend {
    /// Process-local map; nothing survives exit.
    Memory,
    /// `creds.json` plus one file per key under `auth.dir`.
    File,
    /// `auth_state` table in `basic.database_url`, keyed by `auth.session_key`.
    Sql,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// TOML: `auth.backend`. Default: `file`.
    #[serde(default = "default_backend")]
    pub backend: AuthBackend,

    /// Directory of the file backend.
    /// TOML: `auth.dir`. Default: `./auth_info`.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// Row key of the sql backend.
    /// TOML: `auth.session_key`. Default: `default`.
    #[serde(default = "default_session_key")]
    pub session_key: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dir: default_dir(),
            session_key: default_session_key(),
        }
    }
}

fn default_backend() -> AuthBackend {
    AuthBackend::File
}

fn default_dir() -> PathBuf {
    PathBuf::from("./auth_info")
}

fn default_session_key() -> String {
    "default".to_string()
}
