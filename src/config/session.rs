use serde::{Deserialize, Serialize};

/// When the session identifier is minted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionIdTiming {
    /// Generated when the connection opens.
    #[default]
    OnOpen,
    /// Generated once when the manager starts; stable across restarts.
    AtStart,
    /// Like `AtStart`, plus an empty placeholder row written before the first connect.
    Eager,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionConfig {
    /// TOML: `session.id_timing`. Default: `on_open`.
    #[serde(default)]
    pub id_timing: SessionIdTiming,

    /// Clear the local auth store after the session row is written.
    /// TOML: `session.wipe_local_after_persist`. Default: `false`.
    #[serde(default)]
    pub wipe_local_after_persist: bool,
}
