//! SQL DDL for initializing the database schema.
//! SQLite-first design; can be adapted for other RDBMS.

/// Session rows handed out to bots. Also executed before every session upsert.
pub const SESSIONS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY NOT NULL,
    data TEXT NOT NULL, -- JSON session snapshot
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
)
"#;

/// SQLite schema includes:
/// - `sessions` table (one snapshot per session id)
/// - `auth_creds` table (relational auth backend, one credentials blob per session key)
/// - `auth_state` table (relational auth backend, one row per (session key, category, key id))
pub const SQLITE_INIT: &str = r#"
-- ---------------------------------------------------------------------------
-- Persisted sessions
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY NOT NULL,
    data TEXT NOT NULL, -- JSON session snapshot
    created_at TEXT NOT NULL, -- RFC3339
    updated_at TEXT NOT NULL -- RFC3339
);

-- ---------------------------------------------------------------------------
-- Relational auth state
-- ---------------------------------------------------------------------------
CREATE TABLE IF NOT EXISTS auth_creds (
    session_key TEXT PRIMARY KEY NOT NULL,
    creds TEXT NOT NULL, -- JSON credentials
    updated_at TEXT NOT NULL -- RFC3339
);

CREATE TABLE IF NOT EXISTS auth_state (
    session_key TEXT NOT NULL,
    category TEXT NOT NULL,
    key_id TEXT NOT NULL,
    value TEXT NOT NULL, -- JSON key material
    updated_at TEXT NOT NULL, -- RFC3339
    PRIMARY KEY (session_key, category, key_id)
);
"#;
