use crate::db::models::{DbAuthEntry, DbAuthState, DbSessionRecord};
use crate::db::patch::{AuthKeysPatch, SessionUpsert};
use crate::db::schema::{SESSIONS_DDL, SQLITE_INIT};
use crate::error::IzumieError;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Insert or overwrite a session row.
    UpsertSession(SessionUpsert, RpcReplyPort<Result<(), IzumieError>>),

    /// Get a session row by id.
    GetSession(String, RpcReplyPort<Result<Option<DbSessionRecord>, IzumieError>>),

    /// Count session rows.
    CountSessions(RpcReplyPort<Result<i64, IzumieError>>),

    /// Load credentials and all key rows of one session key.
    LoadAuthState(String, RpcReplyPort<Result<DbAuthState, IzumieError>>),

    /// Upsert the credentials blob of one session key.
    SaveAuthCreds {
        session_key: String,
        creds: String,
        reply: RpcReplyPort<Result<(), IzumieError>>,
    },

    /// Apply key upserts and deletes in one transaction.
    WriteAuthKeys(AuthKeysPatch, RpcReplyPort<Result<(), IzumieError>>),

    /// Drop credentials and keys of one session key.
    ClearAuthState(String, RpcReplyPort<Result<(), IzumieError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn upsert_session(&self, upsert: SessionUpsert) -> Result<(), IzumieError> {
        ractor::call!(self.actor, DbActorMessage::UpsertSession, upsert).map_err(|e| {
            IzumieError::RactorError(format!("DbActor UpsertSession RPC failed: {e}"))
        })?
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<DbSessionRecord>, IzumieError> {
        ractor::call!(self.actor, DbActorMessage::GetSession, id.to_string())
            .map_err(|e| IzumieError::RactorError(format!("DbActor GetSession RPC failed: {e}")))?
    }

    pub async fn count_sessions(&self) -> Result<i64, IzumieError> {
        ractor::call!(self.actor, DbActorMessage::CountSessions).map_err(|e| {
            IzumieError::RactorError(format!("DbActor CountSessions RPC failed: {e}"))
        })?
    }

    pub async fn load_auth_state(&self, session_key: &str) -> Result<DbAuthState, IzumieError> {
        ractor::call!(
            self.actor,
            DbActorMessage::LoadAuthState,
            session_key.to_string()
        )
        .map_err(|e| IzumieError::RactorError(format!("DbActor LoadAuthState RPC failed: {e}")))?
    }

    pub async fn save_auth_creds(&self, session_key: &str, creds: String) -> Result<(), IzumieError> {
        ractor::call!(self.actor, |reply| DbActorMessage::SaveAuthCreds {
            session_key: session_key.to_string(),
            creds,
            reply,
        })
        .map_err(|e| IzumieError::RactorError(format!("DbActor SaveAuthCreds RPC failed: {e}")))?
    }

    pub async fn write_auth_keys(&self, patch: AuthKeysPatch) -> Result<(), IzumieError> {
        ractor::call!(self.actor, DbActorMessage::WriteAuthKeys, patch).map_err(|e| {
            IzumieError::RactorError(format!("DbActor WriteAuthKeys RPC failed: {e}"))
        })?
    }

    pub async fn clear_auth_state(&self, session_key: &str) -> Result<(), IzumieError> {
        ractor::call!(
            self.actor,
            DbActorMessage::ClearAuthState,
            session_key.to_string()
        )
        .map_err(|e| IzumieError::RactorError(format!("DbActor ClearAuthState RPC failed: {e}")))?
    }
}

struct DbActorState {
    pool: SqlitePool,
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = DbActorState;
    type Arguments = String;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        database_url: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let connect_opts = SqliteConnectOptions::from_str(database_url.as_str())
            .map_err(|e| ActorProcessingErr::from(format!("invalid database url: {e}")))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .connect_with(connect_opts)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db connect failed: {e}")))?;

        apply_schema(&pool)
            .await
            .map_err(|e| ActorProcessingErr::from(format!("db schema init failed: {e}")))?;

        info!("DbActor initialized");
        Ok(DbActorState { pool })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::UpsertSession(upsert, reply) => {
                let res = self.upsert_session(&state.pool, upsert).await;
                let _ = reply.send(res);
            }
            DbActorMessage::GetSession(id, reply) => {
                let res = self.get_session(&state.pool, &id).await;
                let _ = reply.send(res);
            }
            DbActorMessage::CountSessions(reply) => {
                let res = self.count_sessions(&state.pool).await;
                let _ = reply.send(res);
            }
            DbActorMessage::LoadAuthState(session_key, reply) => {
                let res = self.load_auth_state(&state.pool, &session_key).await;
                let _ = reply.send(res);
            }
            DbActorMessage::SaveAuthCreds {
                session_key,
                creds,
                reply,
            } => {
                let res = self.save_auth_creds(&state.pool, &session_key, creds).await;
                let _ = reply.send(res);
            }
            DbActorMessage::WriteAuthKeys(patch, reply) => {
                let res = self.write_auth_keys(&state.pool, patch).await;
                let _ = reply.send(res);
            }
            DbActorMessage::ClearAuthState(session_key, reply) => {
                let res = self.clear_auth_state(&state.pool, &session_key).await;
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

impl DbActor {
    async fn upsert_session(
        &self,
        pool: &SqlitePool,
        upsert: SessionUpsert,
    ) -> Result<(), IzumieError> {
        // The table may have been dropped by an operator since startup.
        sqlx::query(SESSIONS_DDL).execute(pool).await?;

        let now = Utc::now();
        sqlx::query(
            r#"
        INSERT INTO sessions (id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(&upsert.id)
        .bind(upsert.data)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        debug!(session_id = %upsert.id, "session row upserted");
        Ok(())
    }

    async fn get_session(
        &self,
        pool: &SqlitePool,
        id: &str,
    ) -> Result<Option<DbSessionRecord>, IzumieError> {
        let row = sqlx::query_as::<_, DbSessionRecord>(
            r#"
        SELECT id, data, created_at, updated_at
        FROM sessions
        WHERE id = ?
        "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(row)
    }

    async fn count_sessions(&self, pool: &SqlitePool) -> Result<i64, IzumieError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    async fn load_auth_state(
        &self,
        pool: &SqlitePool,
        session_key: &str,
    ) -> Result<DbAuthState, IzumieError> {
        let creds: Option<String> =
            sqlx::query_scalar("SELECT creds FROM auth_creds WHERE session_key = ?")
                .bind(session_key)
                .fetch_optional(pool)
                .await?;

        let entries = sqlx::query_as::<_, DbAuthEntry>(
            r#"
        SELECT category, key_id, value
        FROM auth_state
        WHERE session_key = ?
        ORDER BY category, key_id
        "#,
        )
        .bind(session_key)
        .fetch_all(pool)
        .await?;

        Ok(DbAuthState { creds, entries })
    }

    async fn save_auth_creds(
        &self,
        pool: &SqlitePool,
        session_key: &str,
        creds: String,
    ) -> Result<(), IzumieError> {
        sqlx::query(
            r#"
        INSERT INTO auth_creds (session_key, creds, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(session_key) DO UPDATE SET
            creds = excluded.creds,
            updated_at = excluded.updated_at
        "#,
        )
        .bind(session_key)
        .bind(creds)
        .bind(Utc::now())
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn write_auth_keys(
        &self,
        pool: &SqlitePool,
        patch: AuthKeysPatch,
    ) -> Result<(), IzumieError> {
        if patch.is_empty() {
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = pool.begin().await?;

        for (category, key_id, value) in patch.upserts {
            sqlx::query(
                r#"
            INSERT INTO auth_state (session_key, category, key_id, value, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(session_key, category, key_id) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            )
            .bind(&patch.session_key)
            .bind(category)
            .bind(key_id)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        for (category, key_id) in patch.deletes {
            sqlx::query(
                "DELETE FROM auth_state WHERE session_key = ? AND category = ? AND key_id = ?",
            )
            .bind(&patch.session_key)
            .bind(category)
            .bind(key_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn clear_auth_state(
        &self,
        pool: &SqlitePool,
        session_key: &str,
    ) -> Result<(), IzumieError> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM auth_state WHERE session_key = ?")
            .bind(session_key)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM auth_creds WHERE session_key = ?")
            .bind(session_key)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(database_url: &str) -> Result<DbActorHandle, IzumieError> {
    let (actor, _jh) = ractor::Actor::spawn(None, DbActor, database_url.to_string())
        .await
        .map_err(|e| IzumieError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), IzumieError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
