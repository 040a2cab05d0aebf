use super::mode::{LoginMode, PairingState};
use super::policy::{CloseAction, HaltReason, classify_close};
use super::qr::render_qr;
use crate::auth::SharedAuthStore;
use crate::config::{Config, SessionConfig, SessionIdTiming};
use crate::db::DbActorHandle;
use crate::error::IsRetryable;
use crate::service::{Notifier, SessionId, SessionPersister};
use crate::transport::{Socket, SocketEvent, Transport};
use crate::utils::logging::with_redacted_json_debug;
use backon::{BackoffBuilder, ExponentialBuilder};
use izumie_schema::{ConnectionState, ConnectionUpdate, DisconnectReason, Jid, SessionSnapshot};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Final result of [`ConnectionManager::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Connected { session_id: SessionId },
    Halted(HaltReason),
}

/// Result of a single socket session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Connected(SessionId),
    /// Closed with a transient reason; `None` when the transport itself failed transiently.
    Reconnecting(Option<DisconnectReason>),
    Halted(HaltReason),
}

/// Owns the login flow: opens sockets, reacts to their events, restarts within the retry
/// budget, and persists plus announces the session once the link opens.
pub struct ConnectionManager<T: Transport> {
    transport: T,
    auth: SharedAuthStore,
    persister: SessionPersister,
    notifier: Notifier,
    mode: LoginMode,
    pairing_delay: Duration,
    retry: ExponentialBuilder,
    session: SessionConfig,
    supplied_session_id: Option<SessionId>,
    pairing: PairingState,
}

impl<T: Transport> ConnectionManager<T> {
    pub fn new(
        transport: T,
        auth: SharedAuthStore,
        db: DbActorHandle,
        mode: LoginMode,
        cfg: &Config,
    ) -> Self {
        Self {
            transport,
            auth,
            persister: SessionPersister::new(db),
            notifier: Notifier,
            mode,
            pairing_delay: cfg.connection.pairing_delay(),
            retry: cfg.connection.retry.backoff(),
            session: cfg.session.clone(),
            supplied_session_id: None,
            pairing: PairingState::default(),
        }
    }

    /// Uses `id` instead of a generated identifier.
    #[must_use]
    pub fn with_session_id(mut self, id: Option<SessionId>) -> Self {
        self.supplied_session_id = id;
        self
    }

    pub fn pairing_requested(&self) -> bool {
        self.pairing.requested()
    }

    /// Connects until the link opens or a halt condition is reached.
    pub async fn run(&mut self) -> RunOutcome {
        let preset_id = self.preset_session_id();
        if self.session.id_timing == SessionIdTiming::Eager
            && let Some(id) = preset_id.as_ref()
        {
            // Placeholder row; overwritten once the link opens.
            self.persister.store(id, &SessionSnapshot::default()).await;
        }

        let mut backoff = self.retry.build();
        let mut attempts = 0usize;
        loop {
            attempts += 1;
            info!(attempt = attempts, mode = %self.mode, "starting WhatsApp socket");

            match self.attempt(preset_id.as_ref()).await {
                AttemptOutcome::Connected(session_id) => {
                    return RunOutcome::Connected { session_id };
                }
                AttemptOutcome::Halted(reason) => {
                    warn!(reason = %reason, "not reconnecting");
                    return RunOutcome::Halted(reason);
                }
                AttemptOutcome::Reconnecting(reason) => match backoff.next() {
                    Some(delay) => {
                        info!(
                            reason = %reason.map_or_else(|| "transport error".to_string(), |r| r.to_string()),
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            "reconnecting"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        let reason = HaltReason::RetriesExhausted { attempts };
                        warn!(reason = %reason, "restart budget spent");
                        return RunOutcome::Halted(reason);
                    }
                },
            }
        }
    }

    fn preset_session_id(&self) -> Option<SessionId> {
        self.supplied_session_id
            .clone()
            .or_else(|| match self.session.id_timing {
                SessionIdTiming::OnOpen => None,
                SessionIdTiming::AtStart | SessionIdTiming::Eager => Some(SessionId::generate()),
            })
    }

    /// Runs one socket session to its end. The socket is dropped before returning.
    pub async fn attempt(&mut self, preset_id: Option<&SessionId>) -> AttemptOutcome {
        let mut socket = match self.transport.connect(self.auth.clone()).await {
            Ok(socket) => socket,
            Err(e) if e.is_retryable() => {
                warn!(error = %e, "transport failed to start");
                return AttemptOutcome::Reconnecting(None);
            }
            Err(e) => {
                error!(error = %e, "transport failed to start");
                return AttemptOutcome::Halted(HaltReason::Transport(e.to_string()));
            }
        };

        // Set when a pairing code was wanted before the library had generated its keys.
        let mut pairing_deferred = false;

        while let Some(event) = socket.next_event().await {
            match event {
                SocketEvent::CredsUpdate(creds) => {
                    if let Err(e) = self.auth.save_creds(&creds).await {
                        warn!(error = %e, "failed to persist credentials update");
                    }
                    if pairing_deferred {
                        pairing_deferred = !self.request_pairing_code(socket.as_ref()).await;
                    }
                }
                SocketEvent::ConnectionUpdate(update) => {
                    if let Some(outcome) = self
                        .on_connection_update(
                            socket.as_ref(),
                            update,
                            preset_id,
                            &mut pairing_deferred,
                        )
                        .await
                    {
                        return outcome;
                    }
                }
            }
        }

        warn!("socket event stream ended without a close event");
        AttemptOutcome::Halted(HaltReason::UnknownError(
            "event stream ended".to_string(),
        ))
    }

    async fn on_connection_update(
        &mut self,
        socket: &dyn Socket,
        update: ConnectionUpdate,
        preset_id: Option<&SessionId>,
        pairing_deferred: &mut bool,
    ) -> Option<AttemptOutcome> {
        with_redacted_json_debug(&update, &["qr"], |pretty| {
            debug!(update = %pretty, "connection.update");
        });

        if let Some(qr) = update.qr.as_deref()
            && !self.mode.is_pairing()
        {
            match render_qr(qr) {
                Ok(rendered) => {
                    info!("scan this QR code with WhatsApp > Linked devices");
                    println!("{rendered}");
                }
                Err(e) => warn!(error = %e, qr, "unable to render QR code; raw payload logged"),
            }
        }

        let wants_code =
            update.connection == Some(ConnectionState::Connecting) || update.qr.is_some();
        if wants_code && !self.request_pairing_code(socket).await {
            *pairing_deferred = true;
        }

        match update.connection {
            Some(ConnectionState::Close) => {
                let last = update.last_disconnect.as_ref();
                info!(
                    status = ?last.and_then(|l| l.status_code),
                    message = ?last.and_then(|l| l.message.as_deref()),
                    "disconnected"
                );
                Some(match classify_close(&self.mode, last) {
                    CloseAction::Reconnect(reason) => AttemptOutcome::Reconnecting(Some(reason)),
                    CloseAction::Halt(reason) => AttemptOutcome::Halted(reason),
                })
            }
            Some(ConnectionState::Open) => Some(
                self.on_open(socket, update.me.as_deref(), preset_id)
                    .await,
            ),
            _ => None,
        }
    }

    /// Requests the pairing code once per process, as soon as the library's noise key exists.
    ///
    /// Returns `false` while the key is still missing; the guard stays unset so a later
    /// credentials update can retry.
    async fn request_pairing_code(&mut self, socket: &dyn Socket) -> bool {
        let LoginMode::Pairing(phone) = &self.mode else {
            return true;
        };
        if self.pairing.requested() {
            return true;
        }

        let keys_ready = match self.auth.load_creds().await {
            Ok(creds) => creds.is_some_and(|c| c.noise_key_ready()),
            Err(e) => {
                warn!(error = %e, "failed to read credentials before pairing");
                false
            }
        };
        if !keys_ready {
            debug!("noise key not generated yet; pairing code request deferred");
            return false;
        }

        if !self.pairing.try_begin() {
            return true;
        }
        tokio::time::sleep(self.pairing_delay).await;
        match socket.request_pairing_code(phone.as_str()).await {
            Ok(code) => info!(
                pairing_code = %code,
                "enter this code in WhatsApp > Linked devices within 2 minutes"
            ),
            Err(e) => error!(error = %e, "pairing code request failed"),
        }
        true
    }

    async fn on_open(
        &self,
        socket: &dyn Socket,
        me: Option<&str>,
        preset_id: Option<&SessionId>,
    ) -> AttemptOutcome {
        info!("connected to WhatsApp");
        let session_id = preset_id.cloned().unwrap_or_else(SessionId::generate);

        let saved = self.persister.persist(&session_id, self.auth.as_ref()).await;

        match self.notify_target(me).await {
            Some(to) => {
                self.notifier
                    .notify(socket, &to, &session_id, saved)
                    .await;
            }
            None => warn!("own account id unknown; skipping notification"),
        }

        if saved && self.session.wipe_local_after_persist {
            match self.auth.clear().await {
                Ok(()) => info!("local auth state cleared"),
                Err(e) => error!(error = %e, "failed to clear local auth state"),
            }
        }

        AttemptOutcome::Connected(session_id)
    }

    async fn notify_target(&self, me: Option<&str>) -> Option<Jid> {
        if let LoginMode::Pairing(phone) = &self.mode {
            return Some(phone.jid());
        }

        let own = match me {
            Some(me) => Some(me.to_string()),
            None => match self.auth.load_creds().await {
                Ok(creds) => creds.and_then(|c| c.me_id().map(str::to_string)),
                Err(e) => {
                    warn!(error = %e, "failed to read credentials for own id");
                    None
                }
            },
        }?;

        match own.parse::<Jid>() {
            Ok(jid) => Some(jid.to_user_jid()),
            Err(e) => {
                warn!(error = %e, "own account id is not a valid jid");
                None
            }
        }
    }
}
