use super::session_id::SessionId;
use crate::transport::Socket;
use izumie_schema::Jid;
use tracing::{error, info, warn};

/// Reports the outcome of a link back to the account over the open socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct Notifier;

impl Notifier {
    pub fn message(session_id: &SessionId, saved: bool) -> String {
        if saved {
            format!("✅ Connected Successfully!\n🆔 Session ID: {session_id}")
        } else {
            "⚠️ Connected but failed to store session to database.".to_string()
        }
    }

    /// Sends one message; a failed send is logged and dropped.
    pub async fn notify(&self, socket: &dyn Socket, to: &Jid, session_id: &SessionId, saved: bool) {
        let text = Self::message(session_id, saved);
        match socket.send_text(to, &text).await {
            Ok(()) if saved => info!(to = %to, session_id = %session_id, "session id sent"),
            Ok(()) => warn!(to = %to, "session not stored; user notified"),
            Err(e) => error!(to = %to, error = %e, "failed to send WhatsApp message"),
        }
    }
}
