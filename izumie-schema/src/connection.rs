//! Connection lifecycle events emitted by the protocol library.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Close,
}

/// One `connection.update` event. Every field is optional; the library sends partial updates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_disconnect: Option<LastDisconnect>,

    /// Own account id once the link is open.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub me: Option<String>,
}

impl ConnectionUpdate {
    pub fn state(state: ConnectionState) -> Self {
        Self {
            connection: Some(state),
            ..Default::default()
        }
    }

    pub fn qr(payload: impl Into<String>) -> Self {
        Self {
            qr: Some(payload.into()),
            ..Default::default()
        }
    }

    pub fn closed(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            connection: Some(ConnectionState::Close),
            last_disconnect: Some(LastDisconnect {
                status_code,
                message: Some(message.into()),
            }),
            ..Default::default()
        }
    }
}

/// Error attached to a close event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastDisconnect {
    /// Missing when the error did not originate in the protocol library.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl LastDisconnect {
    pub fn reason(&self) -> Option<DisconnectReason> {
        self.status_code.map(DisconnectReason::from_status)
    }
}

/// Disconnect status codes surfaced on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisconnectReason {
    ConnectionLost,
    Forbidden,
    ConnectionClosed,
    LoggedOut,
    MultideviceMismatch,
    ConnectionReplaced,
    BadSession,
    UnavailableService,
    RestartRequired,
    Other(u16),
}

impl DisconnectReason {
    pub fn from_status(code: u16) -> Self {
        match code {
            408 => Self::ConnectionLost,
            401 => Self::LoggedOut,
            403 => Self::Forbidden,
            411 => Self::MultideviceMismatch,
            428 => Self::ConnectionClosed,
            440 => Self::ConnectionReplaced,
            500 => Self::BadSession,
            503 => Self::UnavailableService,
            515 => Self::RestartRequired,
            other => Self::Other(other),
        }
    }

    pub fn status(self) -> u16 {
        match self {
            Self::ConnectionLost => 408,
            Self::LoggedOut => 401,
            Self::Forbidden => 403,
            Self::MultideviceMismatch => 411,
            Self::ConnectionClosed => 428,
            Self::ConnectionReplaced => 440,
            Self::BadSession => 500,
            Self::UnavailableService => 503,
            Self::RestartRequired => 515,
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConnectionLost => "connection lost",
            Self::LoggedOut => "logged out",
            Self::Forbidden => "forbidden",
            Self::MultideviceMismatch => "multi-device mismatch",
            Self::ConnectionClosed => "connection closed",
            Self::ConnectionReplaced => "connection replaced",
            Self::BadSession => "bad session",
            Self::UnavailableService => "service unavailable",
            Self::RestartRequired => "restart required",
            Self::Other(_) => "unrecognized",
        };
        write!(f, "{name} ({})", self.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn close_update_parses_with_status() {
        let update: ConnectionUpdate = serde_json::from_value(json!({
            "connection": "close",
            "lastDisconnect": { "statusCode": 515, "message": "Stream Errored (restart required)" }
        }))
        .unwrap();

        assert_eq!(update.connection, Some(ConnectionState::Close));
        assert_eq!(
            update.last_disconnect.as_ref().and_then(LastDisconnect::reason),
            Some(DisconnectReason::RestartRequired)
        );
    }

    #[test]
    fn qr_only_update_has_no_state() {
        let update: ConnectionUpdate = serde_json::from_value(json!({ "qr": "2@abc" })).unwrap();
        assert_eq!(update.connection, None);
        assert_eq!(update.qr.as_deref(), Some("2@abc"));
    }

    #[test]
    fn unknown_codes_round_trip_as_other() {
        let reason = DisconnectReason::from_status(499);
        assert_eq!(reason, DisconnectReason::Other(499));
        assert_eq!(reason.status(), 499);
        assert_eq!(DisconnectReason::BadSession.to_string(), "bad session (500)");
    }
}
