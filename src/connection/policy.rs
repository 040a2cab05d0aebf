use super::mode::LoginMode;
use izumie_schema::{DisconnectReason, LastDisconnect};
use thiserror::Error as ThisError;

/// Why the connection manager stopped without a usable session.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum HaltReason {
    #[error("unauthorized; waiting for the pairing code to be entered, not reconnecting")]
    AwaitingPairingCode,

    #[error("bad or invalid session; delete the local auth state and start again")]
    BadSession,

    #[error("disconnected: {0}")]
    Disconnected(DisconnectReason),

    #[error("disconnected with unknown reason: {0}")]
    UnknownError(String),

    #[error("gave up after {attempts} connection attempts")]
    RetriesExhausted { attempts: usize },

    #[error("transport failure: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseAction {
    Reconnect(DisconnectReason),
    Halt(HaltReason),
}

/// Decides what a `close` event means for the given login mode.
///
/// QR mode only reconnects on restart-required. Pairing mode rides out every drop while the user
/// is typing the code, except `401` ("code not entered yet") and a bad session.
pub fn classify_close(mode: &LoginMode, last: Option<&LastDisconnect>) -> CloseAction {
    let Some(reason) = last.and_then(LastDisconnect::reason) else {
        let message = last
            .and_then(|l| l.message.clone())
            .unwrap_or_else(|| "no disconnect error attached".to_string());
        return CloseAction::Halt(HaltReason::UnknownError(message));
    };

    match (reason, mode.is_pairing()) {
        (DisconnectReason::BadSession, _) => CloseAction::Halt(HaltReason::BadSession),
        (DisconnectReason::LoggedOut, true) => CloseAction::Halt(HaltReason::AwaitingPairingCode),
        (_, true) | (DisconnectReason::RestartRequired, false) => CloseAction::Reconnect(reason),
        (other, false) => CloseAction::Halt(HaltReason::Disconnected(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::PhoneNumber;

    fn pairing() -> LoginMode {
        LoginMode::Pairing(PhoneNumber::parse("12025550123").unwrap())
    }

    fn closed(code: u16) -> LastDisconnect {
        LastDisconnect {
            status_code: Some(code),
            message: None,
        }
    }

    #[test]
    fn restart_required_reconnects_in_both_modes() {
        for mode in [LoginMode::Qr, pairing()] {
            assert_eq!(
                classify_close(&mode, Some(&closed(515))),
                CloseAction::Reconnect(DisconnectReason::RestartRequired)
            );
        }
    }

    #[test]
    fn qr_mode_halts_on_anything_else() {
        for code in [401, 408, 428, 440, 500, 503] {
            assert!(
                matches!(
                    classify_close(&LoginMode::Qr, Some(&closed(code))),
                    CloseAction::Halt(_)
                ),
                "code {code} should halt in QR mode"
            );
        }
    }

    #[test]
    fn pairing_mode_table() {
        let mode = pairing();
        for code in [403, 408, 411, 428, 440, 499, 503, 515] {
            assert_eq!(
                classify_close(&mode, Some(&closed(code))),
                CloseAction::Reconnect(DisconnectReason::from_status(code)),
                "code {code} should reconnect while pairing"
            );
        }
        assert_eq!(
            classify_close(&mode, Some(&closed(401))),
            CloseAction::Halt(HaltReason::AwaitingPairingCode)
        );
        assert_eq!(
            classify_close(&mode, Some(&closed(500))),
            CloseAction::Halt(HaltReason::BadSession)
        );
    }

    #[test]
    fn missing_status_code_halts_without_retry() {
        let last = LastDisconnect {
            status_code: None,
            message: Some("socket hang up".to_string()),
        };
        assert_eq!(
            classify_close(&pairing(), Some(&last)),
            CloseAction::Halt(HaltReason::UnknownError("socket hang up".to_string()))
        );
        assert!(matches!(
            classify_close(&LoginMode::Qr, None),
            CloseAction::Halt(HaltReason::UnknownError(_))
        ));
    }
}
