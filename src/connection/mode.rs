use crate::error::IzumieError;
use izumie_schema::Jid;
use std::fmt;

/// Digits-only phone number in E.164 form without the leading `+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    pub const MIN_DIGITS: usize = 10;
    pub const MAX_DIGITS: usize = 15;

    /// Accepts exactly 10 to 15 ASCII digits and nothing else.
    pub fn parse(raw: &str) -> Result<Self, IzumieError> {
        let valid = (Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&raw.len())
            && raw.bytes().all(|b| b.is_ascii_digit());
        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(IzumieError::InvalidPhoneNumber(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn jid(&self) -> Jid {
        Jid::for_phone(&self.0)
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMode {
    /// Scan a QR code from the phone.
    Qr,
    /// Type a pairing code requested for this number.
    Pairing(PhoneNumber),
}

impl LoginMode {
    pub fn is_pairing(&self) -> bool {
        matches!(self, LoginMode::Pairing(_))
    }
}

impl fmt::Display for LoginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginMode::Qr => f.write_str("qr"),
            LoginMode::Pairing(_) => f.write_str("pairing"),
        }
    }
}

/// One-shot guard for the pairing-code request, owned by the connection manager.
#[derive(Debug, Default)]
pub struct PairingState {
    requested: bool,
}

impl PairingState {
    /// Returns `true` exactly once.
    pub fn try_begin(&mut self) -> bool {
        !std::mem::replace(&mut self.requested, true)
    }

    pub fn requested(&self) -> bool {
        self.requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_number_bounds() {
        assert!(PhoneNumber::parse("1202555012").is_ok());
        assert!(PhoneNumber::parse("120255501234567").is_ok());

        for bad in [
            "",
            "120255501",
            "1202555012345678",
            "+12025550123",
            "1202 555 0123",
            "12025550l23",
            "１２０２５５５０１２３",
        ] {
            assert!(
                matches!(
                    PhoneNumber::parse(bad),
                    Err(IzumieError::InvalidPhoneNumber(_))
                ),
                "expected {bad:?} to be rejected"
            );
        }
    }

    #[test]
    fn pairing_guard_fires_once() {
        let mut state = PairingState::default();
        assert!(!state.requested());
        assert!(state.try_begin());
        assert!(!state.try_begin());
        assert!(!state.try_begin());
        assert!(state.requested());
    }
}
