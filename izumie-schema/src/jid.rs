use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error as ThisError;

/// Server part for regular user accounts.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// A WhatsApp address: `user[:device]@server`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Jid {
    user: String,
    device: Option<u16>,
    server: String,
}

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("invalid jid: {0}")]
pub struct JidParseError(String);

impl Jid {
    /// User address for a phone number; non-digits are stripped.
    pub fn for_phone(phone: &str) -> Self {
        Self {
            user: phone.chars().filter(char::is_ascii_digit).collect(),
            device: None,
            server: USER_SERVER.to_string(),
        }
    }

    /// Same account without the device suffix.
    pub fn to_user_jid(&self) -> Self {
        Self {
            user: self.user.clone(),
            device: None,
            server: self.server.clone(),
        }
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (local, server) = s
            .split_once('@')
            .ok_or_else(|| JidParseError(s.to_string()))?;
        if server.is_empty() {
            return Err(JidParseError(s.to_string()));
        }

        let (user, device) = match local.split_once(':') {
            Some((user, device)) => {
                let device = device
                    .parse::<u16>()
                    .map_err(|_| JidParseError(s.to_string()))?;
                (user, Some(device))
            }
            None => (local, None),
        };
        if user.is_empty() {
            return Err(JidParseError(s.to_string()));
        }

        Ok(Self {
            user: user.to_string(),
            device,
            server: server.to_string(),
        })
    }
}

impl TryFrom<String> for Jid {
    type Error = JidParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Jid> for String {
    fn from(jid: Jid) -> Self {
        jid.to_string()
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.device {
            Some(device) => write!(f, "{}:{}@{}", self.user, device, self.server),
            None => write!(f, "{}@{}", self.user, self.server),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_jid_strips_non_digits() {
        assert_eq!(
            Jid::for_phone("+1 (202) 555-0123").to_string(),
            "12025550123@s.whatsapp.net"
        );
    }

    #[test]
    fn device_suffix_is_parsed_and_dropped() {
        let jid: Jid = "12025550123:7@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid.to_string(), "12025550123:7@s.whatsapp.net");
        assert_eq!(jid.to_user_jid(), Jid::for_phone("12025550123"));
    }

    #[test]
    fn rejects_malformed() {
        assert!("no-at-sign".parse::<Jid>().is_err());
        assert!("@s.whatsapp.net".parse::<Jid>().is_err());
        assert!("123:x@s.whatsapp.net".parse::<Jid>().is_err());
        assert!("123@".parse::<Jid>().is_err());
        assert_eq!(
            "no-at-sign".parse::<Jid>().unwrap_err().to_string(),
            "invalid jid: no-at-sign"
        );
    }
}
