use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt;

pub const SESSION_ID_PREFIX: &str = "IzumieConsole~";

/// Opaque key of a `sessions` row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// `IzumieConsole~` followed by 8 random bytes, base64url without padding.
    pub fn generate() -> Self {
        let bytes: [u8; 8] = rand::random();
        Self(format!("{SESSION_ID_PREFIX}{}", URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Caller-supplied identifier, used verbatim. Blank input yields `None`.
    pub fn supplied(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_have_prefix_and_fixed_length() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);

        let suffix = a.as_str().strip_prefix(SESSION_ID_PREFIX).unwrap();
        assert_eq!(suffix.len(), 11);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn supplied_ids_are_trimmed() {
        assert_eq!(
            SessionId::supplied("  my-bot  ").map(|s| s.to_string()),
            Some("my-bot".to_string())
        );
        assert_eq!(SessionId::supplied("   "), None);
    }
}
