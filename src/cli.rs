//! Command line: `izumie [pair <phone-digits>] [<session-id>]`.

use crate::connection::{LoginMode, PhoneNumber};
use crate::error::IzumieError;
use crate::service::SessionId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "izumie",
    version,
    about = "Link a WhatsApp account and store its session under a shareable id",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Configuration file. Defaults to ./config.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store the session under this id instead of a generated one (QR login).
    pub session_id: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in with a pairing code instead of a QR code.
    Pair {
        /// Phone number, 10-15 digits, country code first, no `+`.
        phone: String,

        /// Store the session under this id instead of a generated one.
        session_id: Option<String>,
    },
}

/// Validated command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub mode: LoginMode,
    pub session_id: Option<SessionId>,
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn into_invocation(self) -> Result<Invocation, IzumieError> {
        let (mode, session_id) = match self.command {
            Some(Command::Pair { phone, session_id }) => {
                (LoginMode::Pairing(PhoneNumber::parse(&phone)?), session_id)
            }
            None => (LoginMode::Qr, self.session_id),
        };

        Ok(Invocation {
            mode,
            session_id: session_id.as_deref().and_then(SessionId::supplied),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Invocation, IzumieError> {
        let argv = std::iter::once("izumie").chain(args.iter().copied());
        Cli::try_parse_from(argv)
            .expect("clap accepts the arguments")
            .into_invocation()
    }

    #[test]
    fn no_arguments_means_qr() {
        let inv = parse(&[]).unwrap();
        assert_eq!(inv.mode, LoginMode::Qr);
        assert_eq!(inv.session_id, None);
        assert_eq!(inv.config, None);
    }

    #[test]
    fn qr_with_session_id() {
        let inv = parse(&["my-bot"]).unwrap();
        assert_eq!(inv.mode, LoginMode::Qr);
        assert_eq!(inv.session_id.unwrap().as_str(), "my-bot");
    }

    #[test]
    fn pair_with_phone_and_session_id() {
        let inv = parse(&["--config", "alt.toml", "pair", "12025550123", "bot-7"]).unwrap();
        assert_eq!(
            inv.mode,
            LoginMode::Pairing(PhoneNumber::parse("12025550123").unwrap())
        );
        assert_eq!(inv.session_id.unwrap().as_str(), "bot-7");
        assert_eq!(inv.config, Some(PathBuf::from("alt.toml")));
    }

    #[test]
    fn malformed_phone_is_rejected() {
        for phone in ["12345", "+12025550123", "1202555O123", "1234567890123456"] {
            assert!(matches!(
                parse(&["pair", phone]),
                Err(IzumieError::InvalidPhoneNumber(_))
            ));
        }
    }

    #[test]
    fn pair_without_phone_is_a_usage_error() {
        assert!(Cli::try_parse_from(["izumie", "pair"]).is_err());
    }
}
