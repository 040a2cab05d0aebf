use thiserror::Error as ThisError;

use super::protocol::ProtocolError;

#[derive(Debug, ThisError)]
pub enum IzumieError {
    #[error("Invalid phone number for pairing: {0:?}. Must be 10-15 digits (E.164 without +).")]
    InvalidPhoneNumber(String),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(#[from] Box<figment::Error>),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Ractor error: {0}")]
    RactorError(String),

    #[error("Unexpected error: {0}")]
    UnexpectedError(String),
}

impl From<figment::Error> for IzumieError {
    fn from(e: figment::Error) -> Self {
        IzumieError::ConfigError(Box::new(e))
    }
}
