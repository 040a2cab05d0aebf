mod izumie;
mod protocol;

pub use izumie::IzumieError;
pub use protocol::ProtocolError;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}
