pub mod notifier;
pub mod session_id;
pub mod session_persistence;

pub use notifier::Notifier;
pub use session_id::{SESSION_ID_PREFIX, SessionId};
pub use session_persistence::SessionPersister;
