//! Connection lifecycle: one socket per attempt, bounded restarts, then persistence and
//! notification once the link opens.

mod manager;
mod mode;
mod policy;
mod qr;

pub use manager::{AttemptOutcome, ConnectionManager, RunOutcome};
pub use mode::{LoginMode, PairingState, PhoneNumber};
pub use policy::{CloseAction, HaltReason, classify_close};
pub use qr::render_qr;
