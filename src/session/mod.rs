//! Session lifecycle types
//!
//! A session covers one push connection from transport accept to close.
//! The state machine here is owned exclusively by the connection task; the
//! registry only ever sees the handle derived from it.

pub mod state;

pub use state::{SessionPhase, SessionState};
