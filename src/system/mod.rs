//! AR session orchestration.
//!
//! This module contains the top-level `ArSession` that runs the startup
//! worker and routes tracker output, along with the shared state,
//! lifecycle states, tracker messages and host-facing events.

pub mod events;
pub mod messages;
pub mod session;
pub mod shared_state;
pub mod state;

pub use events::{ArErrorCode, EventEmitter, SessionEvent};
pub use messages::PoseUpdate;
pub use session::{ArSession, StartupHandle};
pub use shared_state::SharedState;
pub use state::SessionState;
