pub mod anchor;
pub mod capture;
pub mod error;
pub mod geometry;
pub mod io;
pub mod render;
pub mod sim;
pub mod system;
pub mod tracking;

pub use error::{Result, SessionError};
pub use system::{ArSession, SessionEvent, SessionState};
