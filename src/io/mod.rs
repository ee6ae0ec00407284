pub mod config;

pub use config::SessionConfig;
