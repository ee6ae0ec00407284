//! Interface to the external visual tracker.
//!
//! The tracker registers image targets, consumes frames from the input on
//! its own frame loop and reports one [`PoseUpdate`](crate::system::messages::PoseUpdate)
//! per target per frame through the channel handed over at initialization.

pub mod tracker;

pub use tracker::{Tracker, TrackerCapabilities};
