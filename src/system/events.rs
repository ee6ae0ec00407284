//! Host-facing lifecycle and status events.
//!
//! Listeners subscribe through [`EventEmitter::subscribe`] and receive every
//! event emitted afterwards, in emission order. There is no replay: a
//! listener registered after an event fired never sees it.

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::anchor::TargetIndex;

/// Coarse startup failure category reported to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArErrorCode {
    /// Camera could not be acquired.
    #[serde(rename = "VIDEO_FAIL")]
    VideoFail,
    /// Tracker setup, target registration or warm-up failed.
    #[serde(rename = "AR_FAIL")]
    ArFail,
}

impl std::fmt::Display for ArErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VideoFail => write!(f, "VIDEO_FAIL"),
            Self::ArFail => write!(f, "AR_FAIL"),
        }
    }
}

/// Event delivered to the host application.
///
/// Serializes as `{"type": "<eventName>", ...payload}` so web hosts can
/// re-dispatch it as a DOM custom event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    #[serde(rename = "arError")]
    ArError { error: ArErrorCode },

    #[serde(rename = "arReady")]
    ArReady,

    #[serde(rename = "targetFound")]
    TargetFound {
        #[serde(rename = "targetIndex")]
        target_index: TargetIndex,
    },

    #[serde(rename = "targetLost")]
    TargetLost {
        #[serde(rename = "targetIndex")]
        target_index: TargetIndex,
    },
}

impl SessionEvent {
    /// DOM-style event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ArError { .. } => "arError",
            Self::ArReady => "arReady",
            Self::TargetFound { .. } => "targetFound",
            Self::TargetLost { .. } => "targetLost",
        }
    }
}

/// Fan-out of session events to any number of listeners.
pub struct EventEmitter {
    listeners: Mutex<Vec<Sender<SessionEvent>>>,
}

impl EventEmitter {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener. Only events emitted after this call are delivered.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        self.listeners.lock().push(tx);
        rx
    }

    /// Deliver an event to every live listener.
    ///
    /// Listeners whose receiver was dropped are pruned.
    pub fn emit(&self, event: SessionEvent) {
        tracing::debug!(event = event.name(), "emitting session event");
        self.listeners
            .lock()
            .retain(|listener| listener.send(event).is_ok());
    }

    /// Number of registered listeners. Disconnected ones are only pruned on emit.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::new()
    }
}
