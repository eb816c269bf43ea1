use crate::use_cases::SessionEvent;
use axum::extract::ws::Utf8Bytes;
use tokio::sync::{broadcast, mpsc, watch};

#[derive(Clone)]
pub struct AppState {
    // Session events flowing from the network into the world task.
    pub event_tx: mpsc::Sender<SessionEvent>,
    // Serialized tick frames, shared across all sessions.
    pub frame_bytes_tx: broadcast::Sender<Utf8Bytes>,
    // Latest serialized frame for lag recovery.
    pub frame_latest_tx: watch::Sender<Utf8Bytes>,
    // Static snapshot serialized once at startup, sent per connect.
    pub static_bytes: Utf8Bytes,
    // Optional cap on inbound messages per session.
    pub max_session_messages: Option<u64>,
}
