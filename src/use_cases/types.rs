// Use-case level inputs for the world loop.

use crate::domain::ClientIntent;

/// Everything a session can feed into the world task. Intents are decoded
/// payloads; `Disconnect` is constructed by the session manager itself on
/// teardown, never parsed off the wire.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Intent {
        session_id: String,
        intent: ClientIntent,
    },
    Disconnect {
        session_id: String,
    },
}
