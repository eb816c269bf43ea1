use std::{env, time::Duration};

// Runtime/server constants (not gameplay tuning).

pub fn http_port() -> u16 {
    env::var("WORLD_SERVER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000)
}

/// Path to a map grid file. When unset the built-in map is used; when set,
/// a read or parse failure is fatal at startup.
pub fn map_path() -> Option<String> {
    env::var("WORLD_MAP_PATH").ok()
}

/// Optional cap on inbound messages per session; reaching it tears the
/// session down through the normal cleanup path.
pub fn max_session_messages() -> Option<u64> {
    env::var("WORLD_MAX_SESSION_MESSAGES")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 128;

/// Fixed simulation rate: 30 ticks per second.
pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 30);
