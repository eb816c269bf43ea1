// Network adapter: per-session WebSocket handling and the frame serializer.

pub mod client;

pub use client::{frame_serializer, ws_handler};
