// Use cases layer: application workflows for the world server.

pub mod game;
pub mod types;

pub use types::SessionEvent;
