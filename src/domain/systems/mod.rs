// Per-tick simulation systems, run in order by the game state engine.

pub mod interaction;
pub mod movement;
