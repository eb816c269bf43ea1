// Domain layer: core simulation types and rules.

pub mod map;
pub mod state;
pub mod systems;
pub mod tuning;
pub mod world;

pub use state::{ClientIntent, Direction, Entity, EntityAction, Player, StaticFrame, WorldFrame};
pub use tuning::WorldTuning;
pub use world::GameState;
