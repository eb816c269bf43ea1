// Numeric movement rules, grouped so tests can run the world on a small grid.

/// Key that arms an interaction attempt for the next tick.
/// Deliberately outside the movement key set so it cannot clobber velocities.
pub const INTERACT_KEY: &str = "e";

#[derive(Debug, Clone, Copy)]
pub struct WorldTuning {
    /// Distance a player covers per tick on one axis.
    pub step: i64,
    /// Fixed spawn coordinates for newly initialized players.
    pub spawn_x: i64,
    pub spawn_y: i64,
    /// Click targets closer than this on an axis do not start movement.
    pub click_deadband: i64,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            step: 50,
            spawn_x: 500,
            spawn_y: 500,
            click_deadband: 20,
        }
    }
}
