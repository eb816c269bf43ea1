use crate::domain::state::{Entity, Player};
use std::collections::BTreeMap;
use tracing::debug;

/// Adds each player's per-tick velocity to its position.
pub fn integrate(players: &mut BTreeMap<String, Player>) {
    for player in players.values_mut() {
        player.x += player.change_x;
        player.y += player.change_y;
    }
}

/// Reverts this tick's delta for any player that ended up on a blocking
/// entity's cell. Post-hoc correction: the offending move is undone rather
/// than prevented, so a player can overlap for at most the resolution of
/// one tick.
pub fn resolve_collisions(
    players: &mut BTreeMap<String, Player>,
    static_entities: &BTreeMap<String, Entity>,
    dynamic_entities: &BTreeMap<String, Entity>,
) {
    for (session_id, player) in players.iter_mut() {
        let blocked = static_entities
            .values()
            .chain(dynamic_entities.values())
            .any(|e| !e.passable && e.x == player.x && e.y == player.y);
        if blocked {
            player.x -= player.change_x;
            player.y -= player.change_y;
            debug!(
                session_id,
                x = player.x,
                y = player.y,
                "move reverted by blocking entity"
            );
        }
    }
}
