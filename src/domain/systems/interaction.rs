use crate::domain::state::{Entity, EntityAction, Player};
use std::collections::BTreeMap;
use tracing::info;

/// Resolves adjacency interactions for players that armed an interaction
/// this tick. The target cell is exactly one step away along the facing
/// axis, aligned on the perpendicular axis.
pub fn resolve(
    players: &mut BTreeMap<String, Player>,
    static_entities: &BTreeMap<String, Entity>,
    dynamic_entities: &BTreeMap<String, Entity>,
    step: i64,
) {
    for (session_id, player) in players.iter_mut() {
        if !player.trying_action {
            continue;
        }

        let (dx, dy) = player.facing.offset();
        let (target_x, target_y) = (player.x + dx * step, player.y + dy * step);

        let faced = static_entities
            .values()
            .chain(dynamic_entities.values())
            .find(|e| e.x == target_x && e.y == target_y && e.action.is_some());

        if let Some(entity) = faced {
            match &entity.action {
                Some(EntityAction::Dialog { text }) => {
                    info!(session_id, entity = %entity.name, "interaction started");
                    player.dialog = Some(text.clone());
                    player.talking_to = Some(entity.clone());
                }
                None => {}
            }
        }
    }
}
