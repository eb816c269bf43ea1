// The authoritative game state engine: owns all players and entities,
// applies intents, and advances the world once per tick.

use crate::domain::state::{ClientIntent, Direction, Entity, Player, StaticFrame, WorldFrame};
use crate::domain::systems::{interaction, movement};
use crate::domain::tuning::{INTERACT_KEY, WorldTuning};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// The canonical in-memory world. All mutation goes through the owning
/// world task, so intents from any number of sessions are serialized here.
///
/// `BTreeMap` keeps iteration order stable, which makes tick output
/// deterministic for a given intent history.
pub struct GameState {
    tuning: WorldTuning,
    players: BTreeMap<String, Player>,
    static_entities: BTreeMap<String, Entity>,
    dynamic_entities: BTreeMap<String, Entity>,
}

impl GameState {
    pub fn new(
        static_entities: BTreeMap<String, Entity>,
        dynamic_entities: BTreeMap<String, Entity>,
    ) -> Self {
        Self::with_tuning(WorldTuning::default(), static_entities, dynamic_entities)
    }

    pub fn with_tuning(
        tuning: WorldTuning,
        static_entities: BTreeMap<String, Entity>,
        dynamic_entities: BTreeMap<String, Entity>,
    ) -> Self {
        Self {
            tuning,
            players: BTreeMap::new(),
            static_entities,
            dynamic_entities,
        }
    }

    /// Applies one decoded intent for a session. A misbehaving client must
    /// not be able to crash the shared world: every invalid case here is a
    /// logged no-op, never an error to the caller.
    pub fn handle_intent(&mut self, session_id: &str, intent: ClientIntent) {
        match intent {
            ClientIntent::Init { name, avatar } => self.apply_init(session_id, name, avatar),
            ClientIntent::Keydown { key } => self.apply_keydown(session_id, &key),
            ClientIntent::Keyup { key } => self.apply_keyup(session_id, &key),
            ClientIntent::Click { x, y } => self.apply_click(session_id, x, y),
        }
    }

    /// Removes the player for a session. Duplicate disconnect notifications
    /// arrive on some transports, so an unknown session is only a warning.
    pub fn handle_disconnect(&mut self, session_id: &str) {
        if self.players.remove(session_id).is_some() {
            info!(session_id, "player removed");
        } else {
            warn!(session_id, "disconnect for a session with no player");
        }
    }

    /// Advances the world by one tick: integrate velocities, undo moves
    /// that landed on blocking entities, resolve armed interactions, then
    /// consume every `trying_action` flag.
    pub fn tick(&mut self) -> WorldFrame {
        movement::integrate(&mut self.players);
        movement::resolve_collisions(
            &mut self.players,
            &self.static_entities,
            &self.dynamic_entities,
        );
        interaction::resolve(
            &mut self.players,
            &self.static_entities,
            &self.dynamic_entities,
            self.tuning.step,
        );
        for player in self.players.values_mut() {
            player.trying_action = false;
        }

        WorldFrame {
            dynamic: self.dynamic_entities.clone(),
            players: self.players.clone(),
        }
    }

    /// Load-time geometry, delivered once per session at connect.
    pub fn static_snapshot(&self) -> StaticFrame {
        StaticFrame {
            entities: self.static_entities.clone(),
        }
    }

    pub fn player(&self, session_id: &str) -> Option<&Player> {
        self.players.get(session_id)
    }

    pub fn session_ids(&self) -> impl Iterator<Item = &str> {
        self.players.keys().map(String::as_str)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    fn apply_init(&mut self, session_id: &str, name: String, avatar: String) {
        match self.players.get_mut(session_id) {
            Some(player) => {
                // A repeated init must not teleport a live player back to
                // spawn; only the cosmetic fields are refreshed.
                info!(session_id, "repeated init; refreshing name and avatar");
                player.name = name;
                player.avatar = avatar;
            }
            None => {
                info!(session_id, %name, "player joined");
                self.players.insert(
                    session_id.to_string(),
                    Player::spawn(&self.tuning, name, avatar),
                );
            }
        }
    }

    fn apply_keydown(&mut self, session_id: &str, key: &str) {
        let step = self.tuning.step;
        let Some(player) = self.players.get_mut(session_id) else {
            warn!(session_id, key, "keydown for a session with no player");
            return;
        };
        match key {
            "w" => {
                player.change_y = -step;
                player.facing = Direction::Up;
            }
            "s" => {
                player.change_y = step;
                player.facing = Direction::Down;
            }
            "a" => {
                player.change_x = -step;
                player.facing = Direction::Left;
            }
            "d" => {
                player.change_x = step;
                player.facing = Direction::Right;
            }
            INTERACT_KEY => player.trying_action = true,
            _ => debug!(session_id, key, "ignoring unmapped key"),
        }
    }

    fn apply_keyup(&mut self, session_id: &str, key: &str) {
        let Some(player) = self.players.get_mut(session_id) else {
            warn!(session_id, key, "keyup for a session with no player");
            return;
        };
        if matches!(key, "w" | "s") {
            player.change_y = 0;
        }
        if matches!(key, "a" | "d") {
            player.change_x = 0;
        }
    }

    /// Per-axis seek toward the click target: outside the deadband the
    /// velocity points at the target, inside it the axis stops. Not a path
    /// planner; blocking entities still apply on every tick.
    fn apply_click(&mut self, session_id: &str, x: i64, y: i64) {
        let (step, deadband) = (self.tuning.step, self.tuning.click_deadband);
        let Some(player) = self.players.get_mut(session_id) else {
            warn!(session_id, x, y, "click for a session with no player");
            return;
        };

        player.change_x = seek(player.x, x, step, deadband);
        player.change_y = seek(player.y, y, step, deadband);
    }
}

fn seek(current: i64, target: i64, step: i64, deadband: i64) -> i64 {
    let delta = target - current;
    if delta > deadband {
        step
    } else if delta < -deadband {
        -step
    } else {
        0
    }
}
