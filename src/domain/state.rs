// Domain-level world records, intents and frame snapshots.

use crate::domain::tuning::WorldTuning;
use std::collections::BTreeMap;

/// A validated client request against the world, one of a closed set.
/// Session teardown is a separate message kind, not an intent.
#[derive(Debug, Clone)]
pub enum ClientIntent {
    Init { name: String, avatar: String },
    Keydown { key: String },
    Keyup { key: String },
    Click { x: i64, y: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Left,
    Down,
    Right,
}

impl Direction {
    /// Unit grid offset for this direction. Y grows downward.
    pub fn offset(self) -> (i64, i64) {
        match self {
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Down => (0, 1),
            Direction::Right => (1, 0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Left => "left",
            Direction::Down => "down",
            Direction::Right => "right",
        }
    }
}

/// Declarative on-interact behavior. Entities never carry callbacks; the
/// engine interprets the descriptor when an interaction resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityAction {
    Dialog { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub x: i64,
    pub y: i64,
    pub name: String,
    pub avatar: String,
    /// When false, a player ending a tick on this cell has its move reverted.
    pub passable: bool,
    pub action: Option<EntityAction>,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub x: i64,
    pub y: i64,
    pub name: String,
    pub avatar: String,
    pub change_x: i64,
    pub change_y: i64,
    pub facing: Direction,
    /// Armed by the interact key, consumed by the very next tick.
    pub trying_action: bool,
    pub talking_to: Option<Entity>,
    pub dialog: Option<String>,
}

impl Player {
    pub fn spawn(tuning: &WorldTuning, name: String, avatar: String) -> Self {
        Self {
            x: tuning.spawn_x,
            y: tuning.spawn_y,
            name,
            avatar,
            change_x: 0,
            change_y: 0,
            facing: Direction::Down,
            trying_action: false,
            talking_to: None,
            dialog: None,
        }
    }
}

/// Per-tick snapshot broadcast to every session. Static entities are
/// excluded; they went out once at connect time.
#[derive(Debug, Clone)]
pub struct WorldFrame {
    pub dynamic: BTreeMap<String, Entity>,
    pub players: BTreeMap<String, Player>,
}

/// One-time snapshot of load-time world geometry.
#[derive(Debug, Clone)]
pub struct StaticFrame {
    pub entities: BTreeMap<String, Entity>,
}
