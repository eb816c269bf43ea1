// Grid map loading: a rectangular character grid becomes keyed entity maps.

use crate::domain::state::{Entity, EntityAction};
use std::collections::BTreeMap;
use std::fmt;

/// Width and height of one grid cell in world units.
pub const CELL: i64 = 500;

/// What map-loaded NPCs say when a player interacts with them.
const NPC_DIALOG: &str = "Hello! I may have work for you soon.";

/// Map used when no WORLD_MAP_PATH is configured. Row and column indices
/// start at -1, so the outer wall ring sits outside the visible region.
pub const DEFAULT_MAP: &str = "\
wwwwwwwwww
w...c....w
w..n.....w
w.c..t..cw
w....c...w
wwwwwwwwww";

#[derive(Debug)]
pub enum MapError {
    /// A line's length differs from the first line's.
    NotRectangular { line: usize },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::NotRectangular { line } => {
                write!(f, "map is not rectangular: line {line} has a different length")
            }
        }
    }
}

impl std::error::Error for MapError {}

/// Loads a rectangular grid into (static, dynamic) entity maps.
///
/// One character per cell; unreserved characters are empty floor. Keys are
/// `"{kind}{column},{row}"` composites, unique within a single load because
/// a cell holds at most one character.
pub fn load_grid(
    source: &str,
) -> Result<(BTreeMap<String, Entity>, BTreeMap<String, Entity>), MapError> {
    let lines: Vec<&str> = source.lines().collect();
    if let Some(first) = lines.first() {
        let width = first.chars().count();
        for (i, line) in lines.iter().enumerate() {
            if line.chars().count() != width {
                return Err(MapError::NotRectangular { line: i });
            }
        }
    }

    let mut static_entities = BTreeMap::new();
    let mut dynamic_entities = BTreeMap::new();
    for (row, line) in (-1i64..).zip(lines.iter()) {
        for (col, ch) in (-1i64..).zip(line.chars()) {
            let (x, y) = (col * CELL, row * CELL);
            match ch {
                'w' => {
                    static_entities.insert(
                        format!("wall{col},{row}"),
                        blocker(x, y, "wall", "/assets/wall.png"),
                    );
                }
                't' => {
                    static_entities.insert(
                        format!("tree{col},{row}"),
                        blocker(x, y, "tree", "/assets/tree.png"),
                    );
                }
                'c' => {
                    dynamic_entities.insert(
                        format!("coin{col},{row}"),
                        Entity {
                            x,
                            y,
                            name: "coin".to_string(),
                            avatar: "/assets/coin.png".to_string(),
                            passable: true,
                            action: None,
                        },
                    );
                }
                'n' => {
                    dynamic_entities.insert(
                        format!("npc{col},{row}"),
                        Entity {
                            x,
                            y,
                            name: "npc".to_string(),
                            avatar: "/assets/npc.png".to_string(),
                            passable: false,
                            action: Some(EntityAction::Dialog {
                                text: NPC_DIALOG.to_string(),
                            }),
                        },
                    );
                }
                _ => {}
            }
        }
    }

    Ok((static_entities, dynamic_entities))
}

fn blocker(x: i64, y: i64, name: &str, avatar: &str) -> Entity {
    Entity {
        x,
        y,
        name: name.to_string(),
        avatar: avatar.to_string(),
        passable: false,
        action: None,
    }
}
