// Map loader rules: rectangularity, border offsets, kind mapping, and key
// uniqueness within a single load.

use std::collections::BTreeSet;
use world_server::domain::map::{DEFAULT_MAP, MapError, load_grid};
use world_server::domain::{Entity, EntityAction};

#[test]
fn rejects_a_ragged_grid() {
    let result = load_grid("ww\nw");
    assert!(matches!(result, Err(MapError::NotRectangular { line: 1 })));
}

#[test]
fn loads_an_empty_source() {
    let (static_entities, dynamic_entities) = load_grid("").expect("empty source is valid");
    assert!(static_entities.is_empty());
    assert!(dynamic_entities.is_empty());
}

#[test]
fn first_row_and_column_sit_outside_the_visible_region() {
    let (static_entities, _) = load_grid("w").expect("single cell grid");

    let wall = static_entities
        .get("wall-1,-1")
        .expect("wall keyed by its grid indices");
    assert_eq!((wall.x, wall.y), (-500, -500));
}

#[test]
fn characters_map_to_their_entity_kinds() {
    let (static_entities, dynamic_entities) = load_grid("wc\ntn").expect("grid loads");

    let wall = &static_entities["wall-1,-1"];
    assert!(!wall.passable);
    assert!(wall.action.is_none());

    let tree = &static_entities["tree-1,0"];
    assert_eq!((tree.x, tree.y), (-500, 0));
    assert!(!tree.passable);

    let coin = &dynamic_entities["coin0,-1"];
    assert_eq!((coin.x, coin.y), (0, -500));
    assert!(coin.passable);

    let npc = &dynamic_entities["npc0,0"];
    assert_eq!((npc.x, npc.y), (0, 0));
    assert!(!npc.passable);
    assert!(matches!(npc.action, Some(EntityAction::Dialog { .. })));
}

#[test]
fn floor_characters_produce_no_entities() {
    let (static_entities, dynamic_entities) = load_grid("..\n..").expect("grid loads");
    assert!(static_entities.is_empty());
    assert!(dynamic_entities.is_empty());
}

#[test]
fn keys_are_unique_across_one_load() {
    let (static_entities, dynamic_entities) = load_grid(DEFAULT_MAP).expect("default map loads");

    let total = static_entities.len() + dynamic_entities.len();
    let distinct: BTreeSet<&String> = static_entities
        .keys()
        .chain(dynamic_entities.keys())
        .collect();
    assert_eq!(distinct.len(), total);
    assert!(total > 0);
}

#[test]
fn static_and_dynamic_collections_are_disjoint_by_kind() {
    let (static_entities, dynamic_entities) = load_grid(DEFAULT_MAP).expect("default map loads");

    let is_blocking_geometry =
        |e: &Entity| matches!(e.name.as_str(), "wall" | "tree") && !e.passable;
    assert!(static_entities.values().all(is_blocking_geometry));
    assert!(
        dynamic_entities
            .values()
            .all(|e| matches!(e.name.as_str(), "coin" | "npc"))
    );
}
