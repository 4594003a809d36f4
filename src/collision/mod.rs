//! Collision and visibility predicates over the tile grid.
//!
//! Everything here is a pure query: the map and entity store are read,
//! never mutated. Movement code and the AI both lean on these, so they are
//! written to be cheap and branch-predictable.

use glam::IVec2;

use crate::constants::{ACTOR_H, ACTOR_W};
use crate::entity::{Actor, EntityStore, PropFlags};
use crate::map::access::{KeycardFlags, TileClass};
use crate::map::Map;
use crate::mission::{AllyCollision, GameConfig};
use crate::tile::{real_to_tile, ThingId, ThingKind};

/// Which side of the fight an occupant is on. Same-team occupants never
/// collide with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionTeam {
    Good,
    Bad,
    None,
}

/// Team of an actor for collision purposes. In dogfight everyone is on
/// their own, so the team degenerates to `None`.
pub fn calc_collision_team(is_dogfight: bool, actor: &Actor) -> CollisionTeam {
    if is_dogfight {
        return CollisionTeam::None;
    }
    if actor.is_good() {
        CollisionTeam::Good
    } else {
        CollisionTeam::Bad
    }
}

pub fn is_on_same_team(a: CollisionTeam, b: CollisionTeam) -> bool {
    a != CollisionTeam::None && a == b
}

/// Solid at this real position: out of bounds or an unwalkable tile
pub fn hit_wall(map: &Map, real: IVec2) -> bool {
    if !map.contains_real(real) {
        return true;
    }
    !map.tile(real_to_tile(real)).map(|t| t.can_walk()).unwrap_or(false)
}

/// Bullet-stopping at this real position
pub fn shoot_wall(map: &Map, real: IVec2) -> bool {
    if !map.contains_real(real) {
        return true;
    }
    !map.tile(real_to_tile(real)).map(|t| t.can_shoot()).unwrap_or(false)
}

/// Does a bounding box of `size` centered at `real` overlap any unwalkable
/// tile. Boxes poking outside the grid count as colliding.
pub fn is_collision_with_wall(map: &Map, real: IVec2, size: IVec2) -> bool {
    let half = size / 2;
    let min = real - half;
    let max = real + half;
    if !map.contains_real(min) || !map.contains_real(max) {
        return true;
    }
    let t_min = real_to_tile(min);
    let t_max = real_to_tile(max);
    for y in t_min.y..=t_max.y {
        for x in t_min.x..=t_max.x {
            match map.tile(IVec2::new(x, y)) {
                Some(t) if t.can_walk() => {}
                _ => return true,
            }
        }
    }
    false
}

/// Walkable now, or a door the held keycards could open. A locked door
/// counts as passable for planning purposes when the key is in hand.
pub fn is_tile_walkable_or_openable(map: &Map, pos: IVec2, held: KeycardFlags) -> bool {
    let Some(t) = map.tile(pos) else { return false };
    if t.can_walk() {
        return true;
    }
    if map.tile_class(pos) != TileClass::Door {
        return false;
    }
    let required = map.door_keycard_flag(pos);
    required.is_empty() || required.intersects(held)
}

/// Walkable-or-openable, and free of props that explode when bumped
pub fn is_tile_walkable(map: &Map, store: &EntityStore, pos: IVec2, held: KeycardFlags) -> bool {
    if !is_tile_walkable_or_openable(map, pos, held) {
        return false;
    }
    let Some(t) = map.tile(pos) else { return false };
    for tid in &t.things {
        if tid.kind == ThingKind::Object {
            if let Some(p) = store.prop(tid.id) {
                if p.flags.contains(PropFlags::DANGEROUS) {
                    return false;
                }
            }
        }
    }
    true
}

/// Strictest walkability: also refuses tiles occupied by solid props and,
/// depending on the ally-collision policy, by other characters.
pub fn is_tile_walkable_around_objects(
    map: &Map,
    store: &EntityStore,
    config: &GameConfig,
    pos: IVec2,
    held: KeycardFlags,
) -> bool {
    if !is_tile_walkable_or_openable(map, pos, held) {
        return false;
    }
    let Some(t) = map.tile(pos) else { return false };
    for tid in &t.things {
        match tid.kind {
            ThingKind::Object => {
                if store.prop(tid.id).map(|p| p.blocks_movement()).unwrap_or(false) {
                    return false;
                }
            }
            ThingKind::Character => match config.ally_collision {
                AllyCollision::Block => return false,
                // Repulsion is resolved during movement; for planning the
                // tile counts as passable
                AllyCollision::Repel => {}
                AllyCollision::Ignore => {}
            },
        }
    }
    true
}

/// Error-diffusion line walk from `from` to `to` in real coordinates.
/// Conservatively visits both tiles the line's thickness touches when it
/// runs between two rows (or columns), so a diagonal cannot slip through a
/// wall corner. Returns false as soon as a visited tile is blocked.
pub fn has_clear_line(from: IVec2, to: IVec2, is_blocked: &impl Fn(IVec2) -> bool) -> bool {
    let a = real_to_tile(from);
    let b = real_to_tile(to);
    if a == b {
        return true;
    }
    let d = b - a;
    if d.x.abs() >= d.y.abs() {
        clear_line_major(a.x, a.y, b.x, d.x, d.y, &|major, minor| {
            !is_blocked(IVec2::new(major, minor))
        })
    } else {
        clear_line_major(a.y, a.x, b.y, d.y, d.x, &|major, minor| {
            !is_blocked(IVec2::new(minor, major))
        })
    }
}

// 16.16 fixed-point walk along the major axis; `ok(major, minor)` tests one
// tile in axis-swapped coordinates.
fn clear_line_major(
    a_major: i32,
    a_minor: i32,
    b_major: i32,
    d_major: i32,
    d_minor: i32,
    ok: &impl Fn(i32, i32) -> bool,
) -> bool {
    let step = d_major.signum();
    let grad = ((d_minor as i64) << 16) / (d_major.abs() as i64);
    // Start at the tile center so the first diffusion step is unbiased
    let mut minor_fp = ((a_minor as i64) << 16) + 0x8000;
    let mut major = a_major;
    let mut prev_minor = a_minor;
    loop {
        let minor = (minor_fp >> 16) as i32;
        if !ok(major, minor) {
            return false;
        }
        let frac = minor_fp & 0xFFFF;
        if frac != 0x8000 {
            let spill = if frac < 0x8000 { minor - 1 } else { minor + 1 };
            if !ok(major, spill) {
                return false;
            }
        }
        // Diagonal step: the line grazed the corner-adjacent tile too
        if minor != prev_minor && !ok(major, prev_minor) {
            return false;
        }
        if major == b_major {
            break;
        }
        prev_minor = minor;
        major += step;
        minor_fp += grad;
    }
    true
}

/// Can an actor walk a straight line between two real positions. With
/// `ignore_objects` only walls and locked doors block; otherwise props and
/// characters do too.
pub fn has_clear_path(
    map: &Map,
    store: &EntityStore,
    config: &GameConfig,
    held: KeycardFlags,
    from: IVec2,
    to: IVec2,
    ignore_objects: bool,
) -> bool {
    // The mover occupies the start tile; it must not block its own line
    let start = real_to_tile(from);
    if ignore_objects {
        has_clear_line(from, to, &|t| {
            t != start && !is_tile_walkable(map, store, t, held)
        })
    } else {
        has_clear_line(from, to, &|t| {
            t != start && !is_tile_walkable_around_objects(map, store, config, t, held)
        })
    }
}

/// Swept firing corridor: four clear-line tests offset by half the muzzle
/// box in each axis. Offsets starting outside the grid are skipped; every
/// attempted test must pass.
pub fn has_clear_shot(map: &Map, from: IVec2, to: IVec2) -> bool {
    let offsets = [
        IVec2::new((ACTOR_W + 2) / 2, 0),
        IVec2::new(-(ACTOR_W + 2) / 2, 0),
        IVec2::new(0, (ACTOR_H + 2) / 2),
        IVec2::new(0, -(ACTOR_H + 2) / 2),
    ];
    let blocked = |t: IVec2| !map.tile(t).map(|tile| tile.can_see()).unwrap_or(false);
    for off in offsets {
        let start = from + off;
        if !map.contains_real(start) {
            continue;
        }
        if !has_clear_line(start, to, &blocked) {
            return false;
        }
    }
    true
}

/// First occupant whose bounding box overlaps a box of `size` at `pos`.
/// Same-team characters and non-solid props never collide.
pub fn item_in_collision(
    map: &Map,
    store: &EntityStore,
    config: &GameConfig,
    pos: IVec2,
    size: IVec2,
    exclude: Option<ThingId>,
    team: CollisionTeam,
) -> Option<ThingId> {
    let half = size / 2;
    let t_min = real_to_tile(IVec2::new((pos.x - half.x).max(0), (pos.y - half.y).max(0)));
    let t_max = real_to_tile(pos + half);
    for ty in t_min.y..=t_max.y {
        for tx in t_min.x..=t_max.x {
            let Some(tile) = map.tile(IVec2::new(tx, ty)) else {
                continue;
            };
            for &tid in &tile.things {
                if Some(tid) == exclude {
                    continue;
                }
                let (other_pos, other_size) = match tid.kind {
                    ThingKind::Character => {
                        let Some(a) = store.actor(tid.id) else { continue };
                        if a.dead || !a.in_use {
                            continue;
                        }
                        let other_team = calc_collision_team(config.dogfight, a);
                        if is_on_same_team(team, other_team) {
                            continue;
                        }
                        (a.pos, IVec2::new(ACTOR_W, ACTOR_H))
                    }
                    ThingKind::Object => {
                        let Some(p) = store.prop(tid.id) else { continue };
                        if !p.blocks_movement() {
                            continue;
                        }
                        (p.pos, p.size)
                    }
                };
                if boxes_overlap(pos, size, other_pos, other_size) {
                    return Some(tid);
                }
            }
        }
    }
    None
}

fn boxes_overlap(p1: IVec2, s1: IVec2, p2: IVec2, s2: IVec2) -> bool {
    let h1 = s1 / 2;
    let h2 = s2 / 2;
    p1.x - h1.x < p2.x + h2.x
        && p1.x + h1.x > p2.x - h2.x
        && p1.y - h1.y < p2.y + h2.y
        && p1.y + h1.y > p2.y - h2.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::ActorFlags;
    use crate::map::access::MAP_ACCESS_BLUE;
    use crate::tile::{tile_center, DOOR_TILE_FLAGS, TileFlags};

    fn open_map() -> Map {
        Map::new(IVec2::new(20, 20))
    }

    fn wall(map: &mut Map, pos: IVec2) {
        map.tile_mut(pos).unwrap().flags =
            TileFlags::IS_WALL | TileFlags::NO_WALK | TileFlags::NO_SEE | TileFlags::NO_SHOOT;
        map.set_access(pos, TileClass::Wall.code());
    }

    fn closed_door(map: &mut Map, pos: IVec2) {
        map.tile_mut(pos).unwrap().flags = DOOR_TILE_FLAGS;
        map.set_access(pos, TileClass::Door.code());
    }

    #[test]
    fn test_collision_teams() {
        let good = Actor {
            id: 0,
            pos: IVec2::ZERO,
            flags: ActorFlags::GOOD_GUY,
            is_player: false,
            dead: false,
            in_use: true,
        };
        let bad = Actor {
            flags: ActorFlags::empty(),
            ..good.clone()
        };
        assert_eq!(calc_collision_team(false, &good), CollisionTeam::Good);
        assert_eq!(calc_collision_team(false, &bad), CollisionTeam::Bad);
        // Free-for-all dissolves teams
        assert_eq!(calc_collision_team(true, &good), CollisionTeam::None);
        assert!(is_on_same_team(CollisionTeam::Good, CollisionTeam::Good));
        assert!(!is_on_same_team(CollisionTeam::None, CollisionTeam::None));
    }

    #[test]
    fn test_wall_hits() {
        let mut map = open_map();
        wall(&mut map, IVec2::new(5, 5));
        assert!(hit_wall(&map, tile_center(IVec2::new(5, 5))));
        assert!(!hit_wall(&map, tile_center(IVec2::new(4, 5))));
        assert!(hit_wall(&map, IVec2::new(-1, 0)));
        assert!(shoot_wall(&map, tile_center(IVec2::new(5, 5))));
    }

    #[test]
    fn test_box_wall_collision() {
        let mut map = open_map();
        wall(&mut map, IVec2::new(5, 5));
        let size = IVec2::new(ACTOR_W, ACTOR_H);
        assert!(is_collision_with_wall(&map, tile_center(IVec2::new(5, 5)), size));
        // Box straddling the wall edge collides even though its center tile
        // is clear
        let near = IVec2::new(5 * crate::constants::TILE_WIDTH - 2, tile_center(IVec2::new(5, 5)).y);
        assert!(is_collision_with_wall(&map, near, size));
        assert!(!is_collision_with_wall(&map, tile_center(IVec2::new(2, 2)), size));
        // Poking off the map edge collides
        assert!(is_collision_with_wall(&map, IVec2::new(2, 2), size));
    }

    #[test]
    fn test_door_walkable_or_openable() {
        let mut map = open_map();
        let door = IVec2::new(6, 6);
        closed_door(&mut map, door);
        // Unlocked door is passable for planning
        assert!(is_tile_walkable_or_openable(&map, door, KeycardFlags::empty()));

        // Locked door requires the matching key
        map.set_access(door, TileClass::Door.code() | MAP_ACCESS_BLUE);
        assert!(!is_tile_walkable_or_openable(&map, door, KeycardFlags::empty()));
        assert!(!is_tile_walkable_or_openable(&map, door, KeycardFlags::RED));
        assert!(is_tile_walkable_or_openable(&map, door, KeycardFlags::BLUE));

        // A plain wall is never openable
        let w = IVec2::new(8, 8);
        wall(&mut map, w);
        assert!(!is_tile_walkable_or_openable(&map, w, KeycardFlags::all()));
    }

    #[test]
    fn test_walkable_rejects_dangerous_props() {
        let mut map = open_map();
        let mut store = EntityStore::new();
        let pos = IVec2::new(4, 4);
        let rocket = crate::mapobject::catalog()
            .iter()
            .find(|t| t.name == "rocket")
            .unwrap();
        store.add_destructible(&mut map, tile_center(pos), rocket, None);
        assert!(!is_tile_walkable(&map, &store, pos, KeycardFlags::empty()));
        assert!(is_tile_walkable(&map, &store, IVec2::new(3, 4), KeycardFlags::empty()));
    }

    #[test]
    fn test_walkable_around_objects_policies() {
        let mut map = open_map();
        let mut store = EntityStore::new();
        let pos = IVec2::new(4, 4);
        store.add_actor(&mut map, tile_center(pos), ActorFlags::empty(), false);

        let mut config = GameConfig::default();
        assert!(!is_tile_walkable_around_objects(&map, &store, &config, pos, KeycardFlags::empty()));
        // Repel characters do not block planning
        config.ally_collision = AllyCollision::Repel;
        assert!(is_tile_walkable_around_objects(&map, &store, &config, pos, KeycardFlags::empty()));
        config.ally_collision = AllyCollision::Ignore;
        assert!(is_tile_walkable_around_objects(&map, &store, &config, pos, KeycardFlags::empty()));

        // A pickup on a tile never blocks
        let p2 = IVec2::new(7, 7);
        store.add_pickup(
            &mut map,
            p2,
            IVec2::new(4, 3),
            7,
            crate::entity::PickupKind::Health,
        );
        config.ally_collision = AllyCollision::Block;
        assert!(is_tile_walkable_around_objects(&map, &store, &config, p2, KeycardFlags::empty()));
    }

    #[test]
    fn test_clear_line_through_open_space() {
        let map = open_map();
        let blocked = |t: IVec2| !map.tile(t).map(|tile| tile.can_walk()).unwrap_or(false);
        let a = tile_center(IVec2::new(1, 1));
        let b = tile_center(IVec2::new(18, 14));
        assert!(has_clear_line(a, b, &blocked));
        assert!(has_clear_line(b, a, &blocked));
        // Degenerate: same tile
        assert!(has_clear_line(a, a + IVec2::new(1, 1), &blocked));
    }

    #[test]
    fn test_clear_line_blocked_by_wall_row() {
        let mut map = open_map();
        for x in 0..20 {
            wall(&mut map, IVec2::new(x, 8));
        }
        let blocked = |t: IVec2| !map.tile(t).map(|tile| tile.can_walk()).unwrap_or(false);
        let above = tile_center(IVec2::new(5, 3));
        let below = tile_center(IVec2::new(9, 15));
        assert!(!has_clear_line(above, below, &blocked));
        assert!(!has_clear_line(below, above, &blocked));
        // Parallel to the wall, on one side only
        assert!(has_clear_line(above, tile_center(IVec2::new(15, 3)), &blocked));
    }

    #[test]
    fn test_clear_line_does_not_cut_corners() {
        let mut map = open_map();
        // Checkerboard corner: walls at (5,5) and (6,6), gap only diagonal
        wall(&mut map, IVec2::new(5, 5));
        wall(&mut map, IVec2::new(6, 6));
        let blocked = |t: IVec2| !map.tile(t).map(|tile| tile.can_walk()).unwrap_or(false);
        // Diagonal through the shared corner must be refused
        assert!(!has_clear_line(
            tile_center(IVec2::new(6, 5)),
            tile_center(IVec2::new(4, 7)),
            &blocked
        ));
    }

    #[test]
    fn test_clear_shot_muzzle_offsets() {
        let mut map = open_map();
        for y in 0..20 {
            if y != 9 {
                wall(&mut map, IVec2::new(10, y));
            }
        }
        let from = tile_center(IVec2::new(5, 9));
        // Straight through the one-tile slit: some offset ray hits the wall
        assert!(!has_clear_shot(&map, from, tile_center(IVec2::new(15, 9))));
        // Wide open field of fire
        assert!(has_clear_shot(&map, from, tile_center(IVec2::new(5, 2))));
    }

    #[test]
    fn test_item_in_collision() {
        let mut map = open_map();
        let mut store = EntityStore::new();
        let config = GameConfig::default();
        let pos = tile_center(IVec2::new(5, 5));
        let enemy = store.add_actor(&mut map, pos, ActorFlags::empty(), false);
        let friend = store.add_actor(
            &mut map,
            tile_center(IVec2::new(8, 8)),
            ActorFlags::GOOD_GUY,
            false,
        );

        let size = IVec2::new(ACTOR_W, ACTOR_H);
        // A good-team probe overlapping the enemy collides
        assert_eq!(
            item_in_collision(&map, &store, &config, pos, size, None, CollisionTeam::Good),
            Some(enemy)
        );
        // Overlapping a same-team actor does not
        assert_eq!(
            item_in_collision(
                &map,
                &store,
                &config,
                tile_center(IVec2::new(8, 8)),
                size,
                None,
                CollisionTeam::Good
            ),
            None
        );
        // Excluding self
        assert_eq!(
            item_in_collision(&map, &store, &config, pos, size, Some(enemy), CollisionTeam::None),
            None
        );
        let _ = friend;
    }
}
