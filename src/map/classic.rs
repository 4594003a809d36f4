//! Procedural room/corridor interior builder.
//!
//! Writes only the access grid: rooms are walled rectangles carved out of
//! the open floor, with one or two doors punched through the wall ring.
//! Rooms past the first few unlocked ones get keycard access tiers in
//! yellow-green-blue-red order; the resulting tier ladder drives keycard
//! placement later. Rooms keep a one-tile gap from each other so every
//! door opens onto free floor and the map stays fully connected.

use glam::IVec2;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::debug;

use crate::map::access::{access_mask_for_tier, TileClass};
use crate::map::Map;
use crate::mission::ClassicParams;

// Attempts per requested room/square before giving up on it
const PLACEMENT_ATTEMPTS: u32 = 100;

pub fn build(map: &mut Map, params: &ClassicParams, rng: &mut Xoshiro256StarStar) {
    place_squares(map, params.square_count, rng);

    // Interior must be at least 2x2 so a keycard pocket (two stacked clear
    // room tiles) always exists
    let room_min = params.room_min.max(4);
    let room_max = params.room_max.max(room_min);

    let mut placed = 0u32;
    let mut max_tier: Option<u32> = None;
    for _ in 0..params.room_count {
        let Some(rect) = find_clear_rect(map, room_min, room_max, rng) else {
            continue;
        };
        let tier = if placed >= params.unlocked_rooms {
            Some((placed - params.unlocked_rooms) % 4)
        } else {
            None
        };
        carve_room(map, rect, tier, rng);
        if let Some(t) = tier {
            max_tier = Some(max_tier.map_or(t, |m| m.max(t)));
        }
        placed += 1;
    }

    map.key_access_count = match max_tier {
        Some(t) => t + 2,
        None => 1,
    };
    debug!(
        rooms = placed,
        key_access_count = map.key_access_count,
        "classic interior built"
    );
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    pos: IVec2,
    size: IVec2,
}

fn place_squares(map: &mut Map, count: u32, rng: &mut Xoshiro256StarStar) {
    for _ in 0..count {
        for _ in 0..PLACEMENT_ATTEMPTS {
            let size = IVec2::new(rng.gen_range(4..8), rng.gen_range(3..6));
            let Some(rect) = random_rect(map, size, rng) else {
                continue;
            };
            if !rect_is_all_floor(map, grow(rect)) {
                continue;
            }
            for y in rect.pos.y..rect.pos.y + rect.size.y {
                for x in rect.pos.x..rect.pos.x + rect.size.x {
                    map.set_access(IVec2::new(x, y), TileClass::Square.code());
                }
            }
            break;
        }
    }
}

fn find_clear_rect(
    map: &Map,
    room_min: i32,
    room_max: i32,
    rng: &mut Xoshiro256StarStar,
) -> Option<Rect> {
    for _ in 0..PLACEMENT_ATTEMPTS {
        let size = IVec2::new(
            rng.gen_range(room_min..=room_max),
            rng.gen_range(room_min..=room_max),
        );
        let Some(rect) = random_rect(map, size, rng) else {
            continue;
        };
        // One tile of clearance keeps door fronts free of later walls
        if rect_is_all_floor(map, grow(rect)) {
            return Some(rect);
        }
    }
    None
}

/// Random rect of `size` inside the perimeter ring; `None` if the map is
/// too small for it
fn random_rect(map: &Map, size: IVec2, rng: &mut Xoshiro256StarStar) -> Option<Rect> {
    let max_x = map.size.x - 1 - size.x;
    let max_y = map.size.y - 1 - size.y;
    if max_x < 1 || max_y < 1 {
        return None;
    }
    Some(Rect {
        pos: IVec2::new(rng.gen_range(1..=max_x), rng.gen_range(1..=max_y)),
        size,
    })
}

fn grow(r: Rect) -> Rect {
    Rect {
        pos: r.pos - IVec2::ONE,
        size: r.size + IVec2::splat(2),
    }
}

fn rect_is_all_floor(map: &Map, r: Rect) -> bool {
    for y in r.pos.y..r.pos.y + r.size.y {
        for x in r.pos.x..r.pos.x + r.size.x {
            let pos = IVec2::new(x, y);
            if !map.contains_tile(pos) || map.tile_class(pos) != TileClass::Floor {
                return false;
            }
        }
    }
    true
}

fn carve_room(map: &mut Map, rect: Rect, tier: Option<u32>, rng: &mut Xoshiro256StarStar) {
    let x1 = rect.pos.x;
    let y1 = rect.pos.y;
    let x2 = rect.pos.x + rect.size.x - 1;
    let y2 = rect.pos.y + rect.size.y - 1;

    let access = tier.map(|t| access_mask_for_tier(t as i32)).unwrap_or(0);
    for y in y1..=y2 {
        for x in x1..=x2 {
            let pos = IVec2::new(x, y);
            let on_ring = x == x1 || x == x2 || y == y1 || y == y2;
            if on_ring {
                map.set_access(pos, TileClass::Wall.code());
            } else {
                map.set_access(pos, TileClass::Room.code() | access);
            }
        }
    }

    let doors = rng.gen_range(1..=2);
    for _ in 0..doors {
        // A door sits mid-wall, never in a corner
        let pos = match rng.gen_range(0..4) {
            0 => IVec2::new(rng.gen_range(x1 + 1..x2), y1),
            1 => IVec2::new(rng.gen_range(x1 + 1..x2), y2),
            2 => IVec2::new(x1, rng.gen_range(y1 + 1..y2)),
            _ => IVec2::new(x2, rng.gen_range(y1 + 1..y2)),
        };
        map.set_access(pos, TileClass::Door.code() | access);
    }
}
