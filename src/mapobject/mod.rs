//! Placeable prop templates.
//!
//! One read-only catalog for the whole game. Each entry describes a prop's
//! sprites, footprint, structure points and the placement rules the map
//! generator validates before spawning it.

use bitflags::bitflags;

use crate::map::access::{MAP_LEAVEFREE, MAP_MASKACCESS, TileClass};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MapObjectFlags: u32 {
        /// Only on room tiles
        const ROOM_ONLY = 0x0001;
        /// Never on room tiles
        const NOT_IN_ROOM = 0x0002;
        /// Drawn against a wall; the tile above must be wall
        const ON_WALL = 0x0004;
        /// Exactly one orthogonally adjacent wall
        const ONE_WALL = 0x0008;
        /// At least one orthogonally adjacent wall
        const ONE_WALL_PLUS = 0x0010;
        /// No walls in any of the 8 surrounding tiles
        const NO_WALLS = 0x0020;
        /// Tile below must stay walkable (marked leave-free)
        const FREE_IN_FRONT = 0x0040;
        const IMPASSABLE = 0x0080;
        const CAN_BE_SHOT = 0x0100;
        const EXPLOSIVE = 0x0200;
        const FLAMMABLE = 0x0400;
        const POISONOUS = 0x0800;
        /// Screen-shake on destruction
        const QUAKE = 0x1000;
    }
}

/// Static catalog entry for one placeable prop
#[derive(Debug, Clone, Copy)]
pub struct MapObjectTemplate {
    pub name: &'static str,
    pub pic: u16,
    pub wrecked_pic: u16,
    pub width: i32,
    pub height: i32,
    /// Structural hit points
    pub structure: i32,
    pub flags: MapObjectFlags,
}

const CATALOG: &[MapObjectTemplate] = &[
    MapObjectTemplate {
        name: "barrel",
        pic: 100,
        wrecked_pic: 101,
        width: 8,
        height: 6,
        structure: 40,
        flags: MapObjectFlags::NOT_IN_ROOM.union(MapObjectFlags::FLAMMABLE),
    },
    MapObjectTemplate {
        name: "crate",
        pic: 102,
        wrecked_pic: 103,
        width: 8,
        height: 6,
        structure: 20,
        flags: MapObjectFlags::NOT_IN_ROOM,
    },
    MapObjectTemplate {
        name: "skull_barrel",
        pic: 104,
        wrecked_pic: 105,
        width: 8,
        height: 6,
        structure: 40,
        flags: MapObjectFlags::NOT_IN_ROOM
            .union(MapObjectFlags::EXPLOSIVE)
            .union(MapObjectFlags::QUAKE),
    },
    MapObjectTemplate {
        name: "cabinet",
        pic: 106,
        wrecked_pic: 107,
        width: 8,
        height: 6,
        structure: 20,
        flags: MapObjectFlags::ROOM_ONLY
            .union(MapObjectFlags::ONE_WALL_PLUS)
            .union(MapObjectFlags::FREE_IN_FRONT),
    },
    MapObjectTemplate {
        name: "table",
        pic: 108,
        wrecked_pic: 109,
        width: 8,
        height: 6,
        structure: 20,
        flags: MapObjectFlags::ROOM_ONLY.union(MapObjectFlags::NO_WALLS),
    },
    MapObjectTemplate {
        name: "plant",
        pic: 110,
        wrecked_pic: 111,
        width: 4,
        height: 3,
        structure: 20,
        flags: MapObjectFlags::ROOM_ONLY.union(MapObjectFlags::ONE_WALL_PLUS),
    },
    MapObjectTemplate {
        name: "safe",
        pic: 112,
        wrecked_pic: 113,
        width: 8,
        height: 6,
        structure: 100,
        flags: MapObjectFlags::ROOM_ONLY
            .union(MapObjectFlags::ONE_WALL_PLUS)
            .union(MapObjectFlags::FREE_IN_FRONT),
    },
    MapObjectTemplate {
        name: "lab_table",
        pic: 114,
        wrecked_pic: 115,
        width: 8,
        height: 6,
        structure: 60,
        flags: MapObjectFlags::ROOM_ONLY
            .union(MapObjectFlags::ONE_WALL_PLUS)
            .union(MapObjectFlags::FREE_IN_FRONT)
            .union(MapObjectFlags::POISONOUS),
    },
    MapObjectTemplate {
        name: "rocket",
        pic: 116,
        wrecked_pic: 117,
        width: 8,
        height: 6,
        structure: 40,
        flags: MapObjectFlags::NOT_IN_ROOM
            .union(MapObjectFlags::EXPLOSIVE)
            .union(MapObjectFlags::QUAKE),
    },
    MapObjectTemplate {
        name: "egg",
        pic: 118,
        wrecked_pic: 119,
        width: 8,
        height: 6,
        structure: 30,
        flags: MapObjectFlags::IMPASSABLE.union(MapObjectFlags::CAN_BE_SHOT),
    },
    MapObjectTemplate {
        name: "wall_skull",
        pic: 120,
        wrecked_pic: 120,
        width: 0,
        height: 0,
        structure: 0,
        flags: MapObjectFlags::ON_WALL,
    },
    MapObjectTemplate {
        name: "dead_tree",
        pic: 122,
        wrecked_pic: 123,
        width: 4,
        height: 3,
        structure: 40,
        flags: MapObjectFlags::NOT_IN_ROOM,
    },
];

pub fn catalog() -> &'static [MapObjectTemplate] {
    CATALOG
}

pub fn get(index: usize) -> Option<&'static MapObjectTemplate> {
    CATALOG.get(index)
}

fn is_placeable_base(class: TileClass) -> bool {
    matches!(
        class,
        TileClass::Floor | TileClass::Square | TileClass::Room
    )
}

/// Basic placement check: floor-like, empty, and wall above for wall props
pub fn is_tile_ok(
    obj: &MapObjectTemplate,
    code: u16,
    is_empty: bool,
    code_above: u16,
) -> bool {
    let Some(class) = TileClass::from_code(code) else {
        return false;
    };
    if !is_placeable_base(class) {
        return false;
    }
    if !is_empty {
        return false;
    }
    if obj.flags.contains(MapObjectFlags::ON_WALL)
        && TileClass::from_code(code_above) != Some(TileClass::Wall)
    {
        return false;
    }
    true
}

/// Full placement check against all rule flags
#[allow(clippy::too_many_arguments)]
pub fn is_tile_ok_strict(
    obj: &MapObjectTemplate,
    code: u16,
    is_empty: bool,
    code_above: u16,
    code_below: u16,
    num_walls_adjacent: u32,
    num_walls_around: u32,
) -> bool {
    if !is_tile_ok(obj, code, is_empty, code_above) {
        return false;
    }
    if code & MAP_LEAVEFREE != 0 {
        return false;
    }
    let class = TileClass::from_code(code & MAP_MASKACCESS);
    let in_room = class == Some(TileClass::Room);
    if obj.flags.contains(MapObjectFlags::ROOM_ONLY) && !in_room {
        return false;
    }
    if obj.flags.contains(MapObjectFlags::NOT_IN_ROOM) && in_room {
        return false;
    }
    if obj.flags.contains(MapObjectFlags::FREE_IN_FRONT) {
        let below = TileClass::from_code(code_below);
        if !below.map(is_placeable_base).unwrap_or(false) {
            return false;
        }
    }
    if obj.flags.contains(MapObjectFlags::ONE_WALL) && num_walls_adjacent != 1 {
        return false;
    }
    if obj.flags.contains(MapObjectFlags::ONE_WALL_PLUS) && num_walls_adjacent < 1 {
        return false;
    }
    if obj.flags.contains(MapObjectFlags::NO_WALLS) && num_walls_around != 0 {
        return false;
    }
    true
}
