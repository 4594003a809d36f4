//! Tile grid primitives.
//!
//! A [`Tile`] is the smallest addressable unit for walkability, visibility
//! and occupancy. Tiles carry sprite references as plain ids (`PicId`);
//! resolving them to actual images is the renderer's job, not ours.

use bitflags::bitflags;
use glam::IVec2;

use crate::constants::{TILE_HEIGHT, TILE_WIDTH};
use crate::trigger::TriggerId;

/// Opaque sprite reference, resolved by the external renderer
pub type PicId = u16;

bitflags! {
    /// Per-tile behavior flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct TileFlags: u16 {
        const IS_WALL = 0x0001;
        const NO_WALK = 0x0002;
        const NO_SHOOT = 0x0004;
        const NO_SEE = 0x0008;
        /// Drawn with an offset sprite; set on door tiles
        const OFFSET_PIC = 0x0010;
        const IS_NORMAL_FLOOR = 0x0020;
        const IS_DRAINAGE = 0x0040;
        const IS_NOTHING = 0x0080;
    }
}

/// Flags shared by the full door run while closed
pub const DOOR_TILE_FLAGS: TileFlags = TileFlags::NO_SEE
    .union(TileFlags::NO_WALK)
    .union(TileFlags::NO_SHOOT)
    .union(TileFlags::OFFSET_PIC);

/// Kind half of a weak entity reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThingKind {
    Character,
    Object,
}

/// Weak reference into the external entity store. The grid indexes things
/// by tile but never owns them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThingId {
    pub kind: ThingKind,
    pub id: u32,
}

impl ThingId {
    pub fn character(id: u32) -> Self {
        Self {
            kind: ThingKind::Character,
            id,
        }
    }

    pub fn object(id: u32) -> Self {
        Self {
            kind: ThingKind::Object,
            id,
        }
    }
}

/// One cell of the map grid
#[derive(Debug, Clone, Default)]
pub struct Tile {
    pub pic: PicId,
    /// Secondary offset sprite (door leaf); drawn over `pic`
    pub pic_alt: Option<PicId>,
    pub flags: TileFlags,
    pub is_visited: bool,
    /// Occupants, unordered
    pub things: Vec<ThingId>,
    /// Triggers fired when an actor steps here
    pub triggers: Vec<TriggerId>,
}

impl Tile {
    pub fn can_walk(&self) -> bool {
        !self.flags.contains(TileFlags::NO_WALK)
    }

    pub fn can_see(&self) -> bool {
        !self.flags.contains(TileFlags::NO_SEE)
    }

    pub fn can_shoot(&self) -> bool {
        !self.flags.contains(TileFlags::NO_SHOOT)
    }

    /// Plain floor with no other role; eligible for decorative re-skins
    pub fn is_normal_floor(&self) -> bool {
        self.flags.contains(TileFlags::IS_NORMAL_FLOOR)
            && !self.flags.intersects(
                TileFlags::IS_WALL
                    | TileFlags::NO_WALK
                    | TileFlags::IS_DRAINAGE
                    | TileFlags::OFFSET_PIC,
            )
    }

    /// No occupants at all
    pub fn is_clear(&self) -> bool {
        self.things.is_empty()
    }

    pub fn set_alternate_floor(&mut self, pic: PicId) {
        self.pic = pic;
        self.flags.remove(TileFlags::IS_NORMAL_FLOOR);
    }
}

/// Real (sub-tile) position to tile coordinates.
/// Callers must bounds-check negatives separately; integer division
/// truncates small negative values toward zero.
pub fn real_to_tile(real: IVec2) -> IVec2 {
    IVec2::new(real.x / TILE_WIDTH, real.y / TILE_HEIGHT)
}

/// Center of a tile in real coordinates
pub fn tile_center(tile: IVec2) -> IVec2 {
    IVec2::new(
        tile.x * TILE_WIDTH + TILE_WIDTH / 2,
        tile.y * TILE_HEIGHT + TILE_HEIGHT / 2,
    )
}

/// True if a bounding box of `size` centered at `real` lies fully inside
/// `tile`. Used to stop path-followers clipping corners.
pub fn is_box_inside_tile(real: IVec2, size: IVec2, tile: IVec2) -> bool {
    let half = size / 2;
    real.x - half.x >= tile.x * TILE_WIDTH
        && real.x + half.x < (tile.x + 1) * TILE_WIDTH
        && real.y - half.y >= tile.y * TILE_HEIGHT
        && real.y + half.y < (tile.y + 1) * TILE_HEIGHT
}
