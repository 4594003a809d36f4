//! Access grid codes.
//!
//! Every tile carries a `u16` code: the low byte holds exactly one base
//! type, bits 8-11 hold the keycard access tier, bit 12 is a generation-time
//! "leave free" hint. Access bits only ever increase during generation.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

pub const MAP_MASKACCESS: u16 = 0x00FF;
pub const MAP_ACCESSBITS: u16 = 0x0F00;

pub const MAP_ACCESS_YELLOW: u16 = 0x0100;
pub const MAP_ACCESS_GREEN: u16 = 0x0200;
pub const MAP_ACCESS_BLUE: u16 = 0x0400;
pub const MAP_ACCESS_RED: u16 = 0x0800;

/// Generation hint: keep this tile clear of placed props
pub const MAP_LEAVEFREE: u16 = 0x1000;

/// Base type of an access-grid code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileClass {
    Floor,
    Wall,
    Door,
    Room,
    Nothing,
    Square,
}

impl TileClass {
    pub fn code(self) -> u16 {
        match self {
            TileClass::Floor => 0,
            TileClass::Wall => 1,
            TileClass::Door => 2,
            TileClass::Room => 3,
            TileClass::Nothing => 4,
            TileClass::Square => 5,
        }
    }

    /// Base type of a full access code; `None` for a corrupt low byte
    pub fn from_code(code: u16) -> Option<TileClass> {
        match code & MAP_MASKACCESS {
            0 => Some(TileClass::Floor),
            1 => Some(TileClass::Wall),
            2 => Some(TileClass::Door),
            3 => Some(TileClass::Room),
            4 => Some(TileClass::Nothing),
            5 => Some(TileClass::Square),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TileClass::Floor => "Floor",
            TileClass::Wall => "Wall",
            TileClass::Door => "Door",
            TileClass::Room => "Room",
            TileClass::Nothing => "Nothing",
            TileClass::Square => "Square",
        }
    }
}

bitflags! {
    /// Keycard colors, as held by players and required by doors
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeycardFlags: u8 {
        const YELLOW = 0x01;
        const GREEN = 0x02;
        const BLUE = 0x04;
        const RED = 0x08;
    }
}

impl KeycardFlags {
    /// Keycard for access tier `k` (0 = yellow .. 3 = red)
    pub fn for_tier(k: u32) -> KeycardFlags {
        KeycardFlags::from_bits_truncate(KeycardFlags::YELLOW.bits() << k)
    }
}

/// Access mask for key tier `k`; empty mask for "no access required"
pub fn access_mask_for_tier(k: i32) -> u16 {
    if k < 0 {
        return 0;
    }
    MAP_ACCESS_YELLOW << k
}

/// Highest keycard color present in an access code. An empty result means
/// an always-unlocked tile.
pub fn access_code_to_flags(code: u16) -> KeycardFlags {
    if code & MAP_ACCESS_RED != 0 {
        KeycardFlags::RED
    } else if code & MAP_ACCESS_BLUE != 0 {
        KeycardFlags::BLUE
    } else if code & MAP_ACCESS_GREEN != 0 {
        KeycardFlags::GREEN
    } else if code & MAP_ACCESS_YELLOW != 0 {
        KeycardFlags::YELLOW
    } else {
        KeycardFlags::empty()
    }
}

/// Access-code bits for a single keycard color
pub fn flags_to_access_code(flags: KeycardFlags) -> u16 {
    if flags.contains(KeycardFlags::RED) {
        MAP_ACCESS_RED
    } else if flags.contains(KeycardFlags::BLUE) {
        MAP_ACCESS_BLUE
    } else if flags.contains(KeycardFlags::GREEN) {
        MAP_ACCESS_GREEN
    } else if flags.contains(KeycardFlags::YELLOW) {
        MAP_ACCESS_YELLOW
    } else {
        0
    }
}
