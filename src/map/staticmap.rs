//! Hand-authored layout loader.
//!
//! Interprets the template's ASCII rows into the access grid. Unknown
//! characters are rejected rather than guessed at; a bad layout is a
//! template error, not something to paper over at runtime.

use glam::IVec2;

use crate::map::access::{access_mask_for_tier, TileClass};
use crate::map::Map;
use crate::mission::{GenerateError, StaticLayout};

/// Apply a static layout onto the access grid. Cells beyond the layout
/// stay whatever the caller initialized them to; cells outside the grid
/// are ignored. Sets `key_access_count` from the highest tier used.
pub fn build(map: &mut Map, layout: &StaticLayout) -> Result<(), GenerateError> {
    let mut max_tier: Option<u32> = None;
    for (y, row) in layout.rows.iter().enumerate() {
        for (x, c) in row.chars().enumerate() {
            let pos = IVec2::new(x as i32, y as i32);
            if !map.contains_tile(pos) {
                continue;
            }
            let code = match c {
                '#' => TileClass::Wall.code(),
                '.' => TileClass::Floor.code(),
                '+' => TileClass::Door.code(),
                'o' => TileClass::Room.code(),
                's' => TileClass::Square.code(),
                ' ' => TileClass::Nothing.code(),
                '1'..='4' => {
                    let tier = c as u32 - '1' as u32;
                    max_tier = Some(max_tier.map_or(tier, |m| m.max(tier)));
                    TileClass::Room.code() | access_mask_for_tier(tier as i32)
                }
                other => {
                    return Err(GenerateError::BadTemplate(format!(
                        "unknown layout character {other:?} at {x},{y}"
                    )))
                }
            };
            map.set_access(pos, code);
        }
    }
    map.key_access_count = match max_tier {
        Some(t) => t + 2,
        None => 1,
    };
    Ok(())
}
