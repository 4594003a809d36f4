//! Mission templates and game configuration.
//!
//! A [`MissionTemplate`] declares everything the map generator needs: grid
//! size, interior style, prop densities, objectives and (optionally) a fixed
//! exit rectangle or a hand-authored static layout. Templates are plain
//! serde structs loaded from JSON.

use bitflags::bitflags;
use glam::IVec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to read mission template: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid mission template: {0}")]
    Template(#[from] serde_json::Error),
    #[error("mission template rejected: {0}")]
    BadTemplate(String),
    #[error("could not place keycard for access tier {tier} after {attempts} attempts")]
    KeycardPlacement { tier: u32, attempts: u32 },
}

/// Which interior builder generates the room/floor layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapType {
    /// Procedural room/corridor carver
    Classic,
    /// Hand-authored layout shipped in the template
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    Collect,
    Destroy,
    Kill,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ObjectiveFlags: u8 {
        /// Place only inside keycard-locked regions
        const HIGH_ACCESS = 0x01;
        /// Place only outside keycard-locked regions
        const NO_ACCESS = 0x02;
    }
}

impl Serialize for ObjectiveFlags {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(self.bits())
    }
}

impl<'de> Deserialize<'de> for ObjectiveFlags {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let bits = u8::deserialize(d)?;
        Ok(ObjectiveFlags::from_bits_truncate(bits))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionObjective {
    pub kind: ObjectiveKind,
    /// How many instances generation should try to place
    pub count: u32,
    /// How many the player must complete; clamped to what was placed
    pub required: u32,
    /// For `Destroy`: index into the map-object catalog. For `Collect`:
    /// selects the pickup sprite.
    #[serde(default)]
    pub item: usize,
    #[serde(default)]
    pub flags: ObjectiveFlags,
}

/// Density entry: `density × area / 1000` placement attempts for one
/// catalog prop
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDensity {
    /// Index into the map-object catalog
    pub object: usize,
    pub density: u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ExitRect {
    pub start: IVec2,
    pub end: IVec2,
}

/// Hand-authored layout as ASCII rows.
/// `#` wall, `.` floor, `+` door, `o` room, `s` square, space nothing,
/// `1`-`4` room with that access tier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticLayout {
    pub rows: Vec<String>,
}

/// Tuning for the classic interior builder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassicParams {
    pub room_count: u32,
    pub room_min: i32,
    pub room_max: i32,
    /// Rooms after the first N are assigned increasing keycard tiers
    pub unlocked_rooms: u32,
    pub square_count: u32,
}

impl Default for ClassicParams {
    fn default() -> Self {
        Self {
            room_count: 8,
            room_min: 5,
            room_max: 9,
            unlocked_rooms: 4,
            square_count: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub title: String,
    pub size: IVec2,
    pub map_type: MapType,
    #[serde(default)]
    pub floor_style: u8,
    #[serde(default)]
    pub room_style: u8,
    #[serde(default)]
    pub classic: ClassicParams,
    #[serde(default)]
    pub static_layout: Option<StaticLayout>,
    #[serde(default)]
    pub item_densities: Vec<ItemDensity>,
    #[serde(default)]
    pub objectives: Vec<MissionObjective>,
    #[serde(default)]
    pub exit: Option<ExitRect>,
}

impl MissionTemplate {
    pub fn from_json(json: &str) -> Result<Self, GenerateError> {
        let t: MissionTemplate = serde_json::from_str(json)?;
        t.validate()?;
        Ok(t)
    }

    pub fn load_file(path: &std::path::Path) -> Result<Self, GenerateError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), GenerateError> {
        if self.size.x < 8 || self.size.y < 8 {
            return Err(GenerateError::BadTemplate(format!(
                "map size {}x{} below minimum 8x8",
                self.size.x, self.size.y
            )));
        }
        if self.map_type == MapType::Static && self.static_layout.is_none() {
            return Err(GenerateError::BadTemplate(
                "static mission without static_layout".into(),
            ));
        }
        if let Some(exit) = &self.exit {
            let in_bounds = exit.start.x >= 0
                && exit.start.y >= 0
                && exit.start.x <= exit.end.x
                && exit.start.y <= exit.end.y
                && exit.end.x < self.size.x
                && exit.end.y < self.size.y;
            if !in_bounds {
                return Err(GenerateError::BadTemplate(format!(
                    "exit rect {:?}..{:?} outside {}x{} map",
                    exit.start, exit.end, self.size.x, self.size.y
                )));
            }
        }
        Ok(())
    }

    /// Baseline procedural mission, used by tests and the demo driver
    pub fn default_classic(size: IVec2) -> Self {
        Self {
            title: "skirmish".into(),
            size,
            map_type: MapType::Classic,
            floor_style: 0,
            room_style: 0,
            classic: ClassicParams::default(),
            static_layout: None,
            item_densities: vec![
                ItemDensity {
                    object: 0,
                    density: 20,
                },
                ItemDensity {
                    object: 3,
                    density: 10,
                },
            ],
            objectives: vec![MissionObjective {
                kind: ObjectiveKind::Collect,
                count: 5,
                required: 3,
                item: 0,
                flags: ObjectiveFlags::empty(),
            }],
            exit: None,
        }
    }
}

/// Per-objective runtime state produced by generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectiveState {
    pub kind: ObjectiveKind,
    pub flags: ObjectiveFlags,
    pub count: u32,
    pub required: u32,
    pub placed: u32,
}

/// Campaign seed; each mission index hashes to its own RNG stream
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MissionSeed {
    pub seed: u64,
}

impl Default for MissionSeed {
    fn default() -> Self {
        Self { seed: 42 }
    }
}

impl MissionSeed {
    pub fn mission_hash(&self, mission_index: u32) -> u64 {
        let mut hasher = Sha3_256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(mission_index.to_le_bytes());
        let result = hasher.finalize();
        u64::from_le_bytes(result[0..8].try_into().unwrap_or_default())
    }

    pub fn rng(&self, mission_index: u32) -> Xoshiro256StarStar {
        Xoshiro256StarStar::seed_from_u64(self.mission_hash(mission_index))
    }
}

/// How character occupants block each other's movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllyCollision {
    /// Allies block movement
    Block,
    /// Allies push each other aside; planners treat them as passable
    Repel,
    /// Allies pass through each other
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub ally_collision: AllyCollision,
    /// Free-for-all: no same-team collision suppression
    pub dogfight: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ally_collision: AllyCollision::Block,
            dogfight: false,
        }
    }
}
