//! Skirmish Core - Simulation Library
//!
//! This crate provides the deterministic simulation core for a top-down
//! tile-based action game:
//! - Procedural map generation (classic room/corridor builder, static layouts)
//! - Tile grid with collision, line-of-sight and exploration tracking
//! - Keycard access regions and trigger/watch-driven doors
//! - Prop, pickup and objective placement
//! - Enemy AI navigation (A* pathfinding, hunting, goto with cached paths)

pub mod ai;
pub mod collision;
pub mod constants;
pub mod entity;
pub mod logging;
pub mod map;
pub mod mapobject;
pub mod mission;
pub mod tile;
pub mod trigger;
