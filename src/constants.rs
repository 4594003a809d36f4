//! Centralized simulation constants.
//!
//! Eliminates magic numbers duplicated across generation, collision and AI.
//! Per-module constants (prop catalog stats, builder tuning) remain in their
//! respective modules as the single source of truth.

// =====================================================
// Tile geometry
// =====================================================

/// Width of one tile in sub-tile ("real") units. Tiles are non-square.
pub const TILE_WIDTH: i32 = 16;

/// Height of one tile in sub-tile ("real") units.
pub const TILE_HEIGHT: i32 = 12;

/// Actor bounding box, in real units
pub const ACTOR_W: i32 = 14;
pub const ACTOR_H: i32 = 10;

/// Keycard pickup bounding box
pub const KEY_W: i32 = 9;
pub const KEY_H: i32 = 5;

/// Collectible pickup bounding box
pub const COLLECTABLE_W: i32 = 4;
pub const COLLECTABLE_H: i32 = 3;

// =====================================================
// Generation
// =====================================================

/// Exit area size in tiles
pub const EXIT_W: i32 = 8;
pub const EXIT_H: i32 = 6;

/// Fixed re-skin quotas for decorative floor variants. Intentionally
/// independent of map size: small maps get denser decoration.
pub const DRAINAGE_QUOTA: u32 = 50;
pub const ALT_FLOOR1_QUOTA: u32 = 100;
pub const ALT_FLOOR2_QUOTA: u32 = 150;

/// Objective placement retry budgets
pub const OBJECTIVE_ATTEMPTS: u32 = 100;
pub const OBJECTIVE_ATTEMPTS_ACCESS: u32 = 1000;

/// Keycard placement attempt cap. Interior builders guarantee a valid
/// two-tile room pocket per access tier, so exhausting this is a
/// generation bug and reported as an error.
pub const KEYCARD_ATTEMPTS: u32 = 10_000;

/// Random free-position and exit-area search budgets
pub const FREE_POSITION_ATTEMPTS: u32 = 100;
pub const EXIT_AREA_ATTEMPTS: u32 = 100;

// =====================================================
// AI
// =====================================================

/// Max Chebyshev drift from the cached path cursor before a recompute
pub const PATH_DRIFT_MAX: i32 = 2;

/// Diagonal step cost factor; slightly prefers axis-aligned moves
pub const DIAGONAL_COST_FACTOR: f32 = 1.1;
