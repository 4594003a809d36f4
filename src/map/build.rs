//! Mission map construction pipeline.
//!
//! [`load`] turns a [`MissionTemplate`] plus a seed into a fully populated
//! [`Map`] and [`EntityStore`]: perimeter, interior layout, tile visuals,
//! door groups wired to triggers and watches, the exit area, props,
//! objective items and keycards. Generation is deterministic for a given
//! seed and mission index.
//!
//! Placement failures degrade gracefully (fewer props, reduced objective
//! counts) with one exception: a keycard that cannot be placed makes the
//! mission unwinnable, so that aborts with an error instead of looping
//! forever.

use glam::IVec2;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use tracing::{debug, info, warn};

use crate::collision::is_collision_with_wall;
use crate::constants::{
    ALT_FLOOR1_QUOTA, ALT_FLOOR2_QUOTA, COLLECTABLE_H, COLLECTABLE_W, DRAINAGE_QUOTA,
    EXIT_AREA_ATTEMPTS, EXIT_H, EXIT_W, FREE_POSITION_ATTEMPTS, KEYCARD_ATTEMPTS, KEY_H, KEY_W,
    OBJECTIVE_ATTEMPTS, OBJECTIVE_ATTEMPTS_ACCESS, TILE_HEIGHT, TILE_WIDTH,
};
use crate::entity::{EntityStore, PickupKind};
use crate::logging::TimingSpan;
use crate::map::access::{
    access_mask_for_tier, KeycardFlags, MAP_ACCESSBITS, MAP_LEAVEFREE, MAP_MASKACCESS, TileClass,
};
use crate::map::{classic, staticmap, Map};
use crate::mapobject::{self, MapObjectFlags, MapObjectTemplate};
use crate::mission::{
    GenerateError, MapType, MissionObjective, MissionSeed, MissionTemplate, ObjectiveFlags,
    ObjectiveKind, ObjectiveState,
};
use crate::tile::{tile_center, PicId, TileFlags, DOOR_TILE_FLAGS};
use crate::trigger::{Action, Condition, TileChange};

// =====================================================
// Sprite id table
// =====================================================
//
// Plain ids the renderer resolves; layout mirrors the sprite sheet.

const PIC_DRAINAGE: PicId = 8;

fn floor_normal(style: u8) -> PicId {
    10 + style as PicId * 4
}
fn floor_shadow(style: u8) -> PicId {
    11 + style as PicId * 4
}
fn floor_alt1(style: u8) -> PicId {
    12 + style as PicId * 4
}
fn floor_alt2(style: u8) -> PicId {
    13 + style as PicId * 4
}
fn room_normal(style: u8) -> PicId {
    40 + style as PicId * 2
}
fn room_shadow(style: u8) -> PicId {
    41 + style as PicId * 2
}
fn wall_pic(style: u8) -> PicId {
    60 + style as PicId
}

/// Closed door sprite for a keycard color; unlocked doors use color 0
fn door_closed_pic(keys: KeycardFlags, horizontal: bool) -> PicId {
    let color: PicId = if keys.contains(KeycardFlags::RED) {
        4
    } else if keys.contains(KeycardFlags::BLUE) {
        3
    } else if keys.contains(KeycardFlags::GREEN) {
        2
    } else if keys.contains(KeycardFlags::YELLOW) {
        1
    } else {
        0
    };
    70 + color * 2 + if horizontal { 0 } else { 1 }
}

fn door_open_pic(horizontal: bool) -> PicId {
    if horizontal {
        80
    } else {
        81
    }
}

const PIC_EXIT: PicId = 84;
const PIC_EXIT_SHADOW: PicId = 85;

fn key_pic(key_index: u32) -> PicId {
    90 + key_index as PicId
}

fn collectible_pic(item: usize) -> PicId {
    95 + item as PicId
}

// =====================================================
// Pipeline
// =====================================================

/// Everything generation produces for one mission
#[derive(Debug)]
pub struct GeneratedMission {
    pub map: Map,
    pub store: EntityStore,
    pub objectives: Vec<ObjectiveState>,
}

pub fn load(
    template: &MissionTemplate,
    seed: &MissionSeed,
    mission_index: u32,
) -> Result<GeneratedMission, GenerateError> {
    template.validate()?;
    let _timing = TimingSpan::new("map_generation");
    let mut rng = seed.rng(mission_index);
    info!(
        title = %template.title,
        width = template.size.x,
        height = template.size.y,
        mission = mission_index,
        "generating mission map"
    );

    let mut map = Map::new(template.size);
    setup_perimeter(&mut map);

    match template.map_type {
        MapType::Classic => classic::build(&mut map, &template.classic, &mut rng),
        MapType::Static => {
            let layout = template
                .static_layout
                .as_ref()
                .ok_or_else(|| GenerateError::BadTemplate("missing static_layout".into()))?;
            staticmap::build(&mut map, layout)?;
            // Layouts may not breach the outer wall
            setup_perimeter(&mut map);
        }
    }

    setup_tiles_and_walls(&mut map, template, &mut rng);
    setup_doors(&mut map, template);

    match template.exit {
        Some(exit) => {
            map.exit_start = exit.start;
            map.exit_end = exit.end;
        }
        None => generate_random_exit_area(&mut map, &mut rng),
    }
    show_exit_area(&mut map);

    let mut store = EntityStore::new();
    place_items(&mut map, &mut store, template, &mut rng);
    let objectives = place_objectives(&mut map, &mut store, template, &mut rng);
    place_keycards(&mut map, &mut store, &mut rng)?;

    map.count_explorable_tiles();
    debug!(
        explorable = map.explorable_tiles,
        triggers = map.triggers.trigger_count(),
        props = store.props.len(),
        "mission map complete"
    );
    Ok(GeneratedMission {
        map,
        store,
        objectives,
    })
}

fn setup_perimeter(map: &mut Map) {
    for y in 0..map.size.y {
        for x in 0..map.size.x {
            if x == 0 || y == 0 || x == map.size.x - 1 || y == map.size.y - 1 {
                map.set_access(IVec2::new(x, y), TileClass::Wall.code());
            }
        }
    }
}

// =====================================================
// Visual pass
// =====================================================

fn setup_tiles_and_walls(map: &mut Map, template: &MissionTemplate, rng: &mut Xoshiro256StarStar) {
    for y in 0..map.size.y {
        for x in 0..map.size.x {
            let pos = IVec2::new(x, y);
            let class = map.tile_class(pos);
            let Some(t) = map.tile_mut(pos) else { continue };
            match class {
                TileClass::Floor | TileClass::Square => {
                    t.pic = floor_normal(template.floor_style);
                    t.flags = TileFlags::IS_NORMAL_FLOOR;
                }
                TileClass::Room | TileClass::Door => {
                    // Door visuals are overlaid by the door groups
                    t.pic = room_normal(template.room_style);
                    t.flags = TileFlags::empty();
                }
                TileClass::Wall => {
                    t.pic = wall_pic(template.floor_style);
                    t.flags = TileFlags::IS_WALL
                        | TileFlags::NO_WALK
                        | TileFlags::NO_SEE
                        | TileFlags::NO_SHOOT;
                }
                TileClass::Nothing => {
                    t.pic = 0;
                    t.flags = TileFlags::IS_NOTHING
                        | TileFlags::NO_WALK
                        | TileFlags::NO_SEE
                        | TileFlags::NO_SHOOT;
                }
            }
        }
    }

    // Sprinkle drainage on even coordinates so two drains are never
    // adjacent
    for _ in 0..DRAINAGE_QUOTA {
        let pos = IVec2::new(
            rng.gen_range(0..map.size.x) & !1,
            rng.gen_range(0..map.size.y) & !1,
        );
        if let Some(t) = map.tile_mut(pos) {
            if t.is_normal_floor() {
                t.set_alternate_floor(PIC_DRAINAGE);
                t.flags |= TileFlags::IS_DRAINAGE;
            }
        }
    }
    for (quota, pic) in [
        (ALT_FLOOR1_QUOTA, floor_alt1(template.floor_style)),
        (ALT_FLOOR2_QUOTA, floor_alt2(template.floor_style)),
    ] {
        for _ in 0..quota {
            let pos = random_tile(map, rng);
            if let Some(t) = map.tile_mut(pos) {
                if t.is_normal_floor() {
                    t.set_alternate_floor(pic);
                }
            }
        }
    }
}

/// Repaint a walkable tile, casting a shadow when the tile above blocks
/// sight. Drainage tiles keep their look.
fn change_floor(map: &mut Map, pos: IVec2, normal: PicId, shadow: PicId) {
    let above = IVec2::new(pos.x, pos.y - 1);
    let shadowed = pos.y > 0
        && map
            .tile(above)
            .map(|t| !t.can_see())
            .unwrap_or(false);
    match map.tile_class(pos) {
        TileClass::Floor | TileClass::Square | TileClass::Room => {
            if let Some(t) = map.tile_mut(pos) {
                if t.flags.contains(TileFlags::IS_DRAINAGE) {
                    return;
                }
                t.pic = if shadowed { shadow } else { normal };
            }
        }
        _ => {}
    }
}

// =====================================================
// Door groups
// =====================================================

fn setup_doors(map: &mut Map, template: &MissionTemplate) {
    for y in 0..map.size.y {
        for x in 0..map.size.x {
            let pos = IVec2::new(x, y);
            // Start of a door run: no door above or to the left
            if map.tile_class(pos) == TileClass::Door
                && map.tile_class(IVec2::new(x - 1, y)) != TileClass::Door
                && map.tile_class(IVec2::new(x, y - 1)) != TileClass::Door
            {
                add_door_group(map, pos, template);
            }
        }
    }
}

fn door_run_length(map: &Map, start: IVec2, dv: IVec2) -> i32 {
    let mut count = 1;
    let mut next = start + dv;
    while map.tile_class(next) == TileClass::Door {
        count += 1;
        next += dv;
    }
    count
}

fn add_door_group(map: &mut Map, v: IVec2, template: &MissionTemplate) {
    let left = map.tile_class(IVec2::new(v.x - 1, v.y));
    let right = map.tile_class(IVec2::new(v.x + 1, v.y));
    let blocks = |c: TileClass| {
        matches!(c, TileClass::Wall | TileClass::Door | TileClass::Nothing)
    };
    let horizontal = blocks(left) || blocks(right);
    let dv = if horizontal { IVec2::X } else { IVec2::Y };
    let aside = IVec2::new(dv.y, dv.x);
    let count = door_run_length(map, v, dv);
    let keys = map.access_flags_around(v);

    let closed_pic = door_closed_pic(keys, horizontal);
    let open_pic = door_open_pic(horizontal);
    let room_pic = room_normal(template.room_style);
    let shadow_pic = room_shadow(template.room_style);
    let f_normal = floor_normal(template.floor_style);
    let f_shadow = floor_shadow(template.floor_style);

    debug!(
        x = v.x,
        y = v.y,
        count,
        horizontal,
        keys = keys.bits(),
        "door group"
    );

    // Initial closed visuals, plus cast shadows below horizontal doors
    for i in 0..count {
        let vi = v + dv * i;
        let below_is_plain_floor =
            map.access(vi + aside) == TileClass::Floor.code();
        if let Some(t) = map.tile_mut(vi) {
            t.pic = shadow_pic;
            t.pic_alt = Some(closed_pic);
            t.flags = DOOR_TILE_FLAGS;
        }
        if horizontal {
            let pic = if below_is_plain_floor { f_shadow } else { shadow_pic };
            if let Some(t) = map.tile_mut(vi + aside) {
                t.pic = pic;
            }
        }
    }

    let watch = map.triggers.new_watch();
    let trigger = map.triggers.new_trigger(keys);
    let center = tile_center(v + dv * (count / 2));

    // Watch: wait for the run and both flanks to clear, then close
    let mut watch_conditions = Vec::new();
    let mut watch_actions = vec![
        Action::DeactivateWatch(watch),
        Action::Sound {
            pos: center,
            name: "door",
        },
    ];
    for i in 0..count {
        let vi = v + dv * i;
        for pos in [vi - aside, vi, vi + aside] {
            watch_conditions.push(Condition::TileClear { pos });
        }
        watch_actions.push(Action::ChangeTile(TileChange {
            pos: vi,
            pic: shadow_pic,
            pic_alt: Some(closed_pic),
            flags: DOOR_TILE_FLAGS,
        }));
    }
    if horizontal {
        for i in 0..count {
            let vi = v + dv * i;
            let below = vi + aside;
            let pic = if map.access(below) == TileClass::Floor.code() {
                f_shadow
            } else {
                shadow_pic
            };
            watch_actions.push(Action::ChangePic { pos: below, pic });
        }
    }
    watch_actions.push(Action::EnableTrigger(trigger));

    // Trigger: open the run, disarm, arm the closing watch
    let mut trigger_actions = vec![
        Action::Sound {
            pos: center,
            name: "door",
        },
        Action::DisableTrigger(trigger),
    ];
    for i in 0..count {
        let vi = v + dv * i;
        let change = if horizontal {
            TileChange {
                pos: vi,
                pic: open_pic,
                pic_alt: None,
                flags: TileFlags::empty(),
            }
        } else if i == 0 {
            // Top of a vertical run keeps the door cavity sprite
            TileChange {
                pos: vi,
                pic: shadow_pic,
                pic_alt: Some(open_pic),
                flags: TileFlags::OFFSET_PIC,
            }
        } else {
            TileChange {
                pos: vi,
                pic: shadow_pic,
                pic_alt: None,
                flags: TileFlags::empty(),
            }
        };
        trigger_actions.push(Action::ChangeTile(change));
    }
    if horizontal {
        // Lift the shadows the closed leaf cast
        for i in 0..count {
            let vi = v + dv * i;
            let below = vi + aside;
            let pic = if map.access(below) == TileClass::Floor.code() {
                f_normal
            } else {
                room_pic
            };
            trigger_actions.push(Action::ChangePic { pos: below, pic });
        }
    }
    trigger_actions.push(Action::ActivateWatch(watch));

    if let Some(w) = map.triggers.watch_mut(watch) {
        w.conditions = watch_conditions;
        w.actions = watch_actions;
    }
    if let Some(t) = map.triggers.trigger_mut(trigger) {
        t.actions = trigger_actions;
    }

    // The trigger fires from the tiles flanking the run, and the whole
    // neighborhood stays clear of placed props
    for i in 0..count {
        let vi = v + dv * i;
        for pos in [vi - aside, vi + aside] {
            if let Some(t) = map.tile_mut(pos) {
                t.triggers.push(trigger);
            }
        }
        for pos in [vi, vi - aside, vi + aside] {
            map.or_access(pos, MAP_LEAVEFREE);
        }
    }
}

// =====================================================
// Exit area
// =====================================================

fn generate_random_exit_area(map: &mut Map, rng: &mut Xoshiro256StarStar) {
    let w = EXIT_W.min(map.size.x - 4);
    let h = EXIT_H.min(map.size.y - 4);
    for _ in 0..EXIT_AREA_ATTEMPTS {
        let start = IVec2::new(
            rng.gen_range(1..map.size.x - w),
            rng.gen_range(1..map.size.y - h),
        );
        let end = start + IVec2::new(w - 1, h - 1);
        let mut all_walkable = true;
        'scan: for y in start.y..=end.y {
            for x in start.x..=end.x {
                let ok = map
                    .tile(IVec2::new(x, y))
                    .map(|t| t.can_walk())
                    .unwrap_or(false);
                if !ok {
                    all_walkable = false;
                    break 'scan;
                }
            }
        }
        if all_walkable {
            map.exit_start = start;
            map.exit_end = end;
            return;
        }
    }
    // Degenerate maps get a centered exit regardless of walkability
    warn!("no clear exit area found, using map center");
    let center = map.size / 2;
    map.exit_start = center - IVec2::new(w / 2, h / 2);
    map.exit_end = map.exit_start + IVec2::new(w - 1, h - 1);
}

fn show_exit_area(map: &mut Map) {
    let (start, end) = (map.exit_start, map.exit_end);
    for x in start.x..=end.x {
        change_floor(map, IVec2::new(x, start.y), PIC_EXIT, PIC_EXIT_SHADOW);
        change_floor(map, IVec2::new(x, end.y), PIC_EXIT, PIC_EXIT_SHADOW);
    }
    for y in start.y + 1..end.y {
        change_floor(map, IVec2::new(start.x, y), PIC_EXIT, PIC_EXIT_SHADOW);
        change_floor(map, IVec2::new(end.x, y), PIC_EXIT, PIC_EXIT_SHADOW);
    }
}

// =====================================================
// Prop and pickup placement
// =====================================================

fn random_tile(map: &Map, rng: &mut Xoshiro256StarStar) -> IVec2 {
    IVec2::new(rng.gen_range(0..map.size.x), rng.gen_range(0..map.size.y))
}

fn random_real(map: &Map, rng: &mut Xoshiro256StarStar) -> IVec2 {
    IVec2::new(
        rng.gen_range(0..map.size.x * TILE_WIDTH),
        rng.gen_range(0..map.size.y * TILE_HEIGHT),
    )
}

fn tile_is_empty(map: &Map, pos: IVec2) -> bool {
    map.tile(pos)
        .map(|t| {
            t.flags.difference(TileFlags::IS_NORMAL_FLOOR).is_empty() && t.is_clear()
        })
        .unwrap_or(false)
}

/// Validate and place one prop at a tile. Strict mode applies the full
/// placement-rule flags; loose mode only the basics.
pub fn try_place_one_object(
    map: &mut Map,
    store: &mut EntityStore,
    v: IVec2,
    obj: &MapObjectTemplate,
    objective: Option<usize>,
    strict: bool,
) -> bool {
    let code = map.access(v);
    let above = map.access(IVec2::new(v.x, v.y - 1));
    let below = map.access(IVec2::new(v.x, v.y + 1));
    let is_empty = tile_is_empty(map, v);
    let ok = if strict {
        mapobject::is_tile_ok_strict(
            obj,
            code,
            is_empty,
            above,
            below,
            map.num_walls_adjacent(v),
            map.num_walls_around(v),
        )
    } else {
        mapobject::is_tile_ok(obj, code, is_empty, above)
    };
    if !ok {
        return false;
    }

    if obj.flags.contains(MapObjectFlags::FREE_IN_FRONT) {
        map.or_access(v, MAP_LEAVEFREE);
    }
    let mut pos = tile_center(v);
    if obj.flags.contains(MapObjectFlags::ON_WALL) {
        // Hang off the bottom edge of the wall tile above
        pos.y -= TILE_HEIGHT / 2 + 1;
    }
    store.add_destructible(map, pos, obj, objective);
    true
}

/// Drop an already-wrecked prop, subject only to the basic placement rules
pub fn place_wreck(map: &mut Map, store: &mut EntityStore, v: IVec2, obj: &MapObjectTemplate) {
    let code = map.access(v);
    let above = map.access(IVec2::new(v.x, v.y - 1));
    if !mapobject::is_tile_ok(obj, code, tile_is_empty(map, v), above) {
        return;
    }
    store.add_wreck(map, tile_center(v), obj);
}

/// Random wall-free real position for a box of `size`; `None` if the map
/// is too cluttered to find one
pub fn generate_free_position(
    map: &Map,
    rng: &mut Xoshiro256StarStar,
    size: IVec2,
) -> Option<IVec2> {
    for _ in 0..FREE_POSITION_ATTEMPTS {
        let v = random_real(map, rng);
        if !is_collision_with_wall(map, v, size) {
            return Some(v);
        }
    }
    None
}

/// Drop a health pickup at a real position
pub fn place_health(map: &mut Map, store: &mut EntityStore, pos: IVec2) {
    store.add_pickup_at_real(
        map,
        pos,
        IVec2::new(COLLECTABLE_W, COLLECTABLE_H),
        collectible_pic(0),
        PickupKind::Health,
    );
}

fn place_items(
    map: &mut Map,
    store: &mut EntityStore,
    template: &MissionTemplate,
    rng: &mut Xoshiro256StarStar,
) {
    let area = (map.size.x * map.size.y) as u32;
    for density in &template.item_densities {
        let Some(obj) = mapobject::get(density.object) else {
            warn!(object = density.object, "unknown catalog entry, skipping");
            continue;
        };
        let attempts = density.density * area / 1000;
        for _ in 0..attempts {
            let v = random_tile(map, rng);
            try_place_one_object(map, store, v, obj, None, true);
        }
    }
}

// =====================================================
// Objectives
// =====================================================

fn objective_budget(map: &Map, mobj: &MissionObjective) -> (bool, bool, u32) {
    let high_access =
        mobj.flags.contains(ObjectiveFlags::HIGH_ACCESS) && map.has_locked_rooms();
    let no_access = mobj.flags.contains(ObjectiveFlags::NO_ACCESS);
    let budget = if high_access || no_access {
        OBJECTIVE_ATTEMPTS_ACCESS
    } else {
        OBJECTIVE_ATTEMPTS
    };
    (high_access, no_access, budget)
}

fn try_place_collectible(
    map: &mut Map,
    store: &mut EntityStore,
    mobj: &MissionObjective,
    objective: usize,
    rng: &mut Xoshiro256StarStar,
) -> bool {
    let (high_access, no_access, budget) = objective_budget(map, mobj);
    let size = IVec2::new(COLLECTABLE_W, COLLECTABLE_H);
    for _ in 0..budget {
        let v = random_real(map, rng);
        if is_collision_with_wall(map, v, size) {
            continue;
        }
        if high_access && !map.real_pos_is_high_access(v) {
            continue;
        }
        if no_access && map.real_pos_is_high_access(v) {
            continue;
        }
        store.add_pickup_at_real(
            map,
            v,
            size,
            collectible_pic(mobj.item),
            PickupKind::Jewel { objective },
        );
        return true;
    }
    false
}

fn try_place_blowup(
    map: &mut Map,
    store: &mut EntityStore,
    mobj: &MissionObjective,
    objective: usize,
    rng: &mut Xoshiro256StarStar,
) -> bool {
    let Some(obj) = mapobject::get(mobj.item) else {
        warn!(item = mobj.item, "unknown blowup object, objective skipped");
        return false;
    };
    let (high_access, no_access, budget) = objective_budget(map, mobj);
    for _ in 0..budget {
        let v = random_tile(map, rng);
        let bits = map.access(v) & MAP_ACCESSBITS;
        if high_access && bits == 0 {
            continue;
        }
        if no_access && bits != 0 {
            continue;
        }
        if try_place_one_object(map, store, v, obj, Some(objective), true) {
            return true;
        }
    }
    false
}

fn place_objectives(
    map: &mut Map,
    store: &mut EntityStore,
    template: &MissionTemplate,
    rng: &mut Xoshiro256StarStar,
) -> Vec<ObjectiveState> {
    let mut out = Vec::with_capacity(template.objectives.len());
    for (i, mobj) in template.objectives.iter().enumerate() {
        let mut state = ObjectiveState {
            kind: mobj.kind,
            flags: mobj.flags,
            count: mobj.count,
            required: mobj.required,
            placed: 0,
        };
        match mobj.kind {
            ObjectiveKind::Collect => {
                for _ in 0..mobj.count {
                    if try_place_collectible(map, store, mobj, i, rng) {
                        state.placed += 1;
                    }
                }
            }
            ObjectiveKind::Destroy => {
                for _ in 0..mobj.count {
                    if try_place_blowup(map, store, mobj, i, rng) {
                        state.placed += 1;
                    }
                }
            }
            // Kill targets are spawned with the characters, not the map
            ObjectiveKind::Kill => {}
        }
        if matches!(mobj.kind, ObjectiveKind::Collect | ObjectiveKind::Destroy) {
            // Never require more than actually exists
            if state.placed < state.count {
                warn!(
                    objective = i,
                    requested = state.count,
                    placed = state.placed,
                    "objective shortfall, reducing totals"
                );
            }
            state.count = state.placed;
            state.required = state.required.min(state.count);
        }
        out.push(state);
    }
    out
}

// =====================================================
// Keycards
// =====================================================

fn place_keycards(
    map: &mut Map,
    store: &mut EntityStore,
    rng: &mut Xoshiro256StarStar,
) -> Result<(), GenerateError> {
    // Ladder: each card sits one access tier below the doors it opens
    for key_index in (0..4u32).rev() {
        if map.key_access_count >= key_index + 2 {
            place_card(map, store, key_index, rng)?;
        }
    }
    Ok(())
}

fn place_card(
    map: &mut Map,
    store: &mut EntityStore,
    key_index: u32,
    rng: &mut Xoshiro256StarStar,
) -> Result<(), GenerateError> {
    let required_access = access_mask_for_tier(key_index as i32 - 1);
    for _ in 0..KEYCARD_ATTEMPTS {
        let v = random_tile(map, rng);
        let below = IVec2::new(v.x, v.y + 1);
        let code = map.access(v);
        if tile_is_empty(map, v)
            && code & MAP_ACCESSBITS == required_access
            && code & MAP_MASKACCESS == TileClass::Room.code()
            && tile_is_empty(map, below)
        {
            store.add_pickup(
                map,
                v,
                IVec2::new(KEY_W, KEY_H),
                key_pic(key_index),
                PickupKind::Keycard(key_index as u8),
            );
            debug!(
                key = key_index,
                x = v.x,
                y = v.y,
                "keycard placed"
            );
            return Ok(());
        }
    }
    Err(GenerateError::KeycardPlacement {
        tier: key_index,
        attempts: KEYCARD_ATTEMPTS,
    })
}
