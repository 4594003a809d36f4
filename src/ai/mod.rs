//! Enemy navigation: direct steering, cached path following and hunting.
//!
//! Movement is expressed as a direction bitmask rather than a velocity;
//! the movement integrator elsewhere turns commands into displacement.
//! Navigation state lives per actor in a [`GotoContext`] so the expensive
//! A* result is reused across ticks while it stays valid.

pub mod pathfind;

use bitflags::bitflags;
use glam::IVec2;
use tracing::trace;

use crate::collision::{
    calc_collision_team, has_clear_path, is_tile_walkable, is_tile_walkable_around_objects,
    item_in_collision,
};
use crate::constants::{ACTOR_H, ACTOR_W, PATH_DRIFT_MAX};
use crate::entity::{Actor, ActorFlags, EntityStore};
use crate::map::access::KeycardFlags;
use crate::map::Map;
use crate::mission::GameConfig;
use crate::tile::{is_box_inside_tile, real_to_tile, tile_center, ThingId};

bitflags! {
    /// One tick's worth of movement intent
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MoveCmd: u8 {
        const LEFT = 0x01;
        const RIGHT = 0x02;
        const UP = 0x04;
        const DOWN = 0x08;
    }
}

impl MoveCmd {
    /// Flip every direction; applying twice restores the original
    pub fn reverse(self) -> MoveCmd {
        let mut out = MoveCmd::empty();
        if self.contains(MoveCmd::LEFT) {
            out |= MoveCmd::RIGHT;
        }
        if self.contains(MoveCmd::RIGHT) {
            out |= MoveCmd::LEFT;
        }
        if self.contains(MoveCmd::UP) {
            out |= MoveCmd::DOWN;
        }
        if self.contains(MoveCmd::DOWN) {
            out |= MoveCmd::UP;
        }
        out
    }
}

/// Direct steering toward a real position. Never sets opposing bits.
pub fn cmd_towards(from: IVec2, to: IVec2) -> MoveCmd {
    let mut cmd = MoveCmd::empty();
    if to.x < from.x {
        cmd |= MoveCmd::LEFT;
    } else if to.x > from.x {
        cmd |= MoveCmd::RIGHT;
    }
    if to.y < from.y {
        cmd |= MoveCmd::UP;
    } else if to.y > from.y {
        cmd |= MoveCmd::DOWN;
    }
    cmd
}

/// Per-actor navigation cache
#[derive(Debug, Clone, Default)]
pub struct GotoContext {
    pub path: Vec<IVec2>,
    pub path_index: usize,
    pub is_following: bool,
    /// Tile the cached path was computed toward
    pub goal: IVec2,
}

impl GotoContext {
    pub fn has_path(&self) -> bool {
        self.is_following && self.path_index < self.path.len()
    }

    fn cached_path_ok(&self, current_tile: IVec2, goal: IVec2) -> bool {
        if !self.has_path() {
            return false;
        }
        let cursor = self.path[self.path_index];
        let drift = (cursor - current_tile).abs().max_element();
        drift <= PATH_DRIFT_MAX && self.path.last() == Some(&goal)
    }
}

/// Everything the navigation queries need to see, borrowed for one tick
pub struct SimContext<'a> {
    pub map: &'a Map,
    pub store: &'a EntityStore,
    pub config: &'a GameConfig,
    /// Keycards the hunting side has collected; doors they open count as
    /// passable for planning
    pub held: KeycardFlags,
}

impl SimContext<'_> {
    fn tile_walkable(&self, pos: IVec2, ignore_objects: bool) -> bool {
        if ignore_objects {
            is_tile_walkable(self.map, self.store, pos, self.held)
        } else {
            is_tile_walkable_around_objects(self.map, self.store, self.config, pos, self.held)
        }
    }
}

/// Steer an actor toward a real position, reusing the cached path while it
/// stays close and current.
pub fn ai_goto(
    ctx: &SimContext,
    nav: &mut GotoContext,
    actor: &Actor,
    target: IVec2,
    ignore_objects: bool,
) -> MoveCmd {
    let current_tile = real_to_tile(actor.pos);
    let target_tile = real_to_tile(target);

    // Sharing a tile with the target counts as arrived; also guards
    // against steering at a dead or removed target forever
    if current_tile == target_tile {
        nav.is_following = false;
        return MoveCmd::empty();
    }

    if nav.is_following && nav.cached_path_ok(current_tile, target_tile) {
        return follow_path(nav, actor);
    }

    if has_clear_path(
        ctx.map,
        ctx.store,
        ctx.config,
        ctx.held,
        actor.pos,
        target,
        ignore_objects,
    ) {
        nav.is_following = false;
        return cmd_towards(actor.pos, target);
    }

    // Recompute: snap the goal to the nearest walkable tile first
    let walkable = |p: IVec2| ctx.tile_walkable(p, ignore_objects);
    let Some(goal) = ctx.map.search_tile_around(target_tile, |_, p| walkable(p)) else {
        return cmd_towards(actor.pos, target);
    };
    let path = pathfind::find_path(current_tile, goal, &walkable);
    if path.len() <= 1 {
        // No route; direct steering at least keeps pressure on the wall
        nav.is_following = false;
        return cmd_towards(actor.pos, target);
    }
    trace!(
        from = %current_tile,
        to = %goal,
        len = path.len(),
        "path recomputed"
    );
    nav.path = path;
    nav.path_index = 1;
    nav.is_following = true;
    nav.goal = target_tile;
    follow_path(nav, actor)
}

fn follow_path(nav: &mut GotoContext, actor: &Actor) -> MoveCmd {
    let size = IVec2::new(ACTOR_W, ACTOR_H);
    // Advance only once fully inside the cursor tile, so the box cannot
    // clip the corner of the previous tile's neighbor
    if is_box_inside_tile(actor.pos, size, nav.path[nav.path_index]) {
        nav.path_index += 1;
        if nav.path_index >= nav.path.len() {
            nav.is_following = false;
            return MoveCmd::empty();
        }
    }
    cmd_towards(actor.pos, tile_center(nav.path[nav.path_index]))
}

/// Axis-priority chase: move along an axis when its gap dominates, both
/// when the gaps are comparable. Cowards get the reversed command.
pub fn ai_hunt(actor: &Actor, target: IVec2) -> MoveCmd {
    let dx = (target.x - actor.pos.x).abs();
    let dy = (target.y - actor.pos.y).abs();
    let mut cmd = MoveCmd::empty();
    if 2 * dx > dy {
        if target.x < actor.pos.x {
            cmd |= MoveCmd::LEFT;
        } else if target.x > actor.pos.x {
            cmd |= MoveCmd::RIGHT;
        }
    }
    if 2 * dy > dx {
        if target.y < actor.pos.y {
            cmd |= MoveCmd::UP;
        } else if target.y > actor.pos.y {
            cmd |= MoveCmd::DOWN;
        }
    }
    if actor.flags.contains(ActorFlags::RUNS_AWAY) {
        cmd = cmd.reverse();
    }
    cmd
}

/// Hunt the closest enemy. While the actor can see (lit), the last-known
/// target position is refreshed; in the dark it keeps heading for the old
/// one.
pub fn ai_hunt_closest(
    ctx: &SimContext,
    actor: &Actor,
    last_target: &mut IVec2,
) -> MoveCmd {
    if actor.flags.contains(ActorFlags::VISIBLE) {
        if let Some(enemy) = closest_enemy(ctx.store, actor.pos, actor.is_good()) {
            *last_target = enemy.pos;
        }
    }
    ai_hunt(actor, *last_target)
}

fn chebyshev(a: IVec2, b: IVec2) -> i32 {
    (a - b).abs().max_element()
}

fn targetable(a: &Actor) -> bool {
    a.in_use
        && !a.dead
        && !a.flags.contains(ActorFlags::INVULNERABLE)
        && !a.flags.contains(ActorFlags::PENALTY)
}

/// Closest living opponent of a `caller_is_good` actor by Chebyshev
/// distance; ties keep the first one scanned.
pub fn closest_enemy(store: &EntityStore, from: IVec2, caller_is_good: bool) -> Option<&Actor> {
    let mut best: Option<(&Actor, i32)> = None;
    for a in &store.actors {
        if !targetable(a) || a.is_good() == caller_is_good {
            continue;
        }
        let d = chebyshev(from, a.pos);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((a, d));
        }
    }
    best.map(|(a, _)| a)
}

/// Closest enemy currently lit up
pub fn closest_visible_enemy(
    store: &EntityStore,
    from: IVec2,
    caller_is_good: bool,
) -> Option<&Actor> {
    let mut best: Option<(&Actor, i32)> = None;
    for a in &store.actors {
        if !targetable(a)
            || a.is_good() == caller_is_good
            || !a.flags.contains(ActorFlags::VISIBLE)
        {
            continue;
        }
        let d = chebyshev(from, a.pos);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((a, d));
        }
    }
    best.map(|(a, _)| a)
}

/// Closest live player-controlled actor
pub fn closest_player(store: &EntityStore, from: IVec2) -> Option<&Actor> {
    let mut best: Option<(&Actor, i32)> = None;
    for a in &store.actors {
        if !a.is_player || !a.in_use || a.dead {
            continue;
        }
        let d = chebyshev(from, a.pos);
        if best.map(|(_, bd)| d < bd).unwrap_or(true) {
            best = Some((a, d));
        }
    }
    best.map(|(a, _)| a)
}

/// The occupant the actor would bump into if it carried out `cmd` this
/// tick, if any.
pub fn object_running_into(ctx: &SimContext, actor: &Actor, cmd: MoveCmd) -> Option<ThingId> {
    let mut d = IVec2::ZERO;
    if cmd.contains(MoveCmd::LEFT) {
        d.x -= 2;
    }
    if cmd.contains(MoveCmd::RIGHT) {
        d.x += 2;
    }
    if cmd.contains(MoveCmd::UP) {
        d.y -= 2;
    }
    if cmd.contains(MoveCmd::DOWN) {
        d.y += 2;
    }
    if d == IVec2::ZERO {
        return None;
    }
    let team = calc_collision_team(ctx.config.dogfight, actor);
    item_in_collision(
        ctx.map,
        ctx.store,
        ctx.config,
        actor.pos + d,
        IVec2::new(ACTOR_W, ACTOR_H),
        Some(ThingId::character(actor.id)),
        team,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::access::TileClass;
    use crate::tile::TileFlags;

    fn open_map(w: i32, h: i32) -> Map {
        Map::new(IVec2::new(w, h))
    }

    fn wall(map: &mut Map, pos: IVec2) {
        map.tile_mut(pos).unwrap().flags = TileFlags::IS_WALL | TileFlags::NO_WALK;
        map.set_access(pos, TileClass::Wall.code());
    }

    fn actor_at(store: &mut EntityStore, map: &mut Map, tile: IVec2, flags: ActorFlags) -> u32 {
        let tid = store.add_actor(map, tile_center(tile), flags, false);
        tid.id
    }

    #[test]
    fn test_reverse_is_involution() {
        for bits in 0..16u8 {
            let cmd = MoveCmd::from_bits_truncate(bits);
            assert_eq!(cmd.reverse().reverse(), cmd);
        }
        assert_eq!(
            (MoveCmd::LEFT | MoveCmd::UP).reverse(),
            MoveCmd::RIGHT | MoveCmd::DOWN
        );
    }

    #[test]
    fn test_cmd_towards_never_opposes() {
        let from = IVec2::new(50, 50);
        for to in [
            IVec2::new(10, 10),
            IVec2::new(90, 50),
            IVec2::new(50, 90),
            IVec2::new(10, 90),
            from,
        ] {
            let cmd = cmd_towards(from, to);
            assert!(!(cmd.contains(MoveCmd::LEFT) && cmd.contains(MoveCmd::RIGHT)));
            assert!(!(cmd.contains(MoveCmd::UP) && cmd.contains(MoveCmd::DOWN)));
        }
        assert_eq!(cmd_towards(from, from), MoveCmd::empty());
    }

    #[test]
    fn test_hunt_axis_priority() {
        let actor = Actor {
            id: 0,
            pos: IVec2::new(100, 100),
            flags: ActorFlags::empty(),
            is_player: false,
            dead: false,
            in_use: true,
        };
        // Wide horizontal gap, narrow vertical: horizontal only
        assert_eq!(
            ai_hunt(&actor, IVec2::new(150, 103)),
            MoveCmd::RIGHT
        );
        // Comparable gaps: diagonal
        assert_eq!(
            ai_hunt(&actor, IVec2::new(130, 120)),
            MoveCmd::RIGHT | MoveCmd::DOWN
        );
        // Pure vertical
        assert_eq!(ai_hunt(&actor, IVec2::new(101, 60)), MoveCmd::UP);
    }

    #[test]
    fn test_coward_reverses() {
        let coward = Actor {
            id: 0,
            pos: IVec2::new(100, 100),
            flags: ActorFlags::RUNS_AWAY,
            is_player: false,
            dead: false,
            in_use: true,
        };
        assert_eq!(ai_hunt(&coward, IVec2::new(150, 100)), MoveCmd::LEFT);
    }

    #[test]
    fn test_goto_arrived_is_empty() {
        let mut map = open_map(16, 16);
        let mut store = EntityStore::new();
        let id = actor_at(&mut store, &mut map, IVec2::new(4, 4), ActorFlags::empty());
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let mut nav = GotoContext::default();
        let actor = ctx.store.actor(id).unwrap().clone();
        // Target inside the same tile
        let cmd = ai_goto(&ctx, &mut nav, &actor, actor.pos + IVec2::new(2, 1), false);
        assert_eq!(cmd, MoveCmd::empty());
        assert!(!nav.has_path());
    }

    #[test]
    fn test_goto_direct_when_line_clear() {
        let mut map = open_map(16, 16);
        let mut store = EntityStore::new();
        let id = actor_at(&mut store, &mut map, IVec2::new(2, 2), ActorFlags::empty());
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let mut nav = GotoContext::default();
        let actor = ctx.store.actor(id).unwrap().clone();
        let cmd = ai_goto(&ctx, &mut nav, &actor, tile_center(IVec2::new(10, 2)), false);
        assert_eq!(cmd, MoveCmd::RIGHT);
        assert!(!nav.is_following);
    }

    #[test]
    fn test_goto_paths_around_wall_and_caches() {
        let mut map = open_map(16, 16);
        // Wall column with a gap at the bottom
        for y in 0..16 {
            if y != 14 {
                wall(&mut map, IVec2::new(8, y));
            }
        }
        let mut store = EntityStore::new();
        let id = actor_at(&mut store, &mut map, IVec2::new(2, 2), ActorFlags::empty());
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let mut nav = GotoContext::default();
        let actor = ctx.store.actor(id).unwrap().clone();
        let target = tile_center(IVec2::new(14, 2));

        let cmd = ai_goto(&ctx, &mut nav, &actor, target, false);
        assert!(nav.is_following);
        assert_eq!(nav.path_index, 1);
        assert_eq!(nav.path.first(), Some(&IVec2::new(2, 2)));
        assert_eq!(nav.path.last(), Some(&IVec2::new(14, 2)));
        assert!(nav.path.contains(&IVec2::new(8, 14)));
        assert_ne!(cmd, MoveCmd::empty());

        // Second call from the same spot reuses the cached path
        let path_before = nav.path.clone();
        ai_goto(&ctx, &mut nav, &actor, target, false);
        assert_eq!(nav.path, path_before);

        // Target moved a long way: cache rejected, path recomputed
        let new_target = tile_center(IVec2::new(14, 12));
        ai_goto(&ctx, &mut nav, &actor, new_target, false);
        assert_eq!(nav.path.last(), Some(&IVec2::new(14, 12)));
    }

    #[test]
    fn test_goto_unreachable_falls_back_to_direct() {
        let mut map = open_map(16, 16);
        // Sealed-off right half
        for y in 0..16 {
            wall(&mut map, IVec2::new(8, y));
        }
        let mut store = EntityStore::new();
        let id = actor_at(&mut store, &mut map, IVec2::new(2, 2), ActorFlags::empty());
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let mut nav = GotoContext::default();
        let actor = ctx.store.actor(id).unwrap().clone();
        let cmd = ai_goto(&ctx, &mut nav, &actor, tile_center(IVec2::new(14, 2)), false);
        assert_eq!(cmd, MoveCmd::RIGHT);
        assert!(!nav.is_following);
    }

    #[test]
    fn test_closest_enemy_chebyshev_first_wins() {
        let mut map = open_map(32, 32);
        let mut store = EntityStore::new();
        let from = tile_center(IVec2::new(0, 0));
        // Two bad guys at equal Chebyshev distance; the first added wins
        let a = actor_at(&mut store, &mut map, IVec2::new(5, 3), ActorFlags::empty());
        let _b = actor_at(&mut store, &mut map, IVec2::new(3, 5), ActorFlags::empty());
        let _far = actor_at(&mut store, &mut map, IVec2::new(20, 20), ActorFlags::empty());
        let found = closest_enemy(&store, from, true).unwrap();
        assert_eq!(found.id, a);

        // Invulnerable and penalty actors are never targets
        store.actors[a as usize].flags |= ActorFlags::INVULNERABLE;
        let found = closest_enemy(&store, from, true).unwrap();
        assert_eq!(found.id, _b);
    }

    #[test]
    fn test_closest_visible_enemy_skips_unlit() {
        let mut map = open_map(32, 32);
        let mut store = EntityStore::new();
        let from = tile_center(IVec2::new(0, 0));
        // Nearer enemy sits in the dark, the farther one is lit
        let _dark = actor_at(&mut store, &mut map, IVec2::new(3, 3), ActorFlags::empty());
        let lit = actor_at(&mut store, &mut map, IVec2::new(12, 12), ActorFlags::VISIBLE);
        let found = closest_visible_enemy(&store, from, true).unwrap();
        assert_eq!(found.id, lit);

        // Nobody lit: no target at all, even with enemies around
        store.actors[lit as usize].flags.remove(ActorFlags::VISIBLE);
        assert!(closest_visible_enemy(&store, from, true).is_none());
        // The unlit ones still show up for the unfiltered scan
        assert!(closest_enemy(&store, from, true).is_some());
    }

    #[test]
    fn test_closest_player_ignores_dead() {
        let mut map = open_map(32, 32);
        let mut store = EntityStore::new();
        let near = store.add_actor(
            &mut map,
            tile_center(IVec2::new(2, 2)),
            ActorFlags::empty(),
            true,
        );
        let far = store.add_actor(
            &mut map,
            tile_center(IVec2::new(10, 10)),
            ActorFlags::empty(),
            true,
        );
        let from = tile_center(IVec2::new(0, 0));
        assert_eq!(closest_player(&store, from).unwrap().id, near.id);
        store.actors[near.id as usize].dead = true;
        assert_eq!(closest_player(&store, from).unwrap().id, far.id);
    }

    #[test]
    fn test_hunt_closest_remembers_last_target_in_dark() {
        let mut map = open_map(32, 32);
        let mut store = EntityStore::new();
        let hunter = actor_at(
            &mut store,
            &mut map,
            IVec2::new(5, 5),
            ActorFlags::empty(),
        );
        store.add_actor(
            &mut map,
            tile_center(IVec2::new(10, 5)),
            ActorFlags::GOOD_GUY,
            false,
        );
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let actor = ctx.store.actor(hunter).unwrap().clone();
        // In the dark the stale position keeps being used
        let mut last = tile_center(IVec2::new(5, 1));
        assert_eq!(ai_hunt_closest(&ctx, &actor, &mut last), MoveCmd::UP);
        assert_eq!(last, tile_center(IVec2::new(5, 1)));

        // Lit: target refreshed to the real enemy
        let mut lit = actor.clone();
        lit.flags |= ActorFlags::VISIBLE;
        let cmd = ai_hunt_closest(&ctx, &lit, &mut last);
        assert_eq!(last, tile_center(IVec2::new(10, 5)));
        assert_eq!(cmd, MoveCmd::RIGHT);
    }

    #[test]
    fn test_object_running_into() {
        let mut map = open_map(16, 16);
        let mut store = EntityStore::new();
        let id = actor_at(&mut store, &mut map, IVec2::new(4, 4), ActorFlags::empty());
        // Crate right next to the actor
        let crate_t = crate::mapobject::catalog()
            .iter()
            .find(|t| t.name == "crate")
            .unwrap();
        let pos = store.actor(id).unwrap().pos;
        let obstacle = store.add_destructible(
            &mut map,
            pos + IVec2::new(ACTOR_W / 2 + 4, 0),
            crate_t,
            None,
        );
        let config = GameConfig::default();
        let ctx = SimContext {
            map: &map,
            store: &store,
            config: &config,
            held: KeycardFlags::empty(),
        };
        let actor = ctx.store.actor(id).unwrap().clone();
        assert_eq!(
            object_running_into(&ctx, &actor, MoveCmd::RIGHT),
            Some(obstacle)
        );
        assert_eq!(object_running_into(&ctx, &actor, MoveCmd::LEFT), None);
        assert_eq!(object_running_into(&ctx, &actor, MoveCmd::empty()), None);
    }
}
