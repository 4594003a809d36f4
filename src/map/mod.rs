//! The mission map: tile grid, access grid, occupant index, exit area,
//! trigger/watch arena and exploration counters.
//!
//! A `Map` is built once per mission by [`build::load`] and then mutated
//! only through door triggers/watches, occupant moves and visited marking.

pub mod access;
pub mod build;
pub mod classic;
pub mod staticmap;

use glam::IVec2;
use tracing::debug;

use crate::constants::{TILE_HEIGHT, TILE_WIDTH};
use crate::map::access::{
    access_code_to_flags, KeycardFlags, MAP_ACCESSBITS, MAP_MASKACCESS, TileClass,
};
use crate::tile::{real_to_tile, tile_center, ThingId, Tile, TileFlags};
use crate::trigger::{Action, Condition, SideEffect, TriggerArena};

#[derive(Debug, Clone)]
pub struct Map {
    pub size: IVec2,
    tiles: Vec<Tile>,
    access: Vec<u16>,
    pub exit_start: IVec2,
    pub exit_end: IVec2,
    pub triggers: TriggerArena,
    /// Walkable tiles a player has seen, for explored-percentage reporting
    pub tiles_seen: u32,
    /// All walkable tiles, cached at the end of generation
    pub explorable_tiles: u32,
    /// Number of access tiers the interior builder created (plus one);
    /// drives keycard placement
    pub key_access_count: u32,
}

impl Map {
    /// Empty map: every tile floor, access grid all `Floor`
    pub fn new(size: IVec2) -> Self {
        let n = (size.x * size.y) as usize;
        Self {
            size,
            tiles: vec![Tile::default(); n],
            access: vec![TileClass::Floor.code(); n],
            exit_start: IVec2::ZERO,
            exit_end: IVec2::ZERO,
            triggers: TriggerArena::new(),
            tiles_seen: 0,
            explorable_tiles: 0,
            key_access_count: 0,
        }
    }

    fn index(&self, pos: IVec2) -> Option<usize> {
        if pos.x < 0 || pos.x >= self.size.x || pos.y < 0 || pos.y >= self.size.y {
            return None;
        }
        Some((pos.y * self.size.x + pos.x) as usize)
    }

    pub fn tile(&self, pos: IVec2) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    pub fn tile_mut(&mut self, pos: IVec2) -> Option<&mut Tile> {
        self.index(pos).map(move |i| &mut self.tiles[i])
    }

    pub fn contains_tile(&self, pos: IVec2) -> bool {
        self.index(pos).is_some()
    }

    /// Real-coordinate bounds check. Division alone would let small negative
    /// positions alias to tile 0, so the raw coordinates are checked.
    pub fn contains_real(&self, real: IVec2) -> bool {
        real.x >= 0
            && real.y >= 0
            && real.x / TILE_WIDTH <= self.size.x - 1
            && real.y / TILE_HEIGHT <= self.size.y - 1
    }

    /// Access code at `pos`; `Nothing` outside the grid
    pub fn access(&self, pos: IVec2) -> u16 {
        match self.index(pos) {
            Some(i) => self.access[i],
            None => TileClass::Nothing.code(),
        }
    }

    pub fn set_access(&mut self, pos: IVec2, code: u16) {
        if let Some(i) = self.index(pos) {
            self.access[i] = code;
        }
    }

    pub fn or_access(&mut self, pos: IVec2, bits: u16) {
        if let Some(i) = self.index(pos) {
            self.access[i] |= bits;
        }
    }

    pub fn tile_class(&self, pos: IVec2) -> TileClass {
        TileClass::from_code(self.access(pos)).unwrap_or(TileClass::Nothing)
    }

    // =====================================================
    // Occupant index
    // =====================================================

    /// Move a thing to a new real position, updating the per-tile index.
    /// `from` is `None` for a thing not yet on the map. Returns false (and
    /// does nothing) if `to` lies outside the grid.
    pub fn try_move_thing(&mut self, id: ThingId, from: Option<IVec2>, to: IVec2) -> bool {
        if !self.contains_real(to) {
            return false;
        }
        if let Some(from) = from {
            let t1 = real_to_tile(from);
            let t2 = real_to_tile(to);
            if t1 == t2 {
                return true;
            }
            self.remove_thing(id, from);
        }
        let tile = real_to_tile(to);
        if let Some(t) = self.tile_mut(tile) {
            t.things.push(id);
        }
        true
    }

    /// Unindex a thing at its current real position. Removing a thing that
    /// was never indexed is a caller contract breach.
    pub fn remove_thing(&mut self, id: ThingId, at: IVec2) {
        if !self.contains_real(at) {
            return;
        }
        let tile_pos = real_to_tile(at);
        if let Some(t) = self.tile_mut(tile_pos) {
            if let Some(i) = t.things.iter().position(|&tid| tid == id) {
                t.things.swap_remove(i);
                return;
            }
        }
        debug_assert!(false, "did not find thing to remove at {tile_pos}");
    }

    // =====================================================
    // Exploration
    // =====================================================

    pub fn mark_visited(&mut self, pos: IVec2) {
        let Some(i) = self.index(pos) else { return };
        let t = &mut self.tiles[i];
        if !t.is_visited && !t.flags.contains(TileFlags::NO_WALK) {
            self.tiles_seen += 1;
        }
        t.is_visited = true;
    }

    pub fn mark_all_visited(&mut self) {
        for t in &mut self.tiles {
            t.is_visited = true;
        }
        self.tiles_seen = self.explorable_tiles;
    }

    pub fn tile_is_unexplored(&self, pos: IVec2) -> bool {
        self.tile(pos).map(|t| !t.is_visited).unwrap_or(false)
    }

    pub fn explored_percentage(&self) -> i32 {
        if self.explorable_tiles == 0 {
            return 0;
        }
        (100 * self.tiles_seen / self.explorable_tiles) as i32
    }

    pub(crate) fn count_explorable_tiles(&mut self) {
        self.explorable_tiles = self
            .tiles
            .iter()
            .filter(|t| !t.flags.contains(TileFlags::NO_WALK))
            .count() as u32;
    }

    // =====================================================
    // Exit area
    // =====================================================

    /// Is a thing at this real position inside the exit rectangle
    pub fn is_real_pos_in_exit(&self, real: IVec2) -> bool {
        let t = real_to_tile(real);
        t.x >= self.exit_start.x
            && t.x <= self.exit_end.x
            && t.y >= self.exit_start.y
            && t.y <= self.exit_end.y
    }

    pub fn exit_center(&self) -> IVec2 {
        tile_center((self.exit_start + self.exit_end) / 2)
    }

    /// Can a player spawn at this real position. Plain floor only by
    /// default; `allow_all_tiles` widens it to squares and rooms.
    pub fn is_real_pos_ok_for_player(&self, real: IVec2, allow_all_tiles: bool) -> bool {
        if !self.contains_real(real) {
            return false;
        }
        let code = self.access(real_to_tile(real));
        if code == TileClass::Floor.code() {
            return true;
        }
        if allow_all_tiles {
            let class = code & MAP_MASKACCESS;
            return class == TileClass::Square.code() || class == TileClass::Room.code();
        }
        false
    }

    // =====================================================
    // Access queries
    // =====================================================

    pub fn has_locked_rooms(&self) -> bool {
        self.key_access_count > 1
    }

    /// Does the tile under this real position carry any access bits
    pub fn real_pos_is_high_access(&self, real: IVec2) -> bool {
        self.access(real_to_tile(real)) & MAP_ACCESSBITS != 0
    }

    /// Keycard required by the door at `pos`. The access bits live on the
    /// tiles flanking the door run, so the neighbors are consulted too.
    pub fn door_keycard_flag(&self, pos: IVec2) -> KeycardFlags {
        for p in [
            pos,
            IVec2::new(pos.x - 1, pos.y),
            IVec2::new(pos.x + 1, pos.y),
            IVec2::new(pos.x, pos.y - 1),
            IVec2::new(pos.x, pos.y + 1),
        ] {
            let f = access_code_to_flags(self.access(p));
            if !f.is_empty() {
                return f;
            }
        }
        KeycardFlags::empty()
    }

    /// Highest keycard color on the tile or its four neighbors
    pub fn access_flags_around(&self, pos: IVec2) -> KeycardFlags {
        let mut flags = KeycardFlags::empty();
        for p in [
            pos,
            IVec2::new(pos.x - 1, pos.y),
            IVec2::new(pos.x + 1, pos.y),
            IVec2::new(pos.x, pos.y - 1),
            IVec2::new(pos.x, pos.y + 1),
        ] {
            let f = access_code_to_flags(self.access(p));
            if f.bits() > flags.bits() {
                flags = f;
            }
        }
        flags
    }

    // =====================================================
    // Wall adjacency (prop placement rules)
    // =====================================================

    fn tile_can_walk(&self, pos: IVec2) -> bool {
        self.tile(pos).map(|t| t.can_walk()).unwrap_or(false)
    }

    /// Unwalkable neighbors to the left/right/above/below. Zero on the
    /// perimeter ring, where placement never happens.
    pub fn num_walls_adjacent(&self, pos: IVec2) -> u32 {
        if pos.x < 1 || pos.y < 1 || pos.x >= self.size.x - 1 || pos.y >= self.size.y - 1 {
            return 0;
        }
        let mut count = 0;
        for d in [IVec2::NEG_X, IVec2::X, IVec2::NEG_Y, IVec2::Y] {
            if !self.tile_can_walk(pos + d) {
                count += 1;
            }
        }
        count
    }

    /// Unwalkable neighbors among all 8 surrounding tiles
    pub fn num_walls_around(&self, pos: IVec2) -> u32 {
        let mut count = self.num_walls_adjacent(pos);
        if pos.x < 1 || pos.y < 1 || pos.x >= self.size.x - 1 || pos.y >= self.size.y - 1 {
            return count;
        }
        for d in [
            IVec2::new(-1, -1),
            IVec2::new(1, 1),
            IVec2::new(1, -1),
            IVec2::new(-1, 1),
        ] {
            if !self.tile_can_walk(pos + d) {
                count += 1;
            }
        }
        count
    }

    // =====================================================
    // Tile search
    // =====================================================

    /// Expanding-box search around `start` for a tile satisfying `pred`.
    /// Bounded by the grid; `None` if nothing in the whole map qualifies.
    pub fn search_tile_around(
        &self,
        start: IVec2,
        pred: impl Fn(&Map, IVec2) -> bool,
    ) -> Option<IVec2> {
        if pred(self, start) {
            return Some(start);
        }
        for radius in 1..self.size.x.max(self.size.y) {
            for x in (start.x - radius)..=(start.x + radius) {
                if x < 0 {
                    continue;
                }
                if x >= self.size.x {
                    break;
                }
                for y in (start.y - radius)..=(start.y + radius) {
                    if y < 0 {
                        continue;
                    }
                    if y >= self.size.y {
                        break;
                    }
                    // Box border only; interior was covered by smaller radii
                    if x != start.x - radius
                        && x != start.x + radius
                        && y != start.y - radius
                        && y != start.y + radius
                    {
                        continue;
                    }
                    let tile = IVec2::new(x, y);
                    if pred(self, tile) {
                        return Some(tile);
                    }
                }
            }
        }
        None
    }

    // =====================================================
    // Trigger / watch execution
    // =====================================================

    /// Fire all triggers referenced by the tile under `pos` that the held
    /// keycards allow. Returns side effects for external collaborators.
    pub fn fire_triggers_at(&mut self, pos: IVec2, held: KeycardFlags) -> Vec<SideEffect> {
        let ids = match self.tile(pos) {
            Some(t) => t.triggers.clone(),
            None => return Vec::new(),
        };
        let mut effects = Vec::new();
        for id in ids {
            let actions = match self.triggers.trigger(id) {
                Some(t) if t.can_activate(held) => t.actions.clone(),
                _ => continue,
            };
            debug!(trigger = id, x = pos.x, y = pos.y, "trigger fired");
            self.run_actions(&actions, &mut effects);
        }
        effects
    }

    /// Poll every active watch once; run and retire those whose conditions
    /// all hold. Called once per simulation tick.
    pub fn tick_watches(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        for id in self.triggers.active_watch_ids() {
            let Some(w) = self.triggers.watch(id) else {
                continue;
            };
            if !w.conditions.iter().all(|c| self.condition_met(c)) {
                continue;
            }
            let actions = w.actions.clone();
            debug!(watch = id, "watch conditions met");
            self.run_actions(&actions, &mut effects);
        }
        effects
    }

    fn condition_met(&self, c: &Condition) -> bool {
        match c {
            Condition::TileClear { pos } => {
                self.tile(*pos).map(|t| t.is_clear()).unwrap_or(false)
            }
        }
    }

    fn run_actions(&mut self, actions: &[Action], effects: &mut Vec<SideEffect>) {
        for a in actions {
            match a {
                Action::ChangeTile(change) => {
                    if let Some(t) = self.tile_mut(change.pos) {
                        t.pic = change.pic;
                        t.pic_alt = change.pic_alt;
                        t.flags = change.flags;
                    }
                }
                Action::ChangePic { pos, pic } => {
                    if let Some(t) = self.tile_mut(*pos) {
                        t.pic = *pic;
                    }
                }
                Action::Sound { pos, name } => {
                    effects.push(SideEffect::Sound { pos: *pos, name });
                }
                Action::ActivateWatch(id) => {
                    if let Some(w) = self.triggers.watch_mut(*id) {
                        w.active = true;
                    }
                }
                Action::DeactivateWatch(id) => {
                    if let Some(w) = self.triggers.watch_mut(*id) {
                        w.active = false;
                    }
                }
                Action::EnableTrigger(id) => {
                    if let Some(t) = self.triggers.trigger_mut(*id) {
                        t.active = true;
                    }
                }
                Action::DisableTrigger(id) => {
                    if let Some(t) = self.triggers.trigger_mut(*id) {
                        t.active = false;
                    }
                }
            }
        }
    }
}

// Free helper used by generation and AI alike
pub use access::MAP_LEAVEFREE;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::ThingId;
    use crate::trigger::TileChange;

    fn map_10x8() -> Map {
        Map::new(IVec2::new(10, 8))
    }

    #[test]
    fn test_tile_lookup_bounds() {
        let map = map_10x8();
        assert!(map.tile(IVec2::new(0, 0)).is_some());
        assert!(map.tile(IVec2::new(9, 7)).is_some());
        assert!(map.tile(IVec2::new(10, 0)).is_none());
        assert!(map.tile(IVec2::new(0, -1)).is_none());
    }

    #[test]
    fn test_access_out_of_bounds_is_nothing() {
        let map = map_10x8();
        assert_eq!(map.tile_class(IVec2::new(-1, 0)), TileClass::Nothing);
        assert_eq!(map.tile_class(IVec2::new(0, 0)), TileClass::Floor);
    }

    #[test]
    fn test_contains_real_rejects_negatives() {
        let map = map_10x8();
        // -1 / TILE_WIDTH == 0, so the raw check matters
        assert!(!map.contains_real(IVec2::new(-1, 5)));
        assert!(map.contains_real(IVec2::new(5, 5)));
    }

    #[test]
    fn test_try_move_thing_updates_index() {
        let mut map = map_10x8();
        let id = ThingId::character(3);
        let p1 = tile_center(IVec2::new(2, 2));
        let p2 = tile_center(IVec2::new(4, 2));

        assert!(map.try_move_thing(id, None, p1));
        assert_eq!(map.tile(IVec2::new(2, 2)).unwrap().things, vec![id]);

        assert!(map.try_move_thing(id, Some(p1), p2));
        assert!(map.tile(IVec2::new(2, 2)).unwrap().is_clear());
        assert_eq!(map.tile(IVec2::new(4, 2)).unwrap().things, vec![id]);

        // Out of bounds: no change
        assert!(!map.try_move_thing(id, Some(p2), IVec2::new(-5, 0)));
        assert_eq!(map.tile(IVec2::new(4, 2)).unwrap().things, vec![id]);
    }

    #[test]
    fn test_move_within_same_tile_keeps_index() {
        let mut map = map_10x8();
        let id = ThingId::object(1);
        let p1 = tile_center(IVec2::new(2, 2));
        let p2 = p1 + IVec2::new(1, 1);
        assert!(map.try_move_thing(id, None, p1));
        assert!(map.try_move_thing(id, Some(p1), p2));
        assert_eq!(map.tile(IVec2::new(2, 2)).unwrap().things.len(), 1);
    }

    #[test]
    fn test_exit_queries() {
        let mut map = map_10x8();
        map.exit_start = IVec2::new(2, 2);
        map.exit_end = IVec2::new(5, 4);
        assert!(map.is_real_pos_in_exit(tile_center(IVec2::new(2, 2))));
        assert!(map.is_real_pos_in_exit(tile_center(IVec2::new(5, 4))));
        assert!(!map.is_real_pos_in_exit(tile_center(IVec2::new(6, 4))));
        assert!(!map.is_real_pos_in_exit(tile_center(IVec2::new(2, 1))));
        let center = real_to_tile(map.exit_center());
        assert!(map.is_real_pos_in_exit(tile_center(center)));
    }

    #[test]
    fn test_player_spawn_validation() {
        let mut map = map_10x8();
        map.set_access(IVec2::new(2, 2), TileClass::Wall.code());
        map.set_access(IVec2::new(3, 2), TileClass::Room.code());
        let floor = tile_center(IVec2::new(1, 1));
        let wall = tile_center(IVec2::new(2, 2));
        let room = tile_center(IVec2::new(3, 2));
        assert!(map.is_real_pos_ok_for_player(floor, false));
        assert!(!map.is_real_pos_ok_for_player(wall, false));
        assert!(!map.is_real_pos_ok_for_player(wall, true));
        assert!(!map.is_real_pos_ok_for_player(room, false));
        assert!(map.is_real_pos_ok_for_player(room, true));
        assert!(!map.is_real_pos_ok_for_player(IVec2::new(-4, 8), true));
    }

    #[test]
    fn test_explored_percentage() {
        let mut map = map_10x8();
        map.count_explorable_tiles();
        assert_eq!(map.explorable_tiles, 80);
        assert_eq!(map.explored_percentage(), 0);
        for x in 0..10 {
            map.mark_visited(IVec2::new(x, 0));
            map.mark_visited(IVec2::new(x, 1));
        }
        assert_eq!(map.explored_percentage(), 25);
        // Re-visiting does not double count
        map.mark_visited(IVec2::new(0, 0));
        assert_eq!(map.explored_percentage(), 25);
        assert!(!map.tile_is_unexplored(IVec2::new(0, 0)));
        assert!(map.tile_is_unexplored(IVec2::new(5, 5)));
        map.mark_all_visited();
        assert_eq!(map.explored_percentage(), 100);
        assert!(!map.tile_is_unexplored(IVec2::new(5, 5)));
    }

    #[test]
    fn test_search_tile_around_expands() {
        let mut map = map_10x8();
        // Block everything except one far tile
        for y in 0..8 {
            for x in 0..10 {
                map.tile_mut(IVec2::new(x, y)).unwrap().flags = TileFlags::NO_WALK;
            }
        }
        map.tile_mut(IVec2::new(7, 5)).unwrap().flags = TileFlags::empty();
        let found = map.search_tile_around(IVec2::new(1, 1), |m, p| m.tile_can_walk(p));
        assert_eq!(found, Some(IVec2::new(7, 5)));

        map.tile_mut(IVec2::new(7, 5)).unwrap().flags = TileFlags::NO_WALK;
        let none = map.search_tile_around(IVec2::new(1, 1), |m, p| m.tile_can_walk(p));
        assert_eq!(none, None);
    }

    #[test]
    fn test_trigger_fire_and_watch_cycle() {
        let mut map = map_10x8();
        let pos = IVec2::new(3, 3);

        let w = map.triggers.new_watch();
        let t = map.triggers.new_trigger(KeycardFlags::empty());
        {
            let trig = map.triggers.trigger_mut(t).unwrap();
            trig.actions = vec![
                Action::DisableTrigger(t),
                Action::ChangeTile(TileChange {
                    pos,
                    pic: 9,
                    pic_alt: None,
                    flags: TileFlags::empty(),
                }),
                Action::ActivateWatch(w),
                Action::Sound {
                    pos: tile_center(pos),
                    name: "door",
                },
            ];
        }
        {
            let watch = map.triggers.watch_mut(w).unwrap();
            watch.conditions = vec![Condition::TileClear { pos }];
            watch.actions = vec![
                Action::DeactivateWatch(w),
                Action::ChangeTile(TileChange {
                    pos,
                    pic: 1,
                    pic_alt: None,
                    flags: TileFlags::NO_WALK,
                }),
                Action::EnableTrigger(t),
            ];
        }
        map.tile_mut(pos).unwrap().triggers.push(t);
        map.tile_mut(pos).unwrap().flags = TileFlags::NO_WALK;

        // Fire: tile opens, trigger disarms, watch arms
        let fx = map.fire_triggers_at(pos, KeycardFlags::empty());
        assert_eq!(fx.len(), 1);
        assert!(map.tile(pos).unwrap().can_walk());
        assert!(!map.triggers.trigger(t).unwrap().active);
        assert!(map.triggers.watch(w).unwrap().active);

        // Re-firing while disarmed does nothing
        assert!(map.fire_triggers_at(pos, KeycardFlags::empty()).is_empty());

        // Occupied tile: watch holds
        let id = ThingId::character(0);
        map.try_move_thing(id, None, tile_center(pos));
        assert!(map.tick_watches().is_empty());
        assert!(map.triggers.watch(w).unwrap().active);

        // Cleared: watch closes the tile, re-arms the trigger, retires
        map.remove_thing(id, tile_center(pos));
        map.tick_watches();
        assert!(!map.tile(pos).unwrap().can_walk());
        assert!(map.triggers.trigger(t).unwrap().active);
        assert!(!map.triggers.watch(w).unwrap().active);
    }
}
