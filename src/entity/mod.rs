//! The entity store: actors (characters) and props (objects) indexed by id.
//!
//! The tile grid references entities only through [`ThingId`]s; this store
//! is the owning side. AI and collision read it, generation appends to it.

use bitflags::bitflags;
use glam::IVec2;

use crate::map::Map;
use crate::mapobject::{MapObjectFlags, MapObjectTemplate};
use crate::tile::{tile_center, ThingId};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ActorFlags: u16 {
        const GOOD_GUY = 0x0001;
        /// Lit/fogged visibility, recomputed by the ambient lighting pass
        const VISIBLE = 0x0002;
        const INVULNERABLE = 0x0004;
        /// Shooting this actor penalizes the player; never targeted
        const PENALTY = 0x0008;
        /// Coward: flees instead of chasing
        const RUNS_AWAY = 0x0010;
    }
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u32,
    /// Real (sub-tile) position
    pub pos: IVec2,
    pub flags: ActorFlags,
    pub is_player: bool,
    pub dead: bool,
    pub in_use: bool,
}

impl Actor {
    pub fn is_good(&self) -> bool {
        self.is_player || self.flags.contains(ActorFlags::GOOD_GUY)
    }
}

bitflags! {
    /// Collision-relevant flags on a placed prop
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PropFlags: u16 {
        const IMPASSABLE = 0x0001;
        const CAN_BE_SHOT = 0x0002;
        const CAN_BE_TAKEN = 0x0004;
        const IS_WRECK = 0x0008;
        /// Explodes when destroyed; AI paths around it
        const DANGEROUS = 0x0010;
        const FLAMMABLE = 0x0020;
        const POISONOUS = 0x0040;
        /// Shakes the screen when destroyed
        const QUAKE = 0x0080;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickupKind {
    /// Collectible objective item, tagged with its objective index
    Jewel { objective: usize },
    Keycard(u8),
    Health,
}

#[derive(Debug, Clone)]
pub struct Prop {
    pub id: u32,
    pub pos: IVec2,
    pub size: IVec2,
    pub pic: u16,
    pub wrecked_pic: u16,
    pub structure: i32,
    pub flags: PropFlags,
    /// Pickup role, if any; plain destructibles carry `None`
    pub pickup: Option<PickupKind>,
    /// Destroy-objective index, if this prop is an objective target
    pub objective: Option<usize>,
}

impl Prop {
    /// Anything that is not a pickup or a wreck blocks careful movement
    pub fn blocks_movement(&self) -> bool {
        self.pickup.is_none() && !self.flags.contains(PropFlags::IS_WRECK)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    pub actors: Vec<Actor>,
    pub props: Vec<Prop>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn actor(&self, id: u32) -> Option<&Actor> {
        self.actors.get(id as usize)
    }

    pub fn prop(&self, id: u32) -> Option<&Prop> {
        self.props.get(id as usize)
    }

    /// Spawn an actor at a real position and index it on the map
    pub fn add_actor(&mut self, map: &mut Map, pos: IVec2, flags: ActorFlags, is_player: bool) -> ThingId {
        let id = self.actors.len() as u32;
        self.actors.push(Actor {
            id,
            pos,
            flags,
            is_player,
            dead: false,
            in_use: true,
        });
        let tid = ThingId::character(id);
        map.try_move_thing(tid, None, pos);
        tid
    }

    /// Spawn a destructible prop from a catalog template
    pub fn add_destructible(
        &mut self,
        map: &mut Map,
        pos: IVec2,
        template: &MapObjectTemplate,
        objective: Option<usize>,
    ) -> ThingId {
        let mut flags = PropFlags::empty();
        if template.flags.contains(MapObjectFlags::IMPASSABLE) {
            flags |= PropFlags::IMPASSABLE;
        }
        if template.flags.contains(MapObjectFlags::CAN_BE_SHOT) {
            flags |= PropFlags::CAN_BE_SHOT;
        }
        if template.flags.contains(MapObjectFlags::EXPLOSIVE) {
            flags |= PropFlags::DANGEROUS;
        }
        if template.flags.contains(MapObjectFlags::FLAMMABLE) {
            flags |= PropFlags::FLAMMABLE;
        }
        if template.flags.contains(MapObjectFlags::POISONOUS) {
            flags |= PropFlags::POISONOUS;
        }
        if template.flags.contains(MapObjectFlags::QUAKE) {
            flags |= PropFlags::QUAKE;
        }
        self.add_prop(
            map,
            Prop {
                id: 0,
                pos,
                size: IVec2::new(template.width, template.height),
                pic: template.pic,
                wrecked_pic: template.wrecked_pic,
                structure: template.structure,
                flags,
                pickup: None,
                objective,
            },
        )
    }

    /// Spawn an already-destroyed prop
    pub fn add_wreck(&mut self, map: &mut Map, pos: IVec2, template: &MapObjectTemplate) -> ThingId {
        self.add_prop(
            map,
            Prop {
                id: 0,
                pos,
                size: IVec2::new(template.width, template.height),
                pic: template.wrecked_pic,
                wrecked_pic: template.wrecked_pic,
                structure: 0,
                flags: PropFlags::IS_WRECK,
                pickup: None,
                objective: None,
            },
        )
    }

    /// Spawn a pickup (collectible, keycard, health) at a tile
    pub fn add_pickup(
        &mut self,
        map: &mut Map,
        tile: IVec2,
        size: IVec2,
        pic: u16,
        kind: PickupKind,
    ) -> ThingId {
        let objective = match kind {
            PickupKind::Jewel { objective } => Some(objective),
            _ => None,
        };
        self.add_prop(
            map,
            Prop {
                id: 0,
                pos: tile_center(tile),
                size,
                pic,
                wrecked_pic: pic,
                structure: 0,
                flags: PropFlags::CAN_BE_TAKEN,
                pickup: Some(kind),
                objective,
            },
        )
    }

    /// Spawn a pickup at an exact real position
    pub fn add_pickup_at_real(
        &mut self,
        map: &mut Map,
        pos: IVec2,
        size: IVec2,
        pic: u16,
        kind: PickupKind,
    ) -> ThingId {
        let objective = match kind {
            PickupKind::Jewel { objective } => Some(objective),
            _ => None,
        };
        self.add_prop(
            map,
            Prop {
                id: 0,
                pos,
                size,
                pic,
                wrecked_pic: pic,
                structure: 0,
                flags: PropFlags::CAN_BE_TAKEN,
                pickup: Some(kind),
                objective,
            },
        )
    }

    fn add_prop(&mut self, map: &mut Map, mut prop: Prop) -> ThingId {
        let id = self.props.len() as u32;
        prop.id = id;
        let pos = prop.pos;
        self.props.push(prop);
        let tid = ThingId::object(id);
        map.try_move_thing(tid, None, pos);
        tid
    }

    /// Move an entity and keep the map's occupant index in sync
    pub fn try_move(&mut self, map: &mut Map, tid: ThingId, to: IVec2) -> bool {
        let from = match tid.kind {
            crate::tile::ThingKind::Character => self.actor(tid.id).map(|a| a.pos),
            crate::tile::ThingKind::Object => self.prop(tid.id).map(|p| p.pos),
        };
        let Some(from) = from else { return false };
        if !map.try_move_thing(tid, Some(from), to) {
            return false;
        }
        match tid.kind {
            crate::tile::ThingKind::Character => self.actors[tid.id as usize].pos = to,
            crate::tile::ThingKind::Object => self.props[tid.id as usize].pos = to,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapobject;
    use crate::tile::real_to_tile;

    #[test]
    fn test_add_actor_indexes_tile() {
        let mut map = Map::new(IVec2::new(16, 16));
        let mut store = EntityStore::new();
        let pos = tile_center(IVec2::new(4, 4));
        let tid = store.add_actor(&mut map, pos, ActorFlags::GOOD_GUY, false);
        assert_eq!(map.tile(IVec2::new(4, 4)).unwrap().things, vec![tid]);
        assert!(store.actor(tid.id).unwrap().is_good());
    }

    #[test]
    fn test_try_move_syncs_store_and_map() {
        let mut map = Map::new(IVec2::new(16, 16));
        let mut store = EntityStore::new();
        let p1 = tile_center(IVec2::new(2, 2));
        let p2 = tile_center(IVec2::new(6, 6));
        let tid = store.add_actor(&mut map, p1, ActorFlags::empty(), true);

        assert!(store.try_move(&mut map, tid, p2));
        assert_eq!(store.actor(tid.id).unwrap().pos, p2);
        assert!(map.tile(real_to_tile(p1)).unwrap().is_clear());
        assert_eq!(map.tile(real_to_tile(p2)).unwrap().things, vec![tid]);

        // Out of bounds move is refused and position unchanged
        assert!(!store.try_move(&mut map, tid, IVec2::new(-10, 0)));
        assert_eq!(store.actor(tid.id).unwrap().pos, p2);
    }

    #[test]
    fn test_destructible_prop_flags() {
        let mut map = Map::new(IVec2::new(16, 16));
        let mut store = EntityStore::new();
        let rocket = mapobject::catalog()
            .iter()
            .find(|t| t.name == "rocket")
            .unwrap();
        let tid = store.add_destructible(&mut map, tile_center(IVec2::new(3, 3)), rocket, None);
        let prop = store.prop(tid.id).unwrap();
        assert!(prop.flags.contains(PropFlags::DANGEROUS));
        assert!(prop.blocks_movement());
    }

    #[test]
    fn test_pickup_does_not_block() {
        let mut map = Map::new(IVec2::new(16, 16));
        let mut store = EntityStore::new();
        let tid = store.add_pickup(
            &mut map,
            IVec2::new(5, 5),
            IVec2::new(4, 3),
            7,
            PickupKind::Health,
        );
        assert!(!store.prop(tid.id).unwrap().blocks_movement());
    }

    #[test]
    fn test_wreck_does_not_block() {
        let mut map = Map::new(IVec2::new(16, 16));
        let mut store = EntityStore::new();
        let barrel = &mapobject::catalog()[0];
        let tid = store.add_wreck(&mut map, tile_center(IVec2::new(3, 3)), barrel);
        assert!(!store.prop(tid.id).unwrap().blocks_movement());
        assert!(store.prop(tid.id).unwrap().flags.contains(PropFlags::IS_WRECK));
    }
}
