//! Triggers and watches.
//!
//! A [`Trigger`] fires once when an external event addresses it (an actor
//! stepping on a tile that references it) and runs its actions. A [`Watch`]
//! is polled every simulation tick; once all of its conditions hold it runs
//! its actions and deactivates itself. Door groups use both: opening is
//! trigger-driven, closing is watch-driven.
//!
//! Both live in a growable arena owned by the map and are referenced only by
//! integer id, never by pointer, so the arena may reallocate freely.

use glam::IVec2;

use crate::map::access::KeycardFlags;
use crate::tile::{PicId, TileFlags};

pub type TriggerId = u32;
pub type WatchId = u32;

/// Polled condition; all of a watch's conditions must hold at once
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Tile has no occupants
    TileClear { pos: IVec2 },
}

/// Full replacement state for one tile's visuals and flags
#[derive(Debug, Clone)]
pub struct TileChange {
    pub pos: IVec2,
    pub pic: PicId,
    pub pic_alt: Option<PicId>,
    pub flags: TileFlags,
}

/// One step of a trigger/watch action list
#[derive(Debug, Clone)]
pub enum Action {
    ChangeTile(TileChange),
    /// Repaint a tile's base sprite, leaving flags and occupants alone
    ChangePic { pos: IVec2, pic: PicId },
    /// Fire-and-forget sound request for the audio collaborator
    Sound { pos: IVec2, name: &'static str },
    ActivateWatch(WatchId),
    DeactivateWatch(WatchId),
    /// Re-arm a trigger so it can fire again
    EnableTrigger(TriggerId),
    /// Disarm a trigger (e.g. while its door stands open)
    DisableTrigger(TriggerId),
}

/// Event-fired, one-shot (until re-armed) rule
#[derive(Debug, Clone)]
pub struct Trigger {
    pub id: TriggerId,
    /// Keycards needed to set this off; empty means anyone can
    pub required_keys: KeycardFlags,
    pub active: bool,
    pub actions: Vec<Action>,
}

impl Trigger {
    pub fn can_activate(&self, held: KeycardFlags) -> bool {
        self.active && (self.required_keys.is_empty() || self.required_keys.intersects(held))
    }
}

/// Polled, condition-gated rule; deactivates itself via its own actions
#[derive(Debug, Clone)]
pub struct Watch {
    pub id: WatchId,
    pub active: bool,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

/// Arena of triggers and watches; ids are indices and stay stable while the
/// backing storage grows
#[derive(Debug, Clone, Default)]
pub struct TriggerArena {
    triggers: Vec<Trigger>,
    watches: Vec<Watch>,
}

impl TriggerArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_trigger(&mut self, required_keys: KeycardFlags) -> TriggerId {
        let id = self.triggers.len() as TriggerId;
        self.triggers.push(Trigger {
            id,
            required_keys,
            active: true,
            actions: Vec::new(),
        });
        id
    }

    /// Watches start inactive; a trigger action activates them
    pub fn new_watch(&mut self) -> WatchId {
        let id = self.watches.len() as WatchId;
        self.watches.push(Watch {
            id,
            active: false,
            conditions: Vec::new(),
            actions: Vec::new(),
        });
        id
    }

    pub fn trigger(&self, id: TriggerId) -> Option<&Trigger> {
        self.triggers.get(id as usize)
    }

    pub fn trigger_mut(&mut self, id: TriggerId) -> Option<&mut Trigger> {
        self.triggers.get_mut(id as usize)
    }

    pub fn watch(&self, id: WatchId) -> Option<&Watch> {
        self.watches.get(id as usize)
    }

    pub fn watch_mut(&mut self, id: WatchId) -> Option<&mut Watch> {
        self.watches.get_mut(id as usize)
    }

    pub fn trigger_count(&self) -> usize {
        self.triggers.len()
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    /// Ids of watches currently eligible for polling
    pub fn active_watch_ids(&self) -> Vec<WatchId> {
        self.watches
            .iter()
            .filter(|w| w.active)
            .map(|w| w.id)
            .collect()
    }
}

/// Side effects emitted by action lists, handed to external collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Sound { pos: IVec2, name: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_ids_are_stable_indices() {
        let mut arena = TriggerArena::new();
        let a = arena.new_trigger(KeycardFlags::empty());
        let b = arena.new_trigger(KeycardFlags::RED);
        // Force growth
        for _ in 0..100 {
            arena.new_trigger(KeycardFlags::empty());
        }
        assert_eq!(arena.trigger(a).unwrap().id, a);
        assert_eq!(arena.trigger(b).unwrap().required_keys, KeycardFlags::RED);
    }

    #[test]
    fn test_trigger_keycard_gating() {
        let mut arena = TriggerArena::new();
        let unlocked = arena.new_trigger(KeycardFlags::empty());
        let locked = arena.new_trigger(KeycardFlags::BLUE);

        let t = arena.trigger(unlocked).unwrap();
        assert!(t.can_activate(KeycardFlags::empty()));

        let t = arena.trigger(locked).unwrap();
        assert!(!t.can_activate(KeycardFlags::empty()));
        assert!(!t.can_activate(KeycardFlags::RED));
        assert!(t.can_activate(KeycardFlags::BLUE | KeycardFlags::YELLOW));
    }

    #[test]
    fn test_inactive_trigger_never_activates() {
        let mut arena = TriggerArena::new();
        let id = arena.new_trigger(KeycardFlags::empty());
        arena.trigger_mut(id).unwrap().active = false;
        assert!(!arena
            .trigger(id)
            .unwrap()
            .can_activate(KeycardFlags::all()));
    }

    #[test]
    fn test_watches_start_inactive() {
        let mut arena = TriggerArena::new();
        let w = arena.new_watch();
        assert!(!arena.watch(w).unwrap().active);
        assert!(arena.active_watch_ids().is_empty());
        arena.watch_mut(w).unwrap().active = true;
        assert_eq!(arena.active_watch_ids(), vec![w]);
    }
}
