//! Capabilities the host game provides to the engine.
//!
//! The engine never reaches into host objects. Equipment, inventory and
//! status effects are reported through [`BonusSource`], held items through
//! [`ItemStore`], and check results leave through [`ResultSink`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::normalize_key;
use crate::{ActorId, ItemId, SlotId};

/// Talent bonuses granted by things the actor has equipped, carries or suffers.
///
/// Each method returns the summed signed bonus for `abbr` (already
/// normalized) across every matching instance.
pub trait BonusSource {
    /// Equipped weapons and armor.
    fn equipment_bonus(&self, actor: ActorId, abbr: &str) -> i32;
    /// Party inventory; any item held in a count above zero counts once.
    fn item_bonus(&self, abbr: &str) -> i32;
    /// Active status effects.
    fn state_bonus(&self, actor: ActorId, abbr: &str) -> i32;
    fn passive_state_bonus(&self, _actor: ActorId, _abbr: &str) -> i32 {
        0
    }
}

pub trait ItemStore {
    fn item_count(&self, item: ItemId) -> u32;
    fn consume_item(&mut self, item: ItemId, count: u32);
}

pub trait ResultSink {
    fn set_value(&mut self, slot: SlotId, value: i32);
}

/// A result sink that can also be read back, used for `v[n]` indirection.
pub trait VariableStore: ResultSink {
    fn value(&self, slot: SlotId) -> i32;
}

/// Everything a check needs from the host.
pub trait Host: BonusSource + ItemStore + VariableStore {}

impl<T: BonusSource + ItemStore + VariableStore> Host for T {}

/// A host with no equipment, items or states.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoBonuses;

impl BonusSource for NoBonuses {
    fn equipment_bonus(&self, _actor: ActorId, _abbr: &str) -> i32 {
        0
    }

    fn item_bonus(&self, _abbr: &str) -> i32 {
        0
    }

    fn state_bonus(&self, _actor: ActorId, _abbr: &str) -> i32 {
        0
    }
}

/// Parse a `TalentBonus` annotation such as `+2 lock, -1 perc`.
///
/// Tokens are comma separated, each a signed integer followed by an
/// abbreviation. Malformed tokens are ignored.
pub fn parse_talent_bonus(note: &str) -> Vec<(String, i32)> {
    note.split(',')
        .filter_map(|token| {
            let mut parts = token.split_whitespace();
            let value = parts.next()?.parse::<i32>().ok()?;
            let abbr = normalize_key(parts.next()?);
            Some((abbr, value))
        })
        .collect()
}

/// Sum of every entry for `abbr` in a `TalentBonus` annotation.
pub fn annotation_bonus(note: &str, abbr: &str) -> i32 {
    let key = normalize_key(abbr);
    parse_talent_bonus(note)
        .into_iter()
        .filter(|(a, _)| *a == key)
        .map(|(_, v)| v)
        .sum()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldItem {
    pub count: u32,
    /// `TalentBonus` annotation of the item, if any.
    #[serde(default)]
    pub note: String,
}

/// In-memory host: variables, annotated equipment/states and a party bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryHost {
    pub variables: IndexMap<SlotId, i32>,
    pub equipment: IndexMap<ActorId, Vec<String>>,
    pub states: IndexMap<ActorId, Vec<String>>,
    pub passive_states: IndexMap<ActorId, Vec<String>>,
    pub items: IndexMap<ItemId, HeldItem>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equip(&mut self, actor: ActorId, note: &str) {
        self.equipment.entry(actor).or_default().push(note.to_string());
    }

    pub fn add_state(&mut self, actor: ActorId, note: &str) {
        self.states.entry(actor).or_default().push(note.to_string());
    }

    pub fn add_passive_state(&mut self, actor: ActorId, note: &str) {
        self.passive_states
            .entry(actor)
            .or_default()
            .push(note.to_string());
    }

    pub fn give_item(&mut self, item: ItemId, count: u32, note: &str) {
        let held = self.items.entry(item).or_default();
        held.count += count;
        if !note.is_empty() {
            held.note = note.to_string();
        }
    }
}

fn notes_bonus(notes: Option<&Vec<String>>, abbr: &str) -> i32 {
    notes
        .map(|notes| notes.iter().map(|n| annotation_bonus(n, abbr)).sum())
        .unwrap_or(0)
}

impl BonusSource for MemoryHost {
    fn equipment_bonus(&self, actor: ActorId, abbr: &str) -> i32 {
        notes_bonus(self.equipment.get(&actor), abbr)
    }

    fn item_bonus(&self, abbr: &str) -> i32 {
        self.items
            .values()
            .filter(|held| held.count > 0)
            .map(|held| annotation_bonus(&held.note, abbr))
            .sum()
    }

    fn state_bonus(&self, actor: ActorId, abbr: &str) -> i32 {
        notes_bonus(self.states.get(&actor), abbr)
    }

    fn passive_state_bonus(&self, actor: ActorId, abbr: &str) -> i32 {
        notes_bonus(self.passive_states.get(&actor), abbr)
    }
}

impl ItemStore for MemoryHost {
    fn item_count(&self, item: ItemId) -> u32 {
        self.items.get(&item).map(|held| held.count).unwrap_or(0)
    }

    fn consume_item(&mut self, item: ItemId, count: u32) {
        if let Some(held) = self.items.get_mut(&item) {
            held.count = held.count.saturating_sub(count);
        }
    }
}

impl ResultSink for MemoryHost {
    fn set_value(&mut self, slot: SlotId, value: i32) {
        if slot > 0 {
            self.variables.insert(slot, value);
        }
    }
}

impl VariableStore for MemoryHost {
    fn value(&self, slot: SlotId) -> i32 {
        self.variables.get(&slot).copied().unwrap_or(0)
    }
}
