//! Per-actor runtime state and the party roster.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::normalize_key;
use crate::{ActorId, ClassId, MAX_TALENT_POINTS, RaceId};

/// One talent as held by one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorTalentRecord {
    pub abbreviation: String,
    pub ranks: i32,
    /// Display flags cached for the actor's class at (re)initialization.
    pub proficient: bool,
    pub signature: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorState {
    pub actor_id: ActorId,
    pub class_id: ClassId,
    #[serde(default)]
    pub race_id: Option<RaceId>,
    pub level: i32,
    pub initial_level: i32,
    pub talent_points: i32,
    pub talents: IndexMap<String, ActorTalentRecord>,
}

impl ActorState {
    pub fn new(actor_id: ActorId, class_id: ClassId, level: i32) -> Self {
        Self {
            actor_id,
            class_id,
            race_id: None,
            level,
            initial_level: level,
            talent_points: 0,
            talents: IndexMap::new(),
        }
    }

    pub fn with_race(mut self, race: RaceId) -> Self {
        self.race_id = Some(race);
        self
    }

    pub fn with_initial_level(mut self, level: i32) -> Self {
        self.initial_level = level;
        self
    }

    pub fn record(&self, abbr: &str) -> Option<&ActorTalentRecord> {
        self.talents.get(&normalize_key(abbr))
    }

    pub fn record_mut(&mut self, abbr: &str) -> Option<&mut ActorTalentRecord> {
        self.talents.get_mut(&normalize_key(abbr))
    }

    pub fn ranks(&self, abbr: &str) -> Option<i32> {
        self.record(abbr).map(|r| r.ranks)
    }

    /// Sets the unspent pool, clamped to `0..=MAX_TALENT_POINTS`.
    pub fn set_points(&mut self, points: i32) {
        self.talent_points = points.clamp(0, MAX_TALENT_POINTS);
    }

    /// Unspent points plus every rank held.
    pub fn total_points(&self) -> i32 {
        self.talents
            .values()
            .map(|r| r.ranks)
            .fold(self.talent_points, i32::saturating_add)
    }
}

/// Every known actor plus the ordered party roster.
///
/// Roster order is insertion order and decides ties in best-actor scans.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    actors: IndexMap<ActorId, ActorState>,
    members: Vec<ActorId>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) an actor without touching the roster.
    pub fn insert(&mut self, actor: ActorState) {
        self.actors.insert(actor.actor_id, actor);
    }

    /// Appends a known actor to the roster. False if unknown or already in.
    pub fn add_member(&mut self, actor: ActorId) -> bool {
        if !self.actors.contains_key(&actor) || self.members.contains(&actor) {
            return false;
        }
        self.members.push(actor);
        true
    }

    pub fn remove_member(&mut self, actor: ActorId) -> bool {
        let before = self.members.len();
        self.members.retain(|id| *id != actor);
        self.members.len() != before
    }

    pub fn members(&self) -> &[ActorId] {
        &self.members
    }

    pub fn actor(&self, actor: ActorId) -> Option<&ActorState> {
        self.actors.get(&actor)
    }

    pub fn actor_mut(&mut self, actor: ActorId) -> Option<&mut ActorState> {
        self.actors.get_mut(&actor)
    }

    /// Roster members in order, skipping ids with no state.
    pub fn member_states(&self) -> impl Iterator<Item = &ActorState> {
        self.members.iter().filter_map(|id| self.actors.get(id))
    }

    pub fn actors(&self) -> impl Iterator<Item = &ActorState> {
        self.actors.values()
    }
}

/// Not-yet-committed point spending, keyed by abbreviation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pending {
    points: IndexMap<String, i32>,
}

impl Pending {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, abbr: &str) -> i32 {
        self.points.get(&normalize_key(abbr)).copied().unwrap_or(0)
    }

    pub fn add(&mut self, abbr: &str) {
        *self.points.entry(normalize_key(abbr)).or_insert(0) += 1;
    }

    /// Takes back one pending point. False if none was pending.
    pub fn remove(&mut self, abbr: &str) -> bool {
        match self.points.get_mut(&normalize_key(abbr)) {
            Some(p) if *p > 0 => {
                *p -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn total(&self) -> i32 {
        self.points.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.points.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}
