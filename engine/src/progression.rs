//! Point accrual and automatic rank distribution per class, actor and race.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{CheckDefaults, MaxType, NamedValues, Settings, TalentCatalog, normalize_key};
use crate::{ActorId, ClassId, EnemyId, RaceId, SlotId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionMode {
    /// Each talent follows a named repeating pattern.
    #[default]
    Vertical,
    /// One rank-delta table per level, cycling.
    Horizontal,
}

/// Repeating per-level rank increments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionPattern {
    pub name: String,
    pub sequence: Vec<i32>,
}

impl DistributionPattern {
    /// Increment for `level`; index is `level mod len`, so level 1 reads index 1.
    pub fn value_at(&self, level: i32) -> i32 {
        if self.sequence.is_empty() {
            return 0;
        }
        let idx = level.rem_euclid(self.sequence.len() as i32) as usize;
        self.sequence[idx]
    }

    /// Sum of every increment from level 1 through `level`.
    pub fn cumulative(&self, level: i32) -> i32 {
        (1..=level)
            .map(|l| self.value_at(l))
            .fold(0, i32::saturating_add)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassProgression {
    pub starting_points: i32,
    pub points_per_level: i32,
    pub mode: DistributionMode,
    pub vertical: IndexMap<String, DistributionPattern>,
    pub horizontal: Vec<IndexMap<String, i32>>,
}

impl ClassProgression {
    /// Automatic rank delta granted to `abbr` on reaching `level`.
    pub fn level_delta(&self, abbr: &str, level: i32) -> i32 {
        let key = normalize_key(abbr);
        match self.mode {
            DistributionMode::Vertical => self
                .vertical
                .get(&key)
                .map(|p| p.value_at(level))
                .unwrap_or(0),
            DistributionMode::Horizontal => self
                .horizontal_row(level)
                .and_then(|row| row.get(&key).copied())
                .unwrap_or(0),
        }
    }

    /// Automatic ranks applied when an actor is initialized at `level`.
    ///
    /// Vertical patterns are summed over levels 1..=level; horizontal tables
    /// only contribute the row for `level` itself.
    pub fn initial_ranks(&self, abbr: &str, level: i32) -> i32 {
        match self.mode {
            DistributionMode::Vertical => self
                .vertical
                .get(&normalize_key(abbr))
                .map(|p| p.cumulative(level))
                .unwrap_or(0),
            DistributionMode::Horizontal => self.level_delta(abbr, level),
        }
    }

    fn horizontal_row(&self, level: i32) -> Option<&IndexMap<String, i32>> {
        if self.horizontal.is_empty() {
            return None;
        }
        let idx = level.rem_euclid(self.horizontal.len() as i32) as usize;
        self.horizontal.get(idx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorProgressionOverride {
    pub player_control: bool,
    pub starting_bonus: i32,
    pub point_bonus: i32,
    pub talent_bonus: IndexMap<String, i32>,
    pub check_variable: Option<SlotId>,
}

impl Default for ActorProgressionOverride {
    fn default() -> Self {
        Self {
            player_control: true,
            starting_bonus: 0,
            point_bonus: 0,
            talent_bonus: IndexMap::new(),
            check_variable: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceProgression {
    pub starting_bonus: i32,
    pub point_bonus: i32,
    pub talent_bonus: IndexMap<String, i32>,
}

/// Complete validated rule set, built once at startup and owned by the
/// [`crate::TalentSystem`].
#[derive(Debug, Clone, Default)]
pub struct Rules {
    pub settings: Settings,
    pub check: CheckDefaults,
    pub catalog: TalentCatalog,
    pub named_checks: NamedValues,
    pub named_modifiers: NamedValues,
    pub classes: IndexMap<ClassId, ClassProgression>,
    pub actors: IndexMap<ActorId, ActorProgressionOverride>,
    pub races: IndexMap<RaceId, RaceProgression>,
    pub enemies: IndexMap<EnemyId, IndexMap<String, i32>>,
}

impl Rules {
    /// Rank cap for an actor at `level`.
    pub fn max_ranks(&self, level: i32) -> i32 {
        match self.settings.max_type {
            MaxType::Level => self.settings.max_ranks + level,
            MaxType::Strict => self.settings.max_ranks,
        }
    }

    pub fn actor_override(&self, actor: ActorId) -> Option<&ActorProgressionOverride> {
        self.actors.get(&actor)
    }

    /// Actors without an override are player controlled.
    pub fn is_player_controlled(&self, actor: ActorId) -> bool {
        self.actor_override(actor)
            .map(|o| o.player_control)
            .unwrap_or(true)
    }

    /// Race config, only when the actor has a race and races are configured.
    pub fn race(&self, race: Option<RaceId>) -> Option<&RaceProgression> {
        race.and_then(|id| self.races.get(&id))
    }

    pub fn actor_check_variable(&self, actor: ActorId) -> Option<SlotId> {
        self.actor_override(actor)
            .and_then(|o| o.check_variable)
            .filter(|slot| *slot > 0)
    }

    pub fn enemy_score(&self, enemy: EnemyId, abbr: &str) -> Option<i32> {
        self.enemies
            .get(&enemy)
            .map(|talents| talents.get(&normalize_key(abbr)).copied().unwrap_or(0))
    }
}
