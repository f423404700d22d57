//! Static talent definitions and global tuning.
//!
//! Everything in here is loaded once (see [`crate::config`]) and only read
//! afterwards. Abbreviations are stored trimmed and lowercased; every lookup
//! goes through [`normalize_key`] so callers may pass any casing.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::check::{CheckKind, ViewMode};
use crate::{ClassId, ItemId, SlotId};

/// Canonical form of a talent abbreviation or table key.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    #[default]
    #[serde(alias = "ALL")]
    All,
    #[serde(alias = "NONE")]
    None,
    #[serde(alias = "CLASS")]
    Class,
}

/// Another talent that must hold at least `ranks` before this one is usable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyRequirement {
    pub talent: String,
    pub ranks: i32,
}

/// `bonus` is added to the score once `talent` holds at least `ranks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynergyBonus {
    pub talent: String,
    pub ranks: i32,
    pub bonus: i32,
}

/// Item that must be held to attempt a check with the talent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredItem {
    pub item: ItemId,
    #[serde(default = "default_item_count")]
    pub count: u32,
    #[serde(default)]
    pub consume: bool,
}

fn default_item_count() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentDefinition {
    pub abbreviation: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub class_proficiencies: Vec<ClassId>,
    #[serde(default)]
    pub class_signatures: Vec<ClassId>,
    #[serde(default)]
    pub visibility: VisibilityMode,
    #[serde(default)]
    pub class_visibility: Vec<ClassId>,
    #[serde(default)]
    pub starting_ranks: i32,
    #[serde(default)]
    pub requires_training: bool,
    #[serde(default)]
    pub synergy_requirements: Vec<SynergyRequirement>,
    #[serde(default)]
    pub synergy_bonuses: Vec<SynergyBonus>,
    #[serde(default)]
    pub required_item: Option<RequiredItem>,
}

impl TalentDefinition {
    pub fn new(abbreviation: &str, name: &str) -> Self {
        Self {
            abbreviation: normalize_key(abbreviation),
            name: name.to_string(),
            description: String::new(),
            class_proficiencies: Vec::new(),
            class_signatures: Vec::new(),
            visibility: VisibilityMode::All,
            class_visibility: Vec::new(),
            starting_ranks: 0,
            requires_training: false,
            synergy_requirements: Vec::new(),
            synergy_bonuses: Vec::new(),
            required_item: None,
        }
    }

    pub fn is_proficient(&self, class: ClassId) -> bool {
        self.class_proficiencies.contains(&class)
    }

    pub fn is_signature(&self, class: ClassId) -> bool {
        self.class_signatures.contains(&class)
    }

    /// Visibility from the mode alone; synergy requirements are checked separately.
    pub fn is_visible_to(&self, class: ClassId) -> bool {
        match self.visibility {
            VisibilityMode::All => true,
            VisibilityMode::None => false,
            VisibilityMode::Class => self.class_visibility.contains(&class),
        }
    }
}

/// Every talent definition, in configuration order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentCatalog {
    talents: IndexMap<String, TalentDefinition>,
}

impl TalentCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a definition under its normalized abbreviation. Returns false
    /// (and keeps the existing entry) when the abbreviation is taken.
    pub fn insert(&mut self, mut talent: TalentDefinition) -> bool {
        let key = normalize_key(&talent.abbreviation);
        if self.talents.contains_key(&key) {
            return false;
        }
        talent.abbreviation = key.clone();
        self.talents.insert(key, talent);
        true
    }

    pub fn get(&self, abbr: &str) -> Option<&TalentDefinition> {
        self.talents.get(&normalize_key(abbr))
    }

    pub fn contains(&self, abbr: &str) -> bool {
        self.talents.contains_key(&normalize_key(abbr))
    }

    pub fn iter(&self) -> impl Iterator<Item = &TalentDefinition> {
        self.talents.values()
    }

    pub fn len(&self) -> usize {
        self.talents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.talents.is_empty()
    }
}

/// Name → integer table used for named checks and named modifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValues {
    values: IndexMap<String, i32>,
}

impl NamedValues {
    pub fn insert(&mut self, name: &str, value: i32) {
        self.values.insert(normalize_key(name), value);
    }

    pub fn get(&self, name: &str) -> Option<i32> {
        self.values.get(&normalize_key(name)).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(String, i32)> for NamedValues {
    fn from_iter<I: IntoIterator<Item = (String, i32)>>(iter: I) -> Self {
        let mut table = NamedValues::default();
        for (name, value) in iter {
            table.insert(&name, value);
        }
        table
    }
}

/// How the per-talent rank cap is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaxType {
    /// Cap is `max_ranks + level`.
    #[default]
    #[serde(alias = "LEVEL")]
    Level,
    /// Cap is `max_ranks`.
    #[serde(alias = "STRICT")]
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub max_type: MaxType,
    pub max_ranks: i32,
    pub proficiency_bonus: i32,
    pub reset_on_class_change: bool,
    /// Persist the catalog in snapshots so runtime edits survive a reload.
    pub save_catalog: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_type: MaxType::Level,
            max_ranks: 3,
            proficiency_bonus: 3,
            reset_on_class_change: false,
            save_catalog: false,
        }
    }
}

/// Fallbacks for every check option a caller leaves out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckDefaults {
    pub last_check_var: SlotId,
    pub target_number_var: SlotId,
    pub roll_type: CheckKind,
    pub die_type: i32,
    pub die_count: i32,
    pub view_type: ViewMode,
    pub decline_value: i32,
    pub normalize_target: bool,
}

impl Default for CheckDefaults {
    fn default() -> Self {
        Self {
            last_check_var: 0,
            target_number_var: 0,
            roll_type: CheckKind::Roll,
            die_type: 20,
            die_count: 1,
            view_type: ViewMode::Ask,
            decline_value: 9999,
            normalize_target: false,
        }
    }
}
