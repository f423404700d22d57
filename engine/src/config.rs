//! Rules file format and the one-time validation pass into [`Rules`].
//!
//! Entries that reference unknown talents or patterns are logged and skipped;
//! the rest of the file still loads. Only structurally impossible settings
//! are reported as [`ConfigError`].

use std::{fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::warn;

use crate::catalog::{
    CheckDefaults, NamedValues, Settings, TalentCatalog, TalentDefinition, normalize_key,
};
use crate::error::ConfigError;
use crate::progression::{
    ActorProgressionOverride, ClassProgression, DistributionMode, DistributionPattern,
    RaceProgression, Rules,
};
use crate::{ActorId, ClassId, EnemyId, RaceId};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RulesFile {
    pub settings: Settings,
    pub check: CheckDefaults,
    pub talents: Vec<TalentDefinition>,
    pub named_checks: IndexMap<String, i32>,
    pub named_modifiers: IndexMap<String, i32>,
    pub patterns: IndexMap<String, Vec<u32>>,
    pub classes: IndexMap<ClassId, ClassEntry>,
    pub actors: IndexMap<ActorId, ActorProgressionOverride>,
    pub races: IndexMap<RaceId, RaceProgression>,
    pub enemies: IndexMap<EnemyId, IndexMap<String, i32>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClassEntry {
    pub starting_points: i32,
    pub points_per_level: i32,
    pub auto_mode: DistributionMode,
    /// talent abbreviation → pattern name
    pub vertical: IndexMap<String, String>,
    pub horizontal: Vec<IndexMap<String, i32>>,
}

impl Rules {
    pub fn from_yaml_str(text: &str) -> Result<Rules> {
        let file: RulesFile = serde_yaml::from_str(text).context("failed to parse rules YAML")?;
        Ok(file.into_rules()?)
    }

    pub fn from_json_str(text: &str) -> Result<Rules> {
        let file: RulesFile = serde_json::from_str(text).context("failed to parse rules JSON")?;
        Ok(file.into_rules()?)
    }
}

/// Load rules from a `.yaml`/`.yml` or `.json` file.
pub fn load_rules(path: &Path) -> Result<Rules> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read rules file: {}", path.display()))?;
    parse_rules(path, &text)
}

/// Parse already-read rules text, picking the format from `path`'s extension.
pub fn parse_rules(path: &Path, text: &str) -> Result<Rules> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    let rules = match ext.as_str() {
        "yaml" | "yml" => Rules::from_yaml_str(text),
        "json" => Rules::from_json_str(text),
        other => Err(ConfigError::UnsupportedFormat(other.to_string()).into()),
    };
    rules.with_context(|| format!("failed to load rules: {}", path.display()))
}

impl RulesFile {
    pub fn into_rules(self) -> Result<Rules, ConfigError> {
        validate_settings(&self.settings, &self.check)?;

        let mut catalog = TalentCatalog::new();
        for talent in self.talents {
            let abbr = normalize_key(&talent.abbreviation);
            if abbr.is_empty() || talent.name.trim().is_empty() {
                warn!(name = %talent.name, "skipping talent without abbreviation or name");
                continue;
            }
            if abbr.contains(char::is_whitespace) {
                warn!(abbr = %abbr, "skipping talent: abbreviation contains whitespace");
                continue;
            }
            if !catalog.insert(talent) {
                warn!(abbr = %abbr, "skipping duplicate talent abbreviation");
            }
        }
        let catalog = link_synergies(catalog);

        let patterns: IndexMap<String, DistributionPattern> = self
            .patterns
            .into_iter()
            .filter_map(|(name, sequence)| {
                let name = normalize_key(&name);
                if sequence.is_empty() {
                    warn!(pattern = %name, "skipping empty distribution pattern");
                    return None;
                }
                let Ok(sequence) = sequence
                    .iter()
                    .map(|v| i32::try_from(*v))
                    .collect::<Result<Vec<i32>, _>>()
                else {
                    warn!(pattern = %name, "skipping distribution pattern with out-of-range value");
                    return None;
                };
                Some((name.clone(), DistributionPattern { name, sequence }))
            })
            .collect();

        let classes = self
            .classes
            .into_iter()
            .map(|(id, entry)| (id, build_class(id, entry, &catalog, &patterns)))
            .collect();

        let actors = self
            .actors
            .into_iter()
            .map(|(id, mut actor)| {
                actor.talent_bonus = known_talents(actor.talent_bonus, &catalog, "actor", id);
                (id, actor)
            })
            .collect();

        let races = self
            .races
            .into_iter()
            .map(|(id, mut race)| {
                race.talent_bonus = known_talents(race.talent_bonus, &catalog, "race", id);
                (id, race)
            })
            .collect();

        let enemies = self
            .enemies
            .into_iter()
            .map(|(id, talents)| (id, known_talents(talents, &catalog, "enemy", id)))
            .collect();

        Ok(Rules {
            settings: self.settings,
            check: self.check,
            catalog,
            named_checks: self.named_checks.into_iter().collect::<NamedValues>(),
            named_modifiers: self.named_modifiers.into_iter().collect::<NamedValues>(),
            classes,
            actors,
            races,
            enemies,
        })
    }
}

fn validate_settings(settings: &Settings, check: &CheckDefaults) -> Result<(), ConfigError> {
    if settings.max_ranks < 0 {
        return Err(ConfigError::InvalidSettings(format!(
            "max_ranks must be >= 0, got {}",
            settings.max_ranks
        )));
    }
    if check.die_type < 1 {
        return Err(ConfigError::InvalidCheckDefaults(format!(
            "die_type must be >= 1, got {}",
            check.die_type
        )));
    }
    if check.die_count < 1 {
        return Err(ConfigError::InvalidCheckDefaults(format!(
            "die_count must be >= 1, got {}",
            check.die_count
        )));
    }
    Ok(())
}

/// Normalize synergy references and drop those naming unknown talents.
fn link_synergies(catalog: TalentCatalog) -> TalentCatalog {
    let known: Vec<String> = catalog.iter().map(|t| t.abbreviation.clone()).collect();
    let is_known = |abbr: &str| known.iter().any(|k| k == abbr);

    let mut linked = TalentCatalog::new();
    for talent in catalog.iter() {
        let mut talent = talent.clone();
        talent.synergy_requirements = talent
            .synergy_requirements
            .into_iter()
            .filter_map(|mut req| {
                req.talent = normalize_key(&req.talent);
                if is_known(&req.talent) {
                    Some(req)
                } else {
                    warn!(abbr = %talent.abbreviation, other = %req.talent, "dropping synergy requirement on unknown talent");
                    None
                }
            })
            .collect();
        talent.synergy_bonuses = talent
            .synergy_bonuses
            .into_iter()
            .filter_map(|mut bonus| {
                bonus.talent = normalize_key(&bonus.talent);
                if is_known(&bonus.talent) {
                    Some(bonus)
                } else {
                    warn!(abbr = %talent.abbreviation, other = %bonus.talent, "dropping synergy bonus on unknown talent");
                    None
                }
            })
            .collect();
        linked.insert(talent);
    }
    linked
}

fn build_class(
    id: ClassId,
    entry: ClassEntry,
    catalog: &TalentCatalog,
    patterns: &IndexMap<String, DistributionPattern>,
) -> ClassProgression {
    let mut vertical = IndexMap::new();
    for (abbr, pattern) in entry.vertical {
        let abbr = normalize_key(&abbr);
        if !catalog.contains(&abbr) {
            warn!(class = id, abbr = %abbr, "dropping vertical distribution for unknown talent");
            continue;
        }
        match patterns.get(&normalize_key(&pattern)) {
            Some(p) => {
                vertical.insert(abbr, p.clone());
            }
            None => {
                warn!(class = id, abbr = %abbr, pattern = %pattern, "dropping vertical distribution with unknown pattern");
            }
        }
    }

    let horizontal = entry
        .horizontal
        .into_iter()
        .map(|row| known_talents(row, catalog, "class", id))
        .collect();

    ClassProgression {
        starting_points: entry.starting_points,
        points_per_level: entry.points_per_level,
        mode: entry.auto_mode,
        vertical,
        horizontal,
    }
}

fn known_talents(
    table: IndexMap<String, i32>,
    catalog: &TalentCatalog,
    owner: &str,
    id: u32,
) -> IndexMap<String, i32> {
    table
        .into_iter()
        .filter_map(|(abbr, value)| {
            let abbr = normalize_key(&abbr);
            if catalog.contains(&abbr) {
                Some((abbr, value))
            } else {
                warn!(owner, id, abbr = %abbr, "dropping entry for unknown talent");
                None
            }
        })
        .collect()
}
