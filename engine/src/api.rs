//! `TalentSystem`: the facade hosts and scripts talk to.
//!
//! Query methods follow the lookup-miss convention: unknown actors or
//! talents produce a sentinel (`-1` for ranks and points, `0` for scores,
//! [`UNRESOLVED_CHECK`] for checks) and rejected changes return `false`.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::TalentCatalog;
use crate::check::{CheckEngine, CheckOptions, CheckOutcome, EnemyCheckOptions, result_slot};
use crate::distribution::DistributionEngine;
use crate::error::CheckError;
use crate::host::{BonusSource, HeldItem, Host, MemoryHost, ResultSink};
use crate::memo::CheckMemo;
use crate::progression::Rules;
use crate::requirements::RequirementGate;
use crate::score::ScoreResolver;
use crate::state::{ActorState, ActorTalentRecord, Party, Pending};
use crate::{ActorId, ClassId, Dice, EnemyId, ItemId, RaceId, UNRESOLVED_CHECK};

/// Anything that can own a talent score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityRef {
    Actor(ActorId),
    Enemy(EnemyId),
}

/// One line of an actor's talent sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TalentRow {
    pub abbreviation: String,
    pub name: String,
    pub ranks: i32,
    pub bonus: i32,
    pub score: i32,
    pub proficient: bool,
    pub signature: bool,
    pub visible: bool,
    /// Visible and every synergy requirement met.
    pub available: bool,
}

/// Persistable runtime state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub party: Party,
    pub memo: CheckMemo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<TalentCatalog>,
}

fn default_level() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSetup {
    pub id: ActorId,
    pub class: ClassId,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default)]
    pub race: Option<RaceId>,
    /// Level the actor joined at; defaults to `level`.
    #[serde(default)]
    pub initial_level: Option<i32>,
    #[serde(default = "default_true")]
    pub in_party: bool,
    /// `TalentBonus` annotations of equipped gear.
    #[serde(default)]
    pub equipment: Vec<String>,
    #[serde(default)]
    pub states: Vec<String>,
    #[serde(default)]
    pub passive_states: Vec<String>,
}

/// Starting party plus the shared bag, as read from a party file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartySetup {
    pub members: Vec<MemberSetup>,
    pub items: IndexMap<ItemId, HeldItem>,
}

impl PartySetup {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("failed to parse party YAML")
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("failed to parse party JSON")
    }
}

/// Load a party setup from a `.yaml`/`.yml` or `.json` file.
pub fn load_party(path: &Path) -> Result<PartySetup> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read party file: {}", path.display()))?;
    parse_party(path, &text)
}

pub fn parse_party(path: &Path, text: &str) -> Result<PartySetup> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let setup = if is_json {
        PartySetup::from_json_str(text)
    } else {
        PartySetup::from_yaml_str(text)
    };
    setup.with_context(|| format!("failed to load party: {}", path.display()))
}

pub struct TalentSystem {
    rules: Rules,
    party: Party,
    memo: CheckMemo,
    dice: Dice,
    pending: IndexMap<ActorId, Pending>,
}

impl TalentSystem {
    pub fn new(rules: Rules, dice: Dice) -> Self {
        Self {
            rules,
            party: Party::new(),
            memo: CheckMemo::new(),
            dice,
            pending: IndexMap::new(),
        }
    }

    /// Builds a system and an in-memory host from a party setup.
    pub fn from_setup(rules: Rules, setup: &PartySetup, dice: Dice) -> (Self, MemoryHost) {
        let mut system = Self::new(rules, dice);
        let mut host = MemoryHost::new();
        for member in &setup.members {
            let mut actor = ActorState::new(member.id, member.class, member.level.max(1));
            if let Some(race) = member.race {
                actor = actor.with_race(race);
            }
            if let Some(initial) = member.initial_level {
                actor = actor.with_initial_level(initial);
            }
            system.add_actor(actor, member.in_party);
            for note in &member.equipment {
                host.equip(member.id, note);
            }
            for note in &member.states {
                host.add_state(member.id, note);
            }
            for note in &member.passive_states {
                host.add_passive_state(member.id, note);
            }
        }
        for (item, held) in &setup.items {
            host.give_item(*item, held.count, &held.note);
        }
        (system, host)
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn memo(&self) -> &CheckMemo {
        &self.memo
    }

    fn distribution(&self) -> DistributionEngine<'_> {
        DistributionEngine::new(&self.rules)
    }

    /// Initializes `actor`'s talents and points and registers it.
    pub fn add_actor(&mut self, mut actor: ActorState, in_party: bool) {
        let id = actor.actor_id;
        DistributionEngine::new(&self.rules).initialize(&mut actor);
        self.party.insert(actor);
        self.pending.shift_remove(&id);
        if in_party {
            self.party.add_member(id);
        }
    }

    pub fn add_member(&mut self, actor: ActorId) -> bool {
        self.party.add_member(actor)
    }

    pub fn remove_member(&mut self, actor: ActorId) -> bool {
        self.party.remove_member(actor)
    }

    pub fn level_up(&mut self, actor: ActorId) -> bool {
        let Some(state) = self.party.actor_mut(actor) else {
            return false;
        };
        DistributionEngine::new(&self.rules).level_up(state);
        true
    }

    pub fn change_class(&mut self, actor: ActorId, class: ClassId) -> bool {
        let Some(state) = self.party.actor_mut(actor) else {
            return false;
        };
        DistributionEngine::new(&self.rules).change_class(state, class);
        self.pending.shift_remove(&actor);
        true
    }

    /// Rank cap for the actor at its current level; 0 if unknown.
    pub fn max_ranks(&self, actor: ActorId) -> i32 {
        self.party
            .actor(actor)
            .map(|a| self.rules.max_ranks(a.level))
            .unwrap_or(0)
    }

    pub fn get_score<B: BonusSource + ?Sized>(&self, bonuses: &B, actor: ActorId, abbr: &str) -> i32 {
        self.party
            .actor(actor)
            .map(|a| ScoreResolver::new(&self.rules, bonuses).score(a, abbr, &Pending::default()))
            .unwrap_or(0)
    }

    pub fn talent_score<B: BonusSource + ?Sized>(
        &self,
        bonuses: &B,
        entity: EntityRef,
        abbr: &str,
    ) -> i32 {
        match entity {
            EntityRef::Actor(id) => self.get_score(bonuses, id, abbr),
            EntityRef::Enemy(id) => self.enemy_score(id, abbr),
        }
    }

    /// Configured enemy score; 0 when the enemy or talent is unknown.
    pub fn enemy_score(&self, enemy: EnemyId, abbr: &str) -> i32 {
        self.rules.enemy_score(enemy, abbr).unwrap_or(0)
    }

    pub fn get_ranks(&self, actor: ActorId, abbr: &str) -> i32 {
        self.party
            .actor(actor)
            .and_then(|a| a.ranks(abbr))
            .unwrap_or(-1)
    }

    /// Overwrites ranks, clamped into `0..=max_ranks`.
    pub fn set_ranks(&mut self, actor: ActorId, abbr: &str, ranks: i32) -> bool {
        if ranks < 0 {
            return false;
        }
        let max = self.max_ranks(actor);
        self.with_record(actor, abbr, |r| r.ranks = ranks.clamp(0, max))
    }

    pub fn add_ranks(&mut self, actor: ActorId, abbr: &str, delta: i32) -> bool {
        if delta <= 0 {
            return false;
        }
        self.with_record(actor, abbr, |r| r.ranks = r.ranks.saturating_add(delta))
    }

    pub fn remove_ranks(&mut self, actor: ActorId, abbr: &str, delta: i32) -> bool {
        if delta <= 0 {
            return false;
        }
        self.with_record(actor, abbr, |r| r.ranks = (r.ranks - delta).max(0))
    }

    fn with_record(
        &mut self,
        actor: ActorId,
        abbr: &str,
        f: impl FnOnce(&mut ActorTalentRecord),
    ) -> bool {
        match self
            .party
            .actor_mut(actor)
            .and_then(|a| a.record_mut(abbr))
        {
            Some(record) => {
                f(record);
                true
            }
            None => false,
        }
    }

    pub fn get_points(&self, actor: ActorId) -> i32 {
        self.party
            .actor(actor)
            .map(|a| a.talent_points)
            .unwrap_or(-1)
    }

    pub fn set_points(&mut self, actor: ActorId, points: i32) -> bool {
        self.with_actor(actor, |a| a.set_points(points))
    }

    pub fn add_points(&mut self, actor: ActorId, delta: i32) -> bool {
        if delta <= 0 {
            return false;
        }
        self.with_actor(actor, |a| a.set_points(a.talent_points.saturating_add(delta)))
    }

    pub fn remove_points(&mut self, actor: ActorId, delta: i32) -> bool {
        if delta <= 0 {
            return false;
        }
        self.with_actor(actor, |a| a.set_points(a.talent_points - delta))
    }

    fn with_actor(&mut self, actor: ActorId, f: impl FnOnce(&mut ActorState)) -> bool {
        match self.party.actor_mut(actor) {
            Some(state) => {
                f(state);
                true
            }
            None => false,
        }
    }

    /// Unspent points plus every rank held; -1 if unknown.
    pub fn total_points(&self, actor: ActorId) -> i32 {
        self.party
            .actor(actor)
            .map(ActorState::total_points)
            .unwrap_or(-1)
    }

    /// Party member with the best score; 0 for an empty party.
    pub fn most_talented<B: BonusSource + ?Sized>(&self, bonuses: &B, abbr: &str) -> ActorId {
        ScoreResolver::new(&self.rules, bonuses)
            .most_talented(&self.party, abbr)
            .unwrap_or(0)
    }

    /// Resolves a check and writes the result to every bound slot.
    pub fn check<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        opts: &CheckOptions,
    ) -> Result<CheckOutcome, CheckError> {
        let outcome = CheckEngine::new(
            &self.rules,
            &self.party,
            &mut self.memo,
            &mut self.dice,
            host,
        )
        .resolve(opts)?;
        for slot in &outcome.slots {
            host.set_value(*slot, outcome.result);
        }
        Ok(outcome)
    }

    /// Like [`TalentSystem::check`] but returns [`UNRESOLVED_CHECK`] instead of an error.
    pub fn resolve_check<H: Host + ?Sized>(&mut self, host: &mut H, opts: &CheckOptions) -> i32 {
        match self.check(host, opts) {
            Ok(outcome) => outcome.result,
            Err(err) => {
                warn!(abbr = %opts.abbreviation, actor = opts.actor_id, "[CHECK] unresolved: {err}");
                UNRESOLVED_CHECK
            }
        }
    }

    /// The player chose not to attempt the check: store the decline value.
    pub fn decline_check<S: ResultSink + ?Sized>(&self, sink: &mut S, opts: &CheckOptions) -> i32 {
        let value = self.rules.check.decline_value;
        if let Some(slot) = result_slot(opts.var, self.rules.check.last_check_var) {
            sink.set_value(slot, value);
        }
        value
    }

    pub fn enemy_target_number<S: ResultSink + ?Sized>(
        &self,
        sink: &mut S,
        opts: &EnemyCheckOptions,
    ) -> i32 {
        match crate::check::enemy_target_number(&self.rules, opts) {
            Ok(tn) => {
                if let Some(slot) = result_slot(opts.var, self.rules.check.target_number_var) {
                    sink.set_value(slot, tn);
                }
                tn
            }
            Err(err) => {
                warn!(enemy = opts.enemy_id, abbr = %opts.abbreviation, "[ENEMY] unresolved: {err}");
                UNRESOLVED_CHECK
            }
        }
    }

    pub fn pending(&self, actor: ActorId) -> Option<&Pending> {
        self.pending.get(&actor)
    }

    /// Queues one point into `abbr`. False when the cap, pool, visibility
    /// or a synergy requirement forbids it.
    pub fn allocate(&mut self, actor: ActorId, abbr: &str) -> bool {
        let Some(state) = self.party.actor(actor) else {
            return false;
        };
        let pending = self.pending.entry(actor).or_default();
        DistributionEngine::new(&self.rules).allocate(state, abbr, pending)
    }

    pub fn release(&mut self, actor: ActorId, abbr: &str) -> bool {
        match self.pending.get_mut(&actor) {
            Some(pending) => DistributionEngine::new(&self.rules).release(abbr, pending),
            None => false,
        }
    }

    /// False when nothing is pending or the pool no longer covers it.
    pub fn commit_allocation(&mut self, actor: ActorId) -> bool {
        let (Some(state), Some(pending)) =
            (self.party.actor_mut(actor), self.pending.get_mut(&actor))
        else {
            return false;
        };
        if pending.is_empty() {
            return false;
        }
        DistributionEngine::new(&self.rules).commit(state, pending)
    }

    pub fn cancel_allocation(&mut self, actor: ActorId) {
        self.pending.shift_remove(&actor);
    }

    /// Score including this actor's uncommitted allocation.
    pub fn preview_score<B: BonusSource + ?Sized>(&self, bonuses: &B, actor: ActorId, abbr: &str) -> i32 {
        let Some(state) = self.party.actor(actor) else {
            return 0;
        };
        let none = Pending::default();
        let pending = self.pending.get(&actor).unwrap_or(&none);
        ScoreResolver::new(&self.rules, bonuses).score(state, abbr, pending)
    }

    pub fn talent_sheet<B: BonusSource + ?Sized>(&self, bonuses: &B, actor: ActorId) -> Vec<TalentRow> {
        let Some(state) = self.party.actor(actor) else {
            return Vec::new();
        };
        let none = Pending::default();
        let pending = self.pending.get(&actor).unwrap_or(&none);
        let resolver = ScoreResolver::new(&self.rules, bonuses);
        let dist = self.distribution();

        state
            .talents
            .values()
            .filter_map(|record| {
                let talent = self.rules.catalog.get(&record.abbreviation)?;
                let ranks = record.ranks.saturating_add(pending.get(&record.abbreviation));
                Some(TalentRow {
                    abbreviation: record.abbreviation.clone(),
                    name: talent.name.clone(),
                    ranks,
                    bonus: resolver.bonus(state, &record.abbreviation, pending),
                    score: resolver.score(state, &record.abbreviation, pending),
                    proficient: record.proficient,
                    signature: record.signature,
                    visible: record.visible,
                    available: dist.is_available(state, &record.abbreviation, pending),
                })
            })
            .collect()
    }

    /// Best score among the actor's talents, never below 0.
    pub fn max_score<B: BonusSource + ?Sized>(&self, bonuses: &B, actor: ActorId) -> i32 {
        self.talent_sheet(bonuses, actor)
            .iter()
            .map(|row| row.score)
            .fold(0, i32::max)
    }

    /// Widest gauge needed to draw every talent at its potential maximum.
    pub fn max_gauge<B: BonusSource + ?Sized>(&self, bonuses: &B, actor: ActorId) -> i32 {
        let max = self.max_ranks(actor);
        self.party
            .actor(actor)
            .map(|state| {
                let resolver = ScoreResolver::new(&self.rules, bonuses);
                let none = Pending::default();
                state
                    .talents
                    .values()
                    .map(|r| {
                        resolver
                            .score(state, &r.abbreviation, &none)
                            .saturating_add(max.saturating_sub(r.ranks))
                    })
                    .fold(0, i32::max)
            })
            .unwrap_or(0)
    }

    pub fn requirement_gate<'a, B: BonusSource + ?Sized>(
        &'a self,
        bonuses: &'a B,
    ) -> RequirementGate<'a, B> {
        RequirementGate::new(&self.rules, &self.party, bonuses)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            party: self.party.clone(),
            memo: self.memo.clone(),
            catalog: self
                .rules
                .settings
                .save_catalog
                .then(|| self.rules.catalog.clone()),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        self.party = snapshot.party;
        self.memo = snapshot.memo;
        if let Some(catalog) = snapshot.catalog {
            self.rules.catalog = catalog;
        }
        self.pending.clear();
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(&self.snapshot())
            .context("failed to serialize snapshot")?;
        fs::write(path, text)
            .with_context(|| format!("failed to write snapshot: {}", path.display()))
    }

    pub fn load_snapshot(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot: {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse snapshot: {}", path.display()))?;
        self.restore(snapshot);
        Ok(())
    }

    /// Whether `abbr` names a talent in the current catalog.
    pub fn knows_talent(&self, abbr: &str) -> bool {
        self.rules.catalog.contains(abbr)
    }
}
