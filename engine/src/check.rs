//! Talent checks: MAX, RND and ROLL resolution against a target number.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{CheckDefaults, normalize_key};
use crate::error::CheckError;
use crate::host::Host;
use crate::memo::CheckMemo;
use crate::progression::Rules;
use crate::score::ScoreResolver;
use crate::state::{Party, Pending};
use crate::{
    ActorId, Dice, EnemyId, MAX_DICE_COUNT, MAX_DIE_SIZE, MAX_TARGET, MIN_TARGET, SlotId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// Score against target, no randomness.
    #[serde(alias = "MAX")]
    Max,
    /// Uniform draw in `1..=score`.
    #[serde(alias = "RND")]
    Rnd,
    /// Dice pool plus score.
    #[default]
    #[serde(alias = "ROLL")]
    Roll,
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max" => Ok(CheckKind::Max),
            "rnd" => Ok(CheckKind::Rnd),
            "roll" => Ok(CheckKind::Roll),
            other => Err(format!("unknown check type: {other}")),
        }
    }
}

/// How the host presents a check. Never changes the numeric result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[serde(alias = "NONE")]
    None,
    #[serde(alias = "SHOW")]
    Show,
    #[default]
    #[serde(alias = "ASK")]
    Ask,
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(ViewMode::None),
            "show" => Ok(ViewMode::Show),
            "ask" => Ok(ViewMode::Ask),
            other => Err(format!("unknown view mode: {other}")),
        }
    }
}

/// A literal number or the name of an entry in a named-value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValueRef {
    Literal(i32),
    Named(String),
}

impl ValueRef {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        match text.parse::<i32>() {
            Ok(v) => ValueRef::Literal(v),
            Err(_) => ValueRef::Named(text.to_string()),
        }
    }
}

impl From<i32> for ValueRef {
    fn from(v: i32) -> Self {
        ValueRef::Literal(v)
    }
}

impl From<&str> for ValueRef {
    fn from(s: &str) -> Self {
        ValueRef::parse(s)
    }
}

/// Split a comma-joined modifier list (`Dark,Light,2`).
pub fn parse_modifier_list(text: &str) -> Vec<ValueRef> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ValueRef::parse)
        .collect()
}

/// Die size written as `20` or `d20`.
pub fn parse_die(text: &str) -> Option<i32> {
    text.trim()
        .trim_start_matches(['d', 'D'])
        .parse::<i32>()
        .ok()
}

/// floor((die / 2 + 0.5) * count), the average pool result.
pub fn average_roll(die: i32, count: i32) -> i32 {
    let avg = (i64::from(die) + 1) * i64::from(count) / 2;
    avg.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Die size and count with defaults applied, bounded to what a check rolls.
fn dice_spec(die: Option<i32>, count: Option<i32>, defaults: &CheckDefaults) -> (i32, i32) {
    let die = die.filter(|d| *d > 0).unwrap_or(defaults.die_type);
    let count = count.filter(|c| *c > 0).unwrap_or(defaults.die_count);
    (die.clamp(1, MAX_DIE_SIZE), count.clamp(1, MAX_DICE_COUNT))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckOptions {
    pub kind: Option<CheckKind>,
    /// 0 picks the party member with the best score.
    pub actor_id: ActorId,
    pub abbreviation: String,
    pub target: Option<ValueRef>,
    pub modifiers: Vec<ValueRef>,
    pub die: Option<i32>,
    pub dice_count: Option<i32>,
    /// Memo key; repeats return the first result until the actor levels.
    pub remember: Option<String>,
    pub view: Option<ViewMode>,
    pub var: Option<SlotId>,
}

impl CheckOptions {
    pub fn new(abbr: &str) -> Self {
        Self {
            abbreviation: abbr.to_string(),
            ..Self::default()
        }
    }

    pub fn kind(mut self, kind: CheckKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn actor(mut self, actor: ActorId) -> Self {
        self.actor_id = actor;
        self
    }

    pub fn target(mut self, target: impl Into<ValueRef>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn modifier(mut self, modifier: impl Into<ValueRef>) -> Self {
        self.modifiers.push(modifier.into());
        self
    }

    pub fn dice(mut self, count: i32, die: i32) -> Self {
        self.dice_count = Some(count);
        self.die = Some(die);
        self
    }

    pub fn remember(mut self, key: &str) -> Self {
        self.remember = Some(key.to_string());
        self
    }

    pub fn view(mut self, view: ViewMode) -> Self {
        self.view = Some(view);
        self
    }

    pub fn var(mut self, slot: SlotId) -> Self {
        self.var = Some(slot);
        self
    }
}

/// Lowest and highest value a check could produce, for difficulty bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub min: i32,
    pub max: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// `raw - target`: 0 met exactly, negative failed by, positive exceeded by.
    pub result: i32,
    pub kind: CheckKind,
    pub actor_id: ActorId,
    pub abbreviation: String,
    /// Target after modifiers, clamping and normalization.
    pub target: i32,
    pub score: i32,
    /// Value compared with the target: score (MAX), draw (RND), dice + score (ROLL).
    pub raw: i32,
    pub remembered: bool,
    pub gated: bool,
    pub view: ViewMode,
    pub envelope: Option<Envelope>,
    /// Result-store slots the outcome must be written to.
    pub slots: Vec<SlotId>,
}

impl CheckOutcome {
    pub fn passed(&self) -> bool {
        self.result >= 0
    }
}

pub fn resolve_target(rules: &Rules, target: Option<&ValueRef>) -> i32 {
    match target {
        None => 0,
        Some(ValueRef::Literal(v)) => *v,
        Some(ValueRef::Named(name)) => rules.named_checks.get(name).unwrap_or(0),
    }
}

pub fn resolve_modifiers(rules: &Rules, modifiers: &[ValueRef]) -> i32 {
    modifiers
        .iter()
        .map(|m| match m {
            ValueRef::Literal(v) => *v,
            ValueRef::Named(name) => rules.named_modifiers.get(name).unwrap_or(0),
        })
        .fold(0, i32::saturating_add)
}

/// Explicit slot if set, else the configured default; 0 means none.
pub fn result_slot(explicit: Option<SlotId>, default: SlotId) -> Option<SlotId> {
    explicit
        .filter(|s| *s > 0)
        .or(Some(default))
        .filter(|s| *s > 0)
}

pub struct CheckEngine<'a, H: Host + ?Sized> {
    rules: &'a Rules,
    party: &'a Party,
    memo: &'a mut CheckMemo,
    dice: &'a mut Dice,
    host: &'a mut H,
}

impl<'a, H: Host + ?Sized> CheckEngine<'a, H> {
    pub fn new(
        rules: &'a Rules,
        party: &'a Party,
        memo: &'a mut CheckMemo,
        dice: &'a mut Dice,
        host: &'a mut H,
    ) -> Self {
        Self {
            rules,
            party,
            memo,
            dice,
            host,
        }
    }

    pub fn resolve(&mut self, opts: &CheckOptions) -> Result<CheckOutcome, CheckError> {
        let rules = self.rules;
        let party = self.party;
        let defaults = &rules.check;

        let abbr = normalize_key(&opts.abbreviation);
        if abbr.is_empty() {
            return Err(CheckError::MissingAbbreviation);
        }
        let kind = opts.kind.unwrap_or(defaults.roll_type);
        let view = opts.view.unwrap_or(defaults.view_type);
        let (die, count) = dice_spec(opts.die, opts.dice_count, defaults);

        let mut target = resolve_target(rules, opts.target.as_ref())
            .saturating_add(resolve_modifiers(rules, &opts.modifiers))
            .clamp(MIN_TARGET, MAX_TARGET);

        let actor_id = if opts.actor_id == 0 {
            ScoreResolver::new(rules, &*self.host)
                .most_talented(party, &abbr)
                .ok_or(CheckError::EmptyParty)?
        } else {
            opts.actor_id
        };
        let actor = party
            .actor(actor_id)
            .ok_or(CheckError::UnknownActor(actor_id))?;

        let required = rules
            .catalog
            .get(&abbr)
            .and_then(|t| t.required_item.clone());
        if let Some(req) = &required {
            if self.host.item_count(req.item) < req.count {
                return Err(CheckError::MissingItem {
                    abbreviation: abbr,
                    item: req.item,
                    count: req.count,
                });
            }
        }

        let none = Pending::default();
        let resolver = ScoreResolver::new(rules, &*self.host);
        let score = resolver.score(actor, &abbr, &none);
        let gated = resolver.is_gated(actor, &abbr, &none);

        let memo_key = opts
            .remember
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        let level = actor.level;
        let mut remembered = false;

        let raw = match kind {
            CheckKind::Max => score,
            CheckKind::Rnd => {
                let mut draw = 0;
                if !gated {
                    (draw, remembered) = self.draw(memo_key, actor_id, level, |dice| {
                        if score >= 1 { dice.roll(score) } else { 0 }
                    });
                }
                if defaults.normalize_target {
                    target /= 2;
                }
                draw
            }
            CheckKind::Roll => {
                let mut total = 0;
                if !gated {
                    (total, remembered) = self.draw(memo_key, actor_id, level, |dice| {
                        dice.roll_pool(count, die).saturating_add(score)
                    });
                }
                if defaults.normalize_target {
                    target = target.saturating_add(average_roll(die, count));
                }
                total
            }
        };
        let result = raw.saturating_sub(target);

        let envelope = (view != ViewMode::None).then(|| match kind {
            CheckKind::Max | CheckKind::Rnd => Envelope { min: 1, max: score },
            CheckKind::Roll if gated => Envelope {
                min: -target,
                max: -target,
            },
            CheckKind::Roll => Envelope {
                min: count.saturating_add(score),
                max: count.saturating_mul(die).saturating_add(score),
            },
        });

        let mut slots = Vec::new();
        if let Some(slot) = result_slot(opts.var, defaults.last_check_var) {
            slots.push(slot);
        }
        if let Some(slot) = rules.actor_check_variable(actor_id) {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }

        if let Some(req) = required.filter(|r| r.consume) {
            self.host.consume_item(req.item, req.count);
        }

        debug!(
            actor = actor_id,
            abbr = %abbr,
            ?kind,
            score,
            raw,
            target,
            result,
            remembered,
            gated,
            "[CHECK] resolved"
        );

        Ok(CheckOutcome {
            result,
            kind,
            actor_id,
            abbreviation: abbr,
            target,
            score,
            raw,
            remembered,
            gated,
            view,
            envelope,
            slots,
        })
    }

    /// Fresh random value, or the remembered one when `key` was seen at this level.
    fn draw(
        &mut self,
        key: Option<&str>,
        actor: ActorId,
        level: i32,
        fresh: impl FnOnce(&mut Dice) -> i32,
    ) -> (i32, bool) {
        let Some(key) = key else {
            return (fresh(&mut *self.dice), false);
        };
        self.memo.purge_stale(self.party);
        if let Some(value) = self.memo.lookup(key, actor, level) {
            return (value, true);
        }
        let value = fresh(&mut *self.dice);
        self.memo.remember(key, actor, level, value);
        (value, false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyCheckOptions {
    pub kind: Option<CheckKind>,
    pub enemy_id: EnemyId,
    pub abbreviation: String,
    pub die: Option<i32>,
    pub dice_count: Option<i32>,
    pub var: Option<SlotId>,
}

/// Target number an actor must reach to beat an enemy's talent on average.
pub fn enemy_target_number(rules: &Rules, opts: &EnemyCheckOptions) -> Result<i32, CheckError> {
    let defaults = &rules.check;
    let abbr = normalize_key(&opts.abbreviation);
    if abbr.is_empty() {
        return Err(CheckError::MissingAbbreviation);
    }
    let score = rules
        .enemy_score(opts.enemy_id, &abbr)
        .ok_or(CheckError::UnknownEnemy(opts.enemy_id))?;
    if defaults.normalize_target {
        return Ok(score);
    }
    let (die, count) = dice_spec(opts.die, opts.dice_count, defaults);
    Ok(match opts.kind.unwrap_or(defaults.roll_type) {
        CheckKind::Max => score,
        CheckKind::Rnd => score / 2,
        CheckKind::Roll => score.saturating_add(average_roll(die, count)),
    })
}
