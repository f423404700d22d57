//! Talent score resolution.
//!
//! Bonus sources are applied in a fixed order: ranks, proficiency, actor
//! override, race, equipment, party items, states, passive states, synergy.
//! Synergy reads a single `ranks + pending` snapshot of the other talents;
//! it never recurses into their scores.

use crate::catalog::normalize_key;
use crate::host::BonusSource;
use crate::progression::Rules;
use crate::state::{ActorState, Party, Pending};
use crate::ActorId;

pub struct ScoreResolver<'a, B: BonusSource + ?Sized> {
    rules: &'a Rules,
    bonuses: &'a B,
}

impl<'a, B: BonusSource + ?Sized> ScoreResolver<'a, B> {
    pub fn new(rules: &'a Rules, bonuses: &'a B) -> Self {
        Self { rules, bonuses }
    }

    /// Score of `abbr` for `actor`, previewing `pending` allocations.
    ///
    /// Unknown talents score 0. An untrained talent that requires training
    /// scores exactly 0 with no bonuses. Otherwise the score may be negative.
    pub fn score(&self, actor: &ActorState, abbr: &str, pending: &Pending) -> i32 {
        let key = normalize_key(abbr);
        let Some(talent) = self.rules.catalog.get(&key) else {
            return 0;
        };
        let Some(record) = actor.record(&key) else {
            return 0;
        };

        let base = record.ranks.saturating_add(pending.get(&key));
        if talent.requires_training && base <= 0 {
            return 0;
        }

        let mut score = base;
        let mut add = |bonus: i32| score = score.saturating_add(bonus);
        if talent.is_proficient(actor.class_id) {
            add(self.rules.settings.proficiency_bonus);
        }
        if let Some(over) = self.rules.actor_override(actor.actor_id) {
            add(over.talent_bonus.get(&key).copied().unwrap_or(0));
        }
        if let Some(race) = self.rules.race(actor.race_id) {
            add(race.talent_bonus.get(&key).copied().unwrap_or(0));
        }
        add(self.bonuses.equipment_bonus(actor.actor_id, &key));
        add(self.bonuses.item_bonus(&key));
        add(self.bonuses.state_bonus(actor.actor_id, &key));
        add(self.bonuses.passive_state_bonus(actor.actor_id, &key));

        for synergy in &talent.synergy_bonuses {
            let other = actor
                .ranks(&synergy.talent)
                .unwrap_or(0)
                .saturating_add(pending.get(&synergy.talent));
            if other >= synergy.ranks {
                add(synergy.bonus);
            }
        }
        score
    }

    /// Everything on top of ranks (score minus ranks and pending).
    pub fn bonus(&self, actor: &ActorState, abbr: &str, pending: &Pending) -> i32 {
        let base = actor.ranks(abbr).unwrap_or(0).saturating_add(pending.get(abbr));
        if self.is_gated(actor, abbr, pending) {
            return 0;
        }
        self.score(actor, abbr, pending).saturating_sub(base)
    }

    /// True when the talent requires training and no rank is held or pending.
    pub fn is_gated(&self, actor: &ActorState, abbr: &str, pending: &Pending) -> bool {
        self.rules
            .catalog
            .get(abbr)
            .is_some_and(|t| t.requires_training)
            && actor.ranks(abbr).unwrap_or(0).saturating_add(pending.get(abbr)) <= 0
    }

    /// Party member with the strictly highest score; ties keep roster order.
    pub fn most_talented(&self, party: &Party, abbr: &str) -> Option<ActorId> {
        let none = Pending::default();
        let mut best: Option<(ActorId, i32)> = None;
        for actor in party.member_states() {
            let score = self.score(actor, abbr, &none);
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((actor.actor_id, score));
            }
        }
        best.map(|(id, _)| id)
    }
}
