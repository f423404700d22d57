//! Rank and point distribution: initialization, level-up, class change and
//! player point allocation.
//!
//! Player-controlled actors earn points and spend them through
//! [`DistributionEngine::allocate`] / [`DistributionEngine::commit`].
//! Automatic actors earn no points; their class distribution feeds ranks
//! directly. Vertical patterns are summed over every level at
//! initialization while horizontal tables only contribute the current
//! level's row, so an automatic actor created at level 5 with a horizontal
//! table ends up with fewer ranks than one levelled from 1 to 5.

use tracing::{debug, info};

use crate::catalog::{MaxType, TalentDefinition};
use crate::progression::Rules;
use crate::state::{ActorState, ActorTalentRecord, Pending};
use crate::ClassId;

pub struct DistributionEngine<'a> {
    rules: &'a Rules,
}

impl<'a> DistributionEngine<'a> {
    pub fn new(rules: &'a Rules) -> Self {
        Self { rules }
    }

    pub fn max_ranks(&self, actor: &ActorState) -> i32 {
        self.rules.max_ranks(actor.level)
    }

    fn signature_ranks(&self, level: i32) -> i32 {
        match self.rules.settings.max_type {
            MaxType::Level => level + self.rules.settings.max_ranks,
            MaxType::Strict => level,
        }
    }

    fn is_auto(&self, actor: &ActorState) -> bool {
        !self.rules.is_player_controlled(actor.actor_id)
    }

    /// Rebuilds every talent record and the point pool from scratch.
    pub fn initialize(&self, actor: &mut ActorState) {
        let auto = self.is_auto(actor);
        let class = self.rules.classes.get(&actor.class_id);

        actor.talents.clear();
        for talent in self.rules.catalog.iter() {
            let mut ranks = if talent.is_signature(actor.class_id) {
                self.signature_ranks(actor.level)
            } else {
                talent.starting_ranks
            };
            if auto {
                ranks += class
                    .map(|c| c.initial_ranks(&talent.abbreviation, actor.level))
                    .unwrap_or(0);
            }
            actor.talents.insert(
                talent.abbreviation.clone(),
                record_for(talent, actor.class_id, ranks.max(0)),
            );
        }

        let points = if auto {
            0
        } else {
            class.map(|c| c.starting_points).unwrap_or(0)
                + self
                    .rules
                    .actor_override(actor.actor_id)
                    .map(|o| o.starting_bonus)
                    .unwrap_or(0)
                + self
                    .rules
                    .race(actor.race_id)
                    .map(|r| r.starting_bonus)
                    .unwrap_or(0)
        };
        actor.set_points(points);

        debug!(
            actor = actor.actor_id,
            class = actor.class_id,
            level = actor.level,
            auto,
            points = actor.talent_points,
            "[DIST] initialized"
        );
    }

    /// Advances one level and applies that level's points and ranks.
    pub fn level_up(&self, actor: &mut ActorState) {
        actor.level += 1;
        let level = actor.level;
        let auto = self.is_auto(actor);
        let class = self.rules.classes.get(&actor.class_id);

        if !auto {
            let gained = class.map(|c| c.points_per_level).unwrap_or(0)
                + self
                    .rules
                    .actor_override(actor.actor_id)
                    .map(|o| o.point_bonus)
                    .unwrap_or(0)
                + self
                    .rules
                    .race(actor.race_id)
                    .map(|r| r.point_bonus)
                    .unwrap_or(0);
            actor.set_points(actor.talent_points + gained);
        }

        for talent in self.rules.catalog.iter() {
            let mut delta = 0;
            if talent.is_signature(actor.class_id) {
                delta += 1;
            }
            if auto {
                delta += class
                    .map(|c| c.level_delta(&talent.abbreviation, level))
                    .unwrap_or(0);
            }
            if delta != 0 {
                if let Some(record) = actor.record_mut(&talent.abbreviation) {
                    record.ranks = (record.ranks + delta).max(0);
                }
            }
        }

        debug!(
            actor = actor.actor_id,
            level,
            auto,
            points = actor.talent_points,
            "[DIST] level up"
        );
    }

    /// Switches class. Starts over when the reset policy is on or the actor
    /// is still at its initial level; otherwise keeps ranks and points.
    pub fn change_class(&self, actor: &mut ActorState, class: ClassId) {
        actor.class_id = class;
        if self.rules.settings.reset_on_class_change || actor.level <= actor.initial_level {
            info!(
                actor = actor.actor_id,
                class,
                level = actor.level,
                "[DIST] class change resets talents"
            );
            self.initialize(actor);
            return;
        }

        self.refresh_flags(actor);
        if !self.is_auto(actor) {
            return;
        }
        let Some(progression) = self.rules.classes.get(&class) else {
            return;
        };
        for level in (actor.initial_level + 1)..=actor.level {
            for record in actor.talents.values_mut() {
                let delta = progression.level_delta(&record.abbreviation, level);
                record.ranks = (record.ranks + delta).max(0);
            }
        }
    }

    /// Recomputes the cached proficient/signature/visible flags for the
    /// actor's current class.
    pub fn refresh_flags(&self, actor: &mut ActorState) {
        let class = actor.class_id;
        for record in actor.talents.values_mut() {
            if let Some(talent) = self.rules.catalog.get(&record.abbreviation) {
                record.proficient = talent.is_proficient(class);
                record.signature = talent.is_signature(class);
                record.visible = talent.is_visible_to(class);
            }
        }
    }

    /// Visible to the actor's class and every synergy requirement met,
    /// counting pending points.
    pub fn is_available(&self, actor: &ActorState, abbr: &str, pending: &Pending) -> bool {
        let Some(talent) = self.rules.catalog.get(abbr) else {
            return false;
        };
        talent.is_visible_to(actor.class_id)
            && talent.synergy_requirements.iter().all(|req| {
                actor.ranks(&req.talent).unwrap_or(0) + pending.get(&req.talent) >= req.ranks
            })
    }

    pub fn can_allocate(&self, actor: &ActorState, abbr: &str, pending: &Pending) -> bool {
        let Some(ranks) = actor.ranks(abbr) else {
            return false;
        };
        self.is_available(actor, abbr, pending)
            && ranks + pending.get(abbr) < self.max_ranks(actor)
            && actor.talent_points - pending.total() > 0
    }

    /// Adds one pending point. Rejections are expected and return false.
    pub fn allocate(&self, actor: &ActorState, abbr: &str, pending: &mut Pending) -> bool {
        if !self.can_allocate(actor, abbr, pending) {
            return false;
        }
        pending.add(abbr);
        true
    }

    pub fn release(&self, abbr: &str, pending: &mut Pending) -> bool {
        pending.remove(abbr)
    }

    /// Moves pending points into ranks and pays for them from the pool.
    ///
    /// Rejected, leaving `pending` untouched, when the pool no longer covers
    /// the allocation.
    pub fn commit(&self, actor: &mut ActorState, pending: &mut Pending) -> bool {
        if pending.total() > actor.talent_points {
            debug!(
                actor = actor.actor_id,
                pending = pending.total(),
                points = actor.talent_points,
                "[DIST] allocation exceeds pool"
            );
            return false;
        }
        let mut spent = 0;
        for (abbr, points) in pending.iter() {
            if let Some(record) = actor.record_mut(abbr) {
                record.ranks = record.ranks.saturating_add(points);
                spent += points;
            }
        }
        actor.set_points(actor.talent_points - spent);
        pending.clear();
        debug!(actor = actor.actor_id, spent, "[DIST] allocation committed");
        true
    }
}

fn record_for(talent: &TalentDefinition, class: ClassId, ranks: i32) -> ActorTalentRecord {
    ActorTalentRecord {
        abbreviation: talent.abbreviation.clone(),
        ranks,
        proficient: talent.is_proficient(class),
        signature: talent.is_signature(class),
        visible: talent.is_visible_to(class),
    }
}
