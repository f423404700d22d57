//! Talent requirements carried by items: `TalentReq` to equip,
//! `TalentReqGet` to receive, `TalentReqGive` to use on someone.

use crate::catalog::normalize_key;
use crate::host::BonusSource;
use crate::progression::Rules;
use crate::score::ScoreResolver;
use crate::state::{Party, Pending};
use crate::ActorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    Ranks,
    Score,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TalentRequirement {
    pub abbreviation: String,
    pub kind: RequirementKind,
    pub required: i32,
}

impl TalentRequirement {
    /// Parses `abbr rank|ranks|score N`. Any word other than rank/ranks
    /// means score. Returns None when fewer than three tokens are present
    /// or N is not a number.
    pub fn parse(note: &str) -> Option<Self> {
        let mut parts = note.split_whitespace();
        let abbreviation = normalize_key(parts.next()?);
        let kind = match parts.next()?.to_lowercase().as_str() {
            "rank" | "ranks" => RequirementKind::Ranks,
            _ => RequirementKind::Score,
        };
        let required = parts.next()?.parse::<i32>().ok()?;
        Some(Self {
            abbreviation,
            kind,
            required,
        })
    }
}

pub struct RequirementGate<'a, B: BonusSource + ?Sized> {
    rules: &'a Rules,
    party: &'a Party,
    bonuses: &'a B,
}

impl<'a, B: BonusSource + ?Sized> RequirementGate<'a, B> {
    pub fn new(rules: &'a Rules, party: &'a Party, bonuses: &'a B) -> Self {
        Self {
            rules,
            party,
            bonuses,
        }
    }

    /// Unknown actors never meet a requirement; an unknown talent counts
    /// as -1 ranks.
    pub fn meets(&self, actor: ActorId, req: &TalentRequirement) -> bool {
        let Some(state) = self.party.actor(actor) else {
            return false;
        };
        let value = match req.kind {
            RequirementKind::Ranks => state.ranks(&req.abbreviation).unwrap_or(-1),
            RequirementKind::Score => ScoreResolver::new(self.rules, self.bonuses).score(
                state,
                &req.abbreviation,
                &Pending::default(),
            ),
        };
        value >= req.required
    }

    /// `TalentReq`: may `actor` equip an item with this note.
    pub fn can_equip(&self, actor: ActorId, note: &str) -> bool {
        match TalentRequirement::parse(note) {
            Some(req) => self.meets(actor, &req),
            None => true,
        }
    }

    /// `TalentReqGet`: every known target must pass.
    pub fn can_receive(&self, targets: &[ActorId], note: &str) -> bool {
        let Some(req) = TalentRequirement::parse(note) else {
            return true;
        };
        targets
            .iter()
            .filter(|id| self.party.actor(**id).is_some())
            .all(|id| self.meets(*id, &req))
    }

    /// `TalentReqGive`: may `actor` use an item with this note on others.
    pub fn can_give(&self, actor: ActorId, note: &str) -> bool {
        self.can_equip(actor, note)
    }
}
