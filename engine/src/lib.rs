use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod api;
pub mod catalog;
pub mod check;
pub mod command;
pub mod config;
pub mod content;
pub mod distribution;
pub mod error;
pub mod host;
pub mod memo;
pub mod progression;
pub mod requirements;
pub mod score;
pub mod state;

pub use api::{EntityRef, PartySetup, Snapshot, TalentRow, TalentSystem};
pub use catalog::{MaxType, TalentCatalog, TalentDefinition, VisibilityMode};
pub use check::{CheckKind, CheckOptions, CheckOutcome, EnemyCheckOptions, Envelope, ValueRef, ViewMode};
pub use error::{CheckError, CommandError, ConfigError};
pub use host::{BonusSource, Host, ItemStore, MemoryHost, NoBonuses, ResultSink, VariableStore};
pub use progression::Rules;
pub use state::{ActorState, ActorTalentRecord, Party, Pending};

pub type ActorId = u32;
pub type ClassId = u32;
pub type RaceId = u32;
pub type EnemyId = u32;
pub type ItemId = u32;
/// Result-store slot (a host variable id). Slot 0 means "no slot".
pub type SlotId = u32;

/// Returned by check entry points when the check could not be performed at all.
pub const UNRESOLVED_CHECK: i32 = -999;
pub const MAX_TALENT_POINTS: i32 = 100_000;
pub const MIN_TARGET: i32 = 1;
pub const MAX_TARGET: i32 = 9999;
/// Largest die and pool a check will roll; bigger requests are clamped.
pub const MAX_DIE_SIZE: i32 = 1000;
pub const MAX_DICE_COUNT: i32 = 100;

enum DiceSource {
    Seeded(ChaCha8Rng),
    Scripted { rolls: Vec<i32>, next: usize },
}

/// Source of every random draw the engine makes.
pub struct Dice {
    source: DiceSource,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: DiceSource::Seeded(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Replays `rolls` in order, cycling when exhausted. Each value is clamped
    /// into `1..=sides` of the die being rolled.
    pub fn from_scripted(rolls: Vec<i32>) -> Self {
        Self {
            source: DiceSource::Scripted { rolls, next: 0 },
        }
    }

    /// One die in `1..=sides`. A die with fewer than one side rolls 0.
    pub fn roll(&mut self, sides: i32) -> i32 {
        if sides < 1 {
            return 0;
        }
        match &mut self.source {
            DiceSource::Seeded(rng) => rng.gen_range(1..=sides),
            DiceSource::Scripted { rolls, next } => {
                if rolls.is_empty() {
                    return 1;
                }
                let value = rolls[*next % rolls.len()];
                *next += 1;
                value.clamp(1, sides)
            }
        }
    }

    /// Sum of `count` dice of `sides` each.
    pub fn roll_pool(&mut self, count: i32, sides: i32) -> i32 {
        (0..count.clamp(0, MAX_DICE_COUNT))
            .map(|_| self.roll(sides))
            .fold(0, i32::saturating_add)
    }
}
