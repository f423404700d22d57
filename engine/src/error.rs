//! Error types for the talent engine.
//!
//! Runtime queries never fail loudly: lookups return sentinels and rejected
//! rank/point changes return `false`. The enums here cover the cases where a
//! caller wants to know *why* something was refused.

use thiserror::Error;

use crate::{ActorId, EnemyId, ItemId};

/// Rules content that cannot be skipped over with a warning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("invalid check defaults: {0}")]
    InvalidCheckDefaults(String),

    #[error("unsupported rules format: {0}")]
    UnsupportedFormat(String),
}

/// Why a check could not be performed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("check has no talent abbreviation")]
    MissingAbbreviation,

    #[error("actor {0} not found")]
    UnknownActor(ActorId),

    #[error("enemy {0} not found")]
    UnknownEnemy(EnemyId),

    #[error("no party member can attempt the check")]
    EmptyParty,

    #[error("check `{abbreviation}` needs {count}x item {item}")]
    MissingItem {
        abbreviation: String,
        item: ItemId,
        count: u32,
    },
}

/// Malformed command-surface input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command: {0}")]
    UnknownVerb(String),

    #[error("{verb}: missing argument `{name}`")]
    MissingArgument { verb: String, name: &'static str },

    #[error("{verb}: invalid value `{value}` for `{name}`")]
    InvalidArgument {
        verb: String,
        name: &'static str,
        value: String,
    },
}
