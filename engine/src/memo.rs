//! Remembered check results, valid until the actor changes level.

use serde::{Deserialize, Serialize};

use crate::state::Party;
use crate::ActorId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RememberedCheck {
    pub key: String,
    pub actor_id: ActorId,
    pub level: i32,
    pub result: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckMemo {
    entries: Vec<RememberedCheck>,
}

impl CheckMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop entries whose actor is gone or has changed level since.
    pub fn purge_stale(&mut self, party: &Party) {
        self.entries
            .retain(|e| party.actor(e.actor_id).is_some_and(|a| a.level == e.level));
    }

    pub fn lookup(&self, key: &str, actor: ActorId, level: i32) -> Option<i32> {
        self.entries
            .iter()
            .find(|e| e.key == key && e.actor_id == actor && e.level == level)
            .map(|e| e.result)
    }

    pub fn remember(&mut self, key: &str, actor: ActorId, level: i32, result: i32) {
        self.entries.push(RememberedCheck {
            key: key.to_string(),
            actor_id: actor,
            level,
            result,
        });
    }

    pub fn entries(&self) -> &[RememberedCheck] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
