use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::api::PartySetup;
use crate::progression::Rules;

pub fn builtin_rules() -> HashMap<&'static str, &'static str> {
    HashMap::from([(
        "d20_skills",
        include_str!("../content/rules/d20_skills.yaml"),
    )])
}

pub fn builtin_parties() -> HashMap<&'static str, &'static str> {
    HashMap::from([(
        "sample_party",
        include_str!("../content/party/sample_party.yaml"),
    )])
}

pub fn load_builtin_rules(id: &str) -> Result<Rules> {
    let text = builtin_rules()
        .get(id)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("unknown builtin rules '{}'", id))?;
    Rules::from_yaml_str(text).with_context(|| format!("failed to load builtin rules: {}", id))
}

pub fn load_builtin_party(id: &str) -> Result<PartySetup> {
    let text = builtin_parties()
        .get(id)
        .copied()
        .ok_or_else(|| anyhow::anyhow!("unknown builtin party '{}'", id))?;
    PartySetup::from_yaml_str(text).with_context(|| format!("failed to load builtin party: {}", id))
}
