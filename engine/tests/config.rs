use std::path::Path;

use talent_engine::catalog::MaxType;
use talent_engine::check::{CheckKind, ViewMode};
use talent_engine::config::{load_rules, parse_rules};
use talent_engine::content::{builtin_rules, load_builtin_party, load_builtin_rules};
use talent_engine::progression::DistributionMode;
use talent_engine::{Rules, VisibilityMode};

#[test]
fn builtin_rules_load() {
    assert!(builtin_rules().contains_key("d20_skills"));
    let rules = load_builtin_rules("d20_skills").unwrap();
    assert_eq!(rules.catalog.len(), 11);
    assert_eq!(rules.named_checks.get(" HARD "), Some(15));
    assert_eq!(rules.named_modifiers.get("light"), Some(-3));
    assert_eq!(rules.classes[&4].mode, DistributionMode::Horizontal);
    assert_eq!(rules.check.decline_value, 9999);
    assert!(!rules.is_player_controlled(5));
    assert_eq!(rules.actor_check_variable(5), Some(10));
    assert_eq!(rules.enemy_score(1, "perc"), Some(12));
    assert_eq!(rules.enemy_score(1, "arca"), Some(0));
    assert_eq!(rules.enemy_score(9, "perc"), None);

    let party = load_builtin_party("sample_party").unwrap();
    assert_eq!(party.members.len(), 5);
    assert!(load_builtin_rules("missing").is_err());
}

#[test]
fn unknown_references_are_skipped() {
    let rules = Rules::from_yaml_str(
        r#"
talents:
  - { abbreviation: Lock, name: Lockpicking }
  - { abbreviation: lock, name: Duplicate }
  - { abbreviation: "", name: Nameless }
  - { abbreviation: "two words", name: Spaced }
  - abbreviation: disa
    name: Disable Device
    synergy_requirements: [{ talent: fly, ranks: 1 }]
    synergy_bonuses: [{ talent: LOCK, ranks: 2, bonus: 1 }]
patterns:
  steady: [1]
  empty: []
classes:
  1:
    vertical: { lock: steady, fly: steady, disa: empty }
    horizontal: [{ lock: 1, swim: 2 }]
actors:
  1: { talent_bonus: { fly: 3, disa: 1 } }
enemies:
  2: { swim: 4 }
"#,
    )
    .unwrap();

    assert_eq!(rules.catalog.len(), 2);
    assert_eq!(rules.catalog.get("LOCK").unwrap().name, "Lockpicking");
    let disa = rules.catalog.get("disa").unwrap();
    assert!(disa.synergy_requirements.is_empty());
    assert_eq!(disa.synergy_bonuses[0].talent, "lock");

    let class = &rules.classes[&1];
    assert_eq!(class.vertical.len(), 1);
    assert!(class.vertical.contains_key("lock"));
    assert_eq!(class.horizontal[0].len(), 1);

    let actor = rules.actor_override(1).unwrap();
    assert_eq!(actor.talent_bonus.len(), 1);
    assert!(actor.player_control);
    assert_eq!(rules.enemy_score(2, "swim"), Some(0));
}

#[test]
fn uppercase_enum_names_are_accepted() {
    let rules = Rules::from_yaml_str(
        r#"
settings: { max_type: STRICT }
check: { roll_type: MAX, view_type: NONE }
talents:
  - { abbreviation: tact, name: Tactics, visibility: CLASS, class_visibility: [1] }
"#,
    )
    .unwrap();
    assert_eq!(rules.settings.max_type, MaxType::Strict);
    assert_eq!(rules.check.roll_type, CheckKind::Max);
    assert_eq!(rules.check.view_type, ViewMode::None);
    assert_eq!(rules.catalog.get("tact").unwrap().visibility, VisibilityMode::Class);
}

#[test]
fn json_rules_parse_by_extension() {
    let json = r#"{
        "settings": { "max_ranks": 5 },
        "talents": [{ "abbreviation": "perc", "name": "Perception" }],
        "classes": { "2": { "starting_points": 3 } }
    }"#;
    let rules = parse_rules(Path::new("rules.JSON"), json).unwrap();
    assert_eq!(rules.settings.max_ranks, 5);
    assert_eq!(rules.classes[&2].starting_points, 3);

    let err = parse_rules(Path::new("rules.toml"), json).unwrap_err();
    assert!(format!("{:#}", err).contains("unsupported rules format"));
}

#[test]
fn impossible_settings_are_rejected() {
    let err = Rules::from_yaml_str("check: { die_type: 0 }").unwrap_err();
    assert!(format!("{:#}", err).contains("die_type"));
    let err = Rules::from_yaml_str("settings: { max_ranks: -1 }").unwrap_err();
    assert!(format!("{:#}", err).contains("max_ranks"));
}

#[test]
fn rules_file_round_trips_through_disk() {
    let path = std::env::temp_dir().join(format!("talent_rules_{}.yaml", std::process::id()));
    std::fs::write(&path, builtin_rules()["d20_skills"]).unwrap();
    let rules = load_rules(&path).unwrap();
    assert_eq!(rules.catalog.len(), 11);
    std::fs::remove_file(&path).ok();

    let err = load_rules(Path::new("/definitely/not/here.yaml")).unwrap_err();
    assert!(format!("{:#}", err).contains("failed to read rules file"));
}

#[test]
fn out_of_range_pattern_values_are_skipped() {
    let rules = Rules::from_yaml_str(
        r#"
talents:
  - { abbreviation: athl, name: Athletics }
  - { abbreviation: perc, name: Perception }
patterns:
  steady: [1]
  huge: [1, 3000000000]
classes:
  1:
    vertical: { athl: steady, perc: huge }
"#,
    )
    .unwrap();
    let class = &rules.classes[&1];
    assert_eq!(class.vertical.len(), 1);
    assert_eq!(class.level_delta("athl", 3), 1);
    assert_eq!(class.level_delta("perc", 3), 0);
}
