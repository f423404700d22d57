use talent_engine::{ActorState, Dice, MemoryHost, NoBonuses, Rules, TalentSystem};

const RULES: &str = r#"
settings: { max_ranks: 3, proficiency_bonus: 3 }
talents:
  - { abbreviation: lock, name: Lockpicking, class_proficiencies: [2] }
  - abbreviation: disa
    name: Disable Device
    class_proficiencies: [2]
    requires_training: true
    synergy_bonuses:
      - { talent: lock, ranks: 2, bonus: 2 }
  - { abbreviation: perc, name: Perception }
actors:
  1:
    talent_bonus: { perc: 2 }
races:
  7:
    talent_bonus: { perc: -1 }
"#;

fn system(actors: &[(u32, u32)]) -> TalentSystem {
    let rules = Rules::from_yaml_str(RULES).unwrap();
    let mut sys = TalentSystem::new(rules, Dice::from_scripted(vec![10]));
    for (id, class) in actors {
        sys.add_actor(ActorState::new(*id, *class, 1), true);
    }
    sys
}

#[test]
fn proficient_ranks_add_flat_bonus() {
    let mut sys = system(&[(1, 2)]);
    assert!(sys.set_ranks(1, "lock", 2));
    assert_eq!(sys.get_score(&NoBonuses, 1, "lock"), 5);
    assert_eq!(sys.get_score(&NoBonuses, 1, "  LOCK "), 5);
}

#[test]
fn untrained_talent_ignores_every_bonus() {
    let mut sys = system(&[(2, 2)]);
    let mut host = MemoryHost::new();
    host.equip(2, "+4 disa");
    sys.set_ranks(2, "lock", 3);

    assert_eq!(sys.get_score(&host, 2, "disa"), 0);

    assert!(sys.add_ranks(2, "disa", 1));
    // 1 rank + 3 proficiency + 4 equipment + 2 synergy
    assert_eq!(sys.get_score(&host, 2, "disa"), 10);
}

#[test]
fn bonus_sources_stack() {
    let rules = Rules::from_yaml_str(RULES).unwrap();
    let mut sys = TalentSystem::new(rules, Dice::from_scripted(vec![1]));
    sys.add_actor(ActorState::new(1, 1, 1).with_race(7), true);

    let mut host = MemoryHost::new();
    host.equip(1, "+1 perc");
    host.add_state(1, "+2 perc");
    host.add_passive_state(1, "-1 perc");
    host.give_item(3, 1, "+1 perc, +3 lock");
    host.give_item(9, 0, "+5 perc");

    // actor +2, race -1, equipment +1, state +2, passive -1, item +1
    assert_eq!(sys.get_score(&host, 1, "perc"), 4);
    assert_eq!(sys.get_score(&host, 1, "lock"), 3);
}

#[test]
fn negative_scores_are_allowed() {
    let sys = system(&[(2, 1)]);
    let mut host = MemoryHost::new();
    host.add_state(2, "-3 perc");
    assert_eq!(sys.get_score(&host, 2, "perc"), -3);
}

#[test]
fn synergy_follows_ranks_and_pending() {
    let mut sys = system(&[(1, 2)]);
    sys.set_ranks(1, "disa", 1);
    sys.set_ranks(1, "lock", 1);
    sys.set_points(1, 5);
    assert_eq!(sys.get_score(&NoBonuses, 1, "disa"), 4);

    assert!(sys.allocate(1, "lock"));
    assert_eq!(sys.preview_score(&NoBonuses, 1, "disa"), 6);
    assert_eq!(sys.get_score(&NoBonuses, 1, "disa"), 4);

    assert!(sys.release(1, "lock"));
    assert_eq!(sys.preview_score(&NoBonuses, 1, "disa"), 4);

    sys.set_ranks(1, "lock", 2);
    assert_eq!(sys.get_score(&NoBonuses, 1, "disa"), 6);
    sys.remove_ranks(1, "lock", 1);
    assert_eq!(sys.get_score(&NoBonuses, 1, "disa"), 4);
}

#[test]
fn lookup_misses_return_sentinels() {
    let sys = system(&[(1, 2)]);
    assert_eq!(sys.get_score(&NoBonuses, 1, "fly"), 0);
    assert_eq!(sys.get_score(&NoBonuses, 42, "lock"), 0);
    assert_eq!(sys.get_ranks(1, "fly"), -1);
    assert_eq!(sys.get_ranks(42, "lock"), -1);
    assert_eq!(sys.get_points(42), -1);
    assert_eq!(sys.total_points(42), -1);
}

#[test]
fn most_talented_prefers_roster_order_on_ties() {
    let mut sys = system(&[(4, 2), (3, 2), (5, 1)]);
    sys.set_ranks(4, "lock", 1);
    sys.set_ranks(3, "lock", 1);
    assert_eq!(sys.most_talented(&NoBonuses, "lock"), 4);

    sys.add_ranks(3, "lock", 1);
    assert_eq!(sys.most_talented(&NoBonuses, "lock"), 3);
}

#[test]
fn most_talented_of_empty_party_is_zero() {
    let rules = Rules::from_yaml_str(RULES).unwrap();
    let mut sys = TalentSystem::new(rules, Dice::from_seed(1));
    sys.add_actor(ActorState::new(1, 2, 1), false);
    assert_eq!(sys.most_talented(&NoBonuses, "lock"), 0);
}

#[test]
fn rank_and_point_edits_respect_bounds() {
    let mut sys = system(&[(1, 2)]);
    // level 1 cap is 3 + 1
    assert!(sys.set_ranks(1, "lock", 10));
    assert_eq!(sys.get_ranks(1, "lock"), 4);
    assert!(!sys.set_ranks(1, "lock", -1));
    assert!(!sys.add_ranks(1, "lock", 0));
    assert!(sys.remove_ranks(1, "lock", 9));
    assert_eq!(sys.get_ranks(1, "lock"), 0);

    assert!(sys.set_points(1, 200_000));
    assert_eq!(sys.get_points(1), 100_000);
    assert!(sys.remove_points(1, 200_000));
    assert_eq!(sys.get_points(1), 0);
    assert!(!sys.add_points(1, -2));
    assert!(sys.add_points(1, 3));
    assert_eq!(sys.total_points(1), 3);
}
