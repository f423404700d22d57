use talent_engine::{ActorState, Dice, MaxType, Rules, TalentSystem};

const RULES: &str = r#"
settings: { max_type: level, max_ranks: 3, proficiency_bonus: 3 }
talents:
  - { abbreviation: arca, name: Arcana, class_signatures: [3] }
  - { abbreviation: athl, name: Athletics, starting_ranks: 1 }
  - { abbreviation: perc, name: Perception }
  - abbreviation: lock
    name: Lockpicking
    synergy_requirements:
      - { talent: athl, ranks: 2 }
  - { abbreviation: tact, name: Tactics, visibility: class, class_visibility: [1] }
patterns:
  steady: [1]
  every_other: [0, 1]
classes:
  1:
    starting_points: 4
    points_per_level: 2
    vertical: { athl: steady, perc: every_other }
  3:
    starting_points: 2
    points_per_level: 1
  4:
    starting_points: 6
    points_per_level: 3
    auto_mode: horizontal
    horizontal:
      - { perc: 1 }
      - { athl: 2 }
actors:
  1: { starting_bonus: 1, point_bonus: 1 }
  5: { player_control: false }
  6: { player_control: false }
races:
  2: { starting_bonus: 2, point_bonus: 1 }
"#;

fn rules() -> Rules {
    Rules::from_yaml_str(RULES).unwrap()
}

fn system() -> TalentSystem {
    TalentSystem::new(rules(), Dice::from_seed(7))
}

#[test]
fn player_starts_with_every_point_source() {
    let mut sys = system();
    sys.add_actor(ActorState::new(1, 1, 1).with_race(2), true);
    assert_eq!(sys.get_points(1), 4 + 1 + 2);
    assert_eq!(sys.get_ranks(1, "athl"), 1);
    assert_eq!(sys.get_ranks(1, "perc"), 0);

    sys.level_up(1);
    assert_eq!(sys.get_points(1), 7 + 2 + 1 + 1);
    assert_eq!(sys.get_ranks(1, "athl"), 1);
}

#[test]
fn signature_talents_stay_at_cap() {
    let mut sys = system();
    sys.add_actor(ActorState::new(3, 3, 2), true);
    assert_eq!(sys.get_ranks(3, "arca"), 5);
    assert_eq!(sys.max_ranks(3), 5);

    sys.level_up(3);
    assert_eq!(sys.get_ranks(3, "arca"), 6);
    assert_eq!(sys.max_ranks(3), 6);

    let mut strict = rules();
    strict.settings.max_type = MaxType::Strict;
    let mut sys = TalentSystem::new(strict, Dice::from_seed(7));
    sys.add_actor(ActorState::new(3, 3, 2), true);
    assert_eq!(sys.get_ranks(3, "arca"), 2);
    assert_eq!(sys.max_ranks(3), 3);
}

#[test]
fn automatic_actor_sums_vertical_patterns() {
    let mut sys = system();
    sys.add_actor(ActorState::new(5, 1, 3), true);
    assert_eq!(sys.get_points(5), 0);
    assert_eq!(sys.get_ranks(5, "athl"), 1 + 3);
    // every_other reads index level % 2: 1, 0, 1
    assert_eq!(sys.get_ranks(5, "perc"), 2);

    sys.level_up(5);
    assert_eq!(sys.get_ranks(5, "athl"), 5);
    assert_eq!(sys.get_ranks(5, "perc"), 2);
    assert_eq!(sys.get_points(5), 0);
}

#[test]
fn horizontal_tables_are_not_summed_at_initialization() {
    let mut sys = system();
    sys.add_actor(ActorState::new(5, 4, 1), true);
    sys.level_up(5);
    sys.level_up(5);

    sys.add_actor(ActorState::new(6, 4, 3), true);

    // levelled from 1: row 1 at init, row 0 at 2, row 1 at 3
    assert_eq!(sys.get_ranks(5, "athl"), 1 + 2 + 2);
    assert_eq!(sys.get_ranks(5, "perc"), 1);
    // created at 3: only row 1
    assert_eq!(sys.get_ranks(6, "athl"), 1 + 2);
    assert_eq!(sys.get_ranks(6, "perc"), 0);
}

#[test]
fn class_change_at_initial_level_starts_over() {
    let mut sys = system();
    sys.add_actor(ActorState::new(1, 1, 1), true);
    sys.set_ranks(1, "perc", 3);
    assert!(sys.change_class(1, 3));
    assert_eq!(sys.get_ranks(1, "perc"), 0);
    assert_eq!(sys.get_ranks(1, "arca"), 4);
    assert_eq!(sys.get_points(1), 2 + 1);
}

#[test]
fn class_change_after_levelling_keeps_progress() {
    let mut sys = system();
    sys.add_actor(ActorState::new(2, 1, 1), true);
    sys.level_up(2);
    sys.level_up(2);
    sys.set_ranks(2, "perc", 2);
    let points = sys.get_points(2);

    sys.change_class(2, 3);
    assert_eq!(sys.get_ranks(2, "perc"), 2);
    assert_eq!(sys.get_points(2), points);
    let arca = sys.party().actor(2).unwrap().record("arca").unwrap();
    assert!(arca.signature);
}

#[test]
fn reset_policy_forces_reinitialization() {
    let mut r = rules();
    r.settings.reset_on_class_change = true;
    let mut sys = TalentSystem::new(r, Dice::from_seed(7));
    sys.add_actor(ActorState::new(2, 1, 1), true);
    sys.level_up(2);
    sys.set_ranks(2, "perc", 2);

    sys.change_class(2, 3);
    assert_eq!(sys.get_ranks(2, "perc"), 0);
    assert_eq!(sys.get_points(2), 2);
}

#[test]
fn automatic_class_change_replays_new_deltas() {
    let mut sys = system();
    sys.add_actor(ActorState::new(5, 3, 1), true);
    sys.level_up(5);
    sys.level_up(5);
    assert_eq!(sys.get_ranks(5, "athl"), 1);

    sys.change_class(5, 1);
    // steady for levels 2 and 3, every_other gives 0 then 1
    assert_eq!(sys.get_ranks(5, "athl"), 3);
    assert_eq!(sys.get_ranks(5, "perc"), 1);
}

#[test]
fn allocation_respects_cap_synergy_and_visibility() {
    let mut sys = system();
    sys.add_actor(ActorState::new(1, 1, 1), true);
    sys.add_actor(ActorState::new(3, 3, 1), true);
    assert_eq!(sys.get_points(1), 5);

    assert!(!sys.allocate(1, "lock"));
    assert!(sys.allocate(1, "athl"));
    assert!(sys.allocate(1, "athl"));
    assert!(sys.allocate(1, "athl"));
    assert!(!sys.allocate(1, "athl"));
    assert!(sys.allocate(1, "lock"));

    assert!(sys.allocate(1, "tact"));
    assert!(!sys.allocate(3, "tact"));

    assert!(sys.commit_allocation(1));
    assert_eq!(sys.get_ranks(1, "athl"), 4);
    assert_eq!(sys.get_ranks(1, "lock"), 1);
    assert_eq!(sys.get_ranks(1, "tact"), 1);
    assert_eq!(sys.get_points(1), 0);
    assert!(!sys.commit_allocation(1));
}

#[test]
fn allocation_stops_when_pool_is_spent() {
    let mut sys = system();
    sys.add_actor(ActorState::new(1, 1, 1), true);
    sys.set_points(1, 1);
    assert!(sys.allocate(1, "perc"));
    assert!(!sys.allocate(1, "perc"));

    assert!(sys.release(1, "perc"));
    assert!(!sys.release(1, "perc"));
    assert!(sys.allocate(1, "tact"));
}

#[test]
fn commit_is_rejected_when_pool_shrinks() {
    let mut sys = system();
    sys.add_actor(ActorState::new(1, 1, 1), true);
    sys.set_points(1, 2);
    assert!(sys.allocate(1, "perc"));
    assert!(sys.allocate(1, "perc"));

    assert!(sys.remove_points(1, 2));
    assert!(!sys.commit_allocation(1));
    assert_eq!(sys.get_ranks(1, "perc"), 0);
    assert_eq!(sys.get_points(1), 0);
    assert_eq!(sys.pending(1).unwrap().total(), 2);

    assert!(sys.add_points(1, 2));
    assert!(sys.commit_allocation(1));
    assert_eq!(sys.get_ranks(1, "perc"), 2);
    assert_eq!(sys.get_points(1), 0);
}
