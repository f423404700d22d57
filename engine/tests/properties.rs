use proptest::prelude::*;

use talent_engine::{
    ActorState, CheckKind, CheckOptions, Dice, MaxType, MemoryHost, Rules, TalentSystem, ViewMode,
};

const RULES: &str = r#"
settings: { max_ranks: 3, proficiency_bonus: 3 }
talents:
  - { abbreviation: lock, name: Lockpicking, class_proficiencies: [2] }
  - abbreviation: disa
    name: Disable Device
    class_proficiencies: [2]
    requires_training: true
    synergy_bonuses:
      - { talent: lock, ranks: 1, bonus: 2 }
"#;

fn rules() -> Rules {
    Rules::from_yaml_str(RULES).unwrap()
}

fn thief(seed: u64) -> TalentSystem {
    let mut sys = TalentSystem::new(rules(), Dice::from_seed(seed));
    sys.add_actor(ActorState::new(1, 2, 1), true);
    sys
}

proptest! {
    #[test]
    fn untrained_talent_scores_zero(equip in -5..10i32, lock in 0..=4i32, state in -5..10i32) {
        let mut sys = thief(1);
        sys.set_ranks(1, "lock", lock);
        let mut host = MemoryHost::new();
        host.equip(1, &format!("{:+} disa", equip));
        host.add_state(1, &format!("{:+} disa", state));
        prop_assert_eq!(sys.get_score(&host, 1, "disa"), 0);
    }

    #[test]
    fn untrained_max_check_fails_by_target(target in 1..=9999i32) {
        let mut sys = thief(1);
        let mut host = MemoryHost::new();
        let opts = CheckOptions::new("disa").kind(CheckKind::Max).actor(1).target(target);
        prop_assert_eq!(sys.resolve_check(&mut host, &opts), -target);
    }

    #[test]
    fn level_cap_never_shrinks(max_ranks in 0..20i32, level in 1..98i32) {
        let mut r = rules();
        r.settings.max_ranks = max_ranks;
        r.settings.max_type = MaxType::Level;
        prop_assert!(r.max_ranks(level) <= r.max_ranks(level + 1));
    }

    #[test]
    fn roll_stays_inside_envelope(
        seed in any::<u64>(),
        ranks in 0..=4i32,
        die in 1..=20i32,
        count in 1..=5i32,
    ) {
        let mut sys = thief(seed);
        sys.set_ranks(1, "lock", ranks);
        let mut host = MemoryHost::new();
        let opts = CheckOptions::new("lock")
            .kind(CheckKind::Roll)
            .actor(1)
            .target(10)
            .dice(count, die)
            .view(ViewMode::Show);
        let out = sys.check(&mut host, &opts).unwrap();
        let env = out.envelope.unwrap();
        prop_assert!(env.min <= out.raw && out.raw <= env.max);
    }

    #[test]
    fn remembered_roll_is_stable(seed in any::<u64>(), repeats in 2..6usize) {
        let mut sys = thief(seed);
        let mut host = MemoryHost::new();
        let opts = CheckOptions::new("lock").kind(CheckKind::Roll).actor(1).target(10).remember("door");
        let first = sys.check(&mut host, &opts).unwrap().raw;
        for _ in 1..repeats {
            prop_assert_eq!(sys.check(&mut host, &opts).unwrap().raw, first);
        }
    }

    #[test]
    fn synergy_applies_at_threshold(lock in 0..=4i32) {
        let mut sys = thief(1);
        sys.set_ranks(1, "disa", 1);
        sys.set_ranks(1, "lock", lock);
        let expected = 1 + 3 + if lock >= 1 { 2 } else { 0 };
        prop_assert_eq!(sys.get_score(&MemoryHost::new(), 1, "disa"), expected);
    }
}
