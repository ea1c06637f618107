use pitwall_sim::{
    Action, CautionState, ConfigError, FnPolicy, Observation, RaceConfig, RaceStrategySimulator,
    SimError, StepResult, TireCompound, run_episode,
};

fn simulator(cfg: RaceConfig) -> RaceStrategySimulator {
    RaceStrategySimulator::new(cfg).unwrap()
}

/// Cycles through every action so pits, pushes, and saves all occur.
fn mixed_action(lap: u32) -> Action {
    match lap % 11 {
        0..=3 => Action::StayPush,
        4 | 5 => Action::StayConserve,
        6 => Action::PitSoft,
        7 | 8 => Action::StayNormal,
        9 => Action::PitHard,
        _ => Action::PitMedium,
    }
}

fn drive(sim: &mut RaceStrategySimulator, actions: &[Action]) -> Vec<StepResult> {
    actions.iter().map(|&action| sim.step(action)).collect()
}

#[test]
fn wear_and_ers_stay_in_unit_range_for_every_step() {
    let cfg = RaceConfig::default()
        .with_total_laps(120)
        .with_caution_probs(0.2, 0.2);
    for seed in 0..20_u64 {
        let mut sim = simulator(cfg.clone());
        sim.reset(Some(seed));
        for lap in 0..120 {
            let action = if seed % 2 == 0 {
                Action::StayPush
            } else {
                mixed_action(lap)
            };
            let result = sim.step(action);
            let obs = result.observation;
            assert!((0.0..=1.0).contains(&obs.tire_wear), "wear {}", obs.tire_wear);
            assert!((0.0..=1.0).contains(&obs.ers), "ers {}", obs.ers);
            assert!(obs.lap <= 120);
            assert!(sim.state().tire_wear <= 1.2);
        }
    }
}

#[test]
fn same_seed_same_actions_are_bit_identical() {
    let actions: Vec<Action> = (0..50).map(mixed_action).collect();
    let mut a = simulator(RaceConfig::default().with_seed(77));
    let mut b = simulator(RaceConfig::default().with_seed(77));
    let (obs_a, _) = a.reset(None);
    let (obs_b, _) = b.reset(None);
    assert_eq!(obs_a, obs_b);

    let run_a = drive(&mut a, &actions);
    let run_b = drive(&mut b, &actions);
    for (x, y) in run_a.iter().zip(&run_b) {
        assert_eq!(x.info.lap_time_s.to_bits(), y.info.lap_time_s.to_bits());
        assert_eq!(x.reward.to_bits(), y.reward.to_bits());
        assert_eq!(x.observation, y.observation);
    }
}

#[test]
fn reseeding_on_reset_replays_the_trajectory() {
    let actions: Vec<Action> = (0..30).map(mixed_action).collect();
    let mut sim = simulator(RaceConfig::default().with_total_laps(30));
    sim.reset(Some(2024));
    let first: Vec<f64> = drive(&mut sim, &actions)
        .iter()
        .map(|r| r.info.lap_time_s)
        .collect();
    sim.reset(Some(2024));
    let second: Vec<f64> = drive(&mut sim, &actions)
        .iter()
        .map(|r| r.info.lap_time_s)
        .collect();
    assert_eq!(first, second);

    sim.reset(Some(2025));
    let other: Vec<f64> = drive(&mut sim, &actions)
        .iter()
        .map(|r| r.info.lap_time_s)
        .collect();
    assert_ne!(first, other);
}

#[test]
fn pit_actions_reset_stint_and_mount_requested_compound() {
    for compound in TireCompound::ALL {
        let mut sim = simulator(RaceConfig::default().with_seed(5));
        sim.reset(None);
        drive(&mut sim, &[Action::StayPush; 12]);
        assert!(sim.state().tire_wear > 0.3);

        let result = sim.step(Action::pit_for(compound));
        assert!(result.info.pitted);
        assert_eq!(result.observation.compound, compound);
        assert_eq!(result.info.tire, compound);
        assert_eq!(result.observation.stint_laps, 0);
        // Old wear is discarded; only the pit lap itself has been run on the new set.
        let fresh_lap_wear = compound.model().wear_per_lap;
        assert!((sim.state().tire_wear - fresh_lap_wear).abs() < 1e-12);

        let next = sim.step(Action::StayNormal);
        assert_eq!(next.observation.stint_laps, 1);
    }
}

#[test]
fn termination_flags_follow_race_distance() {
    for laps in [1_u32, 2, 7, 50] {
        let mut sim = simulator(RaceConfig::default().with_total_laps(laps).with_seed(9));
        sim.reset(None);
        for lap in 1..=laps {
            let result = sim.step(Action::StayNormal);
            assert!(!result.truncated);
            assert_eq!(result.terminated, lap == laps, "lap {lap} of {laps}");
        }
    }
}

#[test]
fn cumulative_reward_equals_negative_total_time() {
    let mut sim = simulator(RaceConfig::default());
    let mut policy = FnPolicy::new("mixed", |obs: &Observation| mixed_action(obs.lap));
    let summary = run_episode(&mut sim, &mut policy, Some(31));
    assert!(summary.terminated);
    assert_eq!(summary.laps, 50);
    let relative = (summary.cumulative_reward + summary.total_time_s).abs() / summary.total_time_s;
    assert!(relative < 1e-12, "reward drift {relative}");
}

#[test]
fn single_lap_race_scenario() {
    let mut sim = simulator(RaceConfig::default().with_total_laps(1).with_seed(42));
    sim.reset(None);
    let result = sim.step(Action::StayNormal);
    assert!(result.terminated);
    assert_eq!(result.observation.lap, 1);
    assert!((result.reward + result.info.lap_time_s).abs() < f64::EPSILON);
    assert!((result.info.total_time_s - result.info.lap_time_s).abs() < f64::EPSILON);
}

#[test]
fn pit_on_first_lap_costs_the_pit_loss() {
    let cfg = RaceConfig::default().with_total_laps(5).with_seed(17);
    let mut stay = simulator(cfg.clone());
    let mut pit = simulator(cfg.clone());
    stay.reset(None);
    pit.reset(None);

    let normal = stay.step(Action::StayNormal);
    let pitted = pit.step(Action::PitMedium);
    assert!(pitted.info.pitted);
    assert!(!normal.info.pitted);
    assert_eq!(pitted.observation.stint_laps, 0);
    assert_eq!(pitted.info.caution, normal.info.caution);

    let delta = pitted.info.lap_time_s - normal.info.lap_time_s;
    let expected = cfg.pit_loss_s(pitted.info.caution.is_active());
    assert!((delta - expected).abs() < 1e-9, "delta {delta}");
    assert!(delta >= cfg.pit_loss_caution_s - 1e-9);
}

#[test]
fn invalid_actions_fail_without_mutation() {
    let mut sim = simulator(RaceConfig::default().with_seed(3));
    sim.reset(None);
    drive(&mut sim, &[Action::StayPush, Action::PitSoft, Action::StayConserve]);
    let before = sim.state().clone();
    let obs_before = sim.observation();
    for bad in [6_i64, -1, 100, i64::MIN] {
        assert_eq!(sim.step_index(bad), Err(SimError::InvalidAction(bad)));
    }
    assert_eq!(sim.state(), &before);
    assert_eq!(sim.observation(), obs_before);

    let valid = sim.step_index(2).unwrap();
    assert_eq!(valid.observation.lap, before.lap + 1);
}

#[test]
fn non_positive_lap_count_is_rejected_at_construction() {
    let err = RaceStrategySimulator::new(RaceConfig::default().with_total_laps(0)).unwrap_err();
    assert_eq!(
        err,
        SimError::InvalidConfiguration(ConfigError::NonPositiveLaps { value: 0 })
    );
}

#[test]
fn caution_laps_appear_at_roughly_configured_rate() {
    let cfg = RaceConfig::default()
        .with_total_laps(5_000)
        .with_caution_probs(0.1, 0.2)
        .with_seed(11);
    let mut sim = simulator(cfg);
    sim.reset(None);
    let mut full = 0_u32;
    let mut partial = 0_u32;
    for _ in 0..5_000 {
        match sim.step(Action::StayNormal).info.caution {
            CautionState::Full => full += 1,
            CautionState::Partial => partial += 1,
            CautionState::None => {}
        }
    }
    let full_rate = f64::from(full) / 5_000.0;
    let partial_rate = f64::from(partial) / 5_000.0;
    assert!((full_rate - 0.1).abs() < 0.02, "full {full_rate}");
    // Partial only gets a chance when full misses: 0.9 * 0.2.
    assert!((partial_rate - 0.18).abs() < 0.02, "partial {partial_rate}");
}
