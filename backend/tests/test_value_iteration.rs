//! Value iteration and training

mod common;

use common::scratch_dir;
use intersection_control_core::mdp::{
    Action, DiscreteState, MdpConfig, SolverConfig, StateSpace, Trainer, TransitionModel,
    ValueIteration, ValueTable, ValueTableStore, STATE_COUNT,
};

fn model() -> TransitionModel {
    TransitionModel::new(MdpConfig::default()).unwrap()
}

fn greedy_reward(model: &TransitionModel, state: &DiscreteState) -> f64 {
    Action::ALL
        .iter()
        .filter(|a| model.is_admissible(state, **a))
        .map(|a| model.expected_return(state, *a, &ValueTable::zeros(), 0.0).unwrap())
        .fold(f64::NEG_INFINITY, f64::max)
}

#[test]
fn test_zero_discount_ignores_previous_values() {
    let model = model();
    // Arbitrary nonzero starting table
    let seeded: Vec<f64> = (0..STATE_COUNT).map(|i| (i % 97) as f64 - 48.0).collect();
    let seeded = ValueTable::from_values(seeded).unwrap();
    let mut solver = ValueIteration::resume(model.clone(), 0.0, seeded, 0);
    solver.step();

    for state in StateSpace::new().step_by(7) {
        let expected = greedy_reward(&model, &state);
        assert!((solver.current().get(&state) - expected).abs() < 1e-9);
    }
}

#[test]
fn test_horizon_counts_steps() {
    let mut solver = ValueIteration::new(model(), 0.9);
    assert_eq!(solver.horizon(), 0);
    assert_eq!(solver.current(), &ValueTable::zeros());
    solver.step();
    solver.step();
    assert_eq!(solver.horizon(), 2);
}

#[test]
fn test_trainer_persists_every_horizon() {
    let dir = scratch_dir("trainer_persists");
    let store = ValueTableStore::new(&dir);
    let solver = SolverConfig {
        discount: 0.5,
        horizon: 2,
    };

    let table = Trainer::new(MdpConfig::default(), solver, store.clone()).run().unwrap();

    assert!(store.table_path(0.5, 1).exists());
    assert!(store.table_path(0.5, 2).exists());
    let manifest = store.read_manifest(0.5).unwrap().unwrap();
    assert_eq!(manifest.latest_horizon, 2);

    let loaded = store.load(0.5, 2).unwrap();
    assert!(loaded.max_abs_diff(&table) <= 5e-6);
}

#[test]
fn test_resume_continues_from_latest_horizon() {
    let dir = scratch_dir("trainer_resume");
    let store = ValueTableStore::new(&dir);

    let short = SolverConfig {
        discount: 0.5,
        horizon: 1,
    };
    let long = SolverConfig {
        discount: 0.5,
        horizon: 2,
    };
    Trainer::new(MdpConfig::default(), short, store.clone())
        .run()
        .unwrap();
    let resumed = Trainer::new(MdpConfig::default(), long, store.clone())
        .with_resume(true)
        .run()
        .unwrap();

    let mut fresh = ValueIteration::new(model(), 0.5);
    fresh.step();
    fresh.step();

    // The resumed run starts from a table rounded to five decimals
    assert!(resumed.max_abs_diff(fresh.current()) < 1e-4);
    assert_eq!(store.read_manifest(0.5).unwrap().unwrap().latest_horizon, 2);
}

#[test]
fn test_resume_ignores_other_model() {
    let dir = scratch_dir("trainer_other_model");
    let store = ValueTableStore::new(&dir);
    let solver = SolverConfig {
        discount: 0.5,
        horizon: 1,
    };

    let mut other = MdpConfig::default();
    other.rewards[5] = 1000.0;
    let first = Trainer::new(other, solver, store.clone()).run().unwrap();
    let second = Trainer::new(MdpConfig::default(), solver, store.clone())
        .with_resume(true)
        .run()
        .unwrap();

    assert!(first.max_abs_diff(&second) > 1.0);
}
