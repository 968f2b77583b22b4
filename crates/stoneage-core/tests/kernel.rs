//! End-to-end tests for the simulation kernel: the five reference scenarios
//! and the cross-tick properties (liveness, atomicity, uniqueness, bounds,
//! Q-table growth, reentrancy).

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::too_many_lines
)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use stoneage_core::systems::culture::observe::{FactionStats, discretize};
use stoneage_core::systems::disease::progression::progress;
use stoneage_core::systems::disease::registry::DiseaseRegistry;
use stoneage_core::systems::disease::transmission::transmit;
use stoneage_core::{
    CultureConfig, DiseaseConfig, Engine, EngineError, KernelConfig, MemoryArchiver, MemoryBrainStore,
    MemoryReporter, Pipeline, RunFlags, Simulation, System, SystemError, TickError, WorldState, build_default,
};
use stoneage_types::{
    Agent, AgentId, DiseaseDefinition, DiseaseId, FactionId, ImmunityKind, InfectionRecord, LogCategory,
    SeverityEffects, Sex,
};

// =============================================================================
// Helpers
// =============================================================================

fn config(population: u32, seed: u64) -> KernelConfig {
    let mut config = KernelConfig::default();
    config.world.initial_population = population;
    config.world.seed = Some(seed);
    config.engine.auto_restart = false;
    config.engine.tick_rate_limit = 1_000;
    config.engine.paused_poll_ms = 5;
    config
}

fn empty_world(seed: u64) -> WorldState {
    WorldState::with_seed(&config(0, seed), RunFlags::first(false), seed)
}

fn add_adults(state: &mut WorldState, n: usize) -> Vec<AgentId> {
    (0..n)
        .map(|_| {
            let agent = Agent::new(FactionId::from("red_tribe"), Sex::Male, 30.0, 0);
            state.population.insert(agent).unwrap()
        })
        .collect()
}

fn disease(transmission: f64, duration: u32, chronic: bool) -> DiseaseDefinition {
    DiseaseDefinition {
        id: DiseaseId::new(),
        name: String::from("Weeping Eye Cough"),
        transmission,
        lethality: 0.0,
        duration,
        effects: SeverityEffects { hp: 0.0, stamina: -2.0 },
        chronic,
        immunity: ImmunityKind::Waning,
        emerged_on_day: 0,
    }
}

/// Panics on a chosen day.
struct Bomb {
    on_day: u64,
}

impl System for Bomb {
    fn name(&self) -> &'static str {
        "bomb"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        assert!(state.day() != self.on_day, "boom on day {}", self.on_day);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Records every day it sees; must never run after a bomb.
struct Witness {
    seen: Arc<std::sync::Mutex<Vec<u64>>>,
}

impl System for Witness {
    fn name(&self) -> &'static str {
        "witness"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        self.seen.lock().unwrap().push(state.day());
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

/// Stamps the current day on the chronicle, so a reader can check that
/// every system ran for the day it observes.
struct DayStamp;

impl System for DayStamp {
    fn name(&self) -> &'static str {
        "day-stamp"
    }

    fn update(&mut self, state: &mut WorldState) -> Result<(), SystemError> {
        let day = state.day();
        state.log(LogCategory::Engine, format!("stamp {day}"), None);
        Ok(())
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

// =============================================================================
// Reference scenarios
// =============================================================================

#[test]
fn one_carrier_infects_about_thirty_percent() {
    let mut state = empty_world(101);
    let agents = add_adults(&mut state, 100);
    let mut registry = DiseaseRegistry::new();
    let id = registry.register(disease(0.3, 10, false));
    state.infections.insert(InfectionRecord::new(agents[0], id));

    let infected = transmit(&DiseaseConfig::default(), &registry, &mut state);
    assert!((15..=45).contains(&infected), "infected {infected} of 99");
}

#[test]
fn chronic_disease_goes_dormant_after_its_duration() {
    let mut state = empty_world(102);
    let agents = add_adults(&mut state, 1);
    let mut registry = DiseaseRegistry::new();
    let id = registry.register(disease(0.1, 5, true));
    state.infections.insert(InfectionRecord::new(agents[0], id));
    state.immunities.record_exposure(agents[0], id);

    for _ in 0..5 {
        progress(&DiseaseConfig::default(), &registry, &mut state);
    }
    let record = state.infections.get(agents[0], id).expect("dormant record kept");
    assert!(!record.active);
    assert!(state.immunities.level(agents[0], id) > 0.0);
}

#[test]
fn small_sick_hungry_faction_discretizes_to_worst_state() {
    let stats = FactionStats {
        living: 5,
        food: 1.0,
        mean_vulnerability: 0.9,
        mean_hp_fraction: 1.0,
    };
    let key = discretize(&CultureConfig::default(), &stats);
    assert_eq!(key.to_string(), "(CRITICAL, DEGENERATED, FAMINE)");
}

#[test]
fn thirty_forced_steps_while_paused_archive_once() {
    let archiver = MemoryArchiver::new();
    let engine = Engine::new(build_default(
        config(40, 104),
        Box::new(archiver.clone()),
        Box::new(MemoryReporter::new()),
        Box::new(MemoryBrainStore::new()),
    ));
    engine.pause();
    for _ in 0..30 {
        assert!(engine.step(true).unwrap().is_some());
    }
    assert_eq!(engine.day(), 30);
    assert_eq!(archiver.calls(), 1);
    assert!(engine.is_paused());
}

#[test]
fn system_fault_halts_engine_and_skips_later_systems() {
    let reporter = MemoryReporter::new();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let cfg = config(10, 105);
    let state = WorldState::fresh(&cfg, RunFlags::first(false));
    let pipeline = Pipeline::new()
        .with(Bomb { on_day: 3 })
        .with(Witness { seen: Arc::clone(&seen) });
    let engine = Engine::new(Simulation::new(
        cfg,
        state,
        pipeline,
        Box::new(MemoryArchiver::new()),
        Box::new(reporter.clone()),
    ));

    engine.skip_days(2).unwrap();
    let err = engine.step(false).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Tick {
            source: TickError::SystemFailed { system: "bomb", day: 3, .. }
        }
    ));
    assert_eq!(engine.day(), 3);
    assert!(engine.is_paused());
    assert!(!engine.is_running());
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    let crashes = reporter.crashes();
    assert_eq!(crashes.len(), 1);
    assert_eq!(crashes[0].0, 3);
    assert!(crashes[0].1.contains("boom on day 3"));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn liveness_never_returns_and_infections_stay_unique() {
    let engine = Engine::new(build_default(
        config(150, 106),
        Box::new(MemoryArchiver::new()),
        Box::new(MemoryReporter::new()),
        Box::new(MemoryBrainStore::new()),
    ));
    let mut dead: BTreeSet<AgentId> = BTreeSet::new();
    for _ in 0..120 {
        engine.step(true).unwrap();
        engine.read(|state| {
            for agent in state.population.iter() {
                if dead.contains(&agent.id) {
                    assert!(!agent.is_alive(), "agent {} came back", agent.id);
                }
                if !agent.is_alive() {
                    dead.insert(agent.id);
                }
            }
            let mut pairs = BTreeSet::new();
            for record in state.infections.iter() {
                assert!(pairs.insert((record.agent_id, record.disease_id)));
            }
            for record in state.immunities.iter() {
                assert!((0.0..=1.0).contains(&record.level()));
            }
            for faction in state.factions.values() {
                assert!((0.0..=1.0).contains(&faction.policy.mating_strictness()));
                assert!((0.0..=1.0).contains(&faction.policy.rationing_strictness()));
            }
        });
    }
}

#[test]
fn known_states_never_shrink() {
    let store = MemoryBrainStore::new();
    let engine = Engine::new(build_default(
        config(120, 107),
        Box::new(MemoryArchiver::new()),
        Box::new(MemoryReporter::new()),
        Box::new(store.clone()),
    ));
    let mut known: BTreeMap<FactionId, usize> = BTreeMap::new();
    for _ in 0..40 {
        engine.skip_days(7).unwrap();
        engine.flush();
        for (faction, table) in store.tables() {
            let previous = known.insert(faction.clone(), table.len()).unwrap_or(0);
            assert!(table.len() >= previous, "{faction} lost states");
        }
    }
    assert!(known.values().all(|n| *n >= 1));

    let red = FactionId::from("red_tribe");
    assert!(engine.reset_faction_brain(&red));
    engine.flush();
    let tables = store.tables();
    assert!(tables.get(&red).is_none_or(|t| t.is_empty()));
    assert!(tables.get(&FactionId::from("blue_tribe")).is_some_and(|t| !t.is_empty()));
}

#[test]
fn forced_step_while_paused_does_not_deadlock_with_reader() {
    let cfg = config(60, 108);
    let state = WorldState::fresh(&cfg, RunFlags::first(false));
    let engine = Engine::new(Simulation::new(
        cfg,
        state,
        Pipeline::new().with(DayStamp),
        Box::new(MemoryArchiver::new()),
        Box::new(MemoryReporter::new()),
    ));
    engine.pause();

    let done = Arc::new(AtomicBool::new(false));
    let barrier = Arc::new(Barrier::new(2));
    let reader = {
        let engine = engine.clone();
        let done = Arc::clone(&done);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            barrier.wait();
            let mut observations = 0_u32;
            while !done.load(Ordering::Acquire) {
                engine.read(|state| {
                    let day = state.day();
                    if day > 0 {
                        let newest = state.chronicle.newest_first().next().unwrap();
                        assert_eq!(newest.message, format!("stamp {day}"));
                    }
                });
                observations = observations.saturating_add(1);
            }
            observations
        })
    };

    barrier.wait();
    for _ in 0..200 {
        engine.step(true).unwrap();
        engine.toggle_pause();
        engine.toggle_pause();
    }
    done.store(true, Ordering::Release);
    assert!(reader.join().unwrap() > 0);
    assert_eq!(engine.day(), 200);
    assert!(engine.is_paused());
}

#[test]
fn background_loop_honors_pause_and_stop() {
    let engine = Engine::new(build_default(
        config(30, 109),
        Box::new(MemoryArchiver::new()),
        Box::new(MemoryReporter::new()),
        Box::new(MemoryBrainStore::new()),
    ));
    engine.start().unwrap();
    thread::sleep(Duration::from_millis(60));
    engine.pause();
    thread::sleep(Duration::from_millis(30));
    let paused_at = engine.day();
    thread::sleep(Duration::from_millis(150));
    assert_eq!(engine.day(), paused_at);
    assert!(engine.is_running());

    engine.resume();
    thread::sleep(Duration::from_millis(60));
    engine.stop();
    assert!(!engine.is_running());
    assert!(engine.day() > paused_at);
}

#[test]
fn extinction_with_auto_restart_replaces_the_world() {
    let reporter = MemoryReporter::new();
    let mut cfg = config(1, 110);
    cfg.engine.auto_restart = true;
    cfg.engine.low_water_mark = 2;
    let engine = Engine::new(build_default(
        cfg,
        Box::new(MemoryArchiver::new()),
        Box::new(reporter.clone()),
        Box::new(MemoryBrainStore::new()),
    ));
    engine.set_auto_restart(true);
    let summary = engine.step(true).unwrap().unwrap();
    assert!(summary.reset);
    engine.read(|state| {
        assert_eq!(state.flags.run_number, 2);
        assert!(state.flags.auto_restart);
        assert!(
            state
                .chronicle
                .by_category(LogCategory::Extinction)
                .iter()
                .any(|e| e.message.contains("run 2"))
        );
    });
    assert_eq!(reporter.reports()[0].cause, "Extinction");
}

#[test]
fn outbreaks_eventually_happen_in_a_crowded_world() {
    let mut cfg = config(300, 111);
    cfg.disease.outbreak_base_chance = 0.05;
    let engine = Engine::new(build_default(
        cfg,
        Box::new(MemoryArchiver::new()),
        Box::new(MemoryReporter::new()),
        Box::new(MemoryBrainStore::new()),
    ));
    engine.skip_days(200).unwrap();
    engine.read(|state| {
        assert!(!state.chronicle.by_category(LogCategory::Outbreak).is_empty());
    });
}
