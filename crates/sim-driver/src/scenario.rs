//! The two canonical scenarios: a general-topology standard run, and the
//! three-miner mixed SPV/attack race.

use std::cell::RefCell;
use std::rc::Rc;

use rand::SeedableRng;
use rand_distr::{Dirichlet, Distribution};
use sim_bus::{EventPublisher, SimEvent};
use sim_miner::{Miner, Policy, SharedBackend, SharedRng, SpvState, AttackerState};
use sim_network::{EnvelopeStore, Link, Socket};
use sim_persistence::{build_backend, BackendKind, PersistenceBackend};
use sim_scheduler::{Scheduler, StopCondition};
use sim_types::Block;

use crate::config::{MixedConfig, RaceMode, StandardConfig};
use crate::error::DriverError;
use crate::report::{MinerReport, RunReport};
use crate::topology;

fn seeded_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(s) => rand::rngs::StdRng::seed_from_u64(s),
        None => rand::rngs::StdRng::from_entropy(),
    };
    Rc::new(RefCell::new(rng))
}

fn report_of(core: &Rc<RefCell<sim_miner::MinerCore>>) -> MinerReport {
    let core = core.borrow();
    MinerReport {
        id: core.id,
        name: core.name.clone(),
        chain_head: core.chain_head(),
        chain_height: core.chain_head_block().map(|b| b.height),
        block_count: core.block_count(),
        race_tally: core.race_tally(),
    }
}

/// `n` miners, Dirichlet hash shares, a random graph, all honest.
pub fn standard(
    config: StandardConfig,
    seed: Option<u64>,
    backend_kind: BackendKind,
    bus: &dyn EventPublisher,
) -> Result<RunReport, DriverError> {
    config.validate()?;
    let mut backend = build_backend(backend_kind)?;
    backend.clear()?;
    let backend: SharedBackend = Rc::new(RefCell::new(BoxedBackend(backend)));

    bus.publish(SimEvent::name_table());

    let mut sched = Scheduler::new();
    let rng = seeded_rng(seed);
    let genesis = Block::genesis(0);
    let store = EnvelopeStore::new();

    let shares: Vec<f64> = {
        let concentration = vec![1.0; config.n];
        let dirichlet = Dirichlet::new(&concentration).expect("n >= 1 validated above");
        dirichlet.sample(&mut *rng.borrow_mut())
    };

    let mut sockets: Vec<Socket> = (0..config.n as u64).map(|id| Socket::new(id, store.clone())).collect();
    for (i, j) in topology::random_graph(config.n, config.edge_probability, &mut *rng.borrow_mut()) {
        sockets[i].add_link(Link::new(i as u64, j as u64, sim_miner::LINK_DELAY));
        sockets[j].add_link(Link::new(j as u64, i as u64, sim_miner::LINK_DELAY));
    }

    let mut cores = Vec::with_capacity(config.n);
    for (i, socket) in sockets.into_iter().enumerate() {
        let miner = Miner::spawn(
            &mut sched,
            i as u64,
            format!("hon-{i}"),
            shares[i],
            socket,
            rng.clone(),
            backend.clone(),
            Policy::Honest,
            genesis.clone(),
        );
        cores.push(miner.core);
    }

    let stopped_at = sched.run(StopCondition::Time(config.time_budget()));
    bus.publish(SimEvent::SimulationEnded);

    Ok(RunReport {
        stopped_at,
        miners: cores.iter().map(report_of).collect(),
    })
}

/// Three miners (attacker, honest, optional SPV) on a complete graph.
pub fn mixed_spv_attack(
    config: MixedConfig,
    seed: Option<u64>,
    backend_kind: BackendKind,
    bus: &dyn EventPublisher,
) -> Result<RunReport, DriverError> {
    config.validate()?;
    let mut backend = build_backend(backend_kind)?;
    backend.clear()?;
    let backend: SharedBackend = Rc::new(RefCell::new(BoxedBackend(backend)));

    bus.publish(SimEvent::name_table());

    let mut sched = Scheduler::new();
    let rng = seeded_rng(seed);
    let genesis = Block::genesis(0);
    let store = EnvelopeStore::new();

    let has_spv = config.has_spv();
    let n = if has_spv { 3 } else { 2 };
    let mut sockets: Vec<Socket> = (0..n as u64).map(|id| Socket::new(id, store.clone())).collect();
    for (i, j) in topology::complete_graph(n) {
        sockets[i].add_link(Link::new(i as u64, j as u64, sim_miner::LINK_DELAY));
        sockets[j].add_link(Link::new(j as u64, i as u64, sim_miner::LINK_DELAY));
    }
    let mut sockets = sockets.into_iter();

    let race_outcome = sched.new_signal();
    let attacker_policy = Policy::Attacker(AttackerState {
        chain_head_others: None,
        invalid_len: 0,
        honest_len: 0,
        k: config.k,
        wins: 0,
        loses: 0,
        rebase_when_unforked: config.rebase_when_unforked,
        race_outcome,
    });
    let attacker = Miner::spawn(
        &mut sched,
        0,
        "att".to_string(),
        config.alpha,
        sockets.next().unwrap(),
        rng.clone(),
        backend.clone(),
        attacker_policy,
        genesis.clone(),
    );

    let honest = Miner::spawn(
        &mut sched,
        1,
        "hon".to_string(),
        config.beta,
        sockets.next().unwrap(),
        rng.clone(),
        backend.clone(),
        Policy::Honest,
        genesis.clone(),
    );

    let mut cores = vec![attacker.core.clone(), honest.core];
    if has_spv {
        let spv_policy = Policy::Spv(SpvState {
            chain_head_others: None,
            pending_head: None,
            val_frac: config.val_frac,
        });
        let spv = Miner::spawn(
            &mut sched,
            2,
            "spv".to_string(),
            config.gamma(),
            sockets.next().unwrap(),
            rng.clone(),
            backend.clone(),
            spv_policy,
            genesis.clone(),
        );
        cores.push(spv.core);
    }

    let stopped_at = match config.race_mode {
        RaceMode::SingleRace => {
            let signal = attacker.core.borrow().race_outcome_signal().expect("attacker always has one");
            sched.run(StopCondition::Signal(signal))
        }
        RaceMode::Accumulating if config.full_reset => {
            let budget = config.time_budget();
            let mut now = 0.0;
            while now < budget {
                let signal = attacker.core.borrow().race_outcome_signal().expect("attacker always has one");
                now = sched.run(StopCondition::Signal(signal));
                if now >= budget {
                    break;
                }
                for core in &cores {
                    core.borrow_mut().reset_to_genesis(genesis.clone());
                }
            }
            now
        }
        RaceMode::Accumulating => sched.run(StopCondition::Time(config.time_budget())),
    };

    bus.publish(SimEvent::SimulationEnded);

    Ok(RunReport {
        stopped_at,
        miners: cores.iter().map(report_of).collect(),
    })
}

/// Adapts an owned `Box<dyn PersistenceBackend>` so it can live behind the
/// `Rc<RefCell<dyn PersistenceBackend>>` every miner shares.
struct BoxedBackend(Box<dyn PersistenceBackend>);

impl PersistenceBackend for BoxedBackend {
    fn clear(&mut self) -> Result<(), sim_persistence::PersistenceError> {
        self.0.clear()
    }
    fn allocate_id(&mut self, domain: &str) -> Result<u64, sim_persistence::PersistenceError> {
        self.0.allocate_id(domain)
    }
    fn record(&mut self, path: &str, fields: sim_persistence::Fields) -> Result<(), sim_persistence::PersistenceError> {
        self.0.record(path, fields)
    }
    fn record_index(&mut self, set: &str, score: f64, key: &str) -> Result<(), sim_persistence::PersistenceError> {
        self.0.record_index(set, score, key)
    }
}
