//! Public entry point: wire a [`MinerCore`] and its three cooperating
//! activities (mining, main loop, service) plus SPV's background
//! reconciliation activity into a scheduler.

use std::cell::RefCell;
use std::rc::Rc;

use sim_network::Socket;
use sim_scheduler::Scheduler;
use sim_types::Block;

use crate::core::{MinerCore, Policy, SharedBackend, SharedRng};
use crate::main_loop::MainLoopActivity;
use crate::mining::MiningActivity;
use crate::service::ServiceActivity;
use crate::spv::SpvReconcileActivity;

/// A spawned miner: the shared state handle the driver reads statistics
/// from once a run is over.
pub struct Miner {
    pub core: Rc<RefCell<MinerCore>>,
}

impl Miner {
    /// Construct a miner's state and spawn its activities. `genesis` must
    /// be the same block instance every miner in a run is seeded with, so
    /// fingerprints line up.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        sched: &mut Scheduler,
        id: u64,
        name: String,
        hashrate: f64,
        socket: Socket,
        rng: SharedRng,
        backend: SharedBackend,
        policy: Policy,
        genesis: Block,
    ) -> Self {
        let mut core = MinerCore::new(id, name, hashrate, socket, rng, backend, policy, sched);
        core.seed_genesis(genesis);
        let core = Rc::new(RefCell::new(core));

        let mining_id = (hashrate > 0.0).then(|| sched.spawn(Box::new(MiningActivity::new(core.clone()))));
        sched.spawn(Box::new(MainLoopActivity::new(core.clone(), mining_id)));
        sched.spawn(Box::new(ServiceActivity::new(core.clone())));
        sched.spawn(Box::new(SpvReconcileActivity::new(core.clone())));

        Miner { core }
    }
}
