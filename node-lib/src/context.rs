// Copyright (c) 2023 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::sync::Arc;
use std::time::Duration;

use blockprod::{StakerHandle, StakingServices};
use chainstate::{Chainstate, NodeClock};
use common::chain::config::ChainConfig;
use common::time_getter::TimeGetter;
use crypto::random::{make_pseudo_rng, Rng};
use logging::log;
use mempool::Mempool;
use parking_lot::RwLock;
use utils::atomics::RelaxedAtomicBool;
use utils::warnings::Warnings;
use wallet::relocker::WalletRelocker;
use wallet::Wallet;
use wallet_rpc_lib::WalletRpc;

use crate::keypool_worker::KeyPoolWorker;

/// Public STUN servers probed once at startup for the node's external
/// address.
const STUN_SERVERS: &[&str] = &[
    "stun.l.google.com:19302",
    "stun1.l.google.com:19302",
    "stun2.l.google.com:19302",
    "stun.ekiga.net:3478",
    "stun.ideasip.com:3478",
];

#[derive(Debug, Clone)]
pub struct NodeOptions {
    /// Whether to run the staking loop.
    pub stake: bool,
    pub staking_tick: Duration,
    /// Whether to probe STUN servers for the external address.
    pub discover_external_ip: bool,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            stake: true,
            staking_tick: blockprod::DEFAULT_TICK,
            discover_external_ip: false,
        }
    }
}

/// The owning context replacing the original's process-wide singletons.
/// Subsystems reference each other through this record; none owns another.
/// Dropping the context tears the workers down in reverse start order.
pub struct NodeContext {
    chain_config: Arc<ChainConfig>,
    chainstate: Arc<Chainstate>,
    mempool: Arc<Mempool>,
    wallet: Arc<RwLock<Wallet>>,
    relocker: Arc<WalletRelocker>,
    warnings: Arc<Warnings>,
    shutdown: Arc<RelaxedAtomicBool>,
    staker: Option<StakerHandle>,
    keypool_worker: Option<KeyPoolWorker>,
}

impl NodeContext {
    pub fn new(
        chain_config: Arc<ChainConfig>,
        time_getter: TimeGetter,
        options: NodeOptions,
    ) -> Self {
        let clock = Arc::new(NodeClock::new(time_getter.clone()));
        let chainstate = Arc::new(Chainstate::new(Arc::clone(&chain_config), clock));
        let mempool = Arc::new(Mempool::new());
        let wallet = Arc::new(RwLock::new(Wallet::new(
            Arc::clone(&chain_config),
            time_getter.clone(),
        )));
        let relocker = Arc::new(WalletRelocker::new(Arc::clone(&wallet), time_getter));
        let warnings = Arc::new(Warnings::new());
        let shutdown = Arc::new(RelaxedAtomicBool::new(false));

        // Chain ingress drives the wallet first (main-then-wallet order),
        // then evicts confirmed transactions from the mempool.
        {
            let wallet = Arc::clone(&wallet);
            chainstate.subscribe_to_events(Arc::new(move |block, height| {
                wallet.write().scan_new_block(block, height);
            }));
        }
        {
            let mempool = Arc::clone(&mempool);
            chainstate.subscribe_to_events(Arc::new(move |block, _height| {
                mempool.remove_block_transactions(block);
            }));
        }

        if options.discover_external_ip {
            spawn_external_ip_probe();
        }

        let keypool_worker = Some(KeyPoolWorker::spawn(Arc::clone(&wallet)));
        let staker = options.stake.then(|| {
            StakerHandle::spawn(
                StakingServices {
                    chainstate: Arc::clone(&chainstate),
                    mempool: Arc::clone(&mempool),
                    wallet: Arc::clone(&wallet),
                    warnings: Arc::clone(&warnings),
                    // A standalone node with no block download is its own
                    // source of truth.
                    network_synced: Arc::new(RelaxedAtomicBool::new(true)),
                },
                options.staking_tick,
            )
        });

        Self {
            chain_config,
            chainstate,
            mempool,
            wallet,
            relocker,
            warnings,
            shutdown,
            staker,
            keypool_worker,
        }
    }

    pub fn chain_config(&self) -> &Arc<ChainConfig> {
        &self.chain_config
    }

    pub fn chainstate(&self) -> &Arc<Chainstate> {
        &self.chainstate
    }

    pub fn mempool(&self) -> &Arc<Mempool> {
        &self.mempool
    }

    pub fn wallet(&self) -> &Arc<RwLock<Wallet>> {
        &self.wallet
    }

    pub fn warnings(&self) -> &Arc<Warnings> {
        &self.warnings
    }

    /// Set by `encryptwallet` (and future operator surfaces) to ask the
    /// daemon to exit.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load()
    }

    pub fn wallet_rpc(&self) -> WalletRpc {
        WalletRpc::new(
            Arc::clone(&self.chain_config),
            Arc::clone(&self.chainstate),
            Arc::clone(&self.mempool),
            Arc::clone(&self.wallet),
            Arc::clone(&self.relocker),
            Arc::clone(&self.warnings),
            Arc::clone(&self.shutdown),
        )
    }

    /// Stop the workers in reverse start order and release everything.
    pub fn shutdown(mut self) {
        log::info!("Node shutting down");
        if let Some(staker) = self.staker.take() {
            staker.stop();
        }
        if let Some(worker) = self.keypool_worker.take() {
            worker.stop();
        }
        self.relocker.shutdown();
    }
}

fn spawn_external_ip_probe() {
    let spawn_result = std::thread::Builder::new().name("ext-ip-probe".into()).spawn(|| {
        let entropy = make_pseudo_rng().gen();
        match networking::stun::get_external_ip_by_stun(
            entropy,
            STUN_SERVERS,
            &networking::stun::UdpTransport,
        ) {
            Some((address, server)) => log::info!(
                "External address {address} (reported by {})",
                STUN_SERVERS[server]
            ),
            None => log::info!("External address discovery failed"),
        }
    });
    if let Err(e) = spawn_result {
        log::warn!("Could not spawn the external IP probe: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chain::config::create_unit_test_config;

    #[test]
    fn context_starts_and_stops_cleanly() {
        let context = NodeContext::new(
            Arc::new(create_unit_test_config()),
            TimeGetter::default(),
            NodeOptions {
                stake: true,
                staking_tick: Duration::from_millis(50),
                discover_external_ip: false,
            },
        );
        assert!(!context.shutdown_requested());
        let rpc = context.wallet_rpc();
        let info = rpc.getinfo();
        assert_eq!(info.blocks, 0);
        context.shutdown();
    }

    #[test]
    fn encrypting_via_rpc_requests_shutdown() {
        let context = NodeContext::new(
            Arc::new(create_unit_test_config()),
            TimeGetter::default(),
            NodeOptions::default(),
        );
        let rpc = context.wallet_rpc();
        rpc.encryptwallet("passphrase").unwrap();
        assert!(context.shutdown_requested());
        context.shutdown();
    }
}
