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

//! The staking loop: one long-lived worker that, once per tick, snapshots
//! the chain tip and the wallet's stakable outputs, scans the candidate
//! time window through the kernel evaluator, and hands any winner to the
//! assembler and chain ingress.
//!
//! All reads within a tick come from one snapshot; concurrent tip movement
//! is only ever observed as a retryable submission failure. Transient
//! failures are retried next tick; fatal ones halt the worker and leave a
//! persistent warning for `getinfo`.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chainstate::Chainstate;
use common::chain::block::timestamp::BlockTimestamp;
use common::chain::{GenBlock, UtxoOutPoint};
use common::primitives::{Id, Idable};
use common::uint::Uint256;
use consensus::evaluate_kernel;
use consensus::StakedOutput;
use logging::log;
use mempool::Mempool;
use parking_lot::{Condvar, Mutex, RwLock};
use utils::atomics::RelaxedAtomicBool;
use utils::warnings::Warnings;
use wallet::Wallet;

use crate::block_maker::{assemble_pos_block, WinningKernel};
use crate::error::BlockProductionError;

pub const DEFAULT_TICK: Duration = Duration::from_millis(500);

/// Everything the staking worker needs, shared by reference; no subsystem
/// owns another.
#[derive(Clone)]
pub struct StakingServices {
    pub chainstate: Arc<Chainstate>,
    pub mempool: Arc<Mempool>,
    pub wallet: Arc<RwLock<Wallet>>,
    pub warnings: Arc<Warnings>,
    /// Cleared while initial block download is in progress.
    pub network_synced: Arc<RelaxedAtomicBool>,
}

pub struct StakerHandle {
    shutdown: Arc<RelaxedAtomicBool>,
    wakeup: Arc<(Mutex<()>, Condvar)>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl StakerHandle {
    /// Spawn the staking worker. At most one per wallet; the caller owns
    /// the handle and stops it on shutdown.
    pub fn spawn(services: StakingServices, tick: Duration) -> Self {
        let shutdown = Arc::new(RelaxedAtomicBool::new(false));
        let wakeup = Arc::new((Mutex::new(()), Condvar::new()));
        let thread = {
            let shutdown = Arc::clone(&shutdown);
            let wakeup = Arc::clone(&wakeup);
            std::thread::Builder::new()
                .name("staking-loop".into())
                .spawn(move || staking_loop(services, tick, shutdown, wakeup))
                .expect("spawning the staking thread cannot fail")
        };
        Self {
            shutdown,
            wakeup,
            thread: Some(thread),
        }
    }

    /// Request shutdown and wait for the worker to exit at the next tick
    /// boundary; an in-flight assembly completes first.
    pub fn stop(mut self) {
        self.shutdown.store(true);
        self.wakeup.1.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for StakerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true);
        self.wakeup.1.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn staking_loop(
    services: StakingServices,
    tick: Duration,
    shutdown: Arc<RelaxedAtomicBool>,
    wakeup: Arc<(Mutex<()>, Condvar)>,
) {
    log::info!("Staking loop started");
    // Guard against ever signing two blocks for the same (previous block,
    // coinstake input) pair, even across retries.
    let mut submitted: BTreeSet<(Id<GenBlock>, UtxoOutPoint)> = BTreeSet::new();

    loop {
        {
            let mut guard = wakeup.0.lock();
            wakeup.1.wait_for(&mut guard, tick);
        }
        if shutdown.load() {
            break;
        }
        match staking_tick(&services, &mut submitted) {
            Ok(()) => {}
            Err(e) if e.is_retryable() => {
                log::debug!("Staking tick hit a transient error, retrying: {e}");
            }
            Err(e) => {
                let warning = format!("Staking halted: {e}");
                log::error!("{warning}");
                services.warnings.set(warning);
                break;
            }
        }
    }
    log::info!("Staking loop stopped");
}

fn staking_tick(
    services: &StakingServices,
    submitted: &mut BTreeSet<(Id<GenBlock>, UtxoOutPoint)>,
) -> Result<(), BlockProductionError> {
    if !services.network_synced.load() {
        return Ok(());
    }
    // Snapshot phase: tip, stakable set and policy under one wallet read.
    let tip = services.chainstate.get_best();
    let (can_stake, utxos) = {
        let wallet = services.wallet.read();
        (wallet.can_stake(), wallet.stakable_utxos())
    };
    if !can_stake || utxos.is_empty() {
        return Ok(());
    }
    if submitted.len() > 1024 {
        // Pairs for stale tips can never be re-attempted on this chain.
        submitted.retain(|(prev, _)| *prev == tip.block_id);
    }

    let chain_config = services.chainstate.chain_config();
    let now = services.chainstate.clock().adjusted_time().as_secs_since_epoch();
    let window_start = (tip.timestamp.as_int_seconds() + 1)
        .max(now.saturating_sub(chain_config.max_reorg_window()));
    let window_end = now + chain_config.max_future_drift();
    if window_start > window_end {
        return Ok(());
    }

    let granularity = chain_config.stake_timestamp_mask() + 1;
    let mut best: Option<(Uint256, WinningKernel)> = None;

    for utxo in &utxos {
        if submitted.contains(&(tip.block_id, utxo.outpoint)) {
            continue;
        }
        let staked = StakedOutput {
            tx_timestamp: utxo.tx_timestamp,
            tx_offset: utxo.tx_offset,
            output_index: utxo.outpoint.output_index(),
            value: utxo.output.value(),
        };
        let mut t = window_start.div_ceil(granularity) * granularity;
        while t <= window_end {
            let candidate = BlockTimestamp::from_int_seconds(t);
            t += granularity;
            if candidate.as_int_seconds() <= tip.timestamp.as_int_seconds() {
                continue;
            }
            if candidate < utxo.tx_timestamp {
                continue;
            }
            let proof = evaluate_kernel(
                chain_config,
                tip.pos_target,
                tip.stake_modifier,
                tip.timestamp,
                &staked,
                candidate,
            )?;
            if let Some(proof) = proof {
                // Smallest hash wins the tick, not the largest stake.
                let hash_value = Uint256::from(proof.hash);
                let better = best
                    .as_ref()
                    .map_or(true, |(current, _)| hash_value < *current);
                if better {
                    best = Some((
                        hash_value,
                        WinningKernel {
                            utxo: utxo.clone(),
                            proof,
                        },
                    ));
                }
            }
        }
    }

    let Some((_, winner)) = best else {
        return Ok(());
    };

    log::info!(
        "Kernel found for output {:?} at time {}",
        winner.utxo.outpoint,
        winner.proof.timestamp
    );
    let block = assemble_pos_block(
        chain_config,
        &services.mempool,
        &services.wallet,
        &tip,
        &winner,
    )?;
    submitted.insert((tip.block_id, winner.utxo.outpoint));

    let block_id = block.get_id();
    services.chainstate.process_block(block.clone())?;
    services.mempool.remove_block_transactions(&block);
    log::info!("Minted proof-of-stake block {block_id}");
    Ok(())
}
