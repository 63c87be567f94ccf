// Copyright (c) 2022-2023 RBB S.r.l
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

//! The chain view and block ingress. One writer (ingress), any number of
//! snapshot readers; the tip is an `Arc` swapped under the write lock, so a
//! reader either sees the old tip or the new one, never a mix.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::block::{calculate_tx_merkle_root, Block};
use common::chain::config::ChainConfig;
use common::chain::signature::verify_input_signature;
use common::chain::{Destination, GenBlock, Transaction, TxOutput, UtxoOutPoint};
use common::primitives::{Amount, BlockHeight, Id, Idable};
use consensus::pos::coin_age::{coin_day, proof_of_stake_reward};
use consensus::pos::stake_modifier::{compute_next_stake_modifier, stake_modifier_checksum};
use consensus::{check_stake_kernel_hash, compute_kernel_hash, StakedOutput};
use logging::log;
use parking_lot::RwLock;
use utils::ensure;

use crate::block_index::{BlockIndexEntry, BlockKind, ChainTip, TxLocator};
use crate::clock::NodeClock;
use crate::error::ChainstateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DifficultyKind {
    ProofOfWork,
    ProofOfStake,
}

/// Handler invoked for every connected block, while the chain lock is held.
/// Handlers take their own locks after it (main-before-wallet order) and
/// must not call back into the chain view.
pub type BlockConnectedHandler = Arc<dyn Fn(&Block, BlockHeight) + Send + Sync>;

struct ChainstateData {
    index: BTreeMap<Id<GenBlock>, BlockIndexEntry>,
    blocks: BTreeMap<Id<GenBlock>, Block>,
    tx_index: BTreeMap<Id<Transaction>, TxLocator>,
    spent_outpoints: BTreeSet<UtxoOutPoint>,
    tip: Arc<ChainTip>,
}

pub struct Chainstate {
    chain_config: Arc<ChainConfig>,
    clock: Arc<NodeClock>,
    data: RwLock<ChainstateData>,
    subscribers: RwLock<Vec<BlockConnectedHandler>>,
}

impl Chainstate {
    pub fn new(chain_config: Arc<ChainConfig>, clock: Arc<NodeClock>) -> Self {
        let genesis = chain_config.genesis_block().clone();
        let genesis_id = chain_config.genesis_block_id();
        let genesis_entry = BlockIndexEntry {
            block_id: genesis_id,
            prev_block_id: Id::zero(),
            height: BlockHeight::zero(),
            timestamp: genesis.timestamp(),
            bits: genesis.header().bits(),
            kind: BlockKind::ProofOfWork,
            money_supply: Amount::ZERO,
            stake_modifier: 0,
            stake_modifier_checksum: 0,
        };
        let tip = Arc::new(ChainTip {
            block_id: genesis_id,
            height: BlockHeight::zero(),
            timestamp: genesis.timestamp(),
            pos_target: chain_config.pos_target_limit_compact(),
            stake_modifier: 0,
            money_supply: Amount::ZERO,
        });

        let mut index = BTreeMap::new();
        index.insert(genesis_id, genesis_entry);
        let mut blocks = BTreeMap::new();
        let mut tx_index = BTreeMap::new();
        index_block_txs(&mut tx_index, &genesis);
        blocks.insert(genesis_id, genesis);

        Self {
            chain_config,
            clock,
            data: RwLock::new(ChainstateData {
                index,
                blocks,
                tx_index,
                spent_outpoints: BTreeSet::new(),
                tip,
            }),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn chain_config(&self) -> &Arc<ChainConfig> {
        &self.chain_config
    }

    pub fn clock(&self) -> &Arc<NodeClock> {
        &self.clock
    }

    /// Snapshot of the best chain.
    pub fn get_best(&self) -> Arc<ChainTip> {
        Arc::clone(&self.data.read().tip)
    }

    pub fn get_block_index(&self, id: &Id<GenBlock>) -> Option<BlockIndexEntry> {
        self.data.read().index.get(id).copied()
    }

    pub fn get_block(&self, id: &Id<GenBlock>) -> Option<Block> {
        self.data.read().blocks.get(id).cloned()
    }

    pub fn get_tx_locator(&self, tx_id: &Id<Transaction>) -> Option<TxLocator> {
        self.data.read().tx_index.get(tx_id).copied()
    }

    pub fn is_outpoint_spent(&self, outpoint: &UtxoOutPoint) -> bool {
        self.data.read().spent_outpoints.contains(outpoint)
    }

    /// The most recent proof-of-stake block at or below the given index
    /// entry, walking predecessors.
    pub fn get_last_pos_index(&self, from: &Id<GenBlock>) -> Option<BlockIndexEntry> {
        let data = self.data.read();
        let mut cursor = *from;
        loop {
            let entry = data.index.get(&cursor)?;
            if entry.kind == BlockKind::ProofOfStake {
                return Some(*entry);
            }
            if entry.height == BlockHeight::zero() {
                return None;
            }
            cursor = entry.prev_block_id;
        }
    }

    pub fn get_difficulty(&self, kind: DifficultyKind) -> f64 {
        let tip = self.get_best();
        let bits = match kind {
            DifficultyKind::ProofOfStake => self
                .get_last_pos_index(&tip.block_id)
                .map_or(self.chain_config.pos_target_limit_compact(), |entry| entry.bits),
            // PoW issuance ended with the chain's bootstrap; its difficulty
            // is whatever the genesis era left behind.
            DifficultyKind::ProofOfWork => self.chain_config.genesis_block().header().bits(),
        };
        consensus::difficulty::compact_to_difficulty(bits)
    }

    pub fn subscribe_to_events(&self, handler: BlockConnectedHandler) {
        self.subscribers.write().push(handler);
    }

    /// Connect a block on top of the current tip. This is the single writer
    /// path; everything it checks is checked under one write lock, and
    /// subscribers observe blocks in connection order.
    pub fn process_block(&self, block: Block) -> Result<(), ChainstateError> {
        let block_id = block.get_id();
        let block_gen_id: Id<GenBlock> = block_id.into();
        let mut data = self.data.write();

        ensure!(
            !data.index.contains_key(&block_gen_id),
            ChainstateError::BlockAlreadyKnown
        );

        let prev_id = *block.prev_block_id();
        let tip_id = data.tip.block_id;
        ensure!(
            prev_id == tip_id,
            ChainstateError::TipMoved {
                tip: tip_id,
                prev: prev_id,
            }
        );
        let prev_entry = *data.index.get(&prev_id).expect("tip is always indexed");

        self.check_timestamps(&block, &prev_entry)?;
        ensure!(
            calculate_tx_merkle_root(block.transactions()) == block.header().merkle_root(),
            ChainstateError::MerkleRootMismatch
        );
        ensure!(
            block
                .transactions()
                .first()
                .is_some_and(|tx| tx.is_coinbase()),
            ChainstateError::MissingCoinbase
        );

        let kind = if block.is_proof_of_stake() {
            self.check_proof_of_stake(&data, &block, &prev_entry)?;
            BlockKind::ProofOfStake
        } else {
            BlockKind::ProofOfWork
        };

        // No confirmed output may be spent twice across the whole chain.
        let mut spent_now = BTreeSet::new();
        for tx in block.transactions() {
            for input in tx.inputs() {
                if let Some(outpoint) = input.utxo_outpoint() {
                    ensure!(
                        !data.spent_outpoints.contains(outpoint) && spent_now.insert(*outpoint),
                        ChainstateError::TransactionDoubleSpend
                    );
                }
            }
        }

        let minted = self.block_minted_amount(&data, &block, kind)?;
        let money_supply = (prev_entry.money_supply + minted)
            .ok_or(ChainstateError::AmountArithmeticOverflow)?;

        let stake_modifier = compute_next_stake_modifier(prev_entry.stake_modifier, &block_id);
        let entry = BlockIndexEntry {
            block_id: block_id.into(),
            prev_block_id: prev_id,
            height: prev_entry.height.next_height(),
            timestamp: block.timestamp(),
            bits: block.header().bits(),
            kind,
            money_supply,
            stake_modifier,
            stake_modifier_checksum: stake_modifier_checksum(
                prev_entry.stake_modifier_checksum,
                stake_modifier,
            ),
        };

        let pos_target = match kind {
            BlockKind::ProofOfStake => block.header().bits(),
            BlockKind::ProofOfWork => data.tip.pos_target,
        };
        let new_tip = Arc::new(ChainTip {
            block_id: entry.block_id,
            height: entry.height,
            timestamp: entry.timestamp,
            pos_target,
            stake_modifier,
            money_supply,
        });

        data.spent_outpoints.extend(spent_now);
        index_block_txs(&mut data.tx_index, &block);
        data.index.insert(entry.block_id, entry);
        data.blocks.insert(entry.block_id, block.clone());
        data.tip = new_tip;

        log::info!(
            "Connected block {} at height {} ({:?})",
            entry.block_id,
            entry.height,
            kind
        );

        // Still under the chain lock: handlers take the wallet lock next,
        // which is the declared acquisition order, and see blocks in order.
        let subscribers = self.subscribers.read();
        for handler in subscribers.iter() {
            handler(&block, entry.height);
        }

        Ok(())
    }

    fn check_timestamps(
        &self,
        block: &Block,
        prev_entry: &BlockIndexEntry,
    ) -> Result<(), ChainstateError> {
        ensure!(
            block.timestamp() > prev_entry.timestamp,
            ChainstateError::TimestampNotAdvancing(block.timestamp(), prev_entry.timestamp)
        );
        let limit = BlockTimestamp::from_time(self.clock.adjusted_time())
            .add_int_seconds(self.chain_config.max_future_drift())
            .unwrap_or(BlockTimestamp::from_int_seconds(u64::MAX));
        ensure!(
            block.timestamp() <= limit,
            ChainstateError::TimestampTooFarInFuture(block.timestamp(), limit)
        );
        Ok(())
    }

    fn resolve_staked_output(
        &self,
        data: &ChainstateData,
        outpoint: &UtxoOutPoint,
    ) -> Result<(StakedOutput, TxOutput), ChainstateError> {
        let locator = data
            .tx_index
            .get(&outpoint.source_id())
            .copied()
            .ok_or(ChainstateError::KernelTransactionNotFound)?;
        let containing_block_id: Id<GenBlock> = locator.block_id.into();
        let block = data
            .blocks
            .get(&containing_block_id)
            .ok_or(ChainstateError::KernelTransactionNotFound)?;
        let tx = block
            .transactions()
            .get(locator.tx_index as usize)
            .ok_or(ChainstateError::KernelTransactionNotFound)?;
        let output = tx
            .outputs()
            .get(outpoint.output_index() as usize)
            .ok_or(ChainstateError::KernelOutputIndexOutOfRange(
                outpoint.output_index(),
            ))?
            .clone();
        let staked = StakedOutput {
            tx_timestamp: locator.timestamp,
            tx_offset: locator.tx_offset,
            output_index: outpoint.output_index(),
            value: output.value(),
        };
        Ok((staked, output))
    }

    fn check_proof_of_stake(
        &self,
        data: &ChainstateData,
        block: &Block,
        prev_entry: &BlockIndexEntry,
    ) -> Result<(), ChainstateError> {
        let coinstake = block.coinstake_transaction().expect("checked by caller");
        ensure!(
            coinstake.transaction().timestamp() == block.timestamp(),
            ChainstateError::CoinstakeTimeMismatch
        );
        ensure!(
            self.chain_config.mask_stake_timestamp(block.timestamp()) == block.timestamp(),
            ChainstateError::TimestampNotAligned
        );

        let outpoint = coinstake.inputs()[0]
            .utxo_outpoint()
            .expect("coinstake starts with a utxo input by definition");
        ensure!(
            !data.spent_outpoints.contains(outpoint),
            ChainstateError::KernelOutputAlreadySpent
        );

        let (staked, spent_output) = self.resolve_staked_output(data, outpoint)?;

        // The kernel must actually win at the block's timestamp.
        let kernel_hash = compute_kernel_hash(
            prev_entry.stake_modifier,
            prev_entry.timestamp,
            &staked,
            block.timestamp(),
        );
        let weight = consensus::pos::coin_age::coin_age_weight_secs(
            &self.chain_config,
            staked.tx_timestamp,
            block.timestamp().into_time(),
        );
        check_stake_kernel_hash(block.header().bits(), staked.value, weight, kernel_hash)?;

        // Only the holder of the staking key can produce this block: the
        // block signature key must hash to the staked destination and sign
        // the header id.
        let staked_pkh = match spent_output.destination() {
            Destination::PublicKeyHash(pkh) => *pkh,
            Destination::NoDestination | Destination::ScriptHash(_) => {
                return Err(ChainstateError::InvalidStakeDestination)
            }
        };
        let signature = block.signature().ok_or(ChainstateError::MissingBlockSignature)?;
        ensure!(
            common::address::PublicKeyHash::from_public_key(signature.public_key()) == staked_pkh,
            ChainstateError::BlockSignatureKeyMismatch
        );
        let header_id = block.header().get_id();
        ensure!(
            signature
                .public_key()
                .verify_message(signature.signature(), header_id.to_hash().as_bytes()),
            ChainstateError::BlockSignatureVerificationFailed
        );

        // The coinstake input witness must be valid too.
        match coinstake.signatures().first() {
            Some(common::chain::InputWitness::Standard(witness)) => {
                verify_input_signature(coinstake.transaction(), 0, &spent_output, witness)
                    .map_err(|_| ChainstateError::CoinstakeInputSignatureInvalid)?;
            }
            _ => return Err(ChainstateError::CoinstakeInputSignatureInvalid),
        }

        // Reward bound: payout minus principal must not exceed the coin-age
        // schedule.
        let payout = coinstake
            .transaction()
            .total_output_value()
            .ok_or(ChainstateError::AmountArithmeticOverflow)?;
        let coin_days = coin_day(
            &self.chain_config,
            staked.value,
            staked.tx_timestamp,
            block.timestamp().into_time(),
        )
        .ok_or(ChainstateError::AmountArithmeticOverflow)?;
        let allowed_reward = proof_of_stake_reward(&self.chain_config, coin_days)
            .ok_or(ChainstateError::AmountArithmeticOverflow)?;
        let allowed_total =
            (staked.value + allowed_reward).ok_or(ChainstateError::AmountArithmeticOverflow)?;
        ensure!(
            payout <= allowed_total,
            ChainstateError::ExcessiveCoinstakeReward
        );
        Ok(())
    }

    fn block_minted_amount(
        &self,
        data: &ChainstateData,
        block: &Block,
        kind: BlockKind,
    ) -> Result<Amount, ChainstateError> {
        match kind {
            BlockKind::ProofOfWork => Ok(Amount::ZERO),
            BlockKind::ProofOfStake => {
                let coinstake = block.coinstake_transaction().expect("kind implies coinstake");
                let outpoint = coinstake.inputs()[0]
                    .utxo_outpoint()
                    .expect("coinstake starts with a utxo input");
                let (staked, _) = self.resolve_staked_output(data, outpoint)?;
                let payout = coinstake
                    .transaction()
                    .total_output_value()
                    .ok_or(ChainstateError::AmountArithmeticOverflow)?;
                (payout - staked.value).ok_or(ChainstateError::AmountArithmeticOverflow)
            }
        }
    }
}

fn index_block_txs(tx_index: &mut BTreeMap<Id<Transaction>, TxLocator>, block: &Block) {
    let block_id = block.get_id();
    for (i, tx) in block.transactions().iter().enumerate() {
        let offset = block.tx_byte_offset(i).expect("index is in range");
        tx_index.insert(
            tx.get_id(),
            TxLocator {
                block_id,
                tx_index: i as u32,
                tx_offset: offset,
                timestamp: tx.transaction().timestamp(),
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chain::block::BlockHeader;
    use common::chain::config::create_unit_test_config;
    use common::chain::{InputWitness, SignedTransaction, TxInput};
    use common::primitives::Time;
    use common::time_getter::TimeGetter;

    fn fixed_time_chainstate(now: u64) -> Chainstate {
        let config = Arc::new(create_unit_test_config());
        let clock = Arc::new(NodeClock::new(TimeGetter::new(Arc::new(move || {
            Time::from_secs_since_epoch(now)
        }))));
        Chainstate::new(config, clock)
    }

    fn make_pow_block(
        chainstate: &Chainstate,
        prev: Id<GenBlock>,
        timestamp: u64,
    ) -> Block {
        let coinbase = Transaction::new(
            1,
            BlockTimestamp::from_int_seconds(timestamp),
            vec![TxInput::Coinbase],
            vec![TxOutput::empty_marker()],
        );
        let transactions = vec![
            SignedTransaction::new(coinbase, vec![InputWitness::NoSignature]).unwrap(),
        ];
        let header = BlockHeader::new(
            1,
            prev,
            calculate_tx_merkle_root(&transactions),
            BlockTimestamp::from_int_seconds(timestamp),
            chainstate.chain_config().pos_target_limit_compact(),
            0,
        );
        Block::new(header, None, transactions)
    }

    #[test]
    fn genesis_is_the_initial_tip() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let tip = chainstate.get_best();
        assert_eq!(tip.height, BlockHeight::zero());
        assert_eq!(tip.block_id, chainstate.chain_config().genesis_block_id());
        assert!(chainstate.get_block_index(&tip.block_id).is_some());
    }

    #[test]
    fn connecting_advances_the_tip_atomically() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time =
            chainstate.get_best().timestamp.as_int_seconds();

        let block = make_pow_block(&chainstate, genesis_id, genesis_time + 16);
        chainstate.process_block(block.clone()).unwrap();

        let tip = chainstate.get_best();
        assert_eq!(tip.height, BlockHeight::new(1));
        assert_eq!(tip.block_id, block.get_id().into());
        // Every transaction of the block is locatable.
        for tx in block.transactions() {
            assert!(chainstate.get_tx_locator(&tx.get_id()).is_some());
        }
    }

    #[test]
    fn stale_prev_is_a_transient_error() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time = chainstate.get_best().timestamp.as_int_seconds();

        let a = make_pow_block(&chainstate, genesis_id, genesis_time + 16);
        let b = make_pow_block(&chainstate, genesis_id, genesis_time + 32);
        chainstate.process_block(a).unwrap();
        let err = chainstate.process_block(b).unwrap_err();
        assert!(matches!(err, ChainstateError::TipMoved { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn duplicate_block_rejected() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time = chainstate.get_best().timestamp.as_int_seconds();

        let block = make_pow_block(&chainstate, genesis_id, genesis_time + 16);
        chainstate.process_block(block.clone()).unwrap();
        assert_eq!(
            chainstate.process_block(block),
            Err(ChainstateError::BlockAlreadyKnown)
        );
    }

    #[test]
    fn future_timestamp_rejected() {
        let now = 1_700_000_000;
        let chainstate = fixed_time_chainstate(now);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let drift = chainstate.chain_config().max_future_drift();

        let block = make_pow_block(&chainstate, genesis_id, now + drift + 100);
        assert!(matches!(
            chainstate.process_block(block),
            Err(ChainstateError::TimestampTooFarInFuture(_, _))
        ));
    }

    #[test]
    fn non_advancing_timestamp_rejected() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time = chainstate.get_best().timestamp.as_int_seconds();

        let block = make_pow_block(&chainstate, genesis_id, genesis_time);
        assert!(matches!(
            chainstate.process_block(block),
            Err(ChainstateError::TimestampNotAdvancing(_, _))
        ));
    }

    #[test]
    fn merkle_mismatch_rejected() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time = chainstate.get_best().timestamp.as_int_seconds();

        let good = make_pow_block(&chainstate, genesis_id, genesis_time + 16);
        let bad_header = BlockHeader::new(
            1,
            genesis_id,
            common::primitives::H256::zero(),
            good.timestamp(),
            good.header().bits(),
            0,
        );
        let bad = Block::new(bad_header, None, good.transactions().to_vec());
        assert_eq!(
            chainstate.process_block(bad),
            Err(ChainstateError::MerkleRootMismatch)
        );
    }

    #[test]
    fn subscribers_see_blocks_in_order() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let genesis_id = chainstate.chain_config().genesis_block_id();
        let genesis_time = chainstate.get_best().timestamp.as_int_seconds();

        let seen: Arc<parking_lot::Mutex<Vec<BlockHeight>>> =
            Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        chainstate.subscribe_to_events(Arc::new(move |_block, height| {
            seen_clone.lock().push(height);
        }));

        let a = make_pow_block(&chainstate, genesis_id, genesis_time + 16);
        let a_id = a.get_id();
        chainstate.process_block(a).unwrap();
        let b = make_pow_block(&chainstate, a_id.into(), genesis_time + 32);
        chainstate.process_block(b).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![BlockHeight::new(1), BlockHeight::new(2)]
        );
    }

    #[test]
    fn no_pos_block_means_no_last_pos_index() {
        let chainstate = fixed_time_chainstate(1_700_000_000);
        let tip = chainstate.get_best();
        assert_eq!(chainstate.get_last_pos_index(&tip.block_id), None);
        // And the PoS difficulty falls back to the target limit.
        let difficulty = chainstate.get_difficulty(DifficultyKind::ProofOfStake);
        assert!(difficulty > 0.0);
    }
}
