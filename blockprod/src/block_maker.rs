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

//! Assembles a proof-of-stake block around a winning kernel: the coinstake
//! transaction paying principal plus reward back to the staking key,
//! mempool transactions under the block's budgets, and the staker's block
//! signature.

use std::sync::Arc;

use chainstate::ChainTip;
use common::chain::block::timestamp::BlockTimestamp;
use common::chain::block::{calculate_tx_merkle_root, Block, BlockHeader, BlockSignature};
use common::chain::config::ChainConfig;
use common::chain::signature::sign_input;
use common::chain::{
    Destination, InputWitness, SignedTransaction, Transaction, TxInput, TxOutput,
};
use common::primitives::Idable;
use consensus::pos::coin_age::{coin_day, proof_of_stake_reward};
use consensus::KernelProof;
use crypto::key::PublicKey;
use mempool::tx_accumulator::BlockTxAccumulator;
use mempool::Mempool;
use parking_lot::RwLock;
use wallet::{destination_pkh, SpendableUtxo, Wallet};

use crate::error::BlockProductionError;

/// Upper bound on the encoded header, block signature and vector length
/// prefixes, reserved up front in the accumulator's size budget.
const HEADER_OVERHEAD: usize = 256;

/// A kernel evaluation that won, together with the output that won it.
#[derive(Debug, Clone)]
pub struct WinningKernel {
    pub utxo: SpendableUtxo,
    pub proof: KernelProof,
}

/// Build and sign a proof-of-stake block on top of `tip`.
///
/// The caller holds no locks; the wallet lock is taken briefly for key
/// access. A tip that moved since the snapshot surfaces later as a
/// retryable submission error.
pub fn assemble_pos_block(
    chain_config: &ChainConfig,
    mempool: &Mempool,
    wallet: &Arc<RwLock<Wallet>>,
    tip: &ChainTip,
    winner: &WinningKernel,
) -> Result<Block, BlockProductionError> {
    let timestamp = winner.proof.timestamp;
    let (coinstake, staker_key) =
        build_coinstake(chain_config, wallet, winner, timestamp)?;
    let coinbase = build_coinbase(chain_config, timestamp);

    // Mempool packing under the block budgets; the reward transactions and
    // header are already spoken for.
    let base_size = coinbase.encoded_size() + coinstake.encoded_size() + HEADER_OVERHEAD;
    let mut accumulator = BlockTxAccumulator::new(
        chain_config.max_block_size(),
        chain_config.max_block_sigops(),
        base_size,
        coinbase.inputs().len() + coinstake.inputs().len(),
    );
    mempool.collect_txs(&mut accumulator);
    let (pool_txs, _fees) = accumulator.finish();

    let mut transactions = vec![coinbase, coinstake];
    transactions.extend(pool_txs);

    let header = BlockHeader::new(
        chain_config.block_version(),
        tip.block_id,
        calculate_tx_merkle_root(&transactions),
        timestamp,
        tip.pos_target,
        0,
    );
    let header_id = header.get_id();
    let signature = staker_key
        .0
        .sign_message(header_id.to_hash().as_bytes())
        .map_err(|_| BlockProductionError::BlockSigningFailed)?;
    let block_signature = BlockSignature::new(staker_key.1, signature);

    Ok(Block::new(header, Some(block_signature), transactions))
}

fn build_coinstake(
    chain_config: &ChainConfig,
    wallet: &Arc<RwLock<Wallet>>,
    winner: &WinningKernel,
    timestamp: BlockTimestamp,
) -> Result<(SignedTransaction, (crypto::key::PrivateKey, PublicKey)), BlockProductionError> {
    let staked_value = winner.utxo.output.value();
    let pkh = destination_pkh(winner.utxo.output.destination())
        .ok_or(BlockProductionError::UnsignableStakeDestination)?;

    let coin_days = coin_day(
        chain_config,
        staked_value,
        winner.utxo.tx_timestamp,
        timestamp.into_time(),
    )
    .ok_or(BlockProductionError::RewardOverflow)?;
    let reward = proof_of_stake_reward(chain_config, coin_days)
        .ok_or(BlockProductionError::RewardOverflow)?;
    let total = (staked_value + reward).ok_or(BlockProductionError::RewardOverflow)?;

    // Principal plus reward returns to the staking key; large stakes split
    // in two so coin-age keeps accruing on both halves.
    let destination = Destination::PublicKeyHash(pkh);
    let mut outputs = vec![TxOutput::empty_marker()];
    if staked_value > chain_config.coinstake_split_threshold() {
        let half = (total / 2).ok_or(BlockProductionError::RewardOverflow)?;
        let rest = (total - half).ok_or(BlockProductionError::RewardOverflow)?;
        outputs.push(TxOutput::new(half, destination));
        outputs.push(TxOutput::new(rest, destination));
    } else {
        outputs.push(TxOutput::new(total, destination));
    }

    let tx = Transaction::new(
        chain_config.block_version(),
        timestamp,
        vec![TxInput::Utxo(winner.utxo.outpoint)],
        outputs,
    );

    // Key access is the only wallet touch; mint-only unlocks allow it.
    let private_key = wallet.read().private_key_for_destination(&pkh, true)?;
    let witness = sign_input(&private_key, &tx, 0, &winner.utxo.output)
        .map_err(wallet::WalletError::Signing)?;
    let public_key = PublicKey::from_private_key(&private_key);
    let signed = SignedTransaction::new(tx, vec![InputWitness::Standard(witness)])
        .map_err(wallet::WalletError::TransactionCreation)?;
    Ok((signed, (private_key, public_key)))
}

fn build_coinbase(chain_config: &ChainConfig, timestamp: BlockTimestamp) -> SignedTransaction {
    let tx = Transaction::new(
        chain_config.block_version(),
        timestamp,
        vec![TxInput::Coinbase],
        vec![TxOutput::empty_marker()],
    );
    SignedTransaction::new(tx, vec![InputWitness::NoSignature])
        .expect("one witness for one input")
}
