// Copyright (c) 2021-2023 RBB S.r.l
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

//! The network parameters record. Everything the consensus and wallet code
//! treats as "network defined" lives here so that tests can shrink ages and
//! maturities without touching the logic.

use crate::chain::block::timestamp::BlockTimestamp;
use crate::chain::block::{calculate_tx_merkle_root, Block, BlockHeader, GenBlock};
use crate::chain::transaction::{SignedTransaction, Transaction, TxInput, TxOutput};
use crate::primitives::{Amount, Compact, Id, Idable};
use crate::uint::Uint256;

/// Atoms per coin.
pub const COIN: u128 = 100_000_000;
/// Atoms per cent; reserve-balance amounts round to this.
pub const CENT: u128 = 1_000_000;
pub const ONE_DAY: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainType {
    Mainnet,
    Testnet,
    Regtest,
}

#[derive(Debug, Clone)]
pub struct ChainConfig {
    chain_type: ChainType,
    coin_ticker: &'static str,
    coin_decimals: u8,
    block_version: u32,
    /// Lower bound on how young a staked output may be.
    stake_min_age: u64,
    /// Upper clamp on the age credited to a staked output.
    stake_max_age: u64,
    /// Candidate timestamps are aligned by masking these low bits.
    stake_timestamp_mask: u64,
    /// How far into the future a block timestamp may run ahead of the
    /// adjusted clock.
    max_future_drift: u64,
    /// How far back the staking window may reach behind the current time.
    max_reorg_window: u64,
    coinbase_maturity: u64,
    min_tx_fee_per_kb: Amount,
    dust_threshold: Amount,
    max_block_size: usize,
    max_block_sigops: usize,
    /// Above this value a coinstake payout is split into two outputs.
    coinstake_split_threshold: Amount,
    /// Reward atoms granted per accumulated coin-day.
    pos_reward_atoms_per_coin_day: u128,
    pos_target_limit_compact: Compact,
    genesis_block: Block,
}

impl ChainConfig {
    pub fn chain_type(&self) -> ChainType {
        self.chain_type
    }

    pub fn coin_ticker(&self) -> &'static str {
        self.coin_ticker
    }

    pub fn coin_decimals(&self) -> u8 {
        self.coin_decimals
    }

    pub fn block_version(&self) -> u32 {
        self.block_version
    }

    pub fn stake_min_age(&self) -> u64 {
        self.stake_min_age
    }

    pub fn stake_max_age(&self) -> u64 {
        self.stake_max_age
    }

    pub fn stake_timestamp_mask(&self) -> u64 {
        self.stake_timestamp_mask
    }

    /// Quantize a candidate timestamp down to the stake granularity.
    pub fn mask_stake_timestamp(&self, timestamp: BlockTimestamp) -> BlockTimestamp {
        BlockTimestamp::from_int_seconds(
            timestamp.as_int_seconds() & !self.stake_timestamp_mask,
        )
    }

    pub fn max_future_drift(&self) -> u64 {
        self.max_future_drift
    }

    pub fn max_reorg_window(&self) -> u64 {
        self.max_reorg_window
    }

    pub fn coinbase_maturity(&self) -> u64 {
        self.coinbase_maturity
    }

    pub fn min_tx_fee_per_kb(&self) -> Amount {
        self.min_tx_fee_per_kb
    }

    pub fn dust_threshold(&self) -> Amount {
        self.dust_threshold
    }

    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    pub fn max_block_sigops(&self) -> usize {
        self.max_block_sigops
    }

    pub fn coinstake_split_threshold(&self) -> Amount {
        self.coinstake_split_threshold
    }

    pub fn pos_reward_atoms_per_coin_day(&self) -> u128 {
        self.pos_reward_atoms_per_coin_day
    }

    pub fn pos_target_limit_compact(&self) -> Compact {
        self.pos_target_limit_compact
    }

    pub fn pos_target_limit(&self) -> Uint256 {
        self.pos_target_limit_compact
            .try_into()
            .expect("target limit is a valid compact by construction")
    }

    pub fn genesis_block(&self) -> &Block {
        &self.genesis_block
    }

    pub fn genesis_block_id(&self) -> Id<GenBlock> {
        self.genesis_block.get_id().into()
    }
}

fn make_genesis_block(version: u32, timestamp: BlockTimestamp, bits: Compact) -> Block {
    let coinbase = Transaction::new(
        version,
        timestamp,
        vec![TxInput::Coinbase],
        vec![TxOutput::empty_marker()],
    );
    let coinbase = SignedTransaction::new(
        coinbase,
        vec![crate::chain::transaction::InputWitness::NoSignature],
    )
    .expect("one witness for one input");
    let transactions = vec![coinbase];
    let header = BlockHeader::new(
        version,
        Id::zero(),
        calculate_tx_merkle_root(&transactions),
        timestamp,
        bits,
        0,
    );
    Block::new(header, None, transactions)
}

#[derive(Debug, Clone)]
pub struct Builder {
    chain_type: ChainType,
    stake_min_age: u64,
    stake_max_age: u64,
    stake_timestamp_mask: u64,
    max_future_drift: u64,
    max_reorg_window: u64,
    coinbase_maturity: u64,
    coinstake_split_threshold: Amount,
    pos_reward_atoms_per_coin_day: u128,
    pos_target_limit_compact: Compact,
    genesis_timestamp: BlockTimestamp,
}

impl Builder {
    pub fn new(chain_type: ChainType) -> Self {
        let genesis_timestamp = match chain_type {
            ChainType::Mainnet => 1_690_000_000,
            ChainType::Testnet => 1_690_000_016,
            ChainType::Regtest => 1_690_000_032,
        };
        Self {
            chain_type,
            stake_min_age: ONE_DAY,
            stake_max_age: 30 * ONE_DAY,
            stake_timestamp_mask: 0xF,
            max_future_drift: 2 * 60,
            max_reorg_window: 10 * 60,
            coinbase_maturity: 500,
            coinstake_split_threshold: Amount::from_atoms(2_000 * COIN),
            // Roughly a 2% yearly rate: 0.02 * COIN / 365 per coin-day.
            pos_reward_atoms_per_coin_day: 5_479,
            pos_target_limit_compact: Compact(0x1e0fffff),
            genesis_timestamp: BlockTimestamp::from_int_seconds(genesis_timestamp),
        }
    }

    pub fn stake_min_age(mut self, value: u64) -> Self {
        self.stake_min_age = value;
        self
    }

    pub fn stake_max_age(mut self, value: u64) -> Self {
        self.stake_max_age = value;
        self
    }

    pub fn stake_timestamp_mask(mut self, value: u64) -> Self {
        self.stake_timestamp_mask = value;
        self
    }

    pub fn max_future_drift(mut self, value: u64) -> Self {
        self.max_future_drift = value;
        self
    }

    pub fn max_reorg_window(mut self, value: u64) -> Self {
        self.max_reorg_window = value;
        self
    }

    pub fn coinbase_maturity(mut self, value: u64) -> Self {
        self.coinbase_maturity = value;
        self
    }

    pub fn coinstake_split_threshold(mut self, value: Amount) -> Self {
        self.coinstake_split_threshold = value;
        self
    }

    pub fn pos_reward_atoms_per_coin_day(mut self, value: u128) -> Self {
        self.pos_reward_atoms_per_coin_day = value;
        self
    }

    pub fn pos_target_limit_compact(mut self, value: Compact) -> Self {
        self.pos_target_limit_compact = value;
        self
    }

    pub fn genesis_timestamp(mut self, value: BlockTimestamp) -> Self {
        self.genesis_timestamp = value;
        self
    }

    pub fn build(self) -> ChainConfig {
        let block_version = 1;
        ChainConfig {
            chain_type: self.chain_type,
            coin_ticker: "EMB",
            coin_decimals: 8,
            block_version,
            stake_min_age: self.stake_min_age,
            stake_max_age: self.stake_max_age,
            stake_timestamp_mask: self.stake_timestamp_mask,
            max_future_drift: self.max_future_drift,
            max_reorg_window: self.max_reorg_window,
            coinbase_maturity: self.coinbase_maturity,
            min_tx_fee_per_kb: Amount::from_atoms(CENT),
            dust_threshold: Amount::from_atoms(CENT / 100),
            max_block_size: 1_000_000,
            max_block_sigops: 20_000,
            coinstake_split_threshold: self.coinstake_split_threshold,
            pos_reward_atoms_per_coin_day: self.pos_reward_atoms_per_coin_day,
            pos_target_limit_compact: self.pos_target_limit_compact,
            genesis_block: make_genesis_block(
                block_version,
                self.genesis_timestamp,
                self.pos_target_limit_compact,
            ),
        }
    }
}

pub fn create_mainnet() -> ChainConfig {
    Builder::new(ChainType::Mainnet).build()
}

/// A configuration with ages and maturities small enough for unit tests to
/// cross them with hand-picked timestamps.
pub fn create_unit_test_config() -> ChainConfig {
    Builder::new(ChainType::Regtest)
        .stake_min_age(60 * 60)
        .stake_max_age(8 * 60 * 60)
        .coinbase_maturity(2)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_stable() {
        let a = create_mainnet();
        let b = create_mainnet();
        assert_eq!(a.genesis_block_id(), b.genesis_block_id());
        assert_ne!(
            a.genesis_block_id(),
            create_unit_test_config().genesis_block_id()
        );
    }

    #[test]
    fn timestamp_masking() {
        let config = create_mainnet();
        let t = BlockTimestamp::from_int_seconds(1_700_000_013);
        let masked = config.mask_stake_timestamp(t);
        assert_eq!(masked.as_int_seconds() % 16, 0);
        assert!(masked <= t);
        assert_eq!(config.mask_stake_timestamp(masked), masked);
    }

    #[test]
    fn target_limit_expands() {
        let config = create_mainnet();
        assert!(config.pos_target_limit() > Uint256::ZERO);
    }
}
