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

use std::collections::BTreeMap;

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::config::ChainConfig;
use common::chain::{SignedTransaction, Transaction};
use common::primitives::{BlockHeight, Id, Idable, Time};

/// Where a wallet transaction currently stands relative to the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Confirmed {
        height: BlockHeight,
        block_timestamp: BlockTimestamp,
        /// Byte offset of the transaction inside its block; the stake
        /// kernel needs it for outputs staked later.
        tx_offset: u32,
    },
    /// Broadcast and observed in the local mempool, not yet in a block.
    InMempool,
    /// Neither confirmed nor in the mempool (e.g. evicted); kept for
    /// rebroadcast.
    Inactive,
}

/// A transaction the wallet tracks because it credits or debits the wallet.
///
/// `metadata` is the free-form string map carried through from the RPC
/// surface ("comment", "to", "from", "n", ...); it is an opaque bag and no
/// code may assume a closed key set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletTx {
    tx: SignedTransaction,
    state: TxState,
    /// Position in the merged (transactions + accounting entries) ordering.
    order_pos: u64,
    /// First-seen time, which is what listings report for unconfirmed txs.
    timestamp: Time,
    from_me: bool,
    all_inputs_from_me: bool,
    from_account: Option<String>,
    metadata: BTreeMap<String, String>,
}

impl WalletTx {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tx: SignedTransaction,
        state: TxState,
        order_pos: u64,
        timestamp: Time,
        from_me: bool,
        all_inputs_from_me: bool,
        from_account: Option<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            tx,
            state,
            order_pos,
            timestamp,
            from_me,
            all_inputs_from_me,
            from_account,
            metadata,
        }
    }

    pub fn tx(&self) -> &SignedTransaction {
        &self.tx
    }

    pub fn tx_id(&self) -> Id<Transaction> {
        self.tx.get_id()
    }

    pub fn state(&self) -> TxState {
        self.state
    }

    pub fn set_state(&mut self, state: TxState) {
        self.state = state;
    }

    pub fn order_pos(&self) -> u64 {
        self.order_pos
    }

    pub fn timestamp(&self) -> Time {
        self.timestamp
    }

    pub fn from_me(&self) -> bool {
        self.from_me
    }

    pub fn from_account(&self) -> Option<&String> {
        self.from_account.as_ref()
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    pub fn is_coinbase(&self) -> bool {
        self.tx.is_coinbase()
    }

    pub fn is_coinstake(&self) -> bool {
        self.tx.is_coinstake()
    }

    pub fn depth(&self, best_height: BlockHeight) -> u64 {
        match self.state {
            TxState::Confirmed { height, .. } => {
                best_height.checked_sub(height).map_or(0, |d| d + 1)
            }
            TxState::InMempool | TxState::Inactive => 0,
        }
    }

    pub fn blocks_to_maturity(&self, chain_config: &ChainConfig, best_height: BlockHeight) -> u64 {
        if !self.is_coinbase() && !self.is_coinstake() {
            return 0;
        }
        chain_config.coinbase_maturity().saturating_sub(self.depth(best_height))
    }

    pub fn is_mature(&self, chain_config: &ChainConfig, best_height: BlockHeight) -> bool {
        self.blocks_to_maturity(chain_config, best_height) == 0
    }

    /// `trusted ⇔ depth ≥ 1 ∨ (from-me ∧ all-inputs-from-me ∧ in-mempool)`.
    pub fn is_trusted(&self, best_height: BlockHeight) -> bool {
        self.depth(best_height) >= 1
            || (self.from_me && self.all_inputs_from_me && self.state == TxState::InMempool)
    }

    /// Reported block time when confirmed, first-seen time otherwise.
    pub fn display_time(&self) -> Time {
        match self.state {
            TxState::Confirmed {
                block_timestamp, ..
            } => block_timestamp.into_time(),
            TxState::InMempool | TxState::Inactive => self.timestamp,
        }
    }
}
