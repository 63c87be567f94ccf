// Copyright (c) 2022 RBB S.r.l
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

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::{Block, GenBlock};
use common::primitives::{Amount, BlockHeight, Compact, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    ProofOfWork,
    ProofOfStake,
}

/// One entry of the in-memory block index. Owned by the chain view;
/// everything else gets copies, never references into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockIndexEntry {
    pub block_id: Id<GenBlock>,
    pub prev_block_id: Id<GenBlock>,
    pub height: BlockHeight,
    pub timestamp: BlockTimestamp,
    pub bits: Compact,
    pub kind: BlockKind,
    pub money_supply: Amount,
    pub stake_modifier: u64,
    pub stake_modifier_checksum: u32,
}

/// An immutable snapshot of the best chain, swapped atomically on every
/// connected block. Readers clone the `Arc` and can never observe a
/// partially updated tip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainTip {
    pub block_id: Id<GenBlock>,
    pub height: BlockHeight,
    pub timestamp: BlockTimestamp,
    /// Target for the next proof-of-stake block.
    pub pos_target: Compact,
    pub stake_modifier: u64,
    pub money_supply: Amount,
}

/// Where a confirmed transaction sits in the chain; enough for the kernel
/// to reconstruct its inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxLocator {
    pub block_id: Id<Block>,
    pub tx_index: u32,
    /// Byte offset of the transaction inside its encoded block.
    pub tx_offset: u32,
    pub timestamp: BlockTimestamp,
}
