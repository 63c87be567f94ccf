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
use common::chain::GenBlock;
use common::primitives::Id;
use consensus::ConsensusPoSError;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum ChainstateError {
    #[error("Block does not extend the current tip (tip: {tip}, prev: {prev})")]
    TipMoved {
        tip: Id<GenBlock>,
        prev: Id<GenBlock>,
    },
    #[error("Block already known")]
    BlockAlreadyKnown,
    #[error("Block timestamp {0} does not advance past the previous block's {1}")]
    TimestampNotAdvancing(BlockTimestamp, BlockTimestamp),
    #[error("Block timestamp {0} is too far in the future (limit: {1})")]
    TimestampTooFarInFuture(BlockTimestamp, BlockTimestamp),
    #[error("Merkle root mismatch")]
    MerkleRootMismatch,
    #[error("Block has no coinbase transaction in the first slot")]
    MissingCoinbase,
    #[error("Coinstake timestamp does not match the block timestamp")]
    CoinstakeTimeMismatch,
    #[error("Proof-of-stake timestamp is not aligned to the stake granularity")]
    TimestampNotAligned,
    #[error("Could not find the transaction pointed to by the kernel outpoint")]
    KernelTransactionNotFound,
    #[error("Kernel output index out of range: {0}")]
    KernelOutputIndexOutOfRange(u32),
    #[error("Kernel output already spent")]
    KernelOutputAlreadySpent,
    #[error("The staked output is not a pay-to-pubkey-hash destination")]
    InvalidStakeDestination,
    #[error("Proof-of-stake block carries no signature")]
    MissingBlockSignature,
    #[error("Block signature key does not match the staked output")]
    BlockSignatureKeyMismatch,
    #[error("Block signature verification failed")]
    BlockSignatureVerificationFailed,
    #[error("Coinstake input signature invalid")]
    CoinstakeInputSignatureInvalid,
    #[error("Coinstake pays out more than principal plus allowed reward")]
    ExcessiveCoinstakeReward,
    #[error("A transaction double-spends a confirmed output")]
    TransactionDoubleSpend,
    #[error("Amount arithmetic overflow while connecting a block")]
    AmountArithmeticOverflow,
    #[error("Kernel check failed: {0}")]
    KernelCheckFailed(#[from] ConsensusPoSError),
}

impl ChainstateError {
    /// Whether retrying the same submission after refreshing the view can
    /// succeed (a concurrent tip move), as opposed to the block itself being
    /// invalid.
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainstateError::TipMoved { .. })
    }
}
