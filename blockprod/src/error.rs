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

use chainstate::ChainstateError;
use consensus::ConsensusPoSError;
use wallet::WalletError;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum BlockProductionError {
    #[error("The staked output is not a signable destination")]
    UnsignableStakeDestination,
    #[error("Signing the block header failed")]
    BlockSigningFailed,
    #[error("Reward arithmetic overflow")]
    RewardOverflow,
    #[error("Wallet refused to sign: {0}")]
    Wallet(#[from] WalletError),
    #[error("Kernel evaluation failed: {0}")]
    Consensus(#[from] ConsensusPoSError),
    #[error("Block submission failed: {0}")]
    Chainstate(#[from] ChainstateError),
}

impl BlockProductionError {
    /// Retryable errors are races with concurrent chain or mempool
    /// progress; the staking loop retries them on the next tick. Everything
    /// else means this worker cannot make progress.
    pub fn is_retryable(&self) -> bool {
        match self {
            BlockProductionError::Chainstate(e) => e.is_transient(),
            BlockProductionError::UnsignableStakeDestination
            | BlockProductionError::BlockSigningFailed
            | BlockProductionError::RewardOverflow
            | BlockProductionError::Wallet(_)
            | BlockProductionError::Consensus(_) => false,
        }
    }
}
