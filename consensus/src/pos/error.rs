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
use common::primitives::Compact;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum ConsensusPoSError {
    #[error("Bits to target conversion failed {0:?}")]
    BitsToTargetConversionFailed(Compact),
    #[error("Stake kernel hash failed to meet the target requirement")]
    StakeKernelHashTooHigh,
    #[error(
        "Stake candidate timestamp cannot precede the staked output's transaction (tx: {0}, candidate: {1})"
    )]
    TimestampViolation(BlockTimestamp, BlockTimestamp),
    #[error("Extended-precision arithmetic overflow in the kernel target comparison")]
    TargetArithmeticOverflow,
    #[error("The staked output's value overflows the coin-age computation")]
    CoinAgeArithmeticOverflow,
}
