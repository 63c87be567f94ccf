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

//! Continuous approximations of the per-slot minting probability, used by
//! the wallet UI and RPC to answer "how likely is this output to mint within
//! N minutes". Advisory only: nothing here may feed a consensus decision,
//! which is why floating point is acceptable.

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::config::{ChainConfig, COIN, ONE_DAY};
use common::primitives::{Amount, Time};

use super::coin_age::coin_age_weight_secs;

/// Probability that one kernel evaluation of this output succeeds at
/// `time_offset` seconds in the future, at the given difficulty.
pub fn prob_to_mint_stake(
    chain_config: &ChainConfig,
    difficulty: f64,
    value: Amount,
    tx_timestamp: BlockTimestamp,
    now: Time,
    time_offset: u64,
) -> f64 {
    if difficulty <= 0.0 {
        return 0.0;
    }
    let target = (2.0f64).powi(224) / difficulty;
    let at = now.saturating_offset(time_offset as i64);
    let weight_days = (coin_age_weight_secs(chain_config, tx_timestamp, at) / ONE_DAY) as f64;
    let coin_age = (value.into_atoms() as f64 / COIN as f64) * weight_days;
    (target * coin_age / (2.0f64).powi(256)).clamp(0.0, 1.0)
}

/// Probability of minting at least once within `minutes`, convolving the
/// per-slot probability over the window one day at a time so the growing
/// coin-age of far-out days is accounted for.
pub fn prob_to_mint_within_minutes(
    chain_config: &ChainConfig,
    difficulty: f64,
    value: Amount,
    tx_timestamp: BlockTimestamp,
    now: Time,
    minutes: u32,
) -> f64 {
    let slot_secs = (chain_config.stake_timestamp_mask() + 1).max(1);
    let mut remaining = minutes as u64 * 60;
    let mut offset = 0u64;
    let mut failure = 1.0f64;
    while remaining > 0 {
        let chunk = remaining.min(ONE_DAY);
        let success = prob_to_mint_stake(
            chain_config,
            difficulty,
            value,
            tx_timestamp,
            now,
            offset,
        );
        let attempts = (chunk / slot_secs) as f64;
        failure *= (1.0 - success).powf(attempts);
        offset += chunk;
        remaining -= chunk;
    }
    1.0 - failure
}
