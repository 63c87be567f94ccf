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

//! The UI/RPC projection of a stakable output, with a memoized minting
//! probability so list views do not recompute the convolution on every
//! repaint.

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::config::ChainConfig;
use common::chain::Transaction;
use common::primitives::{Amount, Id, Time};

use super::coin_age::coin_day;
use super::probability::prob_to_mint_within_minutes;

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProbabilityCache {
    difficulty: f64,
    minutes: u32,
    probability: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KernelRecord {
    pub txid: Id<Transaction>,
    pub tx_timestamp: BlockTimestamp,
    /// Rendered destination of the output, for display.
    pub address: String,
    pub value: Amount,
    pub output_index: u32,
    pub spent: bool,
    cache: Option<ProbabilityCache>,
}

impl KernelRecord {
    pub fn new(
        txid: Id<Transaction>,
        tx_timestamp: BlockTimestamp,
        address: String,
        value: Amount,
        output_index: u32,
        spent: bool,
    ) -> Self {
        Self {
            txid,
            tx_timestamp,
            address,
            value,
            output_index,
            spent,
            cache: None,
        }
    }

    pub fn coin_day(&self, chain_config: &ChainConfig, now: Time) -> u128 {
        coin_day(chain_config, self.value, self.tx_timestamp, now).unwrap_or(0)
    }

    /// Memoized on the last `(difficulty, minutes)` pair: list views poll
    /// with the same arguments until either changes.
    pub fn probability_within_minutes(
        &mut self,
        chain_config: &ChainConfig,
        difficulty: f64,
        minutes: u32,
        now: Time,
    ) -> f64 {
        if let Some(cache) = &self.cache {
            if cache.difficulty == difficulty && cache.minutes == minutes {
                return cache.probability;
            }
        }
        let probability = prob_to_mint_within_minutes(
            chain_config,
            difficulty,
            self.value,
            self.tx_timestamp,
            now,
            minutes,
        );
        self.cache = Some(ProbabilityCache {
            difficulty,
            minutes,
            probability,
        });
        probability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chain::config::{create_mainnet, COIN, ONE_DAY};
    use common::primitives::hash_encoded;

    fn record(now_secs: u64) -> KernelRecord {
        KernelRecord::new(
            Id::new(hash_encoded(&1u8)),
            BlockTimestamp::from_int_seconds(now_secs - 10 * ONE_DAY),
            "addr".into(),
            Amount::from_atoms(500 * COIN),
            0,
            false,
        )
    }

    #[test]
    fn cache_hits_on_same_inputs() {
        let config = create_mainnet();
        let now = Time::from_secs_since_epoch(2_000_000_000);
        let mut rec = record(2_000_000_000);

        let first = rec.probability_within_minutes(&config, 1000.0, 60, now);
        // A later "now" with the same (difficulty, minutes) returns the memo.
        let later = now.saturating_offset(600);
        assert_eq!(
            rec.probability_within_minutes(&config, 1000.0, 60, later),
            first
        );
        // Changing either key recomputes.
        let other = rec.probability_within_minutes(&config, 2000.0, 60, now);
        assert!(other <= first);
        let _ = rec.probability_within_minutes(&config, 2000.0, 120, now);
    }

    #[test]
    fn coin_day_overflow_collapses_to_zero() {
        let config = create_mainnet();
        let now = Time::from_secs_since_epoch(2_000_000_000);
        let mut rec = record(2_000_000_000);
        rec.value = Amount::MAX;
        assert_eq!(rec.coin_day(&config, now), 0);
    }
}
