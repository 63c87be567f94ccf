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

//! The coin-age model, shared between the kernel evaluator and the wallet's
//! minting estimates. Consensus-facing functions are integer arithmetic
//! only; [`age_days`] is the one floating point helper and is display-only.

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::config::{ChainConfig, COIN, ONE_DAY};
use common::primitives::{Amount, Time};

/// Seconds of age credited to an output at `now`: zero until the output is
/// `stake_min_age` old, then growing second by second, clamped at
/// `stake_max_age`.
pub fn coin_age_weight_secs(
    chain_config: &ChainConfig,
    tx_timestamp: BlockTimestamp,
    now: Time,
) -> u64 {
    let age = now.as_secs_since_epoch().saturating_sub(tx_timestamp.as_int_seconds());
    age.saturating_sub(chain_config.stake_min_age()).min(chain_config.stake_max_age())
}

/// Whole coin-days accumulated by an output:
/// `value * weight / (COIN * ONE_DAY)`. `None` on overflow.
pub fn coin_day(
    chain_config: &ChainConfig,
    value: Amount,
    tx_timestamp: BlockTimestamp,
    now: Time,
) -> Option<u128> {
    let weight = coin_age_weight_secs(chain_config, tx_timestamp, now);
    value
        .into_atoms()
        .checked_mul(weight as u128)
        .map(|product| product / (COIN * ONE_DAY as u128))
}

/// Age of an output in (fractional) days; for display only.
pub fn age_days(tx_timestamp: BlockTimestamp, now: Time) -> f64 {
    now.as_secs_since_epoch().saturating_sub(tx_timestamp.as_int_seconds()) as f64
        / ONE_DAY as f64
}

/// The proof-of-stake reward for a given accumulated coin-age. The schedule
/// is linear in coin-days and therefore monotone non-decreasing.
pub fn proof_of_stake_reward(chain_config: &ChainConfig, coin_days: u128) -> Option<Amount> {
    coin_days
        .checked_mul(chain_config.pos_reward_atoms_per_coin_day())
        .map(Amount::from_atoms)
}

/// Estimate of the reward an output would earn if it minted a block
/// `lookahead_minutes` from `now`. Zero when the lookahead is shorter than
/// the minimum stake age, since the output cannot win inside that window.
/// Advisory; errors collapse to zero.
pub fn expected_reward(
    chain_config: &ChainConfig,
    value: Amount,
    tx_timestamp: BlockTimestamp,
    now: Time,
    lookahead_minutes: u64,
) -> Amount {
    let lookahead_secs = lookahead_minutes.saturating_mul(60);
    if lookahead_secs < chain_config.stake_min_age() {
        return Amount::ZERO;
    }
    let at = now.saturating_offset(lookahead_secs as i64);
    coin_day(chain_config, value, tx_timestamp, at)
        .and_then(|days| proof_of_stake_reward(chain_config, days))
        .unwrap_or(Amount::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chain::config::create_mainnet;
    use proptest::prelude::*;

    fn ts(secs: u64) -> BlockTimestamp {
        BlockTimestamp::from_int_seconds(secs)
    }

    fn t(secs: u64) -> Time {
        Time::from_secs_since_epoch(secs)
    }

    #[test]
    fn clamp_at_max_age() {
        let config = create_mainnet();
        let now = 2_000_000_000u64;
        let tx_time = now - config.stake_max_age() - 10 * ONE_DAY;
        let value = Amount::from_atoms(100 * COIN);

        let days = coin_day(&config, value, ts(tx_time), t(now)).unwrap();
        assert_eq!(days, 100 * (config.stake_max_age() / ONE_DAY) as u128);

        // Ten more days of waiting change nothing.
        let later = now + 10 * ONE_DAY;
        assert_eq!(coin_day(&config, value, ts(tx_time), t(later)).unwrap(), days);
    }

    #[test]
    fn zero_below_min_age() {
        let config = create_mainnet();
        let now = 2_000_000_000u64;
        let tx_time = now - config.stake_min_age() + 1;
        assert_eq!(
            coin_age_weight_secs(&config, ts(tx_time), t(now)),
            0
        );
        assert_eq!(
            coin_day(&config, Amount::from_atoms(100 * COIN), ts(tx_time), t(now)),
            Some(0)
        );
    }

    #[test]
    fn reward_monotone_in_coin_age() {
        let config = create_mainnet();
        let mut last = Amount::ZERO;
        for days in [0u128, 1, 10, 100, 10_000] {
            let reward = proof_of_stake_reward(&config, days).unwrap();
            assert!(reward >= last);
            last = reward;
        }
    }

    #[test]
    fn expected_reward_gated_by_min_age() {
        let config = create_mainnet();
        let now = 2_000_000_000u64;
        let value = Amount::from_atoms(1_000 * COIN);
        let tx_time = ts(now - 5 * ONE_DAY);

        let short = config.stake_min_age() / 60 - 1;
        assert_eq!(
            expected_reward(&config, value, tx_time, t(now), short),
            Amount::ZERO
        );

        let reward_day = expected_reward(&config, value, tx_time, t(now), 24 * 60);
        let reward_week = expected_reward(&config, value, tx_time, t(now), 7 * 24 * 60);
        assert!(reward_day > Amount::ZERO);
        assert!(reward_week >= reward_day);
    }

    proptest! {
        // Fixed value and observation time: age is non-increasing as the
        // output's transaction moves later in time.
        #[test]
        fn weight_non_increasing_in_tx_time(
            tx_a in 1_500_000_000u64..1_700_000_000,
            tx_b in 1_500_000_000u64..1_700_000_000,
        ) {
            let config = create_mainnet();
            let now = t(1_800_000_000);
            let (early, late) = if tx_a <= tx_b { (tx_a, tx_b) } else { (tx_b, tx_a) };
            prop_assert!(
                coin_age_weight_secs(&config, ts(early), now)
                    >= coin_age_weight_secs(&config, ts(late), now)
            );
        }

        #[test]
        fn weight_never_exceeds_max_age(tx_time in 0u64..2_000_000_000) {
            let config = create_mainnet();
            let weight = coin_age_weight_secs(&config, ts(tx_time), t(2_000_000_000));
            prop_assert!(weight <= config.stake_max_age());
        }
    }
}
