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

//! The network-adjusted clock: system time, shifted by the median of peer
//! clock offsets and an NTP offset when one has been measured. Offsets are
//! bounded; a median outside the bound means our clock (or the network) is
//! off in a way we cannot correct, which callers see as "unknown".

use common::primitives::Time;
use common::time_getter::TimeGetter;
use parking_lot::Mutex;

/// Peer offsets beyond this are clock trouble, not clock data.
const MAX_OFFSET_SECS: i64 = 70 * 60;
/// Cap on retained samples; old samples rotate out first.
const MAX_SAMPLES: usize = 200;

/// Sentinel for "the peer offset is unusable".
pub const OFFSET_UNKNOWN: i64 = i64::MAX;

pub struct NodeClock {
    time_getter: TimeGetter,
    peer_offsets: Mutex<Vec<i64>>,
    ntp_offset: Mutex<Option<i64>>,
}

impl NodeClock {
    pub fn new(time_getter: TimeGetter) -> Self {
        Self {
            time_getter,
            peer_offsets: Mutex::new(Vec::new()),
            ntp_offset: Mutex::new(None),
        }
    }

    pub fn system_time(&self) -> Time {
        self.time_getter.get_time()
    }

    pub fn add_peer_offset(&self, offset: i64) {
        let mut samples = self.peer_offsets.lock();
        if samples.len() == MAX_SAMPLES {
            samples.remove(0);
        }
        samples.push(offset);
    }

    pub fn set_ntp_offset(&self, offset: Option<i64>) {
        *self.ntp_offset.lock() = offset;
    }

    pub fn ntp_offset(&self) -> Option<i64> {
        *self.ntp_offset.lock()
    }

    /// Median of the collected peer offsets; zero with no samples, and
    /// [`OFFSET_UNKNOWN`] when the median saturates the plausibility bound.
    pub fn p2p_offset(&self) -> i64 {
        let samples = self.peer_offsets.lock();
        if samples.is_empty() {
            return 0;
        }
        let mut sorted = samples.clone();
        drop(samples);
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 1 {
            sorted[mid]
        } else {
            (sorted[mid - 1] + sorted[mid]) / 2
        };
        if median.abs() > MAX_OFFSET_SECS {
            OFFSET_UNKNOWN
        } else {
            median
        }
    }

    /// System time plus whatever offsets are usable. An unknown peer offset
    /// falls back to the raw system clock rather than poisoning the result.
    pub fn adjusted_time(&self) -> Time {
        let p2p = self.p2p_offset();
        let p2p = if p2p == OFFSET_UNKNOWN { 0 } else { p2p };
        let ntp = self.ntp_offset().unwrap_or(0);
        self.system_time().saturating_offset(p2p + ntp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn fixed_clock(secs: u64) -> NodeClock {
        NodeClock::new(TimeGetter::new(Arc::new(move || {
            Time::from_secs_since_epoch(secs)
        })))
    }

    #[test]
    fn no_samples_means_system_time() {
        let clock = fixed_clock(1000);
        assert_eq!(clock.p2p_offset(), 0);
        assert_eq!(clock.adjusted_time(), Time::from_secs_since_epoch(1000));
    }

    #[test]
    fn median_shifts_the_clock() {
        let clock = fixed_clock(1000);
        for offset in [10, 20, 30] {
            clock.add_peer_offset(offset);
        }
        assert_eq!(clock.p2p_offset(), 20);
        assert_eq!(clock.adjusted_time(), Time::from_secs_since_epoch(1020));
    }

    #[test]
    fn even_sample_count_averages_middles() {
        let clock = fixed_clock(1000);
        for offset in [10, 20, 30, 40] {
            clock.add_peer_offset(offset);
        }
        assert_eq!(clock.p2p_offset(), 25);
    }

    #[test]
    fn saturated_median_is_unknown_and_ignored() {
        let clock = fixed_clock(1000);
        for _ in 0..3 {
            clock.add_peer_offset(2 * MAX_OFFSET_SECS);
        }
        assert_eq!(clock.p2p_offset(), OFFSET_UNKNOWN);
        assert_eq!(clock.adjusted_time(), Time::from_secs_since_epoch(1000));
    }

    #[test]
    fn ntp_offset_applies_on_top() {
        let clock = fixed_clock(1000);
        clock.add_peer_offset(10);
        clock.set_ntp_offset(Some(-5));
        assert_eq!(clock.adjusted_time(), Time::from_secs_since_epoch(1005));
    }

    #[test]
    fn sample_buffer_rotates() {
        let clock = fixed_clock(1000);
        for _ in 0..MAX_SAMPLES {
            clock.add_peer_offset(0);
        }
        for _ in 0..MAX_SAMPLES {
            clock.add_peer_offset(60);
        }
        assert_eq!(clock.p2p_offset(), 60);
    }
}
