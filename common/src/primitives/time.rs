// Copyright (c) 2021 RBB S.r.l
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

use std::time::{Duration, SystemTime};

use serialization::{Decode, Encode};

/// A wall-clock instant with second resolution, as seconds since the Unix
/// epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Time {
    secs: u64,
}

impl Time {
    pub const fn from_secs_since_epoch(secs: u64) -> Self {
        Self { secs }
    }

    pub const fn as_secs_since_epoch(self) -> u64 {
        self.secs
    }

    pub fn saturating_offset(self, offset: i64) -> Self {
        Self {
            secs: self.secs.saturating_add_signed(offset),
        }
    }
}

impl std::ops::Add<Duration> for Time {
    type Output = Option<Time>;

    fn add(self, other: Duration) -> Self::Output {
        self.secs.checked_add(other.as_secs()).map(|secs| Time { secs })
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.secs.fmt(f)
    }
}

/// The system clock, unadjusted.
pub fn get_time() -> Time {
    let since_epoch = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("system clock set before the Unix epoch");
    Time::from_secs_since_epoch(since_epoch.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_and_addition() {
        let t = Time::from_secs_since_epoch(1000);
        assert_eq!(t.saturating_offset(-2000), Time::from_secs_since_epoch(0));
        assert_eq!(t.saturating_offset(50), Time::from_secs_since_epoch(1050));
        assert_eq!(
            t + Duration::from_secs(10),
            Some(Time::from_secs_since_epoch(1010))
        );
    }
}
