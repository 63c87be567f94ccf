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

use std::sync::Arc;

use crate::primitives::time::{get_time, Time};

/// An injectable clock, so that tests can move time by hand instead of
/// sleeping.
#[derive(Clone)]
pub struct TimeGetter {
    f: Arc<dyn Fn() -> Time + Send + Sync>,
}

impl TimeGetter {
    pub fn new(f: Arc<dyn Fn() -> Time + Send + Sync>) -> Self {
        Self { f }
    }

    pub fn get_time(&self) -> Time {
        (self.f)()
    }
}

impl Default for TimeGetter {
    fn default() -> Self {
        Self::new(Arc::new(get_time))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn mocked_time_advances_by_hand() {
        let now = Arc::new(AtomicU64::new(100));
        let now_clone = Arc::clone(&now);
        let getter = TimeGetter::new(Arc::new(move || {
            Time::from_secs_since_epoch(now_clone.load(Ordering::Relaxed))
        }));
        assert_eq!(getter.get_time(), Time::from_secs_since_epoch(100));
        now.store(150, Ordering::Relaxed);
        assert_eq!(getter.get_time(), Time::from_secs_since_epoch(150));
    }
}
