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

use parking_lot::Mutex;

/// A process-wide slot for a persistent operator-facing warning, e.g. a
/// halted worker. Later warnings replace earlier ones; reading does not
/// clear.
#[derive(Debug, Default)]
pub struct Warnings {
    slot: Mutex<Option<String>>,
}

impl Warnings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, warning: String) {
        *self.slot.lock() = Some(warning);
    }

    pub fn get(&self) -> Option<String> {
        self.slot.lock().clone()
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_clear() {
        let warnings = Warnings::new();
        assert_eq!(warnings.get(), None);
        warnings.set("staking halted".into());
        assert_eq!(warnings.get(), Some("staking halted".into()));
        assert_eq!(warnings.get(), Some("staking halted".into()));
        warnings.clear();
        assert_eq!(warnings.get(), None);
    }
}
