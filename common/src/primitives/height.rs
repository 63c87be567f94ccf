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

use serialization::{Decode, Encode};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode, serde::Serialize,
)]
pub struct BlockHeight(u64);

impl BlockHeight {
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn into_int(self) -> u64 {
        self.0
    }

    pub fn next_height(self) -> BlockHeight {
        BlockHeight(self.0.checked_add(1).expect("block height overflow"))
    }

    pub fn checked_sub(self, other: BlockHeight) -> Option<u64> {
        self.0.checked_sub(other.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_and_arithmetic() {
        let h5 = BlockHeight::new(5);
        let h7 = BlockHeight::new(7);
        assert!(h5 < h7);
        assert_eq!(h5.next_height(), BlockHeight::new(6));
        assert_eq!(h7.checked_sub(h5), Some(2));
        assert_eq!(h5.checked_sub(h7), None);
    }
}
