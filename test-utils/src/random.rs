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

pub use rand::{CryptoRng, Rng, RngCore, SeedableRng};

/// A test seed that prints itself when a seeded case fails, so the failing
/// run can be reproduced by pasting the value back into the test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub u64);

impl Seed {
    pub fn from_entropy() -> Self {
        Self(rand::random())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value)
    }
}

impl From<u64> for Seed {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

pub fn make_seedable_rng(seed: Seed) -> rand_chacha::ChaChaRng {
    rand_chacha::ChaChaRng::seed_from_u64(seed.0)
}
