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

//! A thin wrapper around the randomness sources used in the code base, to
//! make auditing callers easier. Code that needs cryptographic randomness
//! (key generation, nonces) must use [`make_true_rng`]; everything else
//! (jitter, shuffling) uses [`make_pseudo_rng`].

use rand::rngs::StdRng;

pub use rand::{seq, CryptoRng, Rng, RngCore, SeedableRng};

pub fn make_true_rng() -> impl Rng + CryptoRng {
    StdRng::from_entropy()
}

pub fn make_pseudo_rng() -> impl Rng {
    rand::thread_rng()
}
