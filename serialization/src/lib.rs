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

//! Serialization facade for the whole workspace.
//!
//! Everything that goes into a hash, a signature or over a wire is encoded
//! through this crate, so the byte layout is fixed in exactly one place.
//! Integers encode fixed-width little-endian, which is what pins down the
//! stake kernel preimage layout.

pub use parity_scale_codec::{Decode, DecodeAll, Encode, Error, Input, Output};

/// Encode a value into a fresh byte vector.
pub fn encode_to_vec<T: Encode>(value: &T) -> Vec<u8> {
    value.encode()
}

/// Decode a value from a byte slice, requiring all input to be consumed.
pub fn decode_all<T: DecodeAll>(mut bytes: &[u8]) -> Result<T, Error> {
    T::decode_all(&mut bytes)
}
