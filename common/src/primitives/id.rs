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

use std::marker::PhantomData;

use fixed_hash::construct_fixed_hash;
use serialization::{Decode, Encode, Error as CodecError, Input, Output};

construct_fixed_hash! {
    pub struct H256(32);
}

impl Encode for H256 {
    fn encode_to<O: Output + ?Sized>(&self, dest: &mut O) {
        self.0.encode_to(dest)
    }
}

impl Decode for H256 {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        <[u8; 32]>::decode(input).map(H256)
    }
}

impl H256 {
    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex_str(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(H256(bytes))
    }
}

/// A typed id: the hash of the scale-encoded object, tagged with the type it
/// identifies so that a block id cannot be passed where a transaction id is
/// expected.
pub struct Id<T> {
    hash: H256,
    _shadow: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    pub const fn new(hash: H256) -> Self {
        Self {
            hash,
            _shadow: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::new(H256::zero())
    }

    pub fn to_hash(&self) -> H256 {
        self.hash
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.hash.hash(state)
    }
}

impl<T> std::fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Id<{}>{{{:x}}}", std::any::type_name::<T>(), self.hash)
    }
}

impl<T> std::fmt::Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:x}", self.hash)
    }
}

impl<T> Encode for Id<T> {
    fn encode_to<O: Output + ?Sized>(&self, dest: &mut O) {
        self.hash.encode_to(dest)
    }
}

impl<T> Decode for Id<T> {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        H256::decode(input).map(Self::new)
    }
}

/// Anything that has a canonical id.
pub trait Idable {
    type Tag;

    fn get_id(&self) -> Id<Self::Tag>;
}

impl<T: Idable> Idable for &T {
    type Tag = T::Tag;

    fn get_id(&self) -> Id<Self::Tag> {
        (*self).get_id()
    }
}

/// Hash the scale encoding of a value with the chain's id hash (sha256d).
pub fn hash_encoded<T: Encode>(value: &T) -> H256 {
    H256(crypto::hash::sha256d(&value.encode()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_encoded_is_sha256d_of_encoding() {
        let value = 0xDEADBEEFu32;
        assert_eq!(
            hash_encoded(&value).0,
            crypto::hash::sha256d(&value.encode())
        );
    }

    #[test]
    fn hex_roundtrip() {
        let hash = hash_encoded(&42u64);
        assert_eq!(H256::from_hex_str(&hash.to_hex()), Ok(hash));
        assert!(H256::from_hex_str("xyz").is_err());
        assert!(H256::from_hex_str("ab").is_err());
    }

    #[test]
    fn id_encoding_matches_hash_encoding() {
        let hash = hash_encoded(&1u8);
        let id: Id<()> = Id::new(hash);
        assert_eq!(id.encode(), hash.encode());
    }
}
