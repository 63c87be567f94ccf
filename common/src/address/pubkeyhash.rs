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

use crypto::key::PublicKey;
use serialization::{Decode, Encode};

use super::AddressError;

/// ripemd160(sha256(encoded public key)); the payload of a pay-to-pubkey-hash
/// destination. The RPC surface renders it as plain hex (base-58 framing is
/// out of this crate's scope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct PublicKeyHash([u8; 20]);

impl PublicKeyHash {
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self(crypto::hash::hash160(&public_key.encode()))
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn hex_encoded(&self) -> String {
        hex::encode(self.0)
    }
}

impl std::fmt::Display for PublicKeyHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex_encoded())
    }
}

impl std::str::FromStr for PublicKeyHash {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 40 {
            return Err(AddressError::InvalidLength);
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| AddressError::InvalidEncoding)?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto::key::{KeyKind, PrivateKey};
    use rstest::rstest;
    use test_utils::random::{make_seedable_rng, Seed};

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn hex_roundtrip(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let (_, public_key) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);
        let pkh = PublicKeyHash::from_public_key(&public_key);
        assert_eq!(pkh.to_string().parse::<PublicKeyHash>(), Ok(pkh));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert_eq!(
            "zz".repeat(20).parse::<PublicKeyHash>(),
            Err(AddressError::InvalidEncoding)
        );
        assert_eq!(
            "abcd".parse::<PublicKeyHash>(),
            Err(AddressError::InvalidLength)
        );
    }
}
