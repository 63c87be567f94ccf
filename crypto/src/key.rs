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

use schnorrkel::signing_context;
use serialization::{Decode, Encode, Error as CodecError, Input, Output};

use crate::random::{CryptoRng, Rng};

const SIGNING_CONTEXT: &[u8] = b"embercoin-signature";

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum SignatureError {
    #[error("Signing failed")]
    SigningFailed,
    #[error("Malformed signature encoding")]
    MalformedSignature,
    #[error("Malformed public key encoding")]
    MalformedPublicKey,
    #[error("Malformed private key encoding")]
    MalformedPrivateKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum KeyKind {
    #[codec(index = 0)]
    RistrettoSchnorr,
}

/// A signing key. The debug representation is redacted; the encoded form is
/// the raw 64-byte schnorrkel secret and must only ever reach the wallet
/// store (possibly symmetrically encrypted first).
#[derive(Clone)]
pub struct PrivateKey {
    key: schnorrkel::SecretKey,
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.key.to_bytes() == other.key.to_bytes()
    }
}

impl Eq for PrivateKey {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PublicKey {
    key_bytes: [u8; 32],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    sig_bytes: [u8; 64],
}

impl PrivateKey {
    pub fn new_from_rng(
        rng: &mut (impl Rng + CryptoRng),
        _kind: KeyKind,
    ) -> (PrivateKey, PublicKey) {
        let keypair = schnorrkel::Keypair::generate_with(rng);
        let public = PublicKey {
            key_bytes: keypair.public.to_bytes(),
        };
        (
            PrivateKey {
                key: keypair.secret.clone(),
            },
            public,
        )
    }

    pub fn kind(&self) -> KeyKind {
        KeyKind::RistrettoSchnorr
    }

    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, SignatureError> {
        let public = self.key.to_public();
        let sig = self.key.sign(signing_context(SIGNING_CONTEXT).bytes(message), &public);
        Ok(Signature {
            sig_bytes: sig.to_bytes(),
        })
    }
}

impl PublicKey {
    pub fn from_private_key(private_key: &PrivateKey) -> Self {
        Self {
            key_bytes: private_key.key.to_public().to_bytes(),
        }
    }

    pub fn verify_message(&self, signature: &Signature, message: &[u8]) -> bool {
        let public = match schnorrkel::PublicKey::from_bytes(&self.key_bytes) {
            Ok(key) => key,
            Err(_) => return false,
        };
        let sig = match schnorrkel::Signature::from_bytes(&signature.sig_bytes) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        public.verify(signing_context(SIGNING_CONTEXT).bytes(message), &sig).is_ok()
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key_bytes
    }
}

impl Encode for PrivateKey {
    fn encode_to<O: Output + ?Sized>(&self, dest: &mut O) {
        self.key.to_bytes().encode_to(dest)
    }
}

impl Decode for PrivateKey {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let bytes = <[u8; 64]>::decode(input)?;
        let key = schnorrkel::SecretKey::from_bytes(&bytes)
            .map_err(|_| CodecError::from("malformed schnorrkel secret key"))?;
        Ok(Self { key })
    }
}

impl Encode for PublicKey {
    fn encode_to<O: Output + ?Sized>(&self, dest: &mut O) {
        self.key_bytes.encode_to(dest)
    }
}

impl Decode for PublicKey {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let key_bytes = <[u8; 32]>::decode(input)?;
        // Reject encodings that do not land on the curve right away.
        schnorrkel::PublicKey::from_bytes(&key_bytes)
            .map_err(|_| CodecError::from("malformed schnorrkel public key"))?;
        Ok(Self { key_bytes })
    }
}

impl Encode for Signature {
    fn encode_to<O: Output + ?Sized>(&self, dest: &mut O) {
        self.sig_bytes.encode_to(dest)
    }
}

impl Decode for Signature {
    fn decode<I: Input>(input: &mut I) -> Result<Self, CodecError> {
        let sig_bytes = <[u8; 64]>::decode(input)?;
        Ok(Self { sig_bytes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serialization::DecodeAll;
    use test_utils::random::{make_seedable_rng, Rng, Seed};

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn sign_and_verify(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let (private_key, public_key) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);
        let message: Vec<u8> = (0..100).map(|_| rng.gen()).collect();

        let signature = private_key.sign_message(&message).unwrap();
        assert!(public_key.verify_message(&signature, &message));

        let mut tampered = message.clone();
        tampered[0] ^= 1;
        assert!(!public_key.verify_message(&signature, &tampered));
    }

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn key_encoding_roundtrip(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let (private_key, public_key) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);

        let decoded_private = PrivateKey::decode_all(&mut private_key.encode().as_slice()).unwrap();
        assert_eq!(decoded_private, private_key);
        assert_eq!(PublicKey::from_private_key(&decoded_private), public_key);

        let decoded_public = PublicKey::decode_all(&mut public_key.encode().as_slice()).unwrap();
        assert_eq!(decoded_public, public_key);
    }

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn verification_key_mismatch(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let (private_key, _) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);
        let (_, other_public) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);

        let signature = private_key.sign_message(b"message").unwrap();
        assert!(!other_public.verify_message(&signature, b"message"));
    }
}
