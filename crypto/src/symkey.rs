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

//! Symmetric encryption used for wallet key material at rest in memory.
//! The ciphertext layout is `nonce (12 bytes) || aead output`.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use zeroize::Zeroize;

use crate::hash::sha256;
use crate::random::{CryptoRng, Rng};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum SymKeyError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed")]
    DecryptionFailed,
    #[error("Ciphertext too short to contain a nonce")]
    CiphertextTooShort,
}

#[derive(Clone)]
pub struct SymmetricKey {
    key_bytes: [u8; 32],
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.key_bytes.zeroize();
    }
}

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key_bytes
    }

    pub fn new_from_rng(rng: &mut (impl Rng + CryptoRng)) -> Self {
        let mut key_bytes = [0u8; 32];
        rng.fill_bytes(&mut key_bytes);
        Self { key_bytes }
    }

    pub fn from_bytes(key_bytes: [u8; 32]) -> Self {
        Self { key_bytes }
    }

    pub fn encrypt(
        &self,
        plaintext: &[u8],
        rng: &mut (impl Rng + CryptoRng),
    ) -> Result<Vec<u8>, SymKeyError> {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key_bytes));
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|_| SymKeyError::EncryptionFailed)?;
        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, SymKeyError> {
        if data.len() < NONCE_LEN {
            return Err(SymKeyError::CiphertextTooShort);
        }
        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&self.key_bytes));
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SymKeyError::DecryptionFailed)
    }
}

/// Stretch a passphrase into a symmetric key by iterated hashing over the
/// passphrase and a per-wallet salt. The round count is stored alongside the
/// salt so it can be raised without breaking existing wallets.
pub fn derive_key_from_passphrase(passphrase: &[u8], salt: &[u8], rounds: u32) -> SymmetricKey {
    let mut state = {
        let mut seed = Vec::with_capacity(passphrase.len() + salt.len());
        seed.extend_from_slice(passphrase);
        seed.extend_from_slice(salt);
        sha256(&seed)
    };
    for _ in 1..rounds.max(1) {
        state = sha256(&state);
    }
    SymmetricKey::from_bytes(state)
}
