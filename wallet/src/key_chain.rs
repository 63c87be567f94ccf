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

//! The wallet's keys: spendable key material (possibly encrypted in
//! memory), watch-only addresses, the pre-generated key pool, and the
//! address book that maps addresses to account labels.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use common::address::PublicKeyHash;
use common::chain::Destination;
use crypto::key::{KeyKind, PrivateKey, PublicKey};
use crypto::random::{CryptoRng, Rng};
use crypto::symkey::SymmetricKey;
use serialization::{DecodeAll, Encode};

use crate::error::{WalletError, WalletResult};

pub const DEFAULT_KEY_POOL_SIZE: usize = 100;

/// Ownership class of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsMine {
    No,
    WatchOnly,
    Spendable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyMaterial {
    Plain(PrivateKey),
    Crypted(Vec<u8>),
}

#[derive(Debug, Clone)]
struct KeyEntry {
    public_key: PublicKey,
    material: KeyMaterial,
}

#[derive(Default)]
pub struct KeyChain {
    keys: BTreeMap<PublicKeyHash, KeyEntry>,
    pool: VecDeque<PublicKeyHash>,
    watch_only: BTreeSet<PublicKeyHash>,
    address_book: BTreeMap<PublicKeyHash, String>,
}

impl KeyChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mine(&self, destination: &Destination) -> IsMine {
        match destination {
            Destination::PublicKeyHash(pkh) => {
                if self.keys.contains_key(pkh) {
                    IsMine::Spendable
                } else if self.watch_only.contains(pkh) {
                    IsMine::WatchOnly
                } else {
                    IsMine::No
                }
            }
            Destination::NoDestination | Destination::ScriptHash(_) => IsMine::No,
        }
    }

    /// Generate and store a fresh key. When `master_key` is given the
    /// private part is stored encrypted under it.
    pub fn generate_key(
        &mut self,
        rng: &mut (impl Rng + CryptoRng),
        master_key: Option<&SymmetricKey>,
    ) -> WalletResult<PublicKeyHash> {
        let (private_key, public_key) = PrivateKey::new_from_rng(rng, KeyKind::RistrettoSchnorr);
        let pkh = PublicKeyHash::from_public_key(&public_key);
        let material = match master_key {
            None => KeyMaterial::Plain(private_key),
            Some(key) => KeyMaterial::Crypted(
                key.encrypt(&private_key.encode(), rng)
                    .map_err(|_| WalletError::KeyEncryptionFailed)?,
            ),
        };
        self.keys.insert(
            pkh,
            KeyEntry {
                public_key,
                material,
            },
        );
        Ok(pkh)
    }

    /// Refill the pool up to `target`; requires key material access (i.e.
    /// an unlocked or unencrypted wallet).
    pub fn top_up_pool(
        &mut self,
        target: usize,
        rng: &mut (impl Rng + CryptoRng),
        master_key: Option<&SymmetricKey>,
    ) -> WalletResult<usize> {
        let mut added = 0;
        while self.pool.len() < target {
            let pkh = self.generate_key(rng, master_key)?;
            self.pool.push_back(pkh);
            added += 1;
        }
        Ok(added)
    }

    pub fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Hand out an address: from the pool when possible, freshly generated
    /// otherwise. The account label is recorded in the address book.
    pub fn issue_address(
        &mut self,
        account: &str,
        rng: &mut (impl Rng + CryptoRng),
        master_key: Option<&SymmetricKey>,
    ) -> WalletResult<PublicKeyHash> {
        let pkh = match self.pool.pop_front() {
            Some(pkh) => pkh,
            None => self.generate_key(rng, master_key)?,
        };
        self.address_book.insert(pkh, account.to_owned());
        Ok(pkh)
    }

    pub fn add_watch_only(&mut self, pkh: PublicKeyHash, account: &str) {
        self.watch_only.insert(pkh);
        self.address_book.insert(pkh, account.to_owned());
    }

    pub fn account_of(&self, pkh: &PublicKeyHash) -> Option<&String> {
        self.address_book.get(pkh)
    }

    pub fn addresses_of_account(&self, account: &str) -> Vec<PublicKeyHash> {
        self.address_book
            .iter()
            .filter(|(_, label)| label.as_str() == account)
            .map(|(pkh, _)| *pkh)
            .collect()
    }

    pub fn accounts(&self) -> BTreeSet<String> {
        self.address_book.values().cloned().collect()
    }

    pub fn public_key_of(&self, pkh: &PublicKeyHash) -> Option<&PublicKey> {
        self.keys.get(pkh).map(|entry| &entry.public_key)
    }

    /// Resolve the private key for a destination we can spend.
    pub fn private_key_for(
        &self,
        pkh: &PublicKeyHash,
        master_key: Option<&SymmetricKey>,
    ) -> WalletResult<PrivateKey> {
        let entry = self.keys.get(pkh).ok_or(WalletError::KeyNotFound(*pkh))?;
        match (&entry.material, master_key) {
            (KeyMaterial::Plain(key), _) => Ok(key.clone()),
            (KeyMaterial::Crypted(bytes), Some(master)) => {
                let plain = master.decrypt(bytes).map_err(|_| WalletError::PassphraseIncorrect)?;
                PrivateKey::decode_all(&mut plain.as_slice())
                    .map_err(|_| WalletError::KeyNotFound(*pkh))
            }
            (KeyMaterial::Crypted(_), None) => Err(WalletError::WalletLocked),
        }
    }

    /// Re-store every plain key encrypted under the master key; called once
    /// when the wallet gets encrypted.
    pub fn encrypt_all(
        &mut self,
        master_key: &SymmetricKey,
        rng: &mut (impl Rng + CryptoRng),
    ) -> WalletResult<()> {
        for entry in self.keys.values_mut() {
            if let KeyMaterial::Plain(private_key) = &entry.material {
                let crypted = master_key
                    .encrypt(&private_key.encode(), rng)
                    .map_err(|_| WalletError::KeyEncryptionFailed)?;
                entry.material = KeyMaterial::Crypted(crypted);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use test_utils::random::{make_seedable_rng, Seed};

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn pool_top_up_and_issue(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let mut chain = KeyChain::new();
        assert_eq!(chain.top_up_pool(5, &mut rng, None).unwrap(), 5);
        assert_eq!(chain.pool_size(), 5);
        assert_eq!(chain.top_up_pool(5, &mut rng, None).unwrap(), 0);

        let pkh = chain.issue_address("savings", &mut rng, None).unwrap();
        assert_eq!(chain.pool_size(), 4);
        assert_eq!(chain.account_of(&pkh), Some(&"savings".to_owned()));
        assert_eq!(
            chain.is_mine(&Destination::PublicKeyHash(pkh)),
            IsMine::Spendable
        );
    }

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn empty_pool_still_issues(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let mut chain = KeyChain::new();
        let pkh = chain.issue_address("", &mut rng, None).unwrap();
        assert!(chain.private_key_for(&pkh, None).is_ok());
    }

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn watch_only_is_not_spendable(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let mut chain = KeyChain::new();
        let (_, public_key) = PrivateKey::new_from_rng(&mut rng, KeyKind::RistrettoSchnorr);
        let pkh = PublicKeyHash::from_public_key(&public_key);
        chain.add_watch_only(pkh, "observed");
        assert_eq!(
            chain.is_mine(&Destination::PublicKeyHash(pkh)),
            IsMine::WatchOnly
        );
        assert_eq!(
            chain.private_key_for(&pkh, None),
            Err(WalletError::KeyNotFound(pkh))
        );
    }

    #[rstest]
    #[trace]
    #[case(Seed::from_entropy())]
    fn encryption_roundtrip(#[case] seed: Seed) {
        let mut rng = make_seedable_rng(seed);
        let mut chain = KeyChain::new();
        let pkh = chain.issue_address("", &mut rng, None).unwrap();
        let before = chain.private_key_for(&pkh, None).unwrap();

        let master = SymmetricKey::new_from_rng(&mut rng);
        chain.encrypt_all(&master, &mut rng).unwrap();
        assert_eq!(
            chain.private_key_for(&pkh, None),
            Err(WalletError::WalletLocked)
        );
        assert_eq!(chain.private_key_for(&pkh, Some(&master)).unwrap(), before);

        // New keys generated while unlocked are stored encrypted as well.
        let pkh2 = chain.issue_address("", &mut rng, Some(&master)).unwrap();
        assert_eq!(
            chain.private_key_for(&pkh2, None),
            Err(WalletError::WalletLocked)
        );
        assert!(chain.private_key_for(&pkh2, Some(&master)).is_ok());
    }
}
