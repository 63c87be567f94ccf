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

//! The wallet: key management, observed-transaction bookkeeping, the
//! spendable-output view that feeds both spending and staking, named-account
//! accounting, and the in-memory encryption state machine.
//!
//! The wallet is driven from outside: chain ingress pushes connected blocks
//! through [`Wallet::scan_new_block`], the send pipeline registers its own
//! transactions, and RPC reads the tallies. Everything here assumes the
//! caller holds the wallet lock; lock ordering (chain before wallet) is the
//! caller's duty.

pub mod accounting;
pub mod error;
pub mod key_chain;
pub mod output_cache;
pub mod relocker;
pub mod send_request;
pub mod wallet_tx;


use std::collections::BTreeMap;
use std::sync::Arc;

use common::address::PublicKeyHash;
use common::chain::block::timestamp::BlockTimestamp;
use common::chain::block::Block;
use common::chain::config::{ChainConfig, CENT};
use common::chain::{Destination, GenBlock, SignedTransaction, Transaction, TxOutput, UtxoOutPoint};
use common::primitives::{Amount, BlockHeight, Id, Idable, SignedAmount};
use common::time_getter::TimeGetter;
use crypto::key::PrivateKey;
use crypto::random::make_true_rng;
use crypto::symkey::{derive_key_from_passphrase, SymmetricKey};
use logging::log;
use utils::ensure;

use accounting::{AccountingEntry, AccountingLedger};
use key_chain::{IsMine, KeyChain, DEFAULT_KEY_POOL_SIZE};
use output_cache::OutputCache;
use wallet_tx::{TxState, WalletTx};

pub use error::{WalletError, WalletResult};

/// Key-stretching rounds for the passphrase KDF.
const KDF_ROUNDS: u32 = 25_000;

/// The reserved pseudo-account meaning "all accounts".
pub const ALL_ACCOUNTS: &str = "*";

/// One confirmed, unspent, owned output, annotated with everything the
/// spending and staking paths need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendableUtxo {
    pub outpoint: UtxoOutPoint,
    pub output: TxOutput,
    pub tx_timestamp: BlockTimestamp,
    /// Byte offset of the creating transaction in its block.
    pub tx_offset: u32,
    pub depth: u64,
    pub is_coinbase: bool,
    pub is_coinstake: bool,
}

/// Public projection of the encryption state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    Unencrypted,
    Locked,
    Unlocked { mint_only: bool },
}

enum Encryption {
    Unencrypted,
    Locked {
        crypted_master: Vec<u8>,
        salt: [u8; 32],
        rounds: u32,
    },
    Unlocked {
        crypted_master: Vec<u8>,
        salt: [u8; 32],
        rounds: u32,
        master: SymmetricKey,
        mint_only: bool,
    },
}

pub struct Wallet {
    chain_config: Arc<ChainConfig>,
    time_getter: TimeGetter,
    key_chain: KeyChain,
    output_cache: OutputCache,
    ledger: AccountingLedger,
    best_height: BlockHeight,
    best_block_id: Id<GenBlock>,
    reserve_balance: Amount,
    encryption: Encryption,
    next_order_pos: u64,
}

impl Wallet {
    pub fn new(chain_config: Arc<ChainConfig>, time_getter: TimeGetter) -> Self {
        let best_block_id = chain_config.genesis_block_id();
        Self {
            chain_config,
            time_getter,
            key_chain: KeyChain::new(),
            output_cache: OutputCache::new(),
            ledger: AccountingLedger::new(),
            best_height: BlockHeight::zero(),
            best_block_id,
            reserve_balance: Amount::ZERO,
            encryption: Encryption::Unencrypted,
            next_order_pos: 0,
        }
    }

    pub fn chain_config(&self) -> &Arc<ChainConfig> {
        &self.chain_config
    }

    pub fn time_getter(&self) -> &TimeGetter {
        &self.time_getter
    }

    pub fn best_height(&self) -> BlockHeight {
        self.best_height
    }

    pub fn best_block_id(&self) -> Id<GenBlock> {
        self.best_block_id
    }

    pub fn reserve_balance(&self) -> Amount {
        self.reserve_balance
    }

    /// Set the reserve floor, rounded down to a whole cent. The rounding is
    /// presentation policy, not consensus.
    pub fn set_reserve_balance(&mut self, amount: Amount) -> WalletResult<Amount> {
        let remainder = (amount % CENT).ok_or(WalletError::AmountArithmeticOverflow)?;
        let rounded = (amount - remainder).ok_or(WalletError::AmountArithmeticOverflow)?;
        self.reserve_balance = rounded;
        Ok(rounded)
    }

    fn take_order_pos(&mut self) -> u64 {
        let pos = self.next_order_pos;
        self.next_order_pos += 1;
        pos
    }

    // ------------------------------------------------------------------
    // Keys and addresses

    pub fn is_mine(&self, destination: &Destination) -> IsMine {
        self.key_chain.is_mine(destination)
    }

    /// The master key for storing new key material, when accessible.
    fn key_access(&self) -> WalletResult<Option<SymmetricKey>> {
        match &self.encryption {
            Encryption::Unencrypted => Ok(None),
            Encryption::Unlocked { master, .. } => Ok(Some(master.clone())),
            Encryption::Locked { .. } => Err(WalletError::WalletLocked),
        }
    }

    pub fn get_new_address(&mut self, account: &str) -> WalletResult<PublicKeyHash> {
        ensure!(account != ALL_ACCOUNTS, WalletError::ReservedAccountName);
        let mut rng = make_true_rng();
        let master = self.key_access()?;
        self.key_chain.issue_address(account, &mut rng, master.as_ref())
    }

    pub fn add_watch_only_address(&mut self, pkh: PublicKeyHash, account: &str) -> WalletResult<()> {
        ensure!(account != ALL_ACCOUNTS, WalletError::ReservedAccountName);
        self.key_chain.add_watch_only(pkh, account);
        Ok(())
    }

    pub fn account_of_address(&self, pkh: &PublicKeyHash) -> Option<&String> {
        self.key_chain.account_of(pkh)
    }

    pub fn key_pool_size(&self) -> usize {
        self.key_chain.pool_size()
    }

    pub fn key_pool_target(&self) -> usize {
        DEFAULT_KEY_POOL_SIZE
    }

    /// Refill the key pool to the target; a no-op error when locked, which
    /// is what the background top-up worker relies on.
    pub fn top_up_key_pool(&mut self) -> WalletResult<usize> {
        let master = self.key_access()?;
        let mut rng = make_true_rng();
        self.key_chain.top_up_pool(DEFAULT_KEY_POOL_SIZE, &mut rng, master.as_ref())
    }

    /// Resolve the signing key for a destination. A mint-only unlock allows
    /// staking keys but refuses spending keys.
    pub fn private_key_for_destination(
        &self,
        pkh: &PublicKeyHash,
        for_staking: bool,
    ) -> WalletResult<PrivateKey> {
        match &self.encryption {
            Encryption::Unencrypted => self.key_chain.private_key_for(pkh, None),
            Encryption::Locked { .. } => Err(WalletError::WalletLocked),
            Encryption::Unlocked {
                master, mint_only, ..
            } => {
                ensure!(
                    !*mint_only || for_staking,
                    WalletError::UnlockedForMintingOnly
                );
                self.key_chain.private_key_for(pkh, Some(master))
            }
        }
    }

    // ------------------------------------------------------------------
    // Encryption state machine

    pub fn lock_state(&self) -> LockState {
        match &self.encryption {
            Encryption::Unencrypted => LockState::Unencrypted,
            Encryption::Locked { .. } => LockState::Locked,
            Encryption::Unlocked { mint_only, .. } => LockState::Unlocked {
                mint_only: *mint_only,
            },
        }
    }

    pub fn is_crypted(&self) -> bool {
        !matches!(self.encryption, Encryption::Unencrypted)
    }

    /// Whether the staking loop may sign blocks right now.
    pub fn can_stake(&self) -> bool {
        matches!(
            self.lock_state(),
            LockState::Unencrypted | LockState::Unlocked { .. }
        )
    }

    pub fn ensure_can_spend(&self) -> WalletResult<()> {
        match self.lock_state() {
            LockState::Unencrypted | LockState::Unlocked { mint_only: false } => Ok(()),
            LockState::Unlocked { mint_only: true } => Err(WalletError::UnlockedForMintingOnly),
            LockState::Locked => Err(WalletError::WalletLocked),
        }
    }

    pub fn encrypt_wallet(&mut self, passphrase: &str) -> WalletResult<()> {
        ensure!(
            matches!(self.encryption, Encryption::Unencrypted),
            WalletError::AlreadyEncrypted
        );
        let mut rng = make_true_rng();
        let master = SymmetricKey::new_from_rng(&mut rng);
        self.key_chain.encrypt_all(&master, &mut rng)?;

        let mut salt = [0u8; 32];
        crypto::random::Rng::fill(&mut rng, &mut salt);
        let kdf_key = derive_key_from_passphrase(passphrase.as_bytes(), &salt, KDF_ROUNDS);
        let crypted_master = kdf_key
            .encrypt(master.as_bytes(), &mut rng)
            .map_err(|_| WalletError::KeyEncryptionFailed)?;

        self.encryption = Encryption::Locked {
            crypted_master,
            salt,
            rounds: KDF_ROUNDS,
        };
        log::info!("Wallet encrypted; keys are locked");
        Ok(())
    }

    pub fn unlock(&mut self, passphrase: &str, mint_only: bool) -> WalletResult<()> {
        let (crypted_master, salt, rounds) = match &self.encryption {
            Encryption::Unencrypted => return Err(WalletError::NotEncrypted),
            Encryption::Locked {
                crypted_master,
                salt,
                rounds,
            }
            | Encryption::Unlocked {
                crypted_master,
                salt,
                rounds,
                ..
            } => (crypted_master.clone(), *salt, *rounds),
        };
        let kdf_key = derive_key_from_passphrase(passphrase.as_bytes(), &salt, rounds);
        let master_bytes =
            kdf_key.decrypt(&crypted_master).map_err(|_| WalletError::PassphraseIncorrect)?;
        let master_bytes: [u8; 32] = master_bytes
            .as_slice()
            .try_into()
            .map_err(|_| WalletError::PassphraseIncorrect)?;
        self.encryption = Encryption::Unlocked {
            crypted_master,
            salt,
            rounds,
            master: SymmetricKey::from_bytes(master_bytes),
            mint_only,
        };
        log::info!("Wallet unlocked{}", if mint_only { " for minting only" } else { "" });
        Ok(())
    }

    pub fn lock(&mut self) -> WalletResult<()> {
        match &self.encryption {
            Encryption::Unencrypted => Err(WalletError::NotEncrypted),
            Encryption::Locked { .. } => Ok(()),
            Encryption::Unlocked {
                crypted_master,
                salt,
                rounds,
                ..
            } => {
                self.encryption = Encryption::Locked {
                    crypted_master: crypted_master.clone(),
                    salt: *salt,
                    rounds: *rounds,
                };
                log::info!("Wallet locked");
                Ok(())
            }
        }
    }

    pub fn change_passphrase(&mut self, old: &str, new: &str) -> WalletResult<()> {
        let (crypted_master, salt, rounds) = match &self.encryption {
            Encryption::Unencrypted => return Err(WalletError::NotEncrypted),
            Encryption::Locked {
                crypted_master,
                salt,
                rounds,
            }
            | Encryption::Unlocked {
                crypted_master,
                salt,
                rounds,
                ..
            } => (crypted_master.clone(), *salt, *rounds),
        };
        let old_kdf = derive_key_from_passphrase(old.as_bytes(), &salt, rounds);
        let master_bytes =
            old_kdf.decrypt(&crypted_master).map_err(|_| WalletError::PassphraseIncorrect)?;

        let mut rng = make_true_rng();
        let mut new_salt = [0u8; 32];
        crypto::random::Rng::fill(&mut rng, &mut new_salt);
        let new_kdf = derive_key_from_passphrase(new.as_bytes(), &new_salt, KDF_ROUNDS);
        let crypted_master = new_kdf
            .encrypt(&master_bytes, &mut rng)
            .map_err(|_| WalletError::PassphraseIncorrect)?;

        self.encryption = Encryption::Locked {
            crypted_master,
            salt: new_salt,
            rounds: KDF_ROUNDS,
        };
        Ok(())
    }

    // ------------------------------------------------------------------
    // Chain observation

    /// Ingest one connected block: adopt confirmations of our own pending
    /// transactions and record any transaction crediting or debiting us.
    pub fn scan_new_block(&mut self, block: &Block, height: BlockHeight) {
        self.best_height = height;
        self.best_block_id = block.get_id().into();

        for (i, tx) in block.transactions().iter().enumerate() {
            let tx_offset = match block.tx_byte_offset(i) {
                Some(offset) => offset,
                None => continue,
            };
            let state = TxState::Confirmed {
                height,
                block_timestamp: block.timestamp(),
                tx_offset,
            };
            let tx_id = tx.get_id();

            if self.output_cache.contains(&tx_id) {
                if let Some(wtx) = self.output_cache.get_tx_mut(&tx_id) {
                    wtx.set_state(state);
                }
                continue;
            }

            let credits_us = tx
                .outputs()
                .iter()
                .any(|output| self.key_chain.is_mine(output.destination()) != IsMine::No);
            let our_inputs = tx
                .inputs()
                .iter()
                .filter_map(|input| input.utxo_outpoint())
                .filter(|outpoint| self.owns_outpoint(outpoint))
                .count();
            if !credits_us && our_inputs == 0 {
                continue;
            }

            let from_me = our_inputs > 0;
            let all_inputs_from_me = our_inputs == tx.inputs().len();
            let order_pos = self.take_order_pos();
            let wallet_tx = WalletTx::new(
                tx.clone(),
                state,
                order_pos,
                block.timestamp().into_time(),
                from_me,
                all_inputs_from_me,
                None,
                BTreeMap::new(),
            );
            log::debug!("Wallet observed transaction {tx_id} at height {height}");
            self.output_cache.add_tx(wallet_tx);
        }
    }

    fn owns_outpoint(&self, outpoint: &UtxoOutPoint) -> bool {
        self.output_cache
            .output_of(outpoint)
            .is_some_and(|output| self.key_chain.is_mine(output.destination()) != IsMine::No)
    }

    /// Register a transaction this wallet just created and broadcast.
    pub fn add_own_transaction(
        &mut self,
        tx: SignedTransaction,
        from_account: Option<String>,
        metadata: BTreeMap<String, String>,
    ) {
        let order_pos = self.take_order_pos();
        let wallet_tx = WalletTx::new(
            tx,
            TxState::InMempool,
            order_pos,
            self.time_getter.get_time(),
            true,
            true,
            from_account,
            metadata,
        );
        self.output_cache.add_tx(wallet_tx);
    }

    /// Transactions that should be re-announced to the network.
    pub fn transactions_to_rebroadcast(&self) -> Vec<SignedTransaction> {
        self.output_cache
            .txs()
            .filter(|wtx| {
                matches!(wtx.state(), TxState::InMempool | TxState::Inactive) && wtx.from_me()
            })
            .map(|wtx| wtx.tx().clone())
            .collect()
    }

    // ------------------------------------------------------------------
    // The spendable view

    /// Enumerate confirmed, unspent, owned outputs. Iteration order is not
    /// part of the contract.
    pub fn spendable_utxos(&self, min_depth: u64, include_watch_only: bool) -> Vec<SpendableUtxo> {
        let mut result = Vec::new();
        for (outpoint, wtx, output) in self.output_cache.unspent_outputs() {
            let tx_offset = match wtx.state() {
                TxState::Confirmed { tx_offset, .. } => tx_offset,
                TxState::InMempool | TxState::Inactive => continue,
            };
            if output.value() == Amount::ZERO {
                continue;
            }
            let depth = wtx.depth(self.best_height);
            if depth < min_depth.max(1) {
                continue;
            }
            if (wtx.is_coinbase() || wtx.is_coinstake())
                && !wtx.is_mature(&self.chain_config, self.best_height)
            {
                continue;
            }
            match self.key_chain.is_mine(output.destination()) {
                IsMine::Spendable => {}
                IsMine::WatchOnly if include_watch_only => {}
                IsMine::WatchOnly | IsMine::No => continue,
            }
            result.push(SpendableUtxo {
                outpoint,
                output: output.clone(),
                tx_timestamp: wtx.tx().transaction().timestamp(),
                tx_offset,
                depth,
                is_coinbase: wtx.is_coinbase(),
                is_coinstake: wtx.is_coinstake(),
            });
        }
        result
    }

    /// The staking snapshot: spendable outputs minus the reserve floor,
    /// which is satisfied from the smallest outputs upward.
    pub fn stakable_utxos(&self) -> Vec<SpendableUtxo> {
        let mut utxos = self.spendable_utxos(1, false);
        utxos.sort_by_key(|utxo| utxo.output.value());
        let reserve = self.reserve_balance;
        let mut covered = Amount::ZERO;
        let mut result = Vec::new();
        for utxo in utxos {
            if covered < reserve {
                covered = (covered + utxo.output.value()).unwrap_or(Amount::MAX);
                continue;
            }
            // Only pay-to-pubkey-hash outputs can sign a block.
            if matches!(utxo.output.destination(), Destination::PublicKeyHash(_)) {
                result.push(utxo);
            }
        }
        result
    }

    // ------------------------------------------------------------------
    // Balances

    fn output_counts_for(&self, output: &TxOutput, include_watch_only: bool) -> bool {
        match self.key_chain.is_mine(output.destination()) {
            IsMine::Spendable => true,
            IsMine::WatchOnly => include_watch_only,
            IsMine::No => false,
        }
    }

    fn tx_credit(&self, wtx: &WalletTx, min_depth: u64, include_watch_only: bool) -> u128 {
        if wtx.depth(self.best_height) < min_depth {
            return 0;
        }
        if (wtx.is_coinbase() || wtx.is_coinstake())
            && !wtx.is_mature(&self.chain_config, self.best_height)
        {
            return 0;
        }
        wtx.tx()
            .outputs()
            .iter()
            .filter(|output| self.output_counts_for(output, include_watch_only))
            .map(|output| output.value().into_atoms())
            .sum()
    }

    fn tx_debit(&self, wtx: &WalletTx, include_watch_only: bool) -> u128 {
        wtx.tx()
            .inputs()
            .iter()
            .filter_map(|input| input.utxo_outpoint())
            .filter_map(|outpoint| self.output_cache.output_of(outpoint))
            .filter(|output| self.output_counts_for(output, include_watch_only))
            .map(|output| output.value().into_atoms())
            .sum()
    }

    /// The `"*"` balance: net value of all trusted transactions, with
    /// credits gated on depth and maturity.
    pub fn get_balance(&self, min_depth: u64, include_watch_only: bool) -> Amount {
        let mut total: i128 = 0;
        for wtx in self.output_cache.txs() {
            if !wtx.is_trusted(self.best_height) {
                continue;
            }
            let credit = self.tx_credit(wtx, min_depth, include_watch_only);
            let debit = self.tx_debit(wtx, include_watch_only);
            total += i128::try_from(credit).unwrap_or(i128::MAX)
                - i128::try_from(debit).unwrap_or(i128::MAX);
        }
        Amount::from_atoms(total.max(0) as u128)
    }

    /// Balance of one named account: confirmed credits to its addresses,
    /// net outflow of sends made from it, plus its accounting entries.
    pub fn account_balance(
        &self,
        account: &str,
        min_depth: u64,
        include_watch_only: bool,
    ) -> WalletResult<SignedAmount> {
        ensure!(account != ALL_ACCOUNTS, WalletError::ReservedAccountName);
        let mut total: i128 = 0;
        for wtx in self.output_cache.txs() {
            if wtx.from_account().map(String::as_str) == Some(account) {
                // A send from this account: the outflow is what the inputs
                // lost minus what came back as change.
                let debit = self.tx_debit(wtx, include_watch_only);
                let change_back = self.tx_credit(wtx, 0, include_watch_only);
                total -= i128::try_from(debit).unwrap_or(i128::MAX);
                total += i128::try_from(change_back).unwrap_or(i128::MAX);
                continue;
            }
            let credit_to_account: u128 = wtx
                .tx()
                .outputs()
                .iter()
                .filter(|output| self.output_counts_for(output, include_watch_only))
                .filter(|output| {
                    destination_pkh(output.destination())
                        .and_then(|pkh| self.key_chain.account_of(&pkh))
                        .map_or(account.is_empty(), |label| label.as_str() == account)
                })
                .map(|output| output.value().into_atoms())
                .sum();
            if wtx.depth(self.best_height) >= min_depth.max(1)
                && wtx.is_mature(&self.chain_config, self.best_height)
            {
                total += i128::try_from(credit_to_account).unwrap_or(i128::MAX);
            }
        }
        let entries = self
            .ledger
            .sum_for_account(account)
            .ok_or(WalletError::AmountArithmeticOverflow)?;
        Ok(SignedAmount::from_atoms(total + entries.into_atoms()))
    }

    /// Sum of our coinstake outputs still maturing; `getinfo.stake`.
    pub fn staked_immature_balance(&self) -> Amount {
        self.immature_reward_balance(true)
    }

    /// Sum of our coinbase outputs still maturing; `getinfo.newmint`.
    pub fn new_mint_balance(&self) -> Amount {
        self.immature_reward_balance(false)
    }

    fn immature_reward_balance(&self, coinstake: bool) -> Amount {
        let mut total: u128 = 0;
        for wtx in self.output_cache.txs() {
            if wtx.is_coinstake() != coinstake || wtx.is_coinbase() == coinstake {
                continue;
            }
            if !matches!(wtx.state(), TxState::Confirmed { .. })
                || wtx.is_mature(&self.chain_config, self.best_height)
            {
                continue;
            }
            total += wtx
                .tx()
                .outputs()
                .iter()
                .filter(|output| self.output_counts_for(output, false))
                .map(|output| output.value().into_atoms())
                .sum::<u128>();
        }
        Amount::from_atoms(total)
    }

    // ------------------------------------------------------------------
    // Accounting

    /// Move value between two named accounts; pure bookkeeping.
    pub fn move_between_accounts(
        &mut self,
        from: &str,
        to: &str,
        amount: Amount,
        comment: String,
    ) -> WalletResult<()> {
        ensure!(
            from != ALL_ACCOUNTS && to != ALL_ACCOUNTS,
            WalletError::ReservedAccountName
        );
        ensure!(amount > Amount::ZERO, WalletError::InvalidAmount);
        let signed = amount.into_signed().ok_or(WalletError::AmountArithmeticOverflow)?;
        let debit = signed.neg().ok_or(WalletError::AmountArithmeticOverflow)?;
        let time = self.time_getter.get_time();

        let debit_pos = self.take_order_pos();
        self.ledger.add_entry(AccountingEntry {
            account: from.to_owned(),
            amount: debit,
            time,
            other_account: to.to_owned(),
            comment: comment.clone(),
            order_pos: debit_pos,
        });
        let credit_pos = self.take_order_pos();
        self.ledger.add_entry(AccountingEntry {
            account: to.to_owned(),
            amount: signed,
            time,
            other_account: from.to_owned(),
            comment,
            order_pos: credit_pos,
        });
        Ok(())
    }

    pub fn ledger(&self) -> &AccountingLedger {
        &self.ledger
    }

    /// All known account labels, including the default account.
    pub fn account_names(&self) -> Vec<String> {
        let mut names = self.key_chain.accounts();
        names.insert(String::new());
        for entry in self.ledger.entries() {
            names.insert(entry.account.clone());
        }
        names.into_iter().collect()
    }

    // ------------------------------------------------------------------
    // History

    /// Wallet transactions and accounting entries merged by order position.
    pub fn ordered_history(&self) -> Vec<HistoryItem<'_>> {
        let mut items: Vec<HistoryItem> = self
            .output_cache
            .txs()
            .map(HistoryItem::Tx)
            .chain(self.ledger.entries().iter().map(HistoryItem::Entry))
            .collect();
        items.sort_by_key(|item| item.order_pos());
        items
    }

    pub fn transactions(&self) -> impl Iterator<Item = &WalletTx> {
        self.output_cache.txs()
    }

    pub fn get_transaction(&self, tx_id: &Id<Transaction>) -> Option<&WalletTx> {
        self.output_cache.get_tx(tx_id)
    }

    // ------------------------------------------------------------------
    // Consistency

    /// Scan for "spent" markers whose spending transaction is gone (a crash
    /// or reorg artifact). Returns the count and total value affected; with
    /// `repair` the markers are cleared so the coins become spendable again.
    pub fn check_wallet(&mut self, repair: bool) -> (usize, Amount) {
        let mut mismatched = Vec::new();
        let mut total = Amount::ZERO;
        for (outpoint, spender) in self.output_cache.consumed_outpoints() {
            let spender_alive = self
                .output_cache
                .get_tx(spender)
                .map_or(false, |wtx| !matches!(wtx.state(), TxState::Inactive));
            if spender_alive {
                continue;
            }
            if let Some(output) = self.output_cache.output_of(outpoint) {
                if self.key_chain.is_mine(output.destination()) != IsMine::No {
                    total = (total + output.value()).unwrap_or(total);
                    mismatched.push(*outpoint);
                }
            }
        }
        if repair {
            for outpoint in &mismatched {
                self.output_cache.clear_consumed_marker(outpoint);
            }
            if !mismatched.is_empty() {
                log::info!("Repaired {} mismatched spent coins", mismatched.len());
            }
        }
        (mismatched.len(), total)
    }

    /// Mark a pending transaction as evicted from the mempool.
    pub fn mark_transaction_inactive(&mut self, tx_id: &Id<Transaction>) {
        if let Some(wtx) = self.output_cache.get_tx_mut(tx_id) {
            if wtx.state() == TxState::InMempool {
                wtx.set_state(TxState::Inactive);
            }
        }
    }
}

pub enum HistoryItem<'a> {
    Tx(&'a WalletTx),
    Entry(&'a AccountingEntry),
}

impl HistoryItem<'_> {
    pub fn order_pos(&self) -> u64 {
        match self {
            HistoryItem::Tx(wtx) => wtx.order_pos(),
            HistoryItem::Entry(entry) => entry.order_pos,
        }
    }
}

pub fn destination_pkh(destination: &Destination) -> Option<PublicKeyHash> {
    match destination {
        Destination::PublicKeyHash(pkh) => Some(*pkh),
        Destination::NoDestination | Destination::ScriptHash(_) => None,
    }
}
