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

//! The wallet's RPC-visible surface, transport-agnostic: each method takes
//! typed parameters and returns a typed result or an [`rpc::RpcError`] with
//! a stable code. Whatever serves JSON-RPC calls into these handlers.

pub mod types;

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use chainstate::{Chainstate, DifficultyKind};
use common::address::PublicKeyHash;
use common::chain::config::ChainConfig;
use common::chain::{Destination, GenBlock, TxOutput};
use common::primitives::{Amount, DecimalAmount, Id, Idable, H256};
use consensus::pos::coin_age::{age_days, coin_day};
use consensus::pos::kernel_record::KernelRecord;
use logging::log;
use mempool::Mempool;
use parking_lot::RwLock;
use rpc::{RpcError, RpcErrorCode, RpcResult};
use utils::atomics::RelaxedAtomicBool;
use utils::warnings::Warnings;
use wallet::key_chain::IsMine;
use wallet::relocker::WalletRelocker;
use wallet::send_request::SendRequest;
use wallet::wallet_tx::WalletTx;
use wallet::{destination_pkh, HistoryItem, LockState, Wallet, WalletError, ALL_ACCOUNTS};

use types::{
    CheckWalletResult, DifficultyInfo, GetInfo, ListSinceBlock, MintingRow, ReserveBalanceInfo,
    Timestamping, TransactionRow, ValidateAddress,
};

pub struct WalletRpc {
    chain_config: Arc<ChainConfig>,
    chainstate: Arc<Chainstate>,
    mempool: Arc<Mempool>,
    wallet: Arc<RwLock<Wallet>>,
    relocker: Arc<WalletRelocker>,
    warnings: Arc<Warnings>,
    shutdown_requested: Arc<RelaxedAtomicBool>,
}

impl WalletRpc {
    pub fn new(
        chain_config: Arc<ChainConfig>,
        chainstate: Arc<Chainstate>,
        mempool: Arc<Mempool>,
        wallet: Arc<RwLock<Wallet>>,
        relocker: Arc<WalletRelocker>,
        warnings: Arc<Warnings>,
        shutdown_requested: Arc<RelaxedAtomicBool>,
    ) -> Self {
        Self {
            chain_config,
            chainstate,
            mempool,
            wallet,
            relocker,
            warnings,
            shutdown_requested,
        }
    }

    fn decimals(&self) -> u8 {
        self.chain_config.coin_decimals()
    }

    fn to_decimal(&self, amount: Amount) -> DecimalAmount {
        DecimalAmount::from_amount_full(amount, self.decimals())
    }

    fn parse_amount(&self, amount: DecimalAmount) -> RpcResult<Amount> {
        amount.to_amount(self.decimals()).ok_or_else(|| {
            RpcError::new(RpcErrorCode::InvalidParameter, "Invalid amount")
        })
    }

    fn parse_address(&self, address: &str) -> RpcResult<PublicKeyHash> {
        PublicKeyHash::from_str(address).map_err(|_| {
            RpcError::new(RpcErrorCode::InvalidAddressOrKey, "Invalid address")
        })
    }

    // ------------------------------------------------------------------
    // Node information

    pub fn getinfo(&self) -> GetInfo {
        // Chain-side reads first; the wallet lock comes last in the order.
        let tip = self.chainstate.get_best();
        let clock = self.chainstate.clock();
        let p2p_offset = clock.p2p_offset();
        let timestamping = Timestamping {
            systemclock: clock.system_time().as_secs_since_epoch(),
            adjustedtime: clock.adjusted_time().as_secs_since_epoch(),
            ntpoffset: clock.ntp_offset(),
            p2poffset: (p2p_offset != chainstate::clock::OFFSET_UNKNOWN).then_some(p2p_offset),
        };
        let difficulty = DifficultyInfo {
            pow: self.chainstate.get_difficulty(DifficultyKind::ProofOfWork),
            pos: self.chainstate.get_difficulty(DifficultyKind::ProofOfStake),
        };
        let wallet = self.wallet.read();
        let unlocked_until = match wallet.lock_state() {
            LockState::Unencrypted => None,
            LockState::Locked => Some(0),
            LockState::Unlocked { .. } => Some(
                self.relocker
                    .unlock_until()
                    .map_or(0, |time| time.as_secs_since_epoch()),
            ),
        };
        GetInfo {
            version: env!("CARGO_PKG_VERSION").to_owned(),
            blocks: tip.height.into_int(),
            balance: self.to_decimal(wallet.get_balance(1, false)),
            stake: self.to_decimal(wallet.staked_immature_balance()),
            newmint: self.to_decimal(wallet.new_mint_balance()),
            moneysupply: self.to_decimal(tip.money_supply),
            timestamping,
            difficulty,
            keypoolsize: wallet.key_pool_size(),
            unlocked_until,
            errors: self.warnings.get().unwrap_or_default(),
        }
    }

    // ------------------------------------------------------------------
    // Addresses and balances

    pub fn getnewaddress(&self, account: Option<String>) -> RpcResult<String> {
        let account = account.unwrap_or_default();
        let pkh = self
            .wallet
            .write()
            .get_new_address(&account)
            .map_err(map_wallet_error)?;
        Ok(pkh.to_string())
    }

    pub fn getbalance(
        &self,
        account: Option<String>,
        minconf: u64,
        watch_only: bool,
    ) -> RpcResult<DecimalAmount> {
        let wallet = self.wallet.read();
        match account.as_deref() {
            None | Some(ALL_ACCOUNTS) => {
                Ok(self.to_decimal(wallet.get_balance(minconf, watch_only)))
            }
            Some(name) => {
                let balance =
                    wallet.account_balance(name, minconf, watch_only).map_err(map_wallet_error)?;
                let clamped = Amount::from_signed(balance).unwrap_or(Amount::ZERO);
                Ok(self.to_decimal(clamped))
            }
        }
    }

    pub fn validateaddress(&self, address: &str) -> ValidateAddress {
        let pkh = match PublicKeyHash::from_str(address) {
            Ok(pkh) => pkh,
            Err(_) => {
                return ValidateAddress {
                    isvalid: false,
                    address: None,
                    ismine: None,
                    iswatchonly: None,
                    account: None,
                    isscript: None,
                }
            }
        };
        let wallet = self.wallet.read();
        let destination = Destination::PublicKeyHash(pkh);
        describe_destination(&destination, wallet.is_mine(&destination), &wallet)
    }

    // ------------------------------------------------------------------
    // Sending

    pub fn sendtoaddress(
        &self,
        address: &str,
        amount: DecimalAmount,
        comment: Option<String>,
        comment_to: Option<String>,
    ) -> RpcResult<String> {
        self.send_internal(None, vec![(address.to_owned(), amount)], 1, comment, comment_to)
    }

    pub fn sendfrom(
        &self,
        account: &str,
        address: &str,
        amount: DecimalAmount,
        minconf: u64,
        comment: Option<String>,
        comment_to: Option<String>,
    ) -> RpcResult<String> {
        self.send_internal(
            Some(account.to_owned()),
            vec![(address.to_owned(), amount)],
            minconf,
            comment,
            comment_to,
        )
    }

    pub fn sendmany(
        &self,
        account: &str,
        amounts: Vec<(String, DecimalAmount)>,
        minconf: u64,
        comment: Option<String>,
    ) -> RpcResult<String> {
        let mut seen = std::collections::BTreeSet::new();
        for (address, _) in &amounts {
            if !seen.insert(address.clone()) {
                return Err(RpcError::new(
                    RpcErrorCode::InvalidAddressOrKey,
                    format!("Invalid parameter, duplicated address: {address}"),
                ));
            }
        }
        let account = (account != ALL_ACCOUNTS).then(|| account.to_owned());
        self.send_internal(account, amounts, minconf, comment, None)
    }

    fn send_internal(
        &self,
        from_account: Option<String>,
        amounts: Vec<(String, DecimalAmount)>,
        minconf: u64,
        comment: Option<String>,
        comment_to: Option<String>,
    ) -> RpcResult<String> {
        let mut outputs = Vec::with_capacity(amounts.len());
        for (address, amount) in amounts {
            let pkh = self.parse_address(&address)?;
            let amount = self.parse_amount(amount)?;
            outputs.push(TxOutput::new(amount, Destination::PublicKeyHash(pkh)));
        }

        let mut metadata = BTreeMap::new();
        if let Some(comment) = comment {
            metadata.insert("comment".to_owned(), comment);
        }
        if let Some(to) = comment_to {
            metadata.insert("to".to_owned(), to);
        }

        let request = SendRequest::new(outputs)
            .with_account(from_account)
            .with_metadata(metadata)
            .with_min_depth(minconf);
        let tx = self.wallet.write().create_transaction(request).map_err(map_wallet_error)?;
        self.broadcast(&tx)?;
        Ok(tx.get_id().to_string())
    }

    pub fn mergecoins(
        &self,
        amount: DecimalAmount,
        min_value: DecimalAmount,
        output_value: DecimalAmount,
    ) -> RpcResult<Vec<String>> {
        let amount = self.parse_amount(amount)?;
        let min_value = self.parse_amount(min_value)?;
        let output_value = self.parse_amount(output_value)?;
        let txs = self
            .wallet
            .write()
            .merge_coins(amount, min_value, output_value)
            .map_err(map_wallet_error)?;
        let mut txids = Vec::with_capacity(txs.len());
        for tx in txs {
            self.broadcast(&tx)?;
            txids.push(tx.get_id().to_string());
        }
        Ok(txids)
    }

    fn broadcast(&self, tx: &common::chain::SignedTransaction) -> RpcResult<()> {
        let (fee, priority) = {
            let wallet = self.wallet.read();
            (
                wallet.transaction_fee(tx).unwrap_or(Amount::ZERO),
                wallet.transaction_priority(tx),
            )
        };
        match self.mempool.add_transaction(tx.clone(), fee, priority) {
            Ok(()) => Ok(()),
            Err(e) => {
                log::warn!("Broadcasting {} failed: {e}", tx.get_id());
                self.wallet.write().mark_transaction_inactive(&tx.get_id());
                Err(RpcError::new(RpcErrorCode::WalletError, e.to_string()))
            }
        }
    }

    pub fn resendwallettransactions(&self) -> RpcResult<Vec<String>> {
        let candidates = self.wallet.read().transactions_to_rebroadcast();
        let mut rebroadcast = Vec::new();
        for tx in candidates {
            let tx_id = tx.get_id();
            if self.mempool.contains(&tx_id) {
                continue;
            }
            let (fee, priority) = {
                let wallet = self.wallet.read();
                (
                    wallet.transaction_fee(&tx).unwrap_or(Amount::ZERO),
                    wallet.transaction_priority(&tx),
                )
            };
            if self.mempool.add_transaction(tx, fee, priority).is_ok() {
                rebroadcast.push(tx_id.to_string());
            }
        }
        Ok(rebroadcast)
    }

    // ------------------------------------------------------------------
    // Accounts

    pub fn move_account(
        &self,
        from: &str,
        to: &str,
        amount: DecimalAmount,
        comment: Option<String>,
    ) -> RpcResult<bool> {
        let amount = self.parse_amount(amount)?;
        self.wallet
            .write()
            .move_between_accounts(from, to, amount, comment.unwrap_or_default())
            .map_err(map_wallet_error)?;
        Ok(true)
    }

    pub fn listaccounts(&self, minconf: u64) -> RpcResult<BTreeMap<String, DecimalAmount>> {
        let wallet = self.wallet.read();
        let mut result = BTreeMap::new();
        for name in wallet.account_names() {
            let balance =
                wallet.account_balance(&name, minconf, false).map_err(map_wallet_error)?;
            let clamped = Amount::from_signed(balance).unwrap_or(Amount::ZERO);
            result.insert(name, self.to_decimal(clamped));
        }
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Listings

    pub fn listtransactions(
        &self,
        account: Option<String>,
        count: usize,
        from: usize,
        watch_only: bool,
    ) -> RpcResult<Vec<TransactionRow>> {
        let wallet = self.wallet.read();
        let account_filter = account.filter(|name| name != ALL_ACCOUNTS);

        // Newest first, then skip/take, then back to oldest-first.
        let mut rows = Vec::new();
        for item in wallet.ordered_history().into_iter().rev() {
            match item {
                HistoryItem::Tx(wtx) => {
                    rows.extend(self.tx_rows(&wallet, wtx, watch_only));
                }
                HistoryItem::Entry(entry) => rows.push(TransactionRow {
                    account: entry.account.clone(),
                    address: None,
                    category: "move".to_owned(),
                    amount: DecimalAmount::from_amount_minimal(
                        Amount::from_atoms(entry.amount.into_atoms().unsigned_abs()),
                        self.decimals(),
                    ),
                    fee: None,
                    confirmations: 0,
                    txid: None,
                    time: entry.time.as_secs_since_epoch(),
                    comment: (!entry.comment.is_empty()).then(|| entry.comment.clone()),
                    otheraccount: Some(entry.other_account.clone()),
                    involves_watchonly: false,
                }),
            }
        }
        if let Some(filter) = account_filter {
            rows.retain(|row| row.account == filter);
        }
        let mut page: Vec<TransactionRow> = rows.into_iter().skip(from).take(count).collect();
        page.reverse();
        Ok(page)
    }

    fn tx_rows(&self, wallet: &Wallet, wtx: &WalletTx, watch_only: bool) -> Vec<TransactionRow> {
        let mut rows = Vec::new();
        let confirmations = wtx.depth(wallet.best_height());
        let time = wtx.display_time().as_secs_since_epoch();
        let txid = wtx.tx_id().to_string();
        let comment = wtx.metadata().get("comment").cloned();
        let generated = wtx.is_coinbase() || wtx.is_coinstake();
        let fee = wallet.transaction_fee(wtx.tx());

        for output in wtx.tx().outputs() {
            if output.is_empty_marker() {
                continue;
            }
            let mine = wallet.is_mine(output.destination());
            let involves_watchonly = mine == IsMine::WatchOnly;
            if involves_watchonly && !watch_only {
                continue;
            }
            let address = destination_pkh(output.destination()).map(|pkh| pkh.to_string());
            let account = destination_pkh(output.destination())
                .and_then(|pkh| wallet.account_of_address(&pkh).cloned())
                .unwrap_or_default();

            if mine != IsMine::No {
                let category = if generated {
                    if wtx.is_mature(wallet.chain_config(), wallet.best_height()) {
                        "generate"
                    } else {
                        "immature"
                    }
                } else {
                    "receive"
                };
                rows.push(TransactionRow {
                    account,
                    address,
                    category: category.to_owned(),
                    amount: self.to_decimal(output.value()),
                    fee: None,
                    confirmations,
                    txid: Some(txid.clone()),
                    time,
                    comment: comment.clone(),
                    otheraccount: None,
                    involves_watchonly,
                });
            } else if wtx.from_me() {
                rows.push(TransactionRow {
                    account: wtx.from_account().cloned().unwrap_or_default(),
                    address,
                    category: "send".to_owned(),
                    amount: self.to_decimal(output.value()),
                    fee: fee.map(|fee| self.to_decimal(fee)),
                    confirmations,
                    txid: Some(txid.clone()),
                    time,
                    comment: comment.clone(),
                    otheraccount: None,
                    involves_watchonly: false,
                });
            }
        }
        rows
    }

    pub fn listsinceblock(
        &self,
        block_hash: Option<String>,
        target_confirms: u64,
        watch_only: bool,
    ) -> RpcResult<ListSinceBlock> {
        let since_height = match block_hash {
            None => 0,
            Some(hash) => {
                let hash = H256::from_hex_str(&hash).map_err(|_| {
                    RpcError::new(RpcErrorCode::InvalidAddressOrKey, "Invalid block hash")
                })?;
                let id: Id<GenBlock> = Id::new(hash);
                self.chainstate
                    .get_block_index(&id)
                    .ok_or_else(|| {
                        RpcError::new(RpcErrorCode::InvalidAddressOrKey, "Block not found")
                    })?
                    .height
                    .into_int()
            }
        };

        let (transactions, best_height) = {
            let wallet = self.wallet.read();
            let best_height = wallet.best_height().into_int();
            let cutoff_depth = best_height.saturating_sub(since_height) + 1;
            let mut transactions = Vec::new();
            for wtx in wallet.transactions() {
                if wtx.depth(wallet.best_height()) < cutoff_depth {
                    transactions.extend(self.tx_rows(&wallet, wtx, watch_only));
                }
            }
            (transactions, best_height)
        };

        // The block the client should pass next time to see everything
        // with at least `target_confirms` confirmations. The wallet lock is
        // released first; chain locks always come before wallet locks.
        let target_height = best_height.saturating_sub(target_confirms.max(1) - 1);
        let lastblock = self
            .block_id_at_height(target_height)
            .map_or_else(String::new, |id| id.to_string());
        Ok(ListSinceBlock {
            transactions,
            lastblock,
        })
    }

    fn block_id_at_height(&self, height: u64) -> Option<Id<GenBlock>> {
        let mut cursor = self.chainstate.get_best().block_id;
        loop {
            let entry = self.chainstate.get_block_index(&cursor)?;
            if entry.height.into_int() == height {
                return Some(entry.block_id);
            }
            if entry.height.into_int() < height {
                return None;
            }
            cursor = entry.prev_block_id;
        }
    }

    // ------------------------------------------------------------------
    // Staking visibility

    /// Rows for the minting view: every stakable output with its age,
    /// coin-days and the chance to mint within `minutes`.
    pub fn listminting(&self, minutes: u32) -> RpcResult<Vec<MintingRow>> {
        let difficulty = self.chainstate.get_difficulty(DifficultyKind::ProofOfStake);
        let now = self.chainstate.clock().adjusted_time();
        let wallet = self.wallet.read();
        let rows = wallet
            .stakable_utxos()
            .into_iter()
            .map(|utxo| {
                let address = destination_pkh(utxo.output.destination())
                    .map(|pkh| pkh.to_string())
                    .unwrap_or_default();
                let mut record = KernelRecord::new(
                    utxo.outpoint.source_id(),
                    utxo.tx_timestamp,
                    address,
                    utxo.output.value(),
                    utxo.outpoint.output_index(),
                    false,
                );
                let probability = record.probability_within_minutes(
                    &self.chain_config,
                    difficulty,
                    minutes,
                    now,
                );
                MintingRow {
                    txid: record.txid.to_string(),
                    address: record.address.clone(),
                    amount: self.to_decimal(record.value),
                    age_days: age_days(record.tx_timestamp, now),
                    coin_day: coin_day(&self.chain_config, record.value, record.tx_timestamp, now)
                        .unwrap_or(0),
                    probability,
                }
            })
            .collect();
        Ok(rows)
    }

    // ------------------------------------------------------------------
    // Locking, encryption, reserve

    pub fn walletpassphrase(
        &self,
        passphrase: &str,
        timeout_secs: u64,
        mint_only: bool,
    ) -> RpcResult<()> {
        self.relocker
            .unlock_for(passphrase, timeout_secs, mint_only)
            .map_err(map_wallet_error)
    }

    pub fn walletpassphrasechange(&self, old: &str, new: &str) -> RpcResult<()> {
        self.wallet.write().change_passphrase(old, new).map_err(map_wallet_error)
    }

    pub fn walletlock(&self) -> RpcResult<()> {
        self.relocker.lock_now().map_err(map_wallet_error)
    }

    /// Encrypt the wallet. As with the original design, the daemon restarts
    /// to drop any plaintext key material from memory, so this schedules a
    /// shutdown.
    pub fn encryptwallet(&self, passphrase: &str) -> RpcResult<()> {
        self.wallet.write().encrypt_wallet(passphrase).map_err(map_wallet_error)?;
        self.shutdown_requested.store(true);
        Ok(())
    }

    pub fn reservebalance(
        &self,
        reserve: Option<bool>,
        amount: Option<DecimalAmount>,
    ) -> RpcResult<ReserveBalanceInfo> {
        let mut wallet = self.wallet.write();
        if let Some(reserve) = reserve {
            let amount = if reserve {
                let amount = amount.ok_or_else(|| {
                    RpcError::new(
                        RpcErrorCode::InvalidParameter,
                        "must provide amount to reserve balance",
                    )
                })?;
                self.parse_amount(amount)?
            } else {
                Amount::ZERO
            };
            wallet.set_reserve_balance(amount).map_err(map_wallet_error)?;
        }
        let current = wallet.reserve_balance();
        Ok(ReserveBalanceInfo {
            reserve: current > Amount::ZERO,
            amount: self.to_decimal(current),
        })
    }

    // ------------------------------------------------------------------
    // Maintenance

    pub fn checkwallet(&self) -> CheckWalletResult {
        let (count, amount) = self.wallet.write().check_wallet(false);
        CheckWalletResult {
            mismatched_spent_coins: count,
            amount: self.to_decimal(amount),
        }
    }

    pub fn repairwallet(&self) -> CheckWalletResult {
        let (count, amount) = self.wallet.write().check_wallet(true);
        CheckWalletResult {
            mismatched_spent_coins: count,
            amount: self.to_decimal(amount),
        }
    }
}

/// One `describe` case per destination variant.
fn describe_destination(
    destination: &Destination,
    mine: IsMine,
    wallet: &Wallet,
) -> ValidateAddress {
    match destination {
        Destination::NoDestination => ValidateAddress {
            isvalid: false,
            address: None,
            ismine: None,
            iswatchonly: None,
            account: None,
            isscript: None,
        },
        Destination::PublicKeyHash(pkh) => ValidateAddress {
            isvalid: true,
            address: Some(pkh.to_string()),
            ismine: Some(mine == IsMine::Spendable),
            iswatchonly: Some(mine == IsMine::WatchOnly),
            account: wallet.account_of_address(pkh).cloned(),
            isscript: Some(false),
        },
        Destination::ScriptHash(hash) => ValidateAddress {
            isvalid: true,
            address: Some(hash.to_hex()),
            ismine: Some(false),
            iswatchonly: Some(false),
            account: None,
            isscript: Some(true),
        },
    }
}

fn map_wallet_error(error: WalletError) -> RpcError {
    let code = match &error {
        WalletError::WalletLocked | WalletError::UnlockedForMintingOnly => {
            RpcErrorCode::UnlockNeeded
        }
        WalletError::PassphraseIncorrect => RpcErrorCode::PassphraseIncorrect,
        WalletError::AlreadyEncrypted | WalletError::NotEncrypted => RpcErrorCode::WrongEncState,
        WalletError::InsufficientFunds { .. } => RpcErrorCode::InsufficientFunds,
        WalletError::DuplicatedAddress(_) | WalletError::KeyNotFound(_) => {
            RpcErrorCode::InvalidAddressOrKey
        }
        WalletError::InvalidAmount
        | WalletError::AmountBelowDust
        | WalletError::InvalidReserveAmount
        | WalletError::ReservedAccountName => RpcErrorCode::InvalidParameter,
        WalletError::AmountArithmeticOverflow
        | WalletError::KeyEncryptionFailed
        | WalletError::FeeEstimationDiverged
        | WalletError::TransactionCreation(_)
        | WalletError::Signing(_) => RpcErrorCode::WalletError,
    };
    RpcError::new(code, error.to_string())
}
