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

//! The send pipeline: coin selection over the spendable view, a
//! fee-per-kilobyte loop, a change output, and per-input signatures. All
//! the send-shaped RPCs (`sendtoaddress`, `sendfrom`, `sendmany`,
//! `mergecoins`) funnel through here.

use std::collections::BTreeMap;

use common::chain::block::timestamp::BlockTimestamp;
use common::chain::signature::sign_input;
use common::chain::{
    Destination, InputWitness, SignedTransaction, Transaction, TxInput, TxOutput,
};
use common::primitives::{amount::sum_amounts, Amount};
use utils::ensure;

use crate::error::{WalletError, WalletResult};
use crate::{destination_pkh, SpendableUtxo, Wallet};

/// How many times the fee loop may grow the fee before giving up; each
/// round only adds bytes for a larger fee value, so two is the norm.
const FEE_LOOP_LIMIT: usize = 16;

#[derive(Debug, Clone)]
pub struct SendRequest {
    pub outputs: Vec<TxOutput>,
    pub from_account: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub min_depth: u64,
}

impl SendRequest {
    pub fn new(outputs: Vec<TxOutput>) -> Self {
        Self {
            outputs,
            from_account: None,
            metadata: BTreeMap::new(),
            min_depth: 1,
        }
    }

    pub fn with_account(mut self, account: Option<String>) -> Self {
        self.from_account = account;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_min_depth(mut self, min_depth: u64) -> Self {
        self.min_depth = min_depth;
        self
    }
}

impl Wallet {
    /// Build, sign and register a transaction paying `request.outputs`.
    /// The caller is responsible for broadcasting the result.
    pub fn create_transaction(&mut self, request: SendRequest) -> WalletResult<SignedTransaction> {
        self.ensure_can_spend()?;
        ensure!(!request.outputs.is_empty(), WalletError::InvalidAmount);
        for output in &request.outputs {
            ensure!(output.value() > Amount::ZERO, WalletError::InvalidAmount);
            ensure!(
                output.value() >= self.chain_config().dust_threshold(),
                WalletError::AmountBelowDust
            );
        }
        let target = sum_amounts(request.outputs.iter().map(|o| o.value()))
            .ok_or(WalletError::AmountArithmeticOverflow)?;

        let mut candidates = self.spendable_utxos(request.min_depth, false);
        candidates.sort_by(|a, b| b.output.value().cmp(&a.output.value()));
        let available = sum_amounts(candidates.iter().map(|u| u.output.value()))
            .ok_or(WalletError::AmountArithmeticOverflow)?;

        // One change key for the whole fee loop.
        let change_pkh = self.get_new_address(request.from_account.as_deref().unwrap_or(""))?;
        let dust = self.chain_config().dust_threshold();
        let timestamp = BlockTimestamp::from_time(self.best_effort_now());

        let mut fee = self.chain_config().min_tx_fee_per_kb();
        for _ in 0..FEE_LOOP_LIMIT {
            let needed = (target + fee).ok_or(WalletError::AmountArithmeticOverflow)?;
            let selected = select_coins(&candidates, needed).ok_or(
                WalletError::InsufficientFunds {
                    available,
                    needed,
                },
            )?;
            let selected_total = sum_amounts(selected.iter().map(|u| u.output.value()))
                .ok_or(WalletError::AmountArithmeticOverflow)?;

            let mut outputs = request.outputs.clone();
            let change = (selected_total - needed).ok_or(WalletError::AmountArithmeticOverflow)?;
            if change >= dust {
                outputs.push(TxOutput::new(
                    change,
                    Destination::PublicKeyHash(change_pkh),
                ));
            }

            let signed = self.sign_spend(&selected, outputs, timestamp)?;
            let required = fee_for_size(self.chain_config().min_tx_fee_per_kb(), signed.encoded_size())
                .ok_or(WalletError::AmountArithmeticOverflow)?;
            if fee >= required {
                self.add_own_transaction(
                    signed.clone(),
                    request.from_account.clone(),
                    request.metadata.clone(),
                );
                return Ok(signed);
            }
            fee = required;
        }
        Err(WalletError::FeeEstimationDiverged)
    }

    /// Consolidate small outputs: spend outputs below `min_value` into
    /// payouts of roughly `output_value`, stopping once `limit` input value
    /// has been merged. Returns the created transactions.
    pub fn merge_coins(
        &mut self,
        limit: Amount,
        min_value: Amount,
        output_value: Amount,
    ) -> WalletResult<Vec<SignedTransaction>> {
        self.ensure_can_spend()?;
        ensure!(
            limit > Amount::ZERO && output_value > Amount::ZERO,
            WalletError::InvalidAmount
        );
        ensure!(
            output_value >= self.chain_config().dust_threshold(),
            WalletError::AmountBelowDust
        );

        let mut candidates = self.spendable_utxos(1, false);
        candidates.retain(|utxo| utxo.output.value() < min_value);
        candidates.sort_by_key(|utxo| utxo.output.value());

        let fee = self.chain_config().min_tx_fee_per_kb();
        let timestamp = BlockTimestamp::from_time(self.best_effort_now());
        let mut merged_total = Amount::ZERO;
        let mut transactions = Vec::new();
        let mut chunk: Vec<SpendableUtxo> = Vec::new();
        let mut chunk_value = Amount::ZERO;

        for utxo in candidates {
            if merged_total >= limit {
                break;
            }
            merged_total = (merged_total + utxo.output.value()).unwrap_or(Amount::MAX);
            chunk_value = (chunk_value + utxo.output.value()).unwrap_or(Amount::MAX);
            chunk.push(utxo);

            let threshold = (output_value + fee).ok_or(WalletError::AmountArithmeticOverflow)?;
            if chunk_value >= threshold && chunk.len() >= 2 {
                let payout = (chunk_value - fee).ok_or(WalletError::AmountArithmeticOverflow)?;
                let to = self.get_new_address("")?;
                let outputs = vec![TxOutput::new(payout, Destination::PublicKeyHash(to))];
                let signed = self.sign_spend(&chunk, outputs, timestamp)?;
                self.add_own_transaction(signed.clone(), None, BTreeMap::new());
                transactions.push(signed);
                chunk.clear();
                chunk_value = Amount::ZERO;
            }
        }
        Ok(transactions)
    }

    fn sign_spend(
        &self,
        inputs: &[SpendableUtxo],
        outputs: Vec<TxOutput>,
        timestamp: BlockTimestamp,
    ) -> WalletResult<SignedTransaction> {
        let tx_inputs: Vec<TxInput> =
            inputs.iter().map(|utxo| TxInput::Utxo(utxo.outpoint)).collect();
        let tx = Transaction::new(
            self.chain_config().block_version(),
            timestamp,
            tx_inputs,
            outputs,
        );
        let mut witnesses = Vec::with_capacity(inputs.len());
        for (index, utxo) in inputs.iter().enumerate() {
            let pkh = destination_pkh(utxo.output.destination())
                .ok_or(WalletError::Signing(
                    common::chain::signature::TransactionSigError::UnsupportedDestination,
                ))?;
            let key = self.private_key_for_destination(&pkh, false)?;
            let witness = sign_input(&key, &tx, index as u32, &utxo.output)?;
            witnesses.push(InputWitness::Standard(witness));
        }
        Ok(SignedTransaction::new(tx, witnesses)?)
    }

    fn best_effort_now(&self) -> common::primitives::Time {
        self.time_getter().get_time()
    }

    /// Classic priority for mempool ordering: `Σ input value × depth`,
    /// scaled down by the transaction size.
    pub fn transaction_priority(&self, tx: &SignedTransaction) -> u128 {
        let size = tx.encoded_size().max(1) as u128;
        let weighted: u128 = tx
            .inputs()
            .iter()
            .filter_map(|input| input.utxo_outpoint())
            .filter_map(|outpoint| {
                let wtx = self.get_transaction(&outpoint.source_id())?;
                let output = wtx.tx().outputs().get(outpoint.output_index() as usize)?;
                Some(output.value().into_atoms() * wtx.depth(self.best_height()) as u128)
            })
            .sum();
        weighted / size
    }

    /// Fee actually paid by one of our transactions (inputs minus outputs);
    /// `None` when inputs are unknown to the wallet.
    pub fn transaction_fee(&self, tx: &SignedTransaction) -> Option<Amount> {
        let mut input_total = Amount::ZERO;
        for input in tx.inputs() {
            let outpoint = input.utxo_outpoint()?;
            let wtx = self.get_transaction(&outpoint.source_id())?;
            let output = wtx.tx().outputs().get(outpoint.output_index() as usize)?;
            input_total = (input_total + output.value())?;
        }
        let output_total = tx.transaction().total_output_value()?;
        input_total - output_total
    }
}

fn fee_for_size(fee_per_kb: Amount, size: usize) -> Option<Amount> {
    let kilobytes = (size as u128).div_ceil(1000).max(1);
    fee_per_kb * kilobytes
}

/// Greedy largest-first selection until the target is covered.
fn select_coins(candidates: &[SpendableUtxo], needed: Amount) -> Option<Vec<SpendableUtxo>> {
    let mut selected = Vec::new();
    let mut total = Amount::ZERO;
    for utxo in candidates {
        if total >= needed {
            break;
        }
        total = (total + utxo.output.value())?;
        selected.push(utxo.clone());
    }
    (total >= needed).then_some(selected)
}
