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

//! Cache of the wallet's transactions and which of their outputs have been
//! consumed, maintained as blocks and own sends are observed.

use std::collections::BTreeMap;

use common::chain::{Transaction, TxOutput, UtxoOutPoint};
use common::primitives::Id;

use crate::wallet_tx::WalletTx;

#[derive(Default)]
pub struct OutputCache {
    txs: BTreeMap<Id<Transaction>, WalletTx>,
    /// Outpoint of one of our outputs -> the transaction that spends it.
    consumed: BTreeMap<UtxoOutPoint, Id<Transaction>>,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_tx(&mut self, wallet_tx: WalletTx) {
        let tx_id = wallet_tx.tx_id();
        for input in wallet_tx.tx().inputs() {
            if let Some(outpoint) = input.utxo_outpoint() {
                self.consumed.insert(*outpoint, tx_id);
            }
        }
        self.txs.insert(tx_id, wallet_tx);
    }

    pub fn get_tx(&self, tx_id: &Id<Transaction>) -> Option<&WalletTx> {
        self.txs.get(tx_id)
    }

    pub fn get_tx_mut(&mut self, tx_id: &Id<Transaction>) -> Option<&mut WalletTx> {
        self.txs.get_mut(tx_id)
    }

    pub fn txs(&self) -> impl Iterator<Item = &WalletTx> {
        self.txs.values()
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.txs.contains_key(tx_id)
    }

    pub fn is_consumed(&self, outpoint: &UtxoOutPoint) -> bool {
        self.consumed.contains_key(outpoint)
    }

    pub fn spender_of(&self, outpoint: &UtxoOutPoint) -> Option<Id<Transaction>> {
        self.consumed.get(outpoint).copied()
    }

    pub fn consumed_outpoints(&self) -> impl Iterator<Item = (&UtxoOutPoint, &Id<Transaction>)> {
        self.consumed.iter()
    }

    pub fn clear_consumed_marker(&mut self, outpoint: &UtxoOutPoint) {
        self.consumed.remove(outpoint);
    }

    /// Resolve an outpoint to one of our transactions' outputs.
    pub fn output_of(&self, outpoint: &UtxoOutPoint) -> Option<&TxOutput> {
        self.txs
            .get(&outpoint.source_id())
            .and_then(|wtx| wtx.tx().outputs().get(outpoint.output_index() as usize))
    }

    /// All unspent `(outpoint, output)` pairs of our transactions,
    /// regardless of ownership, depth or maturity; the wallet layers those
    /// filters on top.
    pub fn unspent_outputs(&self) -> impl Iterator<Item = (UtxoOutPoint, &WalletTx, &TxOutput)> {
        self.txs.values().flat_map(move |wtx| {
            let tx_id = wtx.tx_id();
            wtx.tx().outputs().iter().enumerate().filter_map(move |(index, output)| {
                let outpoint = UtxoOutPoint::new(tx_id, index as u32);
                (!self.is_consumed(&outpoint)).then_some((outpoint, wtx, output))
            })
        })
    }
}
