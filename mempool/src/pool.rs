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

use std::collections::{BTreeMap, BTreeSet};

use common::chain::{Block, SignedTransaction, Transaction, UtxoOutPoint};
use common::primitives::{Amount, Id, Idable};
use logging::log;
use parking_lot::RwLock;
use utils::ensure;

use crate::error::Error;
use crate::tx_accumulator::BlockTxAccumulator;

#[derive(Debug, Clone)]
pub struct TxEntry {
    tx: SignedTransaction,
    fee: Amount,
    /// Classic priority: sum of `input value × depth` over size at the time
    /// the transaction entered the pool. Computed by the submitter; the
    /// pool only orders by it.
    priority: u128,
}

impl TxEntry {
    pub fn tx(&self) -> &SignedTransaction {
        &self.tx
    }

    pub fn fee(&self) -> Amount {
        self.fee
    }

    pub fn priority(&self) -> u128 {
        self.priority
    }
}

#[derive(Default)]
struct Store {
    txs: BTreeMap<Id<Transaction>, TxEntry>,
    by_outpoint: BTreeMap<UtxoOutPoint, Id<Transaction>>,
}

/// The transaction pool. Validation beyond pool-local conflicts is the
/// submitter's business; the pool guarantees no two member transactions
/// spend the same outpoint.
pub struct Mempool {
    store: RwLock<Store>,
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new()
    }
}

impl Mempool {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(Store::default()),
        }
    }

    pub fn add_transaction(
        &self,
        tx: SignedTransaction,
        fee: Amount,
        priority: u128,
    ) -> crate::Result<()> {
        ensure!(
            !tx.is_coinbase() && !tx.is_coinstake(),
            Error::BlockRewardTransaction
        );
        let tx_id = tx.get_id();
        let mut store = self.store.write();
        ensure!(
            !store.txs.contains_key(&tx_id),
            Error::DuplicateTransaction(tx_id)
        );
        for input in tx.inputs() {
            if let Some(outpoint) = input.utxo_outpoint() {
                ensure!(
                    !store.by_outpoint.contains_key(outpoint),
                    Error::ConflictingOutpoint(*outpoint)
                );
            }
        }
        for input in tx.inputs() {
            if let Some(outpoint) = input.utxo_outpoint() {
                store.by_outpoint.insert(*outpoint, tx_id);
            }
        }
        store.txs.insert(tx_id, TxEntry { tx, fee, priority });
        Ok(())
    }

    pub fn contains(&self, tx_id: &Id<Transaction>) -> bool {
        self.store.read().txs.contains_key(tx_id)
    }

    pub fn get(&self, tx_id: &Id<Transaction>) -> Option<SignedTransaction> {
        self.store.read().txs.get(tx_id).map(|entry| entry.tx.clone())
    }

    pub fn count(&self) -> usize {
        self.store.read().txs.len()
    }

    /// Drop everything a connected block confirmed, plus anything that now
    /// conflicts with a confirmed spend.
    pub fn remove_block_transactions(&self, block: &Block) {
        let mut store = self.store.write();
        let mut evicted = Vec::new();
        for tx in block.transactions() {
            let tx_id = tx.get_id();
            if store.txs.contains_key(&tx_id) {
                evicted.push(tx_id);
            }
            for input in tx.inputs() {
                if let Some(outpoint) = input.utxo_outpoint() {
                    if let Some(conflicting) = store.by_outpoint.get(outpoint) {
                        evicted.push(*conflicting);
                    }
                }
            }
        }
        for tx_id in evicted {
            if let Some(entry) = store.txs.remove(&tx_id) {
                for input in entry.tx.inputs() {
                    if let Some(outpoint) = input.utxo_outpoint() {
                        store.by_outpoint.remove(outpoint);
                    }
                }
                log::debug!("Evicted {tx_id} from the mempool");
            }
        }
    }

    /// Fill the accumulator in descending `(priority, fee)` order while
    /// keeping every in-pool parent ahead of its children.
    pub fn collect_txs(&self, accumulator: &mut BlockTxAccumulator) {
        let store = self.store.read();
        let mut order: Vec<&TxEntry> = store.txs.values().collect();
        order.sort_by(|a, b| {
            (b.priority, b.fee).cmp(&(a.priority, a.fee))
        });

        let mut included: BTreeSet<Id<Transaction>> = BTreeSet::new();
        // Children whose parents are still pending get retried on the next
        // sweep; the loop ends when a sweep adds nothing.
        loop {
            let mut progressed = false;
            for entry in &order {
                let tx_id = entry.tx.get_id();
                if included.contains(&tx_id) {
                    continue;
                }
                let parents_ready = entry.tx.inputs().iter().all(|input| {
                    input.utxo_outpoint().map_or(true, |outpoint| {
                        !store.txs.contains_key(&outpoint.source_id())
                            || included.contains(&outpoint.source_id())
                    })
                });
                if parents_ready && accumulator.try_add(&entry.tx, entry.fee) {
                    included.insert(tx_id);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::chain::block::timestamp::BlockTimestamp;
    use common::chain::{Destination, InputWitness, TxInput, TxOutput};
    use common::primitives::hash_encoded;

    fn make_tx(
        spend: Vec<UtxoOutPoint>,
        n_outputs: u32,
        salt: u64,
    ) -> SignedTransaction {
        let inputs: Vec<TxInput> = spend.into_iter().map(TxInput::Utxo).collect();
        let witnesses = vec![InputWitness::NoSignature; inputs.len()];
        let outputs = (0..n_outputs)
            .map(|_| TxOutput::new(Amount::from_atoms(1000), Destination::NoDestination))
            .collect();
        let tx = Transaction::new(1, BlockTimestamp::from_int_seconds(salt), inputs, outputs);
        SignedTransaction::new(tx, witnesses).unwrap()
    }

    fn outpoint(salt: u64, index: u32) -> UtxoOutPoint {
        UtxoOutPoint::new(Id::new(hash_encoded(&salt)), index)
    }

    #[test]
    fn duplicates_and_conflicts_rejected() {
        let pool = Mempool::new();
        let tx = make_tx(vec![outpoint(1, 0)], 1, 1);
        pool.add_transaction(tx.clone(), Amount::from_atoms(10), 0).unwrap();

        assert_eq!(
            pool.add_transaction(tx.clone(), Amount::from_atoms(10), 0),
            Err(Error::DuplicateTransaction(tx.get_id()))
        );

        let conflict = make_tx(vec![outpoint(1, 0)], 2, 2);
        assert_eq!(
            pool.add_transaction(conflict, Amount::from_atoms(10), 0),
            Err(Error::ConflictingOutpoint(outpoint(1, 0)))
        );
        assert_eq!(pool.count(), 1);
    }

    #[test]
    fn ordering_is_priority_then_fee() {
        let pool = Mempool::new();
        let low = make_tx(vec![outpoint(1, 0)], 1, 1);
        let mid = make_tx(vec![outpoint(2, 0)], 1, 2);
        let high = make_tx(vec![outpoint(3, 0)], 1, 3);
        pool.add_transaction(low.clone(), Amount::from_atoms(1), 5).unwrap();
        pool.add_transaction(mid.clone(), Amount::from_atoms(9), 5).unwrap();
        pool.add_transaction(high.clone(), Amount::from_atoms(1), 50).unwrap();

        let mut acc = BlockTxAccumulator::new(usize::MAX, usize::MAX, 0, 0);
        pool.collect_txs(&mut acc);
        let ids: Vec<_> = acc.transactions().iter().map(|tx| tx.get_id()).collect();
        assert_eq!(ids, vec![high.get_id(), mid.get_id(), low.get_id()]);
    }

    #[test]
    fn parents_come_before_children() {
        let pool = Mempool::new();
        let parent = make_tx(vec![outpoint(1, 0)], 2, 1);
        let child = make_tx(vec![UtxoOutPoint::new(parent.get_id(), 0)], 1, 2);
        // The child has better priority, but must wait for its parent.
        pool.add_transaction(child.clone(), Amount::from_atoms(100), 1000).unwrap();
        pool.add_transaction(parent.clone(), Amount::from_atoms(1), 1).unwrap();

        let mut acc = BlockTxAccumulator::new(usize::MAX, usize::MAX, 0, 0);
        pool.collect_txs(&mut acc);
        let ids: Vec<_> = acc.transactions().iter().map(|tx| tx.get_id()).collect();
        assert_eq!(ids, vec![parent.get_id(), child.get_id()]);
    }

    #[test]
    fn block_connection_evicts_confirmed_and_conflicting() {
        let pool = Mempool::new();
        let confirmed = make_tx(vec![outpoint(1, 0)], 1, 1);
        let conflicting = make_tx(vec![outpoint(2, 0)], 1, 2);
        let unrelated = make_tx(vec![outpoint(3, 0)], 1, 3);
        pool.add_transaction(confirmed.clone(), Amount::ZERO, 0).unwrap();
        pool.add_transaction(conflicting.clone(), Amount::ZERO, 0).unwrap();
        pool.add_transaction(unrelated.clone(), Amount::ZERO, 0).unwrap();

        // The block confirms `confirmed` and spends `conflicting`'s input
        // through a different transaction.
        let other_spend = make_tx(vec![outpoint(2, 0)], 1, 4);
        let header = common::chain::block::BlockHeader::new(
            1,
            Id::zero(),
            common::chain::block::calculate_tx_merkle_root(&[
                confirmed.clone(),
                other_spend.clone(),
            ]),
            BlockTimestamp::from_int_seconds(100),
            common::primitives::Compact(0x1d00ffff),
            0,
        );
        let block = Block::new(header, None, vec![confirmed.clone(), other_spend]);

        pool.remove_block_transactions(&block);
        assert!(!pool.contains(&confirmed.get_id()));
        assert!(!pool.contains(&conflicting.get_id()));
        assert!(pool.contains(&unrelated.get_id()));
    }
}
