// Copyright (c) 2021-2022 RBB S.r.l
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

use crypto::key::{PublicKey, Signature};
use serialization::{Decode, Encode};

use crate::address::PublicKeyHash;
use crate::chain::block::timestamp::BlockTimestamp;
use crate::primitives::{amount::sum_amounts, hash_encoded, Amount, Id, Idable, H256};

/// Reference to an output of a previous transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct UtxoOutPoint {
    id: Id<Transaction>,
    index: u32,
}

impl UtxoOutPoint {
    pub fn new(id: Id<Transaction>, index: u32) -> Self {
        Self { id, index }
    }

    pub fn source_id(&self) -> Id<Transaction> {
        self.id
    }

    pub fn output_index(&self) -> u32 {
        self.index
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Encode, Decode)]
pub enum TxInput {
    /// The input of a block-reward transaction; spends nothing.
    #[codec(index = 0)]
    Coinbase,
    #[codec(index = 1)]
    Utxo(UtxoOutPoint),
}

impl TxInput {
    pub fn utxo_outpoint(&self) -> Option<&UtxoOutPoint> {
        match self {
            TxInput::Coinbase => None,
            TxInput::Utxo(outpoint) => Some(outpoint),
        }
    }
}

/// Where an output can be spent to. The variants mirror the three script
/// destinations the wallet understands; everything else is not "ours" by
/// definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub enum Destination {
    /// No spending condition at all; used by the empty coinstake marker
    /// output and by burns.
    #[codec(index = 0)]
    NoDestination,
    #[codec(index = 1)]
    PublicKeyHash(PublicKeyHash),
    #[codec(index = 2)]
    ScriptHash(H256),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub struct TxOutput {
    value: Amount,
    destination: Destination,
}

impl TxOutput {
    pub fn new(value: Amount, destination: Destination) -> Self {
        Self { value, destination }
    }

    /// The empty marker output that distinguishes a coinstake transaction.
    pub fn empty_marker() -> Self {
        Self {
            value: Amount::ZERO,
            destination: Destination::NoDestination,
        }
    }

    pub fn value(&self) -> Amount {
        self.value
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn is_empty_marker(&self) -> bool {
        self.value == Amount::ZERO && self.destination == Destination::NoDestination
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct Transaction {
    version: u32,
    /// Transaction timestamp; consumed by the stake kernel as the time of the
    /// staked output's transaction.
    timestamp: BlockTimestamp,
    inputs: Vec<TxInput>,
    outputs: Vec<TxOutput>,
}

impl Transaction {
    pub fn new(
        version: u32,
        timestamp: BlockTimestamp,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
    ) -> Self {
        Self {
            version,
            timestamp,
            inputs,
            outputs,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn timestamp(&self) -> BlockTimestamp {
        self.timestamp
    }

    pub fn inputs(&self) -> &[TxInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TxOutput] {
        &self.outputs
    }

    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && matches!(self.inputs[0], TxInput::Coinbase)
    }

    pub fn is_coinstake(&self) -> bool {
        !self.inputs.is_empty()
            && matches!(self.inputs[0], TxInput::Utxo(_))
            && self.outputs.len() >= 2
            && self.outputs[0].is_empty_marker()
    }

    pub fn total_output_value(&self) -> Option<Amount> {
        sum_amounts(self.outputs.iter().map(|output| output.value()))
    }
}

impl Idable for Transaction {
    type Tag = Transaction;

    fn get_id(&self) -> Id<Transaction> {
        Id::new(hash_encoded(self))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct StandardInputSignature {
    public_key: PublicKey,
    signature: Signature,
}

impl StandardInputSignature {
    pub fn new(public_key: PublicKey, signature: Signature) -> Self {
        Self {
            public_key,
            signature,
        }
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub enum InputWitness {
    #[codec(index = 0)]
    NoSignature,
    #[codec(index = 1)]
    Standard(StandardInputSignature),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TransactionCreationError {
    #[error("The number of signatures does not match the number of inputs")]
    InvalidWitnessCount,
}

/// A transaction together with one witness per input.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct SignedTransaction {
    transaction: Transaction,
    signatures: Vec<InputWitness>,
}

impl SignedTransaction {
    pub fn new(
        transaction: Transaction,
        signatures: Vec<InputWitness>,
    ) -> Result<Self, TransactionCreationError> {
        utils::ensure!(
            signatures.len() == transaction.inputs().len(),
            TransactionCreationError::InvalidWitnessCount
        );
        Ok(Self {
            transaction,
            signatures,
        })
    }

    pub fn transaction(&self) -> &Transaction {
        &self.transaction
    }

    pub fn signatures(&self) -> &[InputWitness] {
        &self.signatures
    }

    pub fn inputs(&self) -> &[TxInput] {
        self.transaction.inputs()
    }

    pub fn outputs(&self) -> &[TxOutput] {
        self.transaction.outputs()
    }

    pub fn is_coinbase(&self) -> bool {
        self.transaction.is_coinbase()
    }

    pub fn is_coinstake(&self) -> bool {
        self.transaction.is_coinstake()
    }

    /// Serialized size, which is what fee and block size policies charge for.
    pub fn encoded_size(&self) -> usize {
        self.encode().len()
    }
}

impl Idable for SignedTransaction {
    type Tag = Transaction;

    fn get_id(&self) -> Id<Transaction> {
        self.transaction.get_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_tx(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Transaction {
        Transaction::new(1, BlockTimestamp::from_int_seconds(1_700_000_000), inputs, outputs)
    }

    #[test]
    fn coinbase_recognition() {
        let coinbase = make_tx(vec![TxInput::Coinbase], vec![TxOutput::empty_marker()]);
        assert!(coinbase.is_coinbase());
        assert!(!coinbase.is_coinstake());
    }

    #[test]
    fn coinstake_recognition() {
        let outpoint = UtxoOutPoint::new(Id::zero(), 0);
        let coinstake = make_tx(
            vec![TxInput::Utxo(outpoint)],
            vec![
                TxOutput::empty_marker(),
                TxOutput::new(Amount::from_atoms(100), Destination::NoDestination),
            ],
        );
        assert!(coinstake.is_coinstake());
        assert!(!coinstake.is_coinbase());

        // Without the marker first it is a plain spend.
        let plain = make_tx(
            vec![TxInput::Utxo(outpoint)],
            vec![TxOutput::new(Amount::from_atoms(100), Destination::NoDestination)],
        );
        assert!(!plain.is_coinstake());
    }

    #[test]
    fn id_changes_with_any_field() {
        let outpoint = UtxoOutPoint::new(Id::zero(), 0);
        let tx1 = make_tx(vec![TxInput::Utxo(outpoint)], vec![TxOutput::empty_marker()]);
        let mut tx2 = tx1.clone();
        tx2.timestamp = BlockTimestamp::from_int_seconds(1_700_000_001);
        assert_ne!(tx1.get_id(), tx2.get_id());
    }

    #[test]
    fn witness_count_must_match() {
        let outpoint = UtxoOutPoint::new(Id::zero(), 0);
        let tx = make_tx(vec![TxInput::Utxo(outpoint)], vec![TxOutput::empty_marker()]);
        assert_eq!(
            SignedTransaction::new(tx.clone(), vec![]),
            Err(TransactionCreationError::InvalidWitnessCount)
        );
        assert!(SignedTransaction::new(tx, vec![InputWitness::NoSignature]).is_ok());
    }
}
