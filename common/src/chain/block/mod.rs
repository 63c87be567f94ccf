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

pub mod timestamp;

use crypto::key::{PublicKey, Signature};
use serialization::{Decode, Encode};

use crate::primitives::{hash_encoded, Compact, Id, Idable, H256};

use self::timestamp::BlockTimestamp;
use super::transaction::SignedTransaction;

/// Tag for ids that may refer to either the genesis block or a regular
/// block; `Id<GenBlock>` is what `prev_block_id` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenBlock {}

impl From<Id<Block>> for Id<GenBlock> {
    fn from(id: Id<Block>) -> Self {
        Id::new(id.to_hash())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BlockHeader {
    version: u32,
    prev_block_id: Id<GenBlock>,
    merkle_root: H256,
    timestamp: BlockTimestamp,
    bits: Compact,
    nonce: u32,
}

impl BlockHeader {
    pub fn new(
        version: u32,
        prev_block_id: Id<GenBlock>,
        merkle_root: H256,
        timestamp: BlockTimestamp,
        bits: Compact,
        nonce: u32,
    ) -> Self {
        Self {
            version,
            prev_block_id,
            merkle_root,
            timestamp,
            bits,
            nonce,
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn prev_block_id(&self) -> &Id<GenBlock> {
        &self.prev_block_id
    }

    pub fn merkle_root(&self) -> H256 {
        self.merkle_root
    }

    pub fn timestamp(&self) -> BlockTimestamp {
        self.timestamp
    }

    pub fn bits(&self) -> Compact {
        self.bits
    }

    pub fn nonce(&self) -> u32 {
        self.nonce
    }
}

impl Idable for BlockHeader {
    type Tag = Block;

    fn get_id(&self) -> Id<Block> {
        Id::new(hash_encoded(self))
    }
}

/// The signature a staker puts on a proof-of-stake block with the key of the
/// coinstake output being spent.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct BlockSignature {
    public_key: PublicKey,
    signature: Signature,
}

impl BlockSignature {
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
pub struct Block {
    header: BlockHeader,
    /// `None` for proof-of-work blocks (and genesis); proof-of-stake blocks
    /// must carry the staker's signature over the header id.
    signature: Option<BlockSignature>,
    transactions: Vec<SignedTransaction>,
}

impl Block {
    pub fn new(
        header: BlockHeader,
        signature: Option<BlockSignature>,
        transactions: Vec<SignedTransaction>,
    ) -> Self {
        Self {
            header,
            signature,
            transactions,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn signature(&self) -> Option<&BlockSignature> {
        self.signature.as_ref()
    }

    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    pub fn timestamp(&self) -> BlockTimestamp {
        self.header.timestamp()
    }

    pub fn prev_block_id(&self) -> &Id<GenBlock> {
        self.header.prev_block_id()
    }

    /// A proof-of-stake block carries its coinstake as the first
    /// non-coinbase transaction.
    pub fn is_proof_of_stake(&self) -> bool {
        self.transactions.len() >= 2 && self.transactions[1].is_coinstake()
    }

    pub fn coinstake_transaction(&self) -> Option<&SignedTransaction> {
        self.is_proof_of_stake().then(|| &self.transactions[1])
    }

    /// Byte offset of a transaction's encoding inside the encoded block.
    /// The stake kernel commits to the offset of the staked output's
    /// transaction, so this must be computed the same way everywhere.
    pub fn tx_byte_offset(&self, tx_index: usize) -> Option<u32> {
        if tx_index >= self.transactions.len() {
            return None;
        }
        // The transactions vector is the last field of the encoding, so the
        // offset is the total size minus everything from this tx onward.
        let total = self.encode().len();
        let trailing: usize =
            self.transactions[tx_index..].iter().map(|tx| tx.encoded_size()).sum();
        u32::try_from(total - trailing).ok()
    }
}

impl Idable for Block {
    type Tag = Block;

    fn get_id(&self) -> Id<Block> {
        self.header.get_id()
    }
}

/// Merkle root over the transaction ids: pairwise sha256d with the last
/// element duplicated at odd levels; the zero hash for an empty list.
pub fn calculate_tx_merkle_root(transactions: &[SignedTransaction]) -> H256 {
    let mut level: Vec<H256> = transactions.iter().map(|tx| tx.get_id().to_hash()).collect();
    if level.is_empty() {
        return H256::zero();
    }
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = *pair.last().expect("chunk is never empty");
            let mut concat = [0u8; 64];
            concat[..32].copy_from_slice(&left.0);
            concat[32..].copy_from_slice(&right.0);
            next.push(H256(crypto::hash::sha256d(&concat)));
        }
        level = next;
    }
    level[0]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::transaction::{Transaction, TxInput, TxOutput, UtxoOutPoint};
    use crate::primitives::Amount;

    fn signed_tx(n: u64, inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> SignedTransaction {
        let witnesses = vec![crate::chain::transaction::InputWitness::NoSignature; inputs.len()];
        let tx = Transaction::new(1, BlockTimestamp::from_int_seconds(n), inputs, outputs);
        SignedTransaction::new(tx, witnesses).unwrap()
    }

    fn coinbase(n: u64) -> SignedTransaction {
        signed_tx(n, vec![TxInput::Coinbase], vec![TxOutput::empty_marker()])
    }

    fn coinstake(n: u64) -> SignedTransaction {
        signed_tx(
            n,
            vec![TxInput::Utxo(UtxoOutPoint::new(Id::zero(), 0))],
            vec![
                TxOutput::empty_marker(),
                TxOutput::new(
                    Amount::from_atoms(1),
                    crate::chain::transaction::Destination::NoDestination,
                ),
            ],
        )
    }

    fn make_block(transactions: Vec<SignedTransaction>) -> Block {
        let header = BlockHeader::new(
            1,
            Id::zero(),
            calculate_tx_merkle_root(&transactions),
            BlockTimestamp::from_int_seconds(1_700_000_000),
            Compact(0x1d00ffff),
            0,
        );
        Block::new(header, None, transactions)
    }

    #[test]
    fn pos_block_recognition() {
        let pos = make_block(vec![coinbase(1), coinstake(2)]);
        assert!(pos.is_proof_of_stake());
        assert!(pos.coinstake_transaction().is_some());

        let pow = make_block(vec![coinbase(1)]);
        assert!(!pow.is_proof_of_stake());
        assert!(pow.coinstake_transaction().is_none());
    }

    #[test]
    fn merkle_root_depends_on_order_and_content() {
        let a = coinbase(1);
        let b = coinstake(2);
        let ab = calculate_tx_merkle_root(&[a.clone(), b.clone()]);
        let ba = calculate_tx_merkle_root(&[b.clone(), a.clone()]);
        assert_ne!(ab, ba);
        assert_eq!(calculate_tx_merkle_root(&[]), H256::zero());
        // A single transaction is its own root.
        assert_eq!(calculate_tx_merkle_root(&[a.clone()]), a.get_id().to_hash());
        // Odd count duplicates the tail, which still changes the root.
        let c = coinstake(3);
        assert_ne!(
            calculate_tx_merkle_root(&[a.clone(), b.clone()]),
            calculate_tx_merkle_root(&[a, b, c])
        );
    }

    #[test]
    fn block_id_is_header_id() {
        let block = make_block(vec![coinbase(1)]);
        assert_eq!(block.get_id(), block.header().get_id());
    }

    #[test]
    fn tx_byte_offsets_partition_the_encoding() {
        let txs = vec![coinbase(1), coinstake(2), coinstake(3)];
        let block = make_block(txs.clone());
        let encoded = block.encode();

        for (i, tx) in txs.iter().enumerate() {
            let offset = block.tx_byte_offset(i).unwrap() as usize;
            let tx_bytes = tx.encode();
            assert_eq!(&encoded[offset..offset + tx_bytes.len()], &tx_bytes[..]);
        }
        assert_eq!(block.tx_byte_offset(3), None);
    }
}
