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

//! Input signing. The sighash commits to the whole unsigned transaction, the
//! input index being signed, and the output being spent, so a witness cannot
//! be transplanted onto another input or another spend.

use crypto::key::{PrivateKey, PublicKey};

use crate::address::PublicKeyHash;
use crate::chain::transaction::{
    Destination, StandardInputSignature, Transaction, TxOutput,
};
use crate::primitives::{hash_encoded, H256};

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum TransactionSigError {
    #[error("Input index {0} out of range ({1} inputs)")]
    InvalidInputIndex(u32, u32),
    #[error("Signing failed")]
    SigningFailed,
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
    #[error("Public key does not hash to the destination being spent")]
    PublicKeyToDestinationMismatch,
    #[error("Destination cannot be signed for")]
    UnsupportedDestination,
}

pub fn signature_hash(
    tx: &Transaction,
    input_index: u32,
    spent_output: &TxOutput,
) -> Result<H256, TransactionSigError> {
    utils::ensure!(
        (input_index as usize) < tx.inputs().len(),
        TransactionSigError::InvalidInputIndex(input_index, tx.inputs().len() as u32)
    );
    Ok(hash_encoded(&(tx, input_index, spent_output)))
}

pub fn sign_input(
    private_key: &PrivateKey,
    tx: &Transaction,
    input_index: u32,
    spent_output: &TxOutput,
) -> Result<StandardInputSignature, TransactionSigError> {
    let sighash = signature_hash(tx, input_index, spent_output)?;
    let signature = private_key
        .sign_message(sighash.as_bytes())
        .map_err(|_| TransactionSigError::SigningFailed)?;
    Ok(StandardInputSignature::new(
        PublicKey::from_private_key(private_key),
        signature,
    ))
}

pub fn verify_input_signature(
    tx: &Transaction,
    input_index: u32,
    spent_output: &TxOutput,
    witness: &StandardInputSignature,
) -> Result<(), TransactionSigError> {
    match spent_output.destination() {
        Destination::PublicKeyHash(expected) => {
            let actual = PublicKeyHash::from_public_key(witness.public_key());
            utils::ensure!(
                actual == *expected,
                TransactionSigError::PublicKeyToDestinationMismatch
            );
        }
        Destination::NoDestination | Destination::ScriptHash(_) => {
            return Err(TransactionSigError::UnsupportedDestination);
        }
    }
    let sighash = signature_hash(tx, input_index, spent_output)?;
    utils::ensure!(
        witness.public_key().verify_message(witness.signature(), sighash.as_bytes()),
        TransactionSigError::SignatureVerificationFailed
    );
    Ok(())
}
