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

use common::address::PublicKeyHash;
use common::chain::{TransactionCreationError, signature::TransactionSigError};
use common::primitives::Amount;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum WalletError {
    #[error("Wallet is locked")]
    WalletLocked,
    #[error("Wallet is unlocked for block minting only")]
    UnlockedForMintingOnly,
    #[error("Wallet is already encrypted")]
    AlreadyEncrypted,
    #[error("Wallet is not encrypted")]
    NotEncrypted,
    #[error("The supplied passphrase is incorrect")]
    PassphraseIncorrect,
    #[error("Amount must be positive")]
    InvalidAmount,
    #[error("Send amount below the dust floor")]
    AmountBelowDust,
    #[error("Reserve amount cannot be negative")]
    InvalidReserveAmount,
    #[error("Insufficient funds (available: {available:?}, needed: {needed:?})")]
    InsufficientFunds { available: Amount, needed: Amount },
    #[error("Duplicated address: {0}")]
    DuplicatedAddress(String),
    #[error("No private key for destination {0}")]
    KeyNotFound(PublicKeyHash),
    #[error("The account name \"*\" is reserved")]
    ReservedAccountName,
    #[error("Amount arithmetic overflow")]
    AmountArithmeticOverflow,
    #[error("Key material encryption failed")]
    KeyEncryptionFailed,
    #[error("Could not assemble a transaction within the fee loop")]
    FeeEstimationDiverged,
    #[error("Transaction creation error: {0}")]
    TransactionCreation(#[from] TransactionCreationError),
    #[error("Transaction signing error: {0}")]
    Signing(#[from] TransactionSigError),
}

pub type WalletResult<T> = Result<T, WalletError>;
