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

use common::chain::{Transaction, UtxoOutPoint};
use common::primitives::Id;

#[derive(thiserror::Error, Debug, PartialEq, Eq, Clone)]
pub enum Error {
    #[error("Transaction {0} already in mempool")]
    DuplicateTransaction(Id<Transaction>),
    #[error("Transaction conflicts with a mempool spend of {0:?}")]
    ConflictingOutpoint(UtxoOutPoint),
    #[error("Coinbase and coinstake transactions cannot enter the mempool")]
    BlockRewardTransaction,
}
