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

//! Accumulates transactions for a block under construction, enforcing the
//! block size and signature-operation budgets.

use common::chain::SignedTransaction;
use common::primitives::Amount;

#[derive(Debug)]
pub struct BlockTxAccumulator {
    max_size: usize,
    max_sigops: usize,
    used_size: usize,
    used_sigops: usize,
    total_fees: Amount,
    transactions: Vec<SignedTransaction>,
}

impl BlockTxAccumulator {
    /// `base_size` accounts for the header, block signature and reward
    /// transactions that are already committed to the block.
    pub fn new(max_size: usize, max_sigops: usize, base_size: usize, base_sigops: usize) -> Self {
        Self {
            max_size,
            max_sigops,
            used_size: base_size,
            used_sigops: base_sigops,
            total_fees: Amount::ZERO,
            transactions: Vec::new(),
        }
    }

    /// Try to fit one more transaction; returns whether it was taken.
    pub fn try_add(&mut self, tx: &SignedTransaction, fee: Amount) -> bool {
        let size = tx.encoded_size();
        let sigops = tx.inputs().len();
        if self.used_size + size > self.max_size || self.used_sigops + sigops > self.max_sigops {
            return false;
        }
        let total_fees = match self.total_fees + fee {
            Some(fees) => fees,
            None => return false,
        };
        self.used_size += size;
        self.used_sigops += sigops;
        self.total_fees = total_fees;
        self.transactions.push(tx.clone());
        true
    }

    pub fn transactions(&self) -> &[SignedTransaction] {
        &self.transactions
    }

    pub fn total_fees(&self) -> Amount {
        self.total_fees
    }

    pub fn finish(self) -> (Vec<SignedTransaction>, Amount) {
        (self.transactions, self.total_fees)
    }
}
