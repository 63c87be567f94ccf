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

//! The ledger of named-account bookkeeping entries. These move value
//! between labels inside one wallet; they are not transactions and never
//! touch consensus.

use common::primitives::signed_amount::sum_signed_amounts;
use common::primitives::{SignedAmount, Time};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingEntry {
    pub account: String,
    /// Positive for credits, negative for debits.
    pub amount: SignedAmount,
    pub time: Time,
    pub other_account: String,
    pub comment: String,
    /// Position in the merged (transactions + entries) ordering; strictly
    /// monotone across the whole wallet.
    pub order_pos: u64,
}

#[derive(Default)]
pub struct AccountingLedger {
    entries: Vec<AccountingEntry>,
}

impl AccountingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, entry: AccountingEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[AccountingEntry] {
        &self.entries
    }

    pub fn entries_for_account<'a>(
        &'a self,
        account: &'a str,
    ) -> impl Iterator<Item = &'a AccountingEntry> {
        self.entries.iter().filter(move |entry| entry.account == account)
    }

    pub fn sum_for_account(&self, account: &str) -> Option<SignedAmount> {
        sum_signed_amounts(self.entries_for_account(account).map(|entry| entry.amount))
    }

    /// The grand total over all entries; every internal move writes a
    /// matching debit/credit pair, so this is zero in a consistent wallet.
    pub fn total_sum(&self) -> Option<SignedAmount> {
        sum_signed_amounts(self.entries.iter().map(|entry| entry.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(account: &str, amount: i128, order_pos: u64) -> AccountingEntry {
        AccountingEntry {
            account: account.into(),
            amount: SignedAmount::from_atoms(amount),
            time: Time::from_secs_since_epoch(1),
            other_account: String::new(),
            comment: String::new(),
            order_pos,
        }
    }

    #[test]
    fn sums_per_account_and_total() {
        let mut ledger = AccountingLedger::new();
        ledger.add_entry(entry("a", -20, 0));
        ledger.add_entry(entry("b", 20, 1));
        ledger.add_entry(entry("b", -5, 2));
        ledger.add_entry(entry("a", 5, 3));

        assert_eq!(
            ledger.sum_for_account("a"),
            Some(SignedAmount::from_atoms(-15))
        );
        assert_eq!(
            ledger.sum_for_account("b"),
            Some(SignedAmount::from_atoms(15))
        );
        assert_eq!(ledger.sum_for_account("c"), Some(SignedAmount::ZERO));
        assert_eq!(ledger.total_sum(), Some(SignedAmount::ZERO));
    }
}
