// Copyright (c) 2021 RBB S.r.l
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

//! An unsigned monetary amount in atoms (the smallest indivisible unit).
//! All arithmetic is checked; the operators return `Option` so that callers
//! must decide what an overflow means in their context.

use serialization::{Decode, Encode};

use super::signed_amount::SignedAmount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Amount {
    atoms: u128,
}

impl Amount {
    pub const ZERO: Amount = Amount { atoms: 0 };
    pub const MAX: Amount = Amount { atoms: u128::MAX };

    pub const fn from_atoms(atoms: u128) -> Self {
        Amount { atoms }
    }

    pub const fn into_atoms(self) -> u128 {
        self.atoms
    }

    pub fn into_signed(self) -> Option<SignedAmount> {
        i128::try_from(self.atoms).ok().map(SignedAmount::from_atoms)
    }

    pub fn from_signed(amount: SignedAmount) -> Option<Self> {
        u128::try_from(amount.into_atoms()).ok().map(Amount::from_atoms)
    }
}

impl std::ops::Add for Amount {
    type Output = Option<Amount>;

    fn add(self, other: Self) -> Self::Output {
        self.atoms.checked_add(other.atoms).map(|atoms| Amount { atoms })
    }
}

impl std::ops::Sub for Amount {
    type Output = Option<Amount>;

    fn sub(self, other: Self) -> Self::Output {
        self.atoms.checked_sub(other.atoms).map(|atoms| Amount { atoms })
    }
}

impl std::ops::Mul<u128> for Amount {
    type Output = Option<Amount>;

    fn mul(self, other: u128) -> Self::Output {
        self.atoms.checked_mul(other).map(|atoms| Amount { atoms })
    }
}

impl std::ops::Div<u128> for Amount {
    type Output = Option<Amount>;

    fn div(self, other: u128) -> Self::Output {
        self.atoms.checked_div(other).map(|atoms| Amount { atoms })
    }
}

impl std::ops::Rem<u128> for Amount {
    type Output = Option<Amount>;

    fn rem(self, other: u128) -> Self::Output {
        self.atoms.checked_rem(other).map(|atoms| Amount { atoms })
    }
}

/// Sum an iterator of amounts, failing on overflow.
pub fn sum_amounts(iter: impl IntoIterator<Item = Amount>) -> Option<Amount> {
    iter.into_iter().try_fold(Amount::ZERO, |acc, x| acc + x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checked_arithmetic() {
        let a = Amount::from_atoms(10);
        let b = Amount::from_atoms(3);
        assert_eq!(a + b, Some(Amount::from_atoms(13)));
        assert_eq!(a - b, Some(Amount::from_atoms(7)));
        assert_eq!(b - a, None);
        assert_eq!(a * 2, Some(Amount::from_atoms(20)));
        assert_eq!(Amount::MAX + Amount::from_atoms(1), None);
        assert_eq!(Amount::MAX * 2, None);
        assert_eq!(a / 0, None);
    }

    #[test]
    fn signed_conversion_roundtrip() {
        let a = Amount::from_atoms(123);
        assert_eq!(Amount::from_signed(a.into_signed().unwrap()), Some(a));
        assert_eq!(Amount::MAX.into_signed(), None);
        assert_eq!(Amount::from_signed(SignedAmount::from_atoms(-1)), None);
    }

    #[test]
    fn summing() {
        let amounts = vec![Amount::from_atoms(1), Amount::from_atoms(2), Amount::from_atoms(3)];
        assert_eq!(sum_amounts(amounts), Some(Amount::from_atoms(6)));
        assert_eq!(sum_amounts(vec![Amount::MAX, Amount::from_atoms(1)]), None);
        assert_eq!(sum_amounts(vec![]), Some(Amount::ZERO));
    }
}
