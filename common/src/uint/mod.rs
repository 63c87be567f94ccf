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

//! Little-endian-limb wide integers, carrying exactly the operations the
//! difficulty encoding and the stake kernel target comparison need. The
//! kernel comparison multiplies a 256-bit target by an amount and an age
//! weight, so both sides are widened to 512 bits; all multiplications are
//! checked and overflow is reported, never wrapped.

use crate::primitives::H256;

macro_rules! construct_uint {
    ($name:ident, $limbs:expr) => {
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(pub [u64; $limbs]);

        impl $name {
            pub const ZERO: Self = Self([0u64; $limbs]);
            pub const MAX: Self = Self([u64::MAX; $limbs]);

            pub fn from_u64(value: u64) -> Self {
                let mut limbs = [0u64; $limbs];
                limbs[0] = value;
                Self(limbs)
            }

            pub fn from_u128(value: u128) -> Self {
                let mut limbs = [0u64; $limbs];
                limbs[0] = value as u64;
                limbs[1] = (value >> 64) as u64;
                Self(limbs)
            }

            /// Position of the highest set bit, one-based; zero for `ZERO`.
            pub fn bits(&self) -> u32 {
                for (i, limb) in self.0.iter().enumerate().rev() {
                    if *limb != 0 {
                        return (i as u32) * 64 + (64 - limb.leading_zeros());
                    }
                }
                0
            }

            pub fn low_u64(&self) -> u64 {
                self.0[0]
            }

            pub fn checked_add(self, other: Self) -> Option<Self> {
                let mut result = [0u64; $limbs];
                let mut carry = 0u64;
                for i in 0..$limbs {
                    let sum = (self.0[i] as u128) + (other.0[i] as u128) + (carry as u128);
                    result[i] = sum as u64;
                    carry = (sum >> 64) as u64;
                }
                (carry == 0).then_some(Self(result))
            }

            pub fn checked_mul_u64(self, rhs: u64) -> Option<Self> {
                let mut result = [0u64; $limbs];
                let mut carry = 0u128;
                for i in 0..$limbs {
                    let product = (self.0[i] as u128) * (rhs as u128) + carry;
                    result[i] = product as u64;
                    carry = product >> 64;
                }
                (carry == 0).then_some(Self(result))
            }

            pub fn checked_mul_u128(self, rhs: u128) -> Option<Self> {
                let low = rhs as u64;
                let high = (rhs >> 64) as u64;
                let low_product = self.checked_mul_u64(low)?;
                if high == 0 {
                    return Some(low_product);
                }
                let high_product = self.checked_mul_u64(high)?.checked_shl_limb()?;
                low_product.checked_add(high_product)
            }

            // Shift left by one whole limb (64 bits).
            fn checked_shl_limb(self) -> Option<Self> {
                if self.0[$limbs - 1] != 0 {
                    return None;
                }
                let mut result = [0u64; $limbs];
                result[1..$limbs].copy_from_slice(&self.0[..$limbs - 1]);
                Some(Self(result))
            }
        }

        impl std::ops::Shl<u32> for $name {
            type Output = Self;

            fn shl(self, shift: u32) -> Self {
                let total_bits = ($limbs as u32) * 64;
                if shift >= total_bits {
                    return Self::ZERO;
                }
                let limb_shift = (shift / 64) as usize;
                let bit_shift = shift % 64;
                let mut result = [0u64; $limbs];
                for i in 0..($limbs - limb_shift) {
                    result[i + limb_shift] |= self.0[i] << bit_shift;
                    if bit_shift > 0 && i + limb_shift + 1 < $limbs {
                        result[i + limb_shift + 1] |= self.0[i] >> (64 - bit_shift);
                    }
                }
                Self(result)
            }
        }

        impl std::ops::Shr<u32> for $name {
            type Output = Self;

            fn shr(self, shift: u32) -> Self {
                let total_bits = ($limbs as u32) * 64;
                if shift >= total_bits {
                    return Self::ZERO;
                }
                let limb_shift = (shift / 64) as usize;
                let bit_shift = shift % 64;
                let mut result = [0u64; $limbs];
                for i in limb_shift..$limbs {
                    result[i - limb_shift] |= self.0[i] >> bit_shift;
                    if bit_shift > 0 && i + 1 < $limbs {
                        result[i - limb_shift] |= self.0[i + 1] << (64 - bit_shift);
                    }
                }
                Self(result)
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                for i in (0..$limbs).rev() {
                    match self.0[i].cmp(&other.0[i]) {
                        std::cmp::Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                std::cmp::Ordering::Equal
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x")?;
                for limb in self.0.iter().rev() {
                    write!(f, "{limb:016x}")?;
                }
                Ok(())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Debug::fmt(self, f)
            }
        }
    };
}

construct_uint!(Uint256, 4);
construct_uint!(Uint512, 8);

impl From<H256> for Uint256 {
    fn from(hash: H256) -> Self {
        let mut limbs = [0u64; 4];
        for (i, limb) in limbs.iter_mut().enumerate() {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(&hash.0[i * 8..(i + 1) * 8]);
            *limb = u64::from_le_bytes(bytes);
        }
        Self(limbs)
    }
}

impl From<Uint256> for Uint512 {
    fn from(value: Uint256) -> Self {
        let mut limbs = [0u64; 8];
        limbs[..4].copy_from_slice(&value.0);
        Self(limbs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_counting() {
        assert_eq!(Uint256::ZERO.bits(), 0);
        assert_eq!(Uint256::from_u64(1).bits(), 1);
        assert_eq!(Uint256::from_u64(u64::MAX).bits(), 64);
        assert_eq!((Uint256::from_u64(1) << 200).bits(), 201);
        assert_eq!(Uint256::MAX.bits(), 256);
    }

    #[test]
    fn shifts_move_across_limbs() {
        let one = Uint256::from_u64(1);
        let shifted = one << 70;
        assert_eq!(shifted.0, [0, 1 << 6, 0, 0]);
        assert_eq!(shifted >> 70, one);
        assert_eq!(one << 256, Uint256::ZERO);
        assert_eq!((one << 255) >> 255, one);
    }

    #[test]
    fn shr_recombines_split_bits() {
        let value = Uint256([0, u64::MAX, 0, 0]);
        let shifted = value >> 32;
        assert_eq!(shifted.0, [0xffff_ffff_0000_0000, 0x0000_0000_ffff_ffff, 0, 0]);
    }

    #[test]
    fn checked_multiplication() {
        let value = Uint256::from_u128(u128::MAX);
        assert_eq!(
            Uint256::from_u64(3).checked_mul_u64(5),
            Some(Uint256::from_u64(15))
        );
        assert!(value.checked_mul_u128(u128::MAX).is_some());
        assert_eq!(Uint256::MAX.checked_mul_u64(2), None);
        // The widened type fits what the narrow one cannot.
        assert!(Uint512::from(Uint256::MAX).checked_mul_u128(u128::MAX).is_some());
    }

    #[test]
    fn comparison_uses_high_limbs_first() {
        let small = Uint256([u64::MAX, 0, 0, 0]);
        let big = Uint256([0, 1, 0, 0]);
        assert!(small < big);
        assert!(Uint512::from(Uint256::MAX) < Uint512::MAX);
    }

    #[test]
    fn hash_conversion_is_little_endian() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0x01;
        bytes[8] = 0x02;
        let value = Uint256::from(H256(bytes));
        assert_eq!(value.0, [1, 2, 0, 0]);
    }
}
