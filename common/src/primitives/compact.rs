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

//! The compact "nBits" difficulty encoding: a base-256 floating point number
//! with a one-byte exponent and a three-byte mantissa whose top bit encodes
//! the (invalid for targets) sign.

use serialization::{Decode, Encode};

use crate::uint::Uint256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Encode, Decode)]
pub struct Compact(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCompact;

impl TryFrom<Compact> for Uint256 {
    type Error = InvalidCompact;

    fn try_from(compact: Compact) -> Result<Self, Self::Error> {
        let bits = compact.0;
        let exponent = bits >> 24;
        let negative = bits & 0x0080_0000 != 0;
        let mantissa = bits & 0x007f_ffff;

        if mantissa == 0 {
            return Ok(Uint256::ZERO);
        }
        if negative {
            return Err(InvalidCompact);
        }

        if exponent <= 3 {
            Ok(Uint256::from_u64((mantissa >> (8 * (3 - exponent))) as u64))
        } else {
            let overflow = exponent > 34
                || (mantissa > 0xff && exponent > 33)
                || (mantissa > 0xffff && exponent > 32);
            if overflow {
                return Err(InvalidCompact);
            }
            Ok(Uint256::from_u64(mantissa as u64) << (8 * (exponent - 3)))
        }
    }
}

impl From<Uint256> for Compact {
    fn from(target: Uint256) -> Self {
        let mut exponent = (target.bits() + 7) / 8;
        let mut mantissa: u64 = if exponent <= 3 {
            target.low_u64() << (8 * (3 - exponent))
        } else {
            (target >> (8 * (exponent - 3))).low_u64()
        };
        if mantissa & 0x0080_0000 != 0 {
            mantissa >>= 8;
            exponent += 1;
        }
        Compact((exponent << 24) | (mantissa as u32 & 0x007f_ffff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_expansion() {
        // The classic maximum-target encoding: mantissa 0xffff at byte size 29.
        let target = Uint256::try_from(Compact(0x1d00ffff)).unwrap();
        assert_eq!(target, Uint256::from_u64(0xffff) << (8 * 26));
        assert_eq!(Compact::from(target), Compact(0x1d00ffff));
    }

    #[test]
    fn zero_mantissa_is_zero_target() {
        assert_eq!(Uint256::try_from(Compact(0x1d000000)), Ok(Uint256::ZERO));
        assert_eq!(Uint256::try_from(Compact(0)), Ok(Uint256::ZERO));
    }

    #[test]
    fn negative_and_overflowing_rejected() {
        assert_eq!(Uint256::try_from(Compact(0x01fedcba)), Err(InvalidCompact));
        assert_eq!(Uint256::try_from(Compact(0xff123456)), Err(InvalidCompact));
    }

    #[test]
    fn small_exponent_shifts_mantissa_down() {
        assert_eq!(
            Uint256::try_from(Compact(0x01120000)),
            Ok(Uint256::from_u64(0x12))
        );
        assert_eq!(
            Uint256::try_from(Compact(0x02123400)),
            Ok(Uint256::from_u64(0x1234))
        );
        assert_eq!(
            Uint256::try_from(Compact(0x03123456)),
            Ok(Uint256::from_u64(0x123456))
        );
    }

    #[test]
    fn compression_normalizes_high_mantissa_bit() {
        // 0x80 in the top mantissa byte must move to the next exponent.
        let target = Uint256::from_u64(0x8000) << 8;
        let compact = Compact::from(target);
        assert_eq!(Uint256::try_from(compact), Ok(target));
        assert_eq!(compact.0 & 0x0080_0000, 0);
    }
}
