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

//! Decimal-string representation of amounts for the RPC boundary. All RPC
//! amounts are strings like `"12.50000000"`; consensus code never sees this
//! type.

use super::amount::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecimalAmount {
    mantissa: u128,
    decimals: u8,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq, Clone)]
pub enum DecimalParseError {
    #[error("Empty input")]
    Empty,
    #[error("Invalid character in amount")]
    InvalidCharacter,
    #[error("More than one decimal point")]
    MultipleDecimalPoints,
    #[error("Amount out of range")]
    OutOfRange,
    #[error("Too many decimal digits")]
    TooManyDecimals,
}

impl DecimalAmount {
    pub const ZERO: Self = Self {
        mantissa: 0,
        decimals: 0,
    };

    /// Represent the amount with all `decimals` fractional digits, even if
    /// they are trailing zeros.
    pub fn from_amount_full(amount: Amount, decimals: u8) -> Self {
        Self {
            mantissa: amount.into_atoms(),
            decimals,
        }
    }

    /// Represent the amount with trailing fractional zeros stripped.
    pub fn from_amount_minimal(amount: Amount, decimals: u8) -> Self {
        let mut mantissa = amount.into_atoms();
        let mut decimals = decimals;
        while decimals > 0 && mantissa % 10 == 0 {
            mantissa /= 10;
            decimals -= 1;
        }
        Self { mantissa, decimals }
    }

    /// Convert back to atoms given the chain's decimal count. Fails if the
    /// value carries more precision than the chain supports or overflows.
    pub fn to_amount(self, decimals: u8) -> Option<Amount> {
        if self.decimals <= decimals {
            let scale = 10u128.checked_pow((decimals - self.decimals) as u32)?;
            self.mantissa.checked_mul(scale).map(Amount::from_atoms)
        } else {
            let scale = 10u128.checked_pow((self.decimals - decimals) as u32)?;
            (self.mantissa % scale == 0).then(|| Amount::from_atoms(self.mantissa / scale))
        }
    }

    pub fn mantissa(self) -> u128 {
        self.mantissa
    }

    pub fn decimals(self) -> u8 {
        self.decimals
    }
}

impl std::fmt::Display for DecimalAmount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.decimals == 0 {
            return write!(f, "{}", self.mantissa);
        }
        let scale = 10u128.pow(self.decimals as u32);
        write!(
            f,
            "{}.{:0width$}",
            self.mantissa / scale,
            self.mantissa % scale,
            width = self.decimals as usize
        )
    }
}

impl std::str::FromStr for DecimalAmount {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DecimalParseError::Empty);
        }
        let mut parts = s.splitn(3, '.');
        let int_part = parts.next().unwrap_or_default();
        let frac_part = parts.next().unwrap_or_default();
        if parts.next().is_some() {
            return Err(DecimalParseError::MultipleDecimalPoints);
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(DecimalParseError::Empty);
        }
        let digits_valid =
            |p: &str| p.chars().all(|c| c.is_ascii_digit());
        if !digits_valid(int_part) || !digits_valid(frac_part) {
            return Err(DecimalParseError::InvalidCharacter);
        }
        let decimals =
            u8::try_from(frac_part.len()).map_err(|_| DecimalParseError::TooManyDecimals)?;
        let mut mantissa: u128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            mantissa = mantissa
                .checked_mul(10)
                .and_then(|m| m.checked_add((c as u8 - b'0') as u128))
                .ok_or(DecimalParseError::OutOfRange)?;
        }
        Ok(Self { mantissa, decimals })
    }
}

impl serde::Serialize for DecimalAmount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for DecimalAmount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> DecimalAmount {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(dec("12.5").to_string(), "12.5");
        assert_eq!(dec("0.00000001").to_amount(8), Some(Amount::from_atoms(1)));
        assert_eq!(dec("1").to_amount(8), Some(Amount::from_atoms(100_000_000)));
        assert_eq!(dec(".5").to_amount(1), Some(Amount::from_atoms(5)));
        assert_eq!(dec("5.").to_amount(0), Some(Amount::from_atoms(5)));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!("".parse::<DecimalAmount>(), Err(DecimalParseError::Empty));
        assert_eq!(".".parse::<DecimalAmount>(), Err(DecimalParseError::Empty));
        assert_eq!(
            "1.2.3".parse::<DecimalAmount>(),
            Err(DecimalParseError::MultipleDecimalPoints)
        );
        assert_eq!(
            "-5".parse::<DecimalAmount>(),
            Err(DecimalParseError::InvalidCharacter)
        );
        assert_eq!(
            "1,5".parse::<DecimalAmount>(),
            Err(DecimalParseError::InvalidCharacter)
        );
    }

    #[test]
    fn excess_precision_rejected() {
        assert_eq!(dec("0.123").to_amount(2), None);
        assert_eq!(dec("0.120").to_amount(2), Some(Amount::from_atoms(12)));
    }

    #[test]
    fn full_and_minimal_renditions() {
        let amount = Amount::from_atoms(150_000_000);
        assert_eq!(
            DecimalAmount::from_amount_full(amount, 8).to_string(),
            "1.50000000"
        );
        assert_eq!(
            DecimalAmount::from_amount_minimal(amount, 8).to_string(),
            "1.5"
        );
        assert_eq!(
            DecimalAmount::from_amount_minimal(Amount::ZERO, 8).to_string(),
            "0"
        );
    }

    #[test]
    fn serde_as_string() {
        let value = DecimalAmount::from_amount_full(Amount::from_atoms(125), 2);
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"1.25\"");
        let parsed: DecimalAmount = serde_json::from_str("\"1.25\"").unwrap();
        assert_eq!(parsed.to_amount(2), Some(Amount::from_atoms(125)));
    }
}
