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

//! Typed results of the RPC surface. All amounts serialize as decimal
//! strings with the chain's eight decimals.

use common::primitives::DecimalAmount;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Timestamping {
    pub systemclock: u64,
    pub adjustedtime: u64,
    /// Missing when no NTP measurement exists.
    pub ntpoffset: Option<i64>,
    /// Missing when the peer-offset median saturated ("unknown").
    pub p2poffset: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DifficultyInfo {
    #[serde(rename = "proof-of-work")]
    pub pow: f64,
    #[serde(rename = "proof-of-stake")]
    pub pos: f64,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct GetInfo {
    pub version: String,
    pub blocks: u64,
    pub balance: DecimalAmount,
    pub stake: DecimalAmount,
    pub newmint: DecimalAmount,
    pub moneysupply: DecimalAmount,
    pub timestamping: Timestamping,
    pub difficulty: DifficultyInfo,
    pub keypoolsize: usize,
    /// Unix time the wallet relocks, zero when locked, absent when the
    /// wallet is not encrypted.
    pub unlocked_until: Option<u64>,
    pub errors: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TransactionRow {
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub category: String,
    pub amount: DecimalAmount,
    /// Set on send rows only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<DecimalAmount>,
    pub confirmations: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    pub time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otheraccount: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub involves_watchonly: bool,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ListSinceBlock {
    pub transactions: Vec<TransactionRow>,
    pub lastblock: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReserveBalanceInfo {
    pub reserve: bool,
    pub amount: DecimalAmount,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidateAddress {
    pub isvalid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ismine: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iswatchonly: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isscript: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CheckWalletResult {
    #[serde(rename = "mismatched spent coins")]
    pub mismatched_spent_coins: usize,
    #[serde(rename = "amount affected by repair")]
    pub amount: DecimalAmount,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MintingRow {
    pub txid: String,
    pub address: String,
    pub amount: DecimalAmount,
    pub age_days: f64,
    pub coin_day: u128,
    /// Chance to mint a block within the requested window.
    pub probability: f64,
}
