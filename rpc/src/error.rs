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

/// Stable error codes; clients match on these, so the numbers are frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum RpcErrorCode {
    Misc = -1,
    InvalidParameter = -8,
    WalletError = -4,
    InvalidAddressOrKey = -5,
    InsufficientFunds = -6,
    UnlockNeeded = -13,
    PassphraseIncorrect = -14,
    WrongEncState = -15,
    DatabaseError = -20,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RpcError {
    code: RpcErrorCode,
    message: String,
}

impl RpcError {
    pub fn new(code: RpcErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> RpcErrorCode {
        self.code
    }
}

pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_frozen() {
        assert_eq!(RpcErrorCode::WalletError as i32, -4);
        assert_eq!(RpcErrorCode::InvalidAddressOrKey as i32, -5);
        assert_eq!(RpcErrorCode::InsufficientFunds as i32, -6);
        assert_eq!(RpcErrorCode::UnlockNeeded as i32, -13);
        assert_eq!(RpcErrorCode::PassphraseIncorrect as i32, -14);
        assert_eq!(RpcErrorCode::WrongEncState as i32, -15);
        assert_eq!(RpcErrorCode::DatabaseError as i32, -20);
    }

    #[test]
    fn wire_object_carries_code_and_message() {
        let error = RpcError::new(RpcErrorCode::InsufficientFunds, "not enough funds");
        let wire = crate::RpcErrorObject::from(&error);
        assert_eq!(wire.code, -6);
        assert_eq!(wire.message, "not enough funds");
    }
}
