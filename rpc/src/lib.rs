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

//! The RPC error taxonomy. Method handlers return [`RpcError`] with one of
//! the stable integer codes below; whatever transport fronts the node turns
//! it into the `{error: {code, message}, result: null}` wire object.

pub mod error;

pub use error::{RpcError, RpcErrorCode, RpcResult};

/// The wire form of a failed call.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RpcErrorObject {
    pub code: i32,
    pub message: String,
}

impl From<&RpcError> for RpcErrorObject {
    fn from(error: &RpcError) -> Self {
        Self {
            code: error.code() as i32,
            message: error.to_string(),
        }
    }
}
