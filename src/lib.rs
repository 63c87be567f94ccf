// Copyright (c) 2021-2023 RBB S.r.l
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

//! Umbrella crate re-exporting the node's subsystems for embedders.

pub use blockprod;
pub use chainstate;
pub use common;
pub use consensus;
pub use crypto;
pub use logging;
pub use mempool;
pub use networking;
pub use node_lib;
pub use rpc;
pub use serialization;
pub use wallet;
