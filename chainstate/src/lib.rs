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

pub mod block_index;
pub mod clock;
pub mod error;

mod detail;

pub use block_index::{BlockIndexEntry, BlockKind, ChainTip, TxLocator};
pub use clock::NodeClock;
pub use detail::{Chainstate, DifficultyKind};
pub use error::ChainstateError;

pub type ChainstateHandle = std::sync::Arc<Chainstate>;
