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

//! Node wiring shared by the executables: the services record that ties
//! chainstate, mempool and wallet together by shared reference, the worker
//! threads (staking, key-pool top-up, wallet relocker), and clean teardown.

mod context;
mod keypool_worker;

pub use context::{NodeContext, NodeOptions};
