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

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use common::chain::config::{Builder as ConfigBuilder, ChainType};
use common::time_getter::TimeGetter;
use node_lib::{NodeContext, NodeOptions};

#[derive(Parser, Debug)]
#[command(name = "embercoin-daemon", about = "Embercoin node daemon", version)]
struct RunOptions {
    /// Run against the test network instead of mainnet.
    #[arg(long)]
    testnet: bool,

    /// Run a local regression-test chain.
    #[arg(long, conflicts_with = "testnet")]
    regtest: bool,

    /// Disable the staking loop.
    #[arg(long)]
    no_stake: bool,

    /// Probe STUN servers once at startup to learn the external address.
    #[arg(long)]
    discover_external_ip: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let options = RunOptions::parse();

    let chain_type = if options.regtest {
        ChainType::Regtest
    } else if options.testnet {
        ChainType::Testnet
    } else {
        ChainType::Mainnet
    };
    let chain_config = Arc::new(ConfigBuilder::new(chain_type).build());
    logging::log::info!(
        "Starting embercoin-daemon on {:?} (genesis {})",
        chain_config.chain_type(),
        chain_config.genesis_block_id()
    );

    let context = NodeContext::new(
        chain_config,
        TimeGetter::default(),
        NodeOptions {
            stake: !options.no_stake,
            discover_external_ip: options.discover_external_ip,
            ..NodeOptions::default()
        },
    );

    // The daemon parks here until something (e.g. `encryptwallet`) asks for
    // a shutdown; worker teardown happens in `shutdown`.
    while !context.shutdown_requested() {
        std::thread::sleep(Duration::from_millis(200));
    }
    context.shutdown();
    Ok(())
}
