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

use std::sync::atomic::{AtomicU64, Ordering};

use chainstate::NodeClock;
use common::chain::block::timestamp::BlockTimestamp;
use common::chain::block::{calculate_tx_merkle_root, Block, BlockHeader};
use common::chain::config::{create_unit_test_config, COIN};
use common::chain::{
    InputWitness, SignedTransaction, Transaction, TxInput, UtxoOutPoint,
};
use common::primitives::{hash_encoded, Time};
use common::time_getter::TimeGetter;
use rstest::rstest;
use test_utils::random::{make_seedable_rng, Rng, Seed};

use super::*;

struct TestRpc {
    rpc: WalletRpc,
    clock_now: Arc<AtomicU64>,
    chainstate: Arc<Chainstate>,
    wallet: Arc<RwLock<Wallet>>,
    shutdown: Arc<RelaxedAtomicBool>,
}

impl TestRpc {
    fn new() -> Self {
        let config = Arc::new(create_unit_test_config());
        let genesis_time = config.genesis_block().timestamp().as_int_seconds();
        let clock_now = Arc::new(AtomicU64::new(genesis_time + 60));
        let now = Arc::clone(&clock_now);
        let time_getter = TimeGetter::new(Arc::new(move || {
            Time::from_secs_since_epoch(now.load(Ordering::Relaxed))
        }));

        let clock = Arc::new(NodeClock::new(time_getter.clone()));
        let chainstate = Arc::new(Chainstate::new(Arc::clone(&config), clock));
        let wallet = Arc::new(RwLock::new(Wallet::new(
            Arc::clone(&config),
            time_getter.clone(),
        )));
        let wallet_for_events = Arc::clone(&wallet);
        chainstate.subscribe_to_events(Arc::new(move |block, height| {
            wallet_for_events.write().scan_new_block(block, height);
        }));

        let relocker = Arc::new(WalletRelocker::new(Arc::clone(&wallet), time_getter));
        let shutdown = Arc::new(RelaxedAtomicBool::new(false));
        let rpc = WalletRpc::new(
            Arc::clone(&config),
            Arc::clone(&chainstate),
            Arc::new(Mempool::new()),
            Arc::clone(&wallet),
            relocker,
            Arc::new(Warnings::new()),
            Arc::clone(&shutdown),
        );
        Self {
            rpc,
            clock_now,
            chainstate,
            wallet,
            shutdown,
        }
    }

    /// Credit `value` coins to a fresh address of the given account via a
    /// connected block.
    fn fund(&self, rng: &mut impl Rng, account: &str, value: u128) -> String {
        let address = self.rpc.getnewaddress(Some(account.to_owned())).unwrap();
        let pkh: PublicKeyHash = address.parse().unwrap();
        let tip = self.chainstate.get_best();
        let block_time = tip.timestamp.as_int_seconds() + 16;

        let coinbase = SignedTransaction::new(
            Transaction::new(
                1,
                BlockTimestamp::from_int_seconds(block_time),
                vec![TxInput::Coinbase],
                vec![TxOutput::empty_marker()],
            ),
            vec![InputWitness::NoSignature],
        )
        .unwrap();
        let payment = SignedTransaction::new(
            Transaction::new(
                1,
                BlockTimestamp::from_int_seconds(block_time),
                vec![TxInput::Utxo(UtxoOutPoint::new(
                    Id::new(hash_encoded(&rng.gen::<u64>())),
                    0,
                ))],
                vec![TxOutput::new(
                    Amount::from_atoms(value * COIN),
                    Destination::PublicKeyHash(pkh),
                )],
            ),
            vec![InputWitness::NoSignature],
        )
        .unwrap();

        let transactions = vec![coinbase, payment];
        let header = BlockHeader::new(
            1,
            tip.block_id,
            calculate_tx_merkle_root(&transactions),
            BlockTimestamp::from_int_seconds(block_time),
            self.chainstate.chain_config().pos_target_limit_compact(),
            0,
        );
        self.chainstate.process_block(Block::new(header, None, transactions)).unwrap();
        self.clock_now.fetch_add(60, Ordering::Relaxed);
        address
    }

    fn foreign_address(&self, rng: &mut (impl Rng + crypto::random::CryptoRng)) -> String {
        let (_, public_key) =
            crypto::key::PrivateKey::new_from_rng(rng, crypto::key::KeyKind::RistrettoSchnorr);
        PublicKeyHash::from_public_key(&public_key).to_string()
    }
}

fn dec(s: &str) -> DecimalAmount {
    s.parse().unwrap()
}

#[test]
fn getinfo_reports_the_basics() {
    let harness = TestRpc::new();
    let info = harness.rpc.getinfo();
    assert_eq!(info.blocks, 0);
    assert_eq!(info.balance, dec("0.00000000"));
    assert!(info.difficulty.pos > 0.0);
    assert_eq!(info.timestamping.p2poffset, Some(0));
    assert_eq!(info.timestamping.ntpoffset, None);
    assert_eq!(info.errors, "");
    assert_eq!(info.unlocked_until, None);
    assert!(!info.version.is_empty());

    // The whole object serializes.
    let json = serde_json::to_value(&info).unwrap();
    assert!(json.get("moneysupply").is_some());
    assert!(json["timestamping"].get("adjustedtime").is_some());
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn balances_and_accounts(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "A", 50);

    assert_eq!(harness.rpc.getbalance(None, 1, false).unwrap(), dec("50.00000000"));
    assert_eq!(
        harness.rpc.getbalance(Some("A".into()), 1, false).unwrap(),
        dec("50.00000000")
    );
    assert_eq!(
        harness.rpc.getbalance(Some("B".into()), 1, false).unwrap(),
        dec("0.00000000")
    );

    // S3: a move there and back leaves balances where they started.
    assert!(harness.rpc.move_account("A", "B", dec("20"), None).unwrap());
    assert_eq!(
        harness.rpc.getbalance(Some("A".into()), 1, false).unwrap(),
        dec("30.00000000")
    );
    assert!(harness.rpc.move_account("B", "A", dec("20"), None).unwrap());
    assert_eq!(
        harness.rpc.getbalance(Some("A".into()), 1, false).unwrap(),
        dec("50.00000000")
    );
    assert_eq!(
        harness.rpc.getbalance(Some("B".into()), 1, false).unwrap(),
        dec("0.00000000")
    );

    let accounts = harness.rpc.listaccounts(1).unwrap();
    assert!(accounts.contains_key("A"));
    assert!(accounts.contains_key("B"));
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn sendmany_rejects_duplicated_addresses(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "", 50);

    let target = harness.foreign_address(&mut rng);
    let error = harness
        .rpc
        .sendmany(
            ALL_ACCOUNTS,
            vec![(target.clone(), dec("1")), (target.clone(), dec("1"))],
            1,
            None,
        )
        .unwrap_err();
    assert_eq!(error.code(), RpcErrorCode::InvalidAddressOrKey);
    assert!(error.to_string().contains("duplicated address"));
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn send_to_address_broadcasts(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "", 50);

    let target = harness.foreign_address(&mut rng);
    let txid = harness
        .rpc
        .sendtoaddress(&target, dec("10"), Some("rent".into()), None)
        .unwrap();
    assert_eq!(harness.rpc.mempool.count(), 1);

    // The listing shows a send row with the comment attached.
    let rows = harness.rpc.listtransactions(None, 10, 0, false).unwrap();
    let send_row = rows.iter().find(|row| row.category == "send").unwrap();
    assert_eq!(send_row.txid.as_deref(), Some(txid.as_str()));
    assert_eq!(send_row.address.as_deref(), Some(target.as_str()));
    assert_eq!(send_row.comment.as_deref(), Some("rent"));
    assert_eq!(send_row.amount, dec("10.00000000"));

    // Insufficient funds propagates the stable code.
    let error = harness.rpc.sendtoaddress(&target, dec("100000"), None, None).unwrap_err();
    assert_eq!(error.code(), RpcErrorCode::InsufficientFunds);

    // Bad addresses are rejected before anything is built.
    let error = harness.rpc.sendtoaddress("not-an-address", dec("1"), None, None).unwrap_err();
    assert_eq!(error.code(), RpcErrorCode::InvalidAddressOrKey);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn listtransactions_pages_oldest_first(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    for _ in 0..4 {
        harness.fund(&mut rng, "", 5);
    }
    harness.rpc.move_account("", "B", dec("1"), None).unwrap();

    let all = harness.rpc.listtransactions(None, 100, 0, false).unwrap();
    // Four receive rows plus two move rows (debit and credit sides).
    assert_eq!(all.len(), 6);
    assert_eq!(all.last().unwrap().category, "move");

    // `from` skips the newest rows; the page is oldest-first.
    let page = harness.rpc.listtransactions(None, 2, 2, false).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].category, "receive");
    assert_eq!(page[1].category, "receive");
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn listsinceblock_cuts_at_the_given_block(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "", 5);
    let cut = harness.chainstate.get_best();
    harness.fund(&mut rng, "", 7);

    let result = harness
        .rpc
        .listsinceblock(Some(format!("{}", cut.block_id)), 1, false)
        .unwrap();
    assert_eq!(result.transactions.len(), 1);
    assert_eq!(result.transactions[0].amount, dec("7.00000000"));
    assert_eq!(result.lastblock, harness.chainstate.get_best().block_id.to_string());

    let everything = harness.rpc.listsinceblock(None, 1, false).unwrap();
    assert_eq!(everything.transactions.len(), 2);

    let error = harness.rpc.listsinceblock(Some("00".repeat(32)), 1, false).unwrap_err();
    assert_eq!(error.code(), RpcErrorCode::InvalidAddressOrKey);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn validateaddress_describes_ownership(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    let ours = harness.rpc.getnewaddress(Some("cold".into())).unwrap();

    let described = harness.rpc.validateaddress(&ours);
    assert!(described.isvalid);
    assert_eq!(described.ismine, Some(true));
    assert_eq!(described.account.as_deref(), Some("cold"));
    assert_eq!(described.isscript, Some(false));

    let foreign = harness.foreign_address(&mut rng);
    let described = harness.rpc.validateaddress(&foreign);
    assert!(described.isvalid);
    assert_eq!(described.ismine, Some(false));

    let described = harness.rpc.validateaddress("garbage");
    assert!(!described.isvalid);
}

#[test]
fn encryption_surface() {
    let harness = TestRpc::new();

    // Lock states on an unencrypted wallet are a wrong-enc-state error.
    assert_eq!(
        harness.rpc.walletlock().unwrap_err().code(),
        RpcErrorCode::WrongEncState
    );
    assert_eq!(
        harness.rpc.walletpassphrase("x", 10, false).unwrap_err().code(),
        RpcErrorCode::WrongEncState
    );

    harness.rpc.encryptwallet("hunter2").unwrap();
    // Encryption schedules a daemon restart.
    assert!(harness.shutdown.load());
    assert_eq!(
        harness.rpc.encryptwallet("again").unwrap_err().code(),
        RpcErrorCode::WrongEncState
    );

    assert_eq!(
        harness.rpc.walletpassphrase("wrong", 10, false).unwrap_err().code(),
        RpcErrorCode::PassphraseIncorrect
    );
    harness.rpc.walletpassphrase("hunter2", 600, false).unwrap();
    let info = harness.rpc.getinfo();
    assert!(info.unlocked_until.unwrap() > 0);

    harness.rpc.walletlock().unwrap();
    assert_eq!(harness.rpc.getinfo().unlocked_until, Some(0));

    harness.rpc.walletpassphrasechange("hunter2", "hunter3").unwrap();
    assert_eq!(
        harness.rpc.walletpassphrase("hunter2", 10, false).unwrap_err().code(),
        RpcErrorCode::PassphraseIncorrect
    );
    harness.rpc.walletpassphrase("hunter3", 10, true).unwrap();
    assert!(harness.wallet.read().can_stake());
}

#[test]
fn reservebalance_surface() {
    let harness = TestRpc::new();
    let info = harness.rpc.reservebalance(None, None).unwrap();
    assert!(!info.reserve);

    let info = harness.rpc.reservebalance(Some(true), Some(dec("12.345"))).unwrap();
    assert!(info.reserve);
    // Rounded down to a whole cent.
    assert_eq!(info.amount, dec("12.34000000"));

    assert_eq!(
        harness.rpc.reservebalance(Some(true), None).unwrap_err().code(),
        RpcErrorCode::InvalidParameter
    );

    let info = harness.rpc.reservebalance(Some(false), None).unwrap();
    assert!(!info.reserve);
    assert_eq!(info.amount, dec("0.00000000"));
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn checkwallet_and_resend(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "", 50);
    assert_eq!(harness.rpc.checkwallet().mismatched_spent_coins, 0);

    let target = harness.foreign_address(&mut rng);
    let txid = harness.rpc.sendtoaddress(&target, dec("10"), None, None).unwrap();

    // Nothing to resend while the tx sits in the mempool.
    assert!(harness.rpc.resendwallettransactions().unwrap().is_empty());

    // Simulate eviction, then the wallet notices and repairs/rebroadcasts.
    let tx_id = harness
        .wallet
        .read()
        .transactions()
        .find(|wtx| wtx.tx_id().to_string() == txid)
        .map(|wtx| wtx.tx_id())
        .unwrap();
    harness.rpc.mempool.remove_block_transactions(&{
        // A block confirming a conflicting spend is the usual cause; here
        // eviction is simulated directly.
        let tx = harness.rpc.mempool.get(&tx_id).unwrap();
        let header = BlockHeader::new(
            1,
            Id::zero(),
            calculate_tx_merkle_root(std::slice::from_ref(&tx)),
            BlockTimestamp::from_int_seconds(1),
            common::primitives::Compact(0x1d00ffff),
            0,
        );
        Block::new(header, None, vec![tx])
    });
    harness.wallet.write().mark_transaction_inactive(&tx_id);

    let resent = harness.rpc.resendwallettransactions().unwrap();
    assert_eq!(resent, vec![txid]);
}

#[rstest]
#[trace]
#[case(Seed::from_entropy())]
fn listminting_shows_stakable_outputs(#[case] seed: Seed) {
    let mut rng = make_seedable_rng(seed);
    let harness = TestRpc::new();
    harness.fund(&mut rng, "", 1_000);

    // Too young to stake: listed, but with no accumulated coin-days.
    let rows = harness.rpc.listminting(60).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].coin_day, 0);

    // Age past the minimum stake age.
    let min_age = harness.chainstate.chain_config().stake_min_age();
    harness.clock_now.fetch_add(min_age + 3600, Ordering::Relaxed);

    let rows = harness.rpc.listminting(24 * 60).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row.amount, dec("1000.00000000"));
    assert!(row.age_days > 0.0);
    assert!(row.coin_day > 0);
    assert!((0.0..=1.0).contains(&row.probability));
}
