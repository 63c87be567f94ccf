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

//! Background key-pool top-up: refills the pool whenever it drops below
//! target, as long as the wallet's key material is accessible. A locked
//! wallet is simply skipped until the next round.

use std::sync::Arc;
use std::time::Duration;

use logging::log;
use parking_lot::{Condvar, Mutex, RwLock};
use utils::atomics::RelaxedAtomicBool;
use wallet::{Wallet, WalletError};

const CHECK_PERIOD: Duration = Duration::from_secs(5);

pub struct KeyPoolWorker {
    shutdown: Arc<RelaxedAtomicBool>,
    wakeup: Arc<(Mutex<()>, Condvar)>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl KeyPoolWorker {
    pub fn spawn(wallet: Arc<RwLock<Wallet>>) -> Self {
        let shutdown = Arc::new(RelaxedAtomicBool::new(false));
        let wakeup = Arc::new((Mutex::new(()), Condvar::new()));
        let thread = {
            let shutdown = Arc::clone(&shutdown);
            let wakeup = Arc::clone(&wakeup);
            std::thread::Builder::new()
                .name("keypool-topup".into())
                .spawn(move || worker(wallet, shutdown, wakeup))
                .expect("spawning the keypool thread cannot fail")
        };
        Self {
            shutdown,
            wakeup,
            thread: Some(thread),
        }
    }

    pub fn stop(mut self) {
        self.shutdown.store(true);
        self.wakeup.1.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for KeyPoolWorker {
    fn drop(&mut self) {
        self.shutdown.store(true);
        self.wakeup.1.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn worker(
    wallet: Arc<RwLock<Wallet>>,
    shutdown: Arc<RelaxedAtomicBool>,
    wakeup: Arc<(Mutex<()>, Condvar)>,
) {
    loop {
        {
            let mut guard = wakeup.0.lock();
            wakeup.1.wait_for(&mut guard, CHECK_PERIOD);
        }
        if shutdown.load() {
            return;
        }
        let needs_topup = {
            let wallet = wallet.read();
            wallet.key_pool_size() < wallet.key_pool_target()
        };
        if !needs_topup {
            continue;
        }
        match wallet.write().top_up_key_pool() {
            Ok(0) => {}
            Ok(added) => log::debug!("Key pool topped up with {added} keys"),
            Err(WalletError::WalletLocked) => {}
            Err(e) => log::warn!("Key pool top-up failed: {e}"),
        }
    }
}
