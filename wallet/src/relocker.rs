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

//! The wallet re-locker: a single timed worker that re-locks the wallet
//! when a passphrase unlock expires.
//!
//! There is at most one worker thread alive at any time. A new unlock with
//! a later deadline extends the existing worker's wake time; it never
//! spawns a second worker. The worker holds only the narrow relock mutex
//! and takes the wallet lock at the moment of re-locking.

use std::sync::Arc;
use std::time::Duration;

use common::primitives::Time;
use common::time_getter::TimeGetter;
use logging::log;
use parking_lot::{Condvar, Mutex, RwLock};

use crate::error::WalletResult;
use crate::Wallet;

struct RelockState {
    unlock_until: Option<Time>,
    worker_alive: bool,
    shutdown: bool,
}

struct RelockerInner {
    state: Mutex<RelockState>,
    cv: Condvar,
    wallet: Arc<RwLock<Wallet>>,
    time_getter: TimeGetter,
}

pub struct WalletRelocker {
    inner: Arc<RelockerInner>,
    worker: Mutex<Option<std::thread::JoinHandle<()>>>,
}

impl WalletRelocker {
    pub fn new(wallet: Arc<RwLock<Wallet>>, time_getter: TimeGetter) -> Self {
        Self {
            inner: Arc::new(RelockerInner {
                state: Mutex::new(RelockState {
                    unlock_until: None,
                    worker_alive: false,
                    shutdown: false,
                }),
                cv: Condvar::new(),
                wallet,
                time_getter,
            }),
            worker: Mutex::new(None),
        }
    }

    /// Unlock the wallet and (re)arm the relock timer. The resulting wake
    /// time never shrinks: overlapping unlocks extend the deadline.
    pub fn unlock_for(
        &self,
        passphrase: &str,
        timeout_secs: u64,
        mint_only: bool,
    ) -> WalletResult<()> {
        self.inner.wallet.write().unlock(passphrase, mint_only)?;

        let deadline = self
            .inner
            .time_getter
            .get_time()
            .saturating_offset(timeout_secs.min(i64::MAX as u64) as i64);

        let mut state = self.inner.state.lock();
        state.unlock_until = Some(match state.unlock_until {
            Some(existing) => existing.max(deadline),
            None => deadline,
        });
        if state.worker_alive {
            // The live worker re-reads the deadline on wake-up.
            self.inner.cv.notify_all();
        } else {
            state.worker_alive = true;
            drop(state);
            let inner = Arc::clone(&self.inner);
            let handle = std::thread::Builder::new()
                .name("wallet-relocker".into())
                .spawn(move || relock_worker(inner))
                .expect("spawning the relocker thread cannot fail");
            *self.worker.lock() = Some(handle);
        }
        Ok(())
    }

    /// Explicit `walletlock`: lock right away and disarm the timer.
    pub fn lock_now(&self) -> WalletResult<()> {
        self.inner.wallet.write().lock()?;
        let mut state = self.inner.state.lock();
        state.unlock_until = None;
        self.inner.cv.notify_all();
        Ok(())
    }

    pub fn unlock_until(&self) -> Option<Time> {
        self.inner.state.lock().unlock_until
    }

    pub fn is_worker_alive(&self) -> bool {
        self.inner.state.lock().worker_alive
    }

    pub fn shutdown(&self) {
        {
            let mut state = self.inner.state.lock();
            state.shutdown = true;
            self.inner.cv.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WalletRelocker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn relock_worker(inner: Arc<RelockerInner>) {
    log::debug!("Relock worker started");
    let mut state = inner.state.lock();
    loop {
        if state.shutdown {
            state.worker_alive = false;
            return;
        }
        let deadline = match state.unlock_until {
            // Disarmed (explicit lock): the worker retires.
            None => {
                state.worker_alive = false;
                return;
            }
            Some(deadline) => deadline,
        };
        let now = inner.time_getter.get_time();
        if now < deadline {
            let remaining =
                Duration::from_secs(deadline.as_secs_since_epoch() - now.as_secs_since_epoch());
            // Cap the wait so deadline extensions and mocked clocks are
            // noticed promptly.
            let wait = remaining.min(Duration::from_millis(200));
            inner.cv.wait_for(&mut state, wait);
            continue;
        }
        // Deadline passed: relock while still holding the narrow mutex,
        // taking the wallet lock only for the relock itself.
        if let Err(e) = inner.wallet.write().lock() {
            log::error!("Relocking the wallet failed: {e}");
        } else {
            log::info!("Wallet relocked after unlock timeout");
        }
        state.unlock_until = None;
        state.worker_alive = false;
        return;
    }
}
