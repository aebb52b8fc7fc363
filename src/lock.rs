//! Lock Module
//!
//! Mutual exclusion over the key-value store's set-if-absent.
//!
//! ## Semantics
//! - `try_acquire`: one SET NX PX; never retries
//! - `acquire`: polls `try_acquire` until success or the wait deadline
//! - `release`: plain DEL of the key, whoever holds it
//! - `release_owned`: deletes only while the key still holds the owner value
//!
//! Lock keys share the cache's key namespace.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{Receiver, RecvTimeoutError};

use crate::backend::KvBackend;
use crate::codec::{self, CacheEncode};
use crate::config::LockConfig;
use crate::error::Result;

/// Default time spent waiting for a contended lock
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default pause between acquire attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Owner value used by [`DistributedLock::acquire_default`]
const DEFAULT_OWNER: i32 = 1;

/// Waiting behaviour for a blocking acquire
#[derive(Debug, Clone)]
pub struct LockOptions {
    /// Give up once this much time has passed since the first attempt
    pub wait_timeout: Duration,

    /// Pause between attempts
    pub poll_interval: Duration,

    /// Any message (or a closed sender) on this channel ends the wait early
    pub cancel: Option<Receiver<()>>,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_WAIT_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            cancel: None,
        }
    }
}

impl LockOptions {
    pub fn new(wait_timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            wait_timeout,
            poll_interval,
            cancel: None,
        }
    }

    /// Set the wait timeout
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Set the poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Attach a cancellation channel
    pub fn cancel_on(mut self, receiver: Receiver<()>) -> Self {
        self.cancel = Some(receiver);
        self
    }
}

impl From<&LockConfig> for LockOptions {
    fn from(config: &LockConfig) -> Self {
        Self::new(
            Duration::from_millis(config.wait_timeout_ms),
            Duration::from_millis(config.poll_interval_ms),
        )
    }
}

/// Why the poll loop stopped waiting
enum Pause {
    Elapsed,
    Cancelled,
}

/// Lock primitives over an injected backend
#[derive(Clone)]
pub struct DistributedLock {
    backend: Arc<dyn KvBackend>,
}

impl DistributedLock {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self { backend }
    }

    /// Try once to take the lock; true when this call took it
    pub fn try_acquire<V: CacheEncode + ?Sized>(
        &self,
        key: &str,
        owner: &V,
        ttl: Duration,
    ) -> Result<bool> {
        let owner = codec::encode(owner)?;
        self.backend.set_nx(key, &owner, Some(ttl))
    }

    /// Delete the lock key regardless of who holds it
    pub fn release(&self, key: &str) -> Result<()> {
        self.backend.del(&[key])?;
        Ok(())
    }

    /// Delete the lock key only if `owner` still holds it
    pub fn release_owned<V: CacheEncode + ?Sized>(&self, key: &str, owner: &V) -> Result<bool> {
        let owner = codec::encode(owner)?;
        self.backend.del_if_eq(key, &owner)
    }

    /// Poll until the lock is taken or the wait ends
    ///
    /// Returns `Ok(false)` on timeout or cancellation; `Err` only when the
    /// backend call itself fails. The deadline is checked before each
    /// attempt, so the last attempt may finish slightly after it. A timeout
    /// too large to add to the current instant (e.g. `Duration::MAX`) waits
    /// until success or cancellation.
    pub fn acquire<V: CacheEncode + ?Sized>(
        &self,
        key: &str,
        owner: &V,
        lock_ttl: Duration,
        options: &LockOptions,
    ) -> Result<bool> {
        let started = Instant::now();
        // None: the timeout is past what Instant can represent, so wait without one
        let deadline = started.checked_add(options.wait_timeout);
        let mut attempts: u32 = 0;

        while deadline.map_or(true, |deadline| Instant::now() < deadline) {
            attempts += 1;
            if self.try_acquire(key, owner, lock_ttl)? {
                tracing::debug!("Lock {} acquired after {} attempt(s)", key, attempts);
                return Ok(true);
            }

            match pause(options.cancel.as_ref(), options.poll_interval) {
                Pause::Elapsed => {}
                Pause::Cancelled => {
                    tracing::debug!("Lock {} wait cancelled after {:?}", key, started.elapsed());
                    return Ok(false);
                }
            }
        }

        tracing::debug!(
            "Lock {} not acquired within {:?} ({} attempts)",
            key,
            options.wait_timeout,
            attempts
        );
        Ok(false)
    }

    /// Blocking acquire with explicit timing and no cancellation
    pub fn acquire_with_interval<V: CacheEncode + ?Sized>(
        &self,
        key: &str,
        owner: &V,
        lock_ttl: Duration,
        wait_timeout: Duration,
        poll_interval: Duration,
    ) -> Result<bool> {
        self.acquire(key, owner, lock_ttl, &LockOptions::new(wait_timeout, poll_interval))
    }

    /// Blocking acquire with owner `1`, a 60s wait and a 50ms poll interval
    pub fn acquire_default(&self, key: &str, lock_ttl: Duration) -> Result<bool> {
        self.acquire(key, &DEFAULT_OWNER, lock_ttl, &LockOptions::default())
    }
}

/// Sleep for `interval`, waking early if the cancel channel fires
fn pause(cancel: Option<&Receiver<()>>, interval: Duration) -> Pause {
    match cancel {
        Some(receiver) => match receiver.recv_timeout(interval) {
            Ok(()) => Pause::Cancelled,
            Err(RecvTimeoutError::Timeout) => Pause::Elapsed,
            Err(RecvTimeoutError::Disconnected) => Pause::Cancelled,
        },
        None => {
            thread::sleep(interval);
            Pause::Elapsed
        }
    }
}
