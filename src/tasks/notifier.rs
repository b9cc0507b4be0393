//! Counted completion signalling across several task sets
//!
//! A [`CompletionGroup`] is shared by a caller that runs several task sets on
//! their own threads and wants to block until all of them have finished. Each
//! task set receives one [`CompletionToken`]; the group's [`wait`] returns once
//! every token handed out has been completed.
//!
//! A token is consumed when it completes, so a task set cannot signal twice.
//! A token dropped without completing still counts as completed, which keeps a
//! waiter from hanging on a task set that was never run.
//!
//! [`wait`]: CompletionGroup::wait

use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
struct Shared {
    pending: Mutex<usize>,
    all_done: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, usize> {
        // The counter stays consistent even if a holder panicked.
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Join point for a group of independently running task sets.
#[derive(Debug, Clone, Default)]
pub struct CompletionGroup {
    shared: Arc<Shared>,
}

impl CompletionGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one more participant and return its completion handle.
    pub fn token(&self) -> CompletionToken {
        *self.shared.lock() += 1;
        CompletionToken {
            shared: Some(Arc::clone(&self.shared)),
        }
    }

    /// Number of tokens handed out that have not completed yet.
    pub fn pending(&self) -> usize {
        *self.shared.lock()
    }

    /// Block until every token handed out so far has completed.
    pub fn wait(&self) {
        let mut pending = self.shared.lock();
        while *pending > 0 {
            pending = self
                .shared
                .all_done
                .wait(pending)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// Like [`wait`](Self::wait) but gives up after `timeout`.
    ///
    /// Returns `true` if all tokens completed within the limit.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let pending = self.shared.lock();
        let (pending, _) = self
            .shared
            .all_done
            .wait_timeout_while(pending, timeout, |p| *p > 0)
            .unwrap_or_else(|e| e.into_inner());
        *pending == 0
    }
}

/// Single-use completion handle for one task set.
#[derive(Debug)]
pub struct CompletionToken {
    shared: Option<Arc<Shared>>,
}

impl CompletionToken {
    /// Signal that the owning task set has finished.
    pub fn complete(mut self) {
        self.signal();
    }

    fn signal(&mut self) {
        if let Some(shared) = self.shared.take() {
            let mut pending = shared.lock();
            *pending = pending.saturating_sub(1);
            if *pending == 0 {
                shared.all_done.notify_all();
            }
        }
    }
}

impl Drop for CompletionToken {
    fn drop(&mut self) {
        self.signal();
    }
}
