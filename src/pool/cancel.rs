use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use crossbeam_channel::{Receiver, Sender, bounded, select};
use parking_lot::Mutex;

use crate::foundation::error::{RigError, RigResult};

/// Shared cancellation signal.
///
/// Clones observe the same signal. Cancelling is idempotent; once cancelled a token stays
/// cancelled. [`CancelToken::done`] yields a channel that disconnects on cancellation so workers
/// can `select!` on it next to their job stream.
#[derive(Clone, Debug)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(tx)),
                done: rx,
            }),
        }
    }

    /// Token that cancels itself after `timeout` unless cancelled earlier.
    pub fn with_timeout(timeout: Duration) -> Self {
        let token = Self::new();
        let watcher = token.clone();
        thread::spawn(move || {
            select! {
                recv(watcher.done()) -> _ => {}
                default(timeout) => {
                    tracing::debug!(?timeout, "deadline reached, cancelling");
                    watcher.cancel();
                }
            }
        });
        token
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::SeqCst) {
            // Dropping the only sender disconnects every `done()` receiver.
            self.inner.trigger.lock().take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Channel that never yields a value and disconnects once the token is cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.inner.done
    }

    /// `Err(Cancelled)` once the token is cancelled.
    pub fn check(&self, what: &str) -> RigResult<()> {
        if self.is_cancelled() {
            Err(RigError::cancelled(what.to_string()))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pool/cancel.rs"]
mod tests;
