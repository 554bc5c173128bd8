use std::time::{Duration, Instant};

use crossbeam_channel::TryRecvError;

use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn cancel_is_shared_and_idempotent() {
    let token = CancelToken::new();
    let clone = token.clone();
    assert!(!clone.is_cancelled());
    assert!(clone.check("x").is_ok());

    token.cancel();
    token.cancel();
    assert!(clone.is_cancelled());
    assert_eq!(clone.check("x").unwrap_err().kind(), ErrorKind::Cancelled);
}

#[test]
fn done_channel_disconnects_on_cancel() {
    let token = CancelToken::new();
    assert_eq!(token.done().try_recv(), Err(TryRecvError::Empty));

    let waiter = token.clone();
    let handle = std::thread::spawn(move || waiter.done().recv().is_err());
    token.cancel();
    assert!(handle.join().unwrap());
    assert_eq!(token.done().try_recv(), Err(TryRecvError::Disconnected));
}

#[test]
fn timeout_token_fires_after_deadline() {
    let start = Instant::now();
    let token = CancelToken::with_timeout(Duration::from_millis(30));
    assert!(!token.is_cancelled());
    assert!(token.done().recv().is_err());
    assert!(token.is_cancelled());
    assert!(start.elapsed() >= Duration::from_millis(25));
}

#[test]
fn early_cancel_beats_the_deadline() {
    let token = CancelToken::with_timeout(Duration::from_secs(60));
    token.cancel();
    assert!(token.done().recv_timeout(Duration::from_secs(1)).is_err());
    assert!(token.is_cancelled());
}
