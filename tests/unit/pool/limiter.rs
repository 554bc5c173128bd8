use std::time::{Duration, Instant};

use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn unlimited_never_waits() {
    let limiter = RateLimiter::new(RateLimit::Unlimited).unwrap();
    let cancel = CancelToken::new();
    let start = Instant::now();
    for _ in 0..1000 {
        limiter.acquire(&cancel).unwrap();
    }
    assert!(start.elapsed() < Duration::from_millis(500));
}

#[test]
fn per_second_spaces_out_starts() {
    let limiter = RateLimiter::new(RateLimit::PerSecond(50.0)).unwrap();
    let cancel = CancelToken::new();
    let start = Instant::now();
    for _ in 0..6 {
        limiter.acquire(&cancel).unwrap();
    }
    // First slot is immediate, the next five are 20ms apart.
    assert!(start.elapsed() >= Duration::from_millis(95));
}

#[test]
fn cancel_interrupts_a_wait() {
    let limiter = RateLimiter::new(RateLimit::PerSecond(0.1)).unwrap();
    let cancel = CancelToken::new();
    limiter.acquire(&cancel).unwrap();

    let trigger = cancel.clone();
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        trigger.cancel();
    });
    let start = Instant::now();
    let err = limiter.acquire(&cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn invalid_rates_are_rejected() {
    for r in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        assert!(RateLimit::PerSecond(r).validate().is_err(), "rate {r}");
    }
    assert_eq!(RateLimit::from_per_second(None), RateLimit::Unlimited);
    assert_eq!(
        RateLimit::from_per_second(Some(2.0)),
        RateLimit::PerSecond(2.0)
    );
}
