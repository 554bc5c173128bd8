use super::*;

#[test]
fn unit_f64_stays_in_half_open_range() {
    assert_eq!(unit_f64(0), 0.0);
    let max = unit_f64(u64::MAX);
    assert!(max < 1.0);
    assert!(max > 0.999_999);
}

#[test]
fn os_random_draws_are_in_range() {
    let draws = OsRandom.gen_randoms(64).unwrap();
    assert_eq!(draws.len(), 64);
    assert!(draws.iter().all(|d| (0.0..1.0).contains(d)));
}

#[test]
fn seeded_random_is_reproducible() {
    let a = SeededRandom::new(42).gen_randoms(10).unwrap();
    let b = SeededRandom::new(42).gen_randoms(10).unwrap();
    let c = SeededRandom::new(43).gen_randoms(10).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.iter().all(|d| (0.0..1.0).contains(d)));
}

#[test]
fn fixed_randoms_replay_then_run_dry() {
    let src = FixedRandoms::new([0.1, 0.2, 0.3]);
    assert_eq!(src.gen_randoms(2).unwrap(), vec![0.1, 0.2]);
    assert_eq!(src.remaining(), 1);
    assert!(src.gen_randoms(2).is_err());
    assert_eq!(src.gen_randoms(1).unwrap(), vec![0.3]);
}
