use super::*;
use assert_matches::assert_matches;

#[test]
fn manual_clock_only_moves_when_advanced() {
    testonly::abort_on_panic();
    let clock = ManualClock::new();
    let start = clock.now();
    std::thread::sleep(Duration::from_millis(5));
    assert_eq!(start, clock.now());

    clock.advance(Duration::from_secs(3));
    assert_eq!(start + Duration::from_secs(3), clock.now());
    assert_eq!(Duration::from_secs(3), clock.elapsed());
}

#[test]
fn manual_clock_clones_share_time() {
    let clock = ManualClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_millis(250));
    assert_eq!(clock.now(), clone.now());
}

#[test]
fn advance_until_ignores_the_past() {
    let clock = ManualClock::new();
    let start = clock.now();
    clock.advance(Duration::from_secs(10));
    clock.advance_until(start + Duration::from_secs(1));
    assert_eq!(start + Duration::from_secs(10), clock.now());
    clock.advance_until(start + Duration::from_secs(12));
    assert_eq!(start + Duration::from_secs(12), clock.now());
}

#[test]
fn clock_since() {
    let manual = ManualClock::new();
    let clock = Clock::from(manual.clone());
    assert_matches!(clock, Clock::Manual(_));
    let start = clock.now();
    manual.advance(Duration::from_millis(1500));
    assert_eq!(Duration::from_millis(1500), clock.since(start));
    // Instants from the future saturate.
    assert_eq!(
        Duration::ZERO,
        clock.since(start + Duration::from_secs(60))
    );
}

#[tokio::test(start_paused = true)]
async fn real_clock_follows_paused_tokio_time() {
    let clock = Clock::REAL;
    let start = clock.now();
    tokio::time::advance(Duration::from_secs(10)).await;
    assert!(clock.since(start) >= Duration::from_secs(10));
}
