use super::*;
use chrono::TimeZone;

const MAX_GAP: Duration = Duration::from_millis(1500);

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000 + ms).unwrap()
}

fn millis(offsets: &[Duration]) -> Vec<u128> {
    offsets.iter().map(Duration::as_millis).collect()
}

#[test]
fn test_offsets_follow_recorded_gaps() {
    let offsets = plan_offsets(&[at(0), at(200), at(450)], 1.0, MAX_GAP);
    assert_eq!(millis(&offsets), [0, 200, 450]);
}

#[test]
fn test_long_gaps_are_capped() {
    let offsets = plan_offsets(&[at(0), at(60_000), at(60_100)], 1.0, MAX_GAP);
    assert_eq!(millis(&offsets), [0, 1500, 1600]);
}

#[test]
fn test_timescale_divides_gaps() {
    let offsets = plan_offsets(&[at(0), at(300), at(301)], 2.0, MAX_GAP);
    // 301 - 300 = 1ms, halved and floored to zero.
    assert_eq!(millis(&offsets), [0, 150, 150]);

    let offsets = plan_offsets(&[at(0), at(100)], 0.5, MAX_GAP);
    assert_eq!(millis(&offsets), [0, 200]);
}

#[test]
fn test_offsets_never_decrease() {
    let offsets = plan_offsets(&[at(500), at(100), at(900), at(900)], 1.0, MAX_GAP);
    assert_eq!(millis(&offsets), [0, 0, 800, 800]);
    assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_bad_timescale_means_real_time() {
    for scale in [0.0, -1.0, f64::NAN, f64::INFINITY] {
        let offsets = plan_offsets(&[at(0), at(100)], scale, MAX_GAP);
        assert_eq!(millis(&offsets), [0, 100]);
    }
}

#[test]
fn test_tiny_timescale_is_capped() {
    let stamps = [at(0), at(1500), at(3000), at(4500)];
    let offsets = plan_offsets(&stamps, 1e-300, MAX_GAP);
    assert_eq!(offsets[0], Duration::ZERO);
    assert!(offsets[1..].iter().all(|o| *o == MAX_OFFSET));
}

#[test]
fn test_empty_and_single() {
    assert!(plan_offsets(&[], 1.0, MAX_GAP).is_empty());
    assert_eq!(millis(&plan_offsets(&[at(7)], 1.0, MAX_GAP)), [0]);
}

#[tokio::test(start_paused = true)]
async fn test_pacer_waits_for_target_time() {
    let pacer = Pacer::start(vec![Duration::ZERO, Duration::from_millis(250)]);
    let began = Instant::now();

    pacer.wait(0).await;
    assert_eq!(began.elapsed(), Duration::ZERO);

    pacer.wait(1).await;
    assert_eq!(began.elapsed(), Duration::from_millis(250));
}

#[tokio::test(start_paused = true)]
async fn test_pacer_does_not_wait_when_behind() {
    let pacer = Pacer::start(vec![Duration::ZERO, Duration::from_millis(100)]);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let before = Instant::now();
    pacer.wait(1).await;
    assert_eq!(before.elapsed(), Duration::ZERO);
    // Out-of-range index is a no-op.
    pacer.wait(9).await;
}

#[tokio::test(start_paused = true)]
async fn test_pacer_survives_unreachable_offset() {
    let pacer = Pacer::start(vec![Duration::MAX]);
    let waited = tokio::time::timeout(Duration::from_secs(1), pacer.wait(0)).await;
    assert!(waited.is_err());
}
