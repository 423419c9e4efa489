use proptest::prelude::*;
use windowpulse::{SlidingWindow, WindowStats, mean, stddev};

#[test]
fn test_window_filling_and_sliding() {
    let mut window = SlidingWindow::new(3);
    let cpu = [10.0, 10.0, 10.0, 100.0];

    for (i, value) in cpu.iter().enumerate() {
        window.append(*value, 1.0, i as u64);
        assert_eq!(window.len(), (i + 1).min(3));
    }

    // Oldest 10.0 evicted, stats over [10, 10, 100].
    let stats = window.stats();
    assert_eq!(stats.len, 3);
    assert!((stats.cpu_mean - 40.0).abs() < 1e-9);
    assert!((stats.cpu_stddev - 1800.0f64.sqrt()).abs() < 1e-9);
    assert_eq!(stats.rps_mean, 1.0);
    assert_eq!(stats.rps_stddev, 0.0);
    assert_eq!(window.timestamps().collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn test_empty_window() {
    let window = SlidingWindow::new(10);
    assert_eq!(window.stats(), WindowStats::default());
    assert_eq!(window.oldest_timestamp(), None);
}

#[test]
fn test_single_sample_has_no_spread() {
    let mut window = SlidingWindow::new(10);
    window.append(42.0, 7.0, 1);
    let stats = window.stats();
    assert_eq!(stats.cpu_mean, 42.0);
    assert_eq!(stats.cpu_stddev, 0.0);
    assert_eq!(stats.rps_stddev, 0.0);
}

#[test]
fn test_population_not_sample_variance() {
    let values = [1.0, 3.0];
    let m = mean(&values);
    // Sample variance would give sqrt(2); population gives 1.
    assert_eq!(stddev(&values, m), 1.0);
}

proptest! {
    #[test]
    fn prop_len_never_exceeds_capacity(
        capacity in 1usize..64,
        samples in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 0..512),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for (i, (cpu, rps)) in samples.iter().enumerate() {
            window.append(*cpu, *rps, i as u64);
            prop_assert!(window.len() <= capacity);
            prop_assert_eq!(window.len(), (i + 1).min(capacity));
            prop_assert_eq!(window.cpu_values().count(), window.timestamps().count());
            prop_assert_eq!(window.rps_values().count(), window.timestamps().count());
        }
    }

    #[test]
    fn prop_stats_match_retained_tail(
        capacity in 1usize..32,
        samples in prop::collection::vec(-1e3f64..1e3, 1..128),
    ) {
        let mut window = SlidingWindow::new(capacity);
        for (i, cpu) in samples.iter().enumerate() {
            window.append(*cpu, 0.0, i as u64);
        }

        let tail = &samples[samples.len().saturating_sub(capacity)..];
        let expected_mean = tail.iter().sum::<f64>() / tail.len() as f64;
        let expected_var = tail
            .iter()
            .map(|v| (v - expected_mean).powi(2))
            .sum::<f64>()
            / tail.len() as f64;

        let stats = window.stats();
        prop_assert!((stats.cpu_mean - expected_mean).abs() < 1e-6);
        prop_assert!((stats.cpu_stddev - expected_var.sqrt()).abs() < 1e-6);
        prop_assert_eq!(window.cpu_values().collect::<Vec<_>>(), tail.to_vec());
    }
}
