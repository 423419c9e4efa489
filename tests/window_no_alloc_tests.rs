use assert_no_alloc::*;
use windowpulse::{SlidingWindow, WindowRegistry};

#[cfg(debug_assertions)]
#[global_allocator]
static ALLOC: AllocDisabler = AllocDisabler;

#[test]
fn test_full_window_append_no_alloc() {
    let mut window = SlidingWindow::new(16);
    for i in 0..16 {
        window.append(i as f64, i as f64, i);
    }

    assert_no_alloc(|| {
        for i in 16..1024 {
            window.append(i as f64, i as f64, i);
        }
    });
    assert_eq!(window.len(), 16);
}

#[test]
fn test_window_stats_no_alloc() {
    let mut window = SlidingWindow::new(8);
    for i in 0..20 {
        window.append(i as f64, 2.0 * i as f64, i);
    }

    let stats = assert_no_alloc(|| window.stats());
    assert_eq!(stats.len, 8);
    assert_eq!(stats.cpu_mean, 15.5);
}

#[test]
fn test_registry_lookup_of_known_device_no_alloc() {
    let registry = WindowRegistry::new(4);
    registry.get_or_create("known");

    let window = assert_no_alloc(|| registry.get_or_create("known"));
    assert_eq!(window.lock().capacity(), 4);
}
