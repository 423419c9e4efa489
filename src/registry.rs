use crate::window::SlidingWindow;
use fxhash::FxHashMap;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

pub type SharedWindow = Arc<Mutex<SlidingWindow>>;

/// Per-device window storage.
///
/// The map lock is only held to look up or insert an entry; the returned
/// window has its own lock, so callers never hold both at once. Entries are
/// never evicted: memory grows with the number of distinct device ids seen.
pub struct WindowRegistry {
    windows: RwLock<FxHashMap<String, SharedWindow>>,
    window_size: usize,
}

impl WindowRegistry {
    /// # Panics
    ///
    /// Panics if `window_size` is zero.
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "window_size must be positive");
        Self {
            windows: RwLock::new(FxHashMap::default()),
            window_size,
        }
    }

    /// Returns the window for `device_id`, creating an empty one on first use.
    ///
    /// Concurrent callers racing on the same new id all receive the same window.
    pub fn get_or_create(&self, device_id: &str) -> SharedWindow {
        if let Some(window) = self.windows.read().get(device_id) {
            return window.clone();
        }

        let mut windows = self.windows.write();
        // Another caller may have inserted between the two locks.
        windows
            .entry(device_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(SlidingWindow::new(self.window_size))))
            .clone()
    }

    pub fn get(&self, device_id: &str) -> Option<SharedWindow> {
        self.windows.read().get(device_id).cloned()
    }

    pub fn tracked_devices(&self) -> usize {
        self.windows.read().len()
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }
}
