//! Snapshot publishing and the state exposed to rendering

use parking_lot::RwLock;
use std::sync::Arc;

use crate::analysis::AllowList;
use crate::config::AppConfig;
use crate::geometry::{Rect, RoiCalculator, ViewportPx};

/// Atomically replaceable, immutable value.
///
/// Readers take an `Arc` to the current value and keep using it for the rest
/// of their work even if a new value is published meanwhile.
#[derive(Debug)]
pub struct Snapshot<T> {
    current: Arc<RwLock<Arc<T>>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        Self {
            current: Arc::clone(&self.current),
        }
    }
}

impl<T> Snapshot<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(value))),
        }
    }

    /// Current value
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.current.read())
    }

    /// Replace the value for all future loads
    pub fn publish(&self, value: T) {
        *self.current.write() = Arc::new(value);
    }
}

/// Configuration snapshots shared by the recognizer and the display context
#[derive(Debug, Clone)]
pub struct SharedAppState {
    /// Plates that pass
    pub allow_list: Snapshot<AllowList>,
    /// Reading window geometry
    pub region: Snapshot<RoiCalculator>,
}

impl SharedAppState {
    /// Create shared state from the loaded configuration
    pub fn new(config: &AppConfig) -> Self {
        Self {
            allow_list: Snapshot::new(config.authorization.allow_list()),
            region: Snapshot::new(config.region.calculator()),
        }
    }

    /// Apply a reloaded configuration between frames.
    ///
    /// Only the allow-list and the reading window are refreshed. Enhancement,
    /// throttle and orientation settings are fixed when the session is built.
    pub fn publish_config(&self, config: &AppConfig) {
        self.allow_list.publish(config.authorization.allow_list());
        self.region.publish(config.region.calculator());
    }
}

/// Everything rendering needs to draw the indicator and the reading window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayState {
    /// Authorized indicator intensity (0.0 - 1.0)
    pub fade: f32,
    /// Whether the authorized indicator is showing
    pub authorized: bool,
    /// Last verdict text
    pub text: String,
    /// Frame the verdict came from
    pub last_sequence: Option<u64>,
    /// Masked reading window in viewport pixels
    pub overlay: Option<Rect<ViewportPx>>,
    /// The true OCR crop mapped into the viewport
    pub crop_in_viewport: Option<Rect<ViewportPx>>,
}
