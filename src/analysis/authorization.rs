//! Pass/fail indicator with a decaying "authorized" intensity

use tracing::debug;

use super::{AllowList, Verdict};

/// Default decrement applied on each unauthorized verdict
pub const DEFAULT_FADE_STEP: f32 = 0.1;

/// Drives the authorized/not-authorized indicator.
///
/// An authorized verdict lights the indicator fully and immediately. Each
/// unauthorized verdict dims it by one step, so a single missed read after
/// a true positive does not make it flicker off.
#[derive(Debug, Clone)]
pub struct AuthorizationState {
    fade: f32,
    fade_step: f32,
    text: String,
}

impl Default for AuthorizationState {
    fn default() -> Self {
        Self::new(DEFAULT_FADE_STEP)
    }
}

impl AuthorizationState {
    pub fn new(fade_step: f32) -> Self {
        Self {
            fade: 0.0,
            fade_step: fade_step.clamp(0.0, 1.0),
            text: String::new(),
        }
    }

    /// Apply a verdict text. Returns the new fade value.
    pub fn update(&mut self, text: &str, allow_list: &AllowList) -> f32 {
        self.record(text, allow_list.contains(text))
    }

    /// Apply a verdict already judged against an allow-list snapshot.
    ///
    /// The verdict's own classification drives the fade, so a list published
    /// after judging cannot flip the outcome.
    pub fn apply(&mut self, verdict: &Verdict) -> f32 {
        self.record(verdict.text(), verdict.is_authorized())
    }

    fn record(&mut self, text: &str, authorized: bool) -> f32 {
        if authorized {
            self.fade = 1.0;
        } else if self.fade > 0.0 {
            self.fade = (self.fade - self.fade_step).max(0.0);
            // Snap float residue left by repeated 0.1 steps
            if self.fade < 1e-4 {
                self.fade = 0.0;
            }
        }
        self.text.clear();
        self.text.push_str(text);

        debug!("Authorization update '{}': fade={:.2}", text, self.fade);
        self.fade
    }

    /// Indicator intensity in `[0, 1]`
    pub fn fade(&self) -> f32 {
        self.fade
    }

    /// Last verdict text shown
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the authorized indicator is showing at all
    pub fn is_authorized(&self) -> bool {
        self.fade > 0.0
    }
}
