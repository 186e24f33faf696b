//! Analysis Layer
//!
//! Turns recognized text into an authorization verdict and drives the
//! decaying pass/fail indicator.

pub mod authorization;
pub mod reconcile;

pub use authorization::AuthorizationState;
pub use reconcile::reconcile;

use std::collections::HashSet;

/// Exact-match set of authorized plate strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    plates: HashSet<String>,
}

impl AllowList {
    pub fn contains(&self, text: &str) -> bool {
        self.plates.contains(text)
    }

    pub fn len(&self) -> usize {
        self.plates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for AllowList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            plates: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Reconciled result of one processed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Authorized(String),
    Unauthorized(String),
}

impl Verdict {
    /// Classify `text` against the allow-list
    pub fn judge(text: String, allow_list: &AllowList) -> Self {
        if allow_list.contains(&text) {
            Verdict::Authorized(text)
        } else {
            Verdict::Unauthorized(text)
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Verdict::Authorized(text) | Verdict::Unauthorized(text) => text,
        }
    }

    pub fn is_authorized(&self) -> bool {
        matches!(self, Verdict::Authorized(_))
    }
}
