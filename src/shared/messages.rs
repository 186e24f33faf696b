//! Message types sent from the recognizer to the display context

use crate::analysis::Verdict;

/// Messages sent from the capture-side recognizer to the display context
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerToDisplay {
    /// A frame was recognized and reconciled
    Verdict { sequence: u64, verdict: Verdict },
    /// OCR failed for a frame; the previous verdict stays on display
    RecognitionFailed { sequence: u64, reason: String },
}
