//! Application Coordinator
//!
//! Wires the capture-side [`PlateRecognizer`] to the [`DisplayContext`] that
//! owns everything rendering observes. The recognizer runs on the capture
//! thread; OCR completes on a tokio worker; results come back to the display
//! context over a channel.

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{debug, info, warn};

use crate::analysis::{reconcile, AuthorizationState, Verdict};
use crate::capture::{CaptureConfig, CapturedFrame, FrameSink, FrameThrottle};
use crate::config::AppConfig;
use crate::geometry::{AspectFill, GeometryError, Size, SourcePx, ViewportPx};
use crate::shared::{DisplayState, RecognizerToDisplay, SharedAppState};
use crate::vision::{top_candidates, EnhancementPipeline, OcrEngine, OcrRequest, VisionError};

/// Frame counters kept by the recognizer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames delivered by capture
    pub frames_seen: u64,
    /// Frames dropped by the throttle
    pub frames_throttled: u64,
    /// Frames sent to OCR
    pub frames_recognized: u64,
    /// Frames where OCR failed
    pub recognition_failures: u64,
    /// Frames where OCR found no text
    pub empty_frames: u64,
}

/// Per-frame recognition pipeline, driven by the capture thread
pub struct PlateRecognizer {
    throttle: FrameThrottle,
    enhancer: EnhancementPipeline,
    ocr: Arc<dyn OcrEngine>,
    shared: SharedAppState,
    to_display: Sender<RecognizerToDisplay>,
    runtime: Runtime,
    stats: PipelineStats,
}

impl PlateRecognizer {
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Mutable access to the enhancer, e.g. to attach a preview channel
    pub fn enhancer_mut(&mut self) -> &mut EnhancementPipeline {
        &mut self.enhancer
    }

    fn recognize(&mut self, frame: &CapturedFrame) -> Result<Option<Verdict>, VisionError> {
        // Frame dimensions are not guaranteed stable, so the crop is
        // recomputed from this frame every time
        let roi = match self.shared.region.load().plate_window(frame.size()) {
            Ok(roi) => roi,
            Err(e) => {
                warn!("Frame {} skipped: {}", frame.sequence, e);
                return Ok(None);
            }
        };

        let enhanced = self.enhancer.enhance(&frame.image, roi);
        let request = OcrRequest {
            sequence: frame.sequence,
            image: enhanced.image,
            region: enhanced.region,
        };
        self.stats.frames_recognized += 1;

        let ocr = Arc::clone(&self.ocr);
        let allow_list = self.shared.allow_list.clone();
        let to_display = self.to_display.clone();
        let sequence = frame.sequence;

        // Reconciliation happens in the OCR completion, off the capture thread
        let task = self.runtime.spawn(async move {
            let observations = ocr.recognize(request).await?;
            let allow = allow_list.load();
            let Some(text) = reconcile(top_candidates(&observations), &allow) else {
                return Ok(None);
            };
            let verdict = Verdict::judge(text, &allow);
            let message = RecognizerToDisplay::Verdict {
                sequence,
                verdict: verdict.clone(),
            };
            if to_display.send(message).is_err() {
                debug!("Frame {}: display context closed, verdict not shown", sequence);
            }
            Ok::<_, VisionError>(Some(verdict))
        });

        self.runtime
            .block_on(task)
            .map_err(|e| VisionError::RecognitionUnavailable(e.to_string()))?
    }
}

impl FrameSink for PlateRecognizer {
    fn on_frame(&mut self, frame: &CapturedFrame) -> Option<Verdict> {
        self.stats.frames_seen += 1;
        if !self.throttle.should_process(frame.timestamp) {
            self.stats.frames_throttled += 1;
            return None;
        }

        match self.recognize(frame) {
            Ok(Some(verdict)) => {
                debug!("Frame {}: {:?}", frame.sequence, verdict);
                Some(verdict)
            }
            Ok(None) => {
                self.stats.empty_frames += 1;
                debug!("Frame {}: no text", frame.sequence);
                None
            }
            Err(e) => {
                self.stats.recognition_failures += 1;
                warn!("Frame {}: {}", frame.sequence, e);
                let message = RecognizerToDisplay::RecognitionFailed {
                    sequence: frame.sequence,
                    reason: e.to_string(),
                };
                if self.to_display.send(message).is_err() {
                    debug!("Frame {}: display context closed", frame.sequence);
                }
                None
            }
        }
    }
}

/// Owner of the authorization indicator and displayed text.
///
/// Only this context mutates [`DisplayState`]; rendering reads copies of it
/// through [`DisplayContext::state`].
pub struct DisplayContext {
    from_recognizer: Receiver<RecognizerToDisplay>,
    shared: SharedAppState,
    authorization: AuthorizationState,
    state: Arc<RwLock<DisplayState>>,
}

impl DisplayContext {
    pub fn shared(&self) -> &SharedAppState {
        &self.shared
    }

    /// Current display state
    pub fn state(&self) -> DisplayState {
        self.state.read().clone()
    }

    /// Place the reading window for a viewport showing `frame`-sized video
    pub fn layout(&mut self, viewport: Size<ViewportPx>, frame: Size<SourcePx>) -> Result<(), GeometryError> {
        let region = self.shared.region.load();
        let overlay = region.overlay_window(viewport)?;
        let crop = region.plate_window(frame)?;
        let mapped = AspectFill::new(frame, viewport)?.map_rect(crop);

        let mut state = self.state.write();
        state.overlay = Some(overlay);
        state.crop_in_viewport = Some(mapped);
        debug!("Layout {:?}: overlay {:?}, crop {:?}", viewport, overlay, mapped);
        Ok(())
    }

    /// Apply every pending message without blocking. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let pending: Vec<_> = self.from_recognizer.try_iter().collect();
        let count = pending.len();
        for message in pending {
            self.apply(message);
        }
        count
    }

    /// Wait up to `timeout` for the next message and apply it.
    ///
    /// Returns `Ok(true)` when the display changed, `Ok(false)` on timeout or a
    /// message that left it unchanged, and `Err` once the recognizer is gone.
    pub fn wait_and_apply(&mut self, timeout: Duration) -> Result<bool, RecvTimeoutError> {
        match self.from_recognizer.recv_timeout(timeout) {
            Ok(message) => Ok(self.apply(message)),
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn apply(&mut self, message: RecognizerToDisplay) -> bool {
        match message {
            RecognizerToDisplay::Verdict { sequence, verdict } => {
                self.authorization.apply(&verdict);

                let mut state = self.state.write();
                state.fade = self.authorization.fade();
                state.authorized = self.authorization.is_authorized();
                state.text = self.authorization.text().to_string();
                state.last_sequence = Some(sequence);
                true
            }
            RecognizerToDisplay::RecognitionFailed { sequence, reason } => {
                debug!("Frame {} left display unchanged: {}", sequence, reason);
                false
            }
        }
    }
}

/// Build the recognizer and display context for one capture session
pub fn build(config: &AppConfig, ocr: Arc<dyn OcrEngine>) -> Result<(PlateRecognizer, DisplayContext)> {
    let shared = SharedAppState::new(config);
    let capture = CaptureConfig::from(&config.capture);
    let (to_display, from_recognizer) = unbounded();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("ocr-worker")
        .enable_all()
        .build()?;

    if shared.allow_list.load().is_empty() {
        warn!("Allow-list is empty, every plate will be unauthorized");
    }
    info!(
        "Recognizer ready: {} authorized plates, min interval {:?}, orientation {:?}",
        shared.allow_list.load().len(),
        capture.min_interval,
        capture.orientation
    );

    let recognizer = PlateRecognizer {
        throttle: FrameThrottle::new(capture.min_interval),
        enhancer: EnhancementPipeline::new(config.enhancement.clone()),
        ocr,
        shared: shared.clone(),
        to_display,
        runtime,
        stats: PipelineStats::default(),
    };

    let display = DisplayContext {
        from_recognizer,
        shared,
        authorization: AuthorizationState::new(config.authorization.fade_step),
        state: Arc::new(RwLock::new(DisplayState::default())),
    };

    Ok((recognizer, display))
}
