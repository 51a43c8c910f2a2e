use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::adjust::{Command, CropAdjuster};
use crate::data_url;
use crate::error::AvatarError;
use crate::face_detector::{FaceDetector, FaceRegion};
use crate::geometry::Rectangle;
use crate::imaging::{crop_to_rectangle, decode_image, encode_png, to_gray};
use crate::notice::{Notice, Notifier, TracingNotifier};
use crate::readiness::ReadinessGate;
use crate::reconcile::{CropReconciler, Reconciliation};
use crate::saliency::{HeuristicCropper, SaliencyCropper};
use crate::validation::{ValidationRequest, ValidationVerdict, Validator};
use crate::AvatarConfig;

/// A decoded frame waiting for analysis, tagged with its capture generation.
#[derive(Debug, Clone)]
pub struct Capture {
    generation: u64,
    image: Arc<DynamicImage>,
}

impl Capture {
    /// Generation this frame was captured in.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The decoded frame.
    pub fn image(&self) -> &DynamicImage {
        &self.image
    }
}

/// Result of analysing one [`Capture`].
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Generation of the analysed capture.
    pub generation: u64,
    /// Faces found by the detector, primary face first.
    pub faces: Vec<FaceRegion>,
    /// Crop derived from the faces and the cropper's suggestion.
    pub reconciliation: Reconciliation,
}

/// Detection, cropping and reconciliation for one frame.
///
/// Holds no per-capture state, so a shared `Arc<Analyzer>` can run on a
/// worker thread while the session keeps accepting captures.
pub struct Analyzer {
    config: AvatarConfig,
    detector: Box<dyn FaceDetector>,
    cropper: Box<dyn SaliencyCropper>,
    reconciler: CropReconciler,
    detect_eyes: bool,
    readiness: ReadinessGate,
}

impl Analyzer {
    /// Analyzer using the built-in [`HeuristicCropper`].
    ///
    /// Fails if `config` does not pass [`AvatarConfig::validate`].
    pub fn new(
        config: &AvatarConfig,
        detector: Box<dyn FaceDetector>,
        readiness: ReadinessGate,
    ) -> Result<Self, AvatarError> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            detector,
            cropper: Box::new(HeuristicCropper),
            reconciler: CropReconciler::new(config),
            detect_eyes: config.detect_eyes,
            readiness,
        })
    }

    /// Settings the analyzer was built with; sessions take theirs from here.
    pub fn config(&self) -> &AvatarConfig {
        &self.config
    }

    /// Replace the saliency cropper.
    pub fn cropper(mut self, cropper: Box<dyn SaliencyCropper>) -> Self {
        self.cropper = cropper;
        self
    }

    /// Whether the runtime and classifiers have loaded.
    pub fn is_ready(&self) -> bool {
        self.readiness.is_ready()
    }

    /// Detect faces in `capture` and reconcile them with the cropper's
    /// suggestion. Fails only if the detector is not loaded yet.
    pub fn analyze(&self, capture: &Capture) -> Result<Analysis, AvatarError> {
        if !self.readiness.is_ready() {
            return Err(AvatarError::DetectorNotReady);
        }

        let faces = {
            // The grayscale buffer only lives for the detector calls.
            let gray = to_gray(capture.image());
            let (width, height) = gray.dimensions();
            let mut faces = self.detector.detect(gray.as_raw(), width, height);
            if self.detect_eyes {
                if let Some(primary) = faces.first_mut() {
                    let eyes = self.detector.count_eyes(gray.as_raw(), width, height, primary);
                    primary.eye_count = eyes;
                }
            }
            faces
        };
        debug!(generation = capture.generation, faces = faces.len(), "faces detected");

        let reconciliation = self
            .reconciler
            .reconcile(capture.image(), &faces, self.cropper.as_ref());

        Ok(Analysis {
            generation: capture.generation,
            faces,
            reconciliation,
        })
    }
}

/// How a capture session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The user picked the crop; carries it as a PNG data URL.
    Selected(String),
    /// The user closed the dialog without picking.
    Cancelled,
}

/// State of one avatar capture dialog.
///
/// Each new frame bumps the capture generation; analyses finishing for an
/// older generation are discarded so a slow analysis cannot overwrite the
/// crop of a newer frame.
pub struct CaptureSession {
    analyzer: Arc<Analyzer>,
    notifier: Box<dyn Notifier>,
    adjuster: CropAdjuster,
    generation: u64,
    image: Option<Arc<DynamicImage>>,
    last: Option<Reconciliation>,
    verdict: Option<ValidationVerdict>,
    image_accepted: bool,
}

impl CaptureSession {
    /// Empty session using the analyzer's settings for manual adjustment.
    pub fn new(analyzer: Analyzer) -> Self {
        let adjuster = CropAdjuster::new(analyzer.config());
        Self {
            analyzer: Arc::new(analyzer),
            notifier: Box::new(TracingNotifier),
            adjuster,
            generation: 0,
            image: None,
            last: None,
            verdict: None,
            image_accepted: false,
        }
    }

    /// Route notices somewhere other than the log.
    pub fn notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Session seeded with a user-supplied file instead of a webcam frame.
    pub fn seeded(analyzer: Analyzer, file: &[u8]) -> Result<(Self, Reconciliation), AvatarError> {
        let mut session = Self::new(analyzer);
        let reconciliation = session.handle_file(file)?;
        Ok((session, reconciliation))
    }

    /// Shared handle for running analyses off the session's thread.
    pub fn analyzer(&self) -> Arc<Analyzer> {
        Arc::clone(&self.analyzer)
    }

    /// Start a new capture from raw image bytes.
    ///
    /// The frame becomes the displayed image immediately; its crop follows
    /// once the analysis is applied.
    pub fn begin_capture(&mut self, bytes: &[u8]) -> Result<Capture, AvatarError> {
        let image = Arc::new(decode_image(bytes)?);
        self.generation += 1;
        self.image = Some(Arc::clone(&image));
        self.adjuster.set_image_bounds(image.width(), image.height());
        self.verdict = None;
        self.image_accepted = false;
        info!(
            generation = self.generation,
            width = image.width(),
            height = image.height(),
            "capture started"
        );
        Ok(Capture {
            generation: self.generation,
            image,
        })
    }

    /// Start a new capture from a webcam data URL.
    pub fn begin_capture_data_url(&mut self, data_url: &str) -> Result<Capture, AvatarError> {
        let bytes = data_url::decode(data_url)?;
        self.begin_capture(&bytes)
    }

    /// Install the result of an analysis.
    ///
    /// Returns `None` and leaves the crop untouched if a newer capture has
    /// started since `analysis` was requested.
    pub fn apply(&mut self, analysis: Analysis) -> Option<&Reconciliation> {
        if analysis.generation != self.generation {
            debug!(
                stale = analysis.generation,
                current = self.generation,
                "discarding stale analysis"
            );
            return None;
        }
        let reconciliation = analysis.reconciliation;
        if let Some(notice) = &reconciliation.notice {
            self.notifier.notify(notice);
        }
        self.adjuster.set_rectangle(reconciliation.rectangle);
        self.last = Some(reconciliation);
        self.last.as_ref()
    }

    /// Capture, analyse and apply a frame in one step.
    pub fn handle_file(&mut self, bytes: &[u8]) -> Result<Reconciliation, AvatarError> {
        let capture = self.begin_capture(bytes)?;
        self.finish(capture)
    }

    /// [`CaptureSession::handle_file`] for a webcam data URL.
    pub fn handle_image(&mut self, data_url: &str) -> Result<Reconciliation, AvatarError> {
        let capture = self.begin_capture_data_url(data_url)?;
        self.finish(capture)
    }

    fn finish(&mut self, capture: Capture) -> Result<Reconciliation, AvatarError> {
        let analysis = self.analyzer.analyze(&capture)?;
        self.apply(analysis).cloned().ok_or(AvatarError::NoCapture)
    }

    /// Generation of the latest capture; 0 before the first one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The active crop.
    pub fn rectangle(&self) -> Rectangle {
        self.adjuster.rectangle()
    }

    /// Latest applied reconciliation.
    pub fn reconciliation(&self) -> Option<&Reconciliation> {
        self.last.as_ref()
    }

    /// Faces found in the latest applied analysis.
    pub fn face_count(&self) -> usize {
        self.last.as_ref().map_or(0, |r| r.face_count)
    }

    /// Start applying keyboard commands to the crop.
    pub fn enable_manual_edit(&mut self) {
        self.adjuster.enable_manual_edit();
    }

    /// See [`CropAdjuster::apply`].
    pub fn apply_command(&mut self, command: Command) -> bool {
        self.adjuster.apply(command)
    }

    /// See [`CropAdjuster::apply_key`].
    pub fn apply_key(&mut self, code: &str) -> bool {
        self.adjuster.apply_key(code)
    }

    /// The current frame cut to the active crop, as a PNG data URL.
    pub fn cropped_image(&self) -> Result<String, AvatarError> {
        let image = self.image.as_ref().ok_or(AvatarError::NoCapture)?;
        let cropped = crop_to_rectangle(image, &self.adjuster.rectangle())?;
        Ok(data_url::encode_png(&encode_png(&cropped)?))
    }

    /// Send the cropped image to `validator` and keep its verdict.
    ///
    /// A failure is reported to the notifier and returned; the crop is not
    /// touched either way.
    pub async fn validate(&mut self, validator: &dyn Validator) -> Result<&ValidationVerdict, AvatarError> {
        let cropped = self.cropped_image()?;
        let request = ValidationRequest::from_data_url(&cropped)?;
        match validator.validate(request.image).await {
            Ok(verdict) => {
                info!(message = %verdict.message, "photo validated");
                Ok(&*self.verdict.insert(verdict))
            }
            Err(e) => {
                warn!("photo validation failed: {e}");
                self.notifier.notify(&Notice::ValidationFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Verdict of the last successful validation of this capture.
    pub fn verdict(&self) -> Option<&ValidationVerdict> {
        self.verdict.as_ref()
    }

    /// Accept the current crop without asking the validation endpoint.
    pub fn skip_validation(&mut self) {
        self.image_accepted = true;
    }

    /// Whether the user accepted the crop by skipping validation.
    pub fn is_image_accepted(&self) -> bool {
        self.image_accepted
    }

    /// Close the session returning the cropped image.
    pub fn select_image(self) -> Result<CaptureOutcome, AvatarError> {
        self.cropped_image().map(CaptureOutcome::Selected)
    }

    /// Close the session without a result.
    pub fn cancel(self) -> CaptureOutcome {
        CaptureOutcome::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFaces;

    impl FaceDetector for NoFaces {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceRegion> {
            Vec::new()
        }
    }

    #[test]
    fn analyzer_rejects_invalid_config() {
        let readiness = crate::ReadinessTracker::ready();
        let config = AvatarConfig::default().step(0.0);
        assert!(matches!(
            Analyzer::new(&config, Box::new(NoFaces), readiness.subscribe()),
            Err(AvatarError::InvalidStep(_))
        ));
    }

    #[test]
    fn session_takes_settings_from_analyzer() {
        let readiness = crate::ReadinessTracker::ready();
        let config = AvatarConfig::default().step(4.0);
        let analyzer = Analyzer::new(&config, Box::new(NoFaces), readiness.subscribe()).unwrap();
        let mut session = CaptureSession::new(analyzer);
        session.adjuster.set_rectangle(Rectangle::from_size(35.0, 45.0));
        session.enable_manual_edit();
        assert!(session.apply_command(Command::MoveRight));
        assert_eq!(session.rectangle(), Rectangle::new(4.0, 0.0, 39.0, 45.0));
        assert_eq!(session.analyzer().config().step, 4.0);
    }
}
