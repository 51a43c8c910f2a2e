use thiserror::Error;

/// Errors returned by avatar capture operations.
#[derive(Debug, Error)]
pub enum AvatarError {
    /// Input bytes are not a supported image.
    #[error("failed to decode image: {0}")]
    DecodeError(String),

    /// Image or crop has no pixels.
    #[error("image dimensions are zero")]
    ZeroDimensions,

    /// PNG encoding failed.
    #[error("failed to encode image: {0}")]
    EncodeError(String),

    /// Data URL lacks a `;base64,` header.
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Data URL payload is not valid base64.
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    /// Target width or height is not a positive number.
    #[error("target crop size must be > 0, got {width}x{height}")]
    InvalidTargetSize {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// Vertical divisor is not a positive number.
    #[error("vertical divisor must be > 0, got {0}")]
    InvalidDivisor(f64),

    /// Adjustment step is not a positive number.
    #[error("adjustment step must be > 0, got {0}")]
    InvalidStep(f64),

    /// Boost weight is not a positive number.
    #[error("boost weight must be > 0, got {0}")]
    InvalidBoostWeight(f64),

    /// Any other unusable setting, or malformed config JSON.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Face or eye model could not be loaded.
    #[error("failed to load classifier: {0}")]
    ClassifierLoad(String),

    /// Analysis was requested before the classifiers loaded.
    #[error("face detector is not ready")]
    DetectorNotReady,

    /// The saliency cropper returned an error.
    #[error("saliency cropper failed: {0}")]
    CropFailed(String),

    /// No frame has been captured yet.
    #[error("no capture to work on")]
    NoCapture,

    /// The validation request or its response body failed.
    #[error("validation request failed: {0}")]
    Validation(String),

    /// The validation endpoint returned an empty list.
    #[error("validation response contained no result")]
    EmptyValidationResponse,
}
