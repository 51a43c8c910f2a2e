use std::fmt;
use std::time::Duration;

use tracing::{info, warn};

/// How long a transient notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_millis(2000);

/// User-visible, transient condition raised by the capture flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// The detector found no face in the frame.
    NoFace,
    /// The detector or cropper returned data the reconciler could not use.
    CouldNotCrop,
    /// The validation endpoint failed; carries the error text.
    ValidationFailed(String),
}

impl Notice {
    /// Whether the notice reports a failure rather than a hint to the user.
    pub fn is_error(&self) -> bool {
        !matches!(self, Notice::NoFace)
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NoFace => f.write_str("Show your face in camera!"),
            Notice::CouldNotCrop => f.write_str("Could not crop the photo, adjust it manually"),
            Notice::ValidationFailed(reason) => write!(f, "Photo validation failed: {reason}"),
        }
    }
}

/// Sink for transient notices (a snackbar, a toast, a log line).
pub trait Notifier: Send + Sync {
    /// Show `notice` for [`NOTICE_DURATION`].
    fn notify(&self, notice: &Notice);
}

/// Notifier that writes notices to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: &Notice) {
        if notice.is_error() {
            warn!(duration_ms = NOTICE_DURATION.as_millis() as u64, "{notice}");
        } else {
            info!(duration_ms = NOTICE_DURATION.as_millis() as u64, "{notice}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_face_is_a_hint() {
        assert!(!Notice::NoFace.is_error());
        assert!(Notice::CouldNotCrop.is_error());
    }

    #[test]
    fn validation_message_carries_reason() {
        let notice = Notice::ValidationFailed("503".into());
        assert_eq!(notice.to_string(), "Photo validation failed: 503");
    }
}
