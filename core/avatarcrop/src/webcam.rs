//! Webcam control plumbing between the capture UI and the camera driver.
//!
//! Commands travel over a single-consumer queue and are delivered in the
//! order they were sent.

use tokio::sync::mpsc;
use tracing::debug;

/// Which camera to switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSwitch {
    /// The next device in the platform's list.
    Next,
    /// The previous device in the platform's list.
    Previous,
    /// A specific device by id.
    Device(String),
}

/// Command for the camera driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebcamCommand {
    /// Grab the current frame.
    Snapshot,
    /// Change the active camera.
    Switch(DeviceSwitch),
}

/// A video input reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDevice {
    /// Platform device id.
    pub id: String,
    /// Human-readable name.
    pub label: String,
}

/// Create a connected control/driver pair.
pub fn channel() -> (WebcamControl, WebcamEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (WebcamControl::new(tx), WebcamEvents { rx })
}

/// UI side: issues commands and tracks what the webcam widget shows.
#[derive(Debug)]
pub struct WebcamControl {
    tx: mpsc::UnboundedSender<WebcamCommand>,
    show_webcam: bool,
    multiple_webcams_available: bool,
    device_id: Option<String>,
    errors: Vec<String>,
}

impl WebcamControl {
    fn new(tx: mpsc::UnboundedSender<WebcamCommand>) -> Self {
        Self {
            tx,
            show_webcam: true,
            multiple_webcams_available: false,
            device_id: None,
            errors: Vec::new(),
        }
    }

    /// Ask the driver for a frame and hide the live preview.
    ///
    /// Returns `false` if the driver side has been dropped; the preview is
    /// then left as it was.
    pub fn trigger_snapshot(&mut self) -> bool {
        let sent = self.tx.send(WebcamCommand::Snapshot).is_ok();
        if sent {
            self.toggle_webcam();
        } else {
            debug!("snapshot requested with no camera driver attached");
        }
        sent
    }

    /// Ask the driver to switch cameras. Returns `false` if it is gone.
    pub fn show_next_webcam(&self, switch: DeviceSwitch) -> bool {
        self.tx.send(WebcamCommand::Switch(switch)).is_ok()
    }

    /// Flip between the live preview and the captured frame.
    pub fn toggle_webcam(&mut self) {
        self.show_webcam = !self.show_webcam;
    }

    /// Whether the live preview is visible.
    pub fn is_webcam_shown(&self) -> bool {
        self.show_webcam
    }

    /// Record the available video inputs; switching is offered only when
    /// there is more than one.
    pub fn set_available_devices(&mut self, devices: &[VideoDevice]) {
        self.multiple_webcams_available = devices.len() > 1;
    }

    /// Whether a camera switch control should be offered.
    pub fn multiple_webcams_available(&self) -> bool {
        self.multiple_webcams_available
    }

    /// Called by the driver once it has switched cameras.
    pub fn camera_switched(&mut self, device_id: impl Into<String>) {
        let id = device_id.into();
        debug!(device = %id, "active camera changed");
        self.device_id = Some(id);
    }

    /// Id of the active camera, once the driver has reported one.
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Keep a camera initialization error for display.
    pub fn record_init_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Initialization errors recorded so far.
    pub fn init_errors(&self) -> &[String] {
        &self.errors
    }
}

/// Driver side: receives commands in send order.
#[derive(Debug)]
pub struct WebcamEvents {
    rx: mpsc::UnboundedReceiver<WebcamCommand>,
}

impl WebcamEvents {
    /// Wait for the next command; `None` once the control side is dropped.
    pub async fn recv(&mut self) -> Option<WebcamCommand> {
        self.rx.recv().await
    }

    /// Next queued command without waiting.
    pub fn try_recv(&mut self) -> Option<WebcamCommand> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_arrive_in_order() {
        let (mut control, mut events) = channel();
        assert!(control.show_next_webcam(DeviceSwitch::Next));
        assert!(control.trigger_snapshot());
        assert!(control.show_next_webcam(DeviceSwitch::Device("cam-2".into())));

        assert_eq!(
            events.try_recv(),
            Some(WebcamCommand::Switch(DeviceSwitch::Next))
        );
        assert_eq!(events.try_recv(), Some(WebcamCommand::Snapshot));
        assert_eq!(
            events.try_recv(),
            Some(WebcamCommand::Switch(DeviceSwitch::Device("cam-2".into())))
        );
        assert_eq!(events.try_recv(), None);
    }

    #[test]
    fn snapshot_hides_preview() {
        let (mut control, _events) = channel();
        assert!(control.is_webcam_shown());
        control.trigger_snapshot();
        assert!(!control.is_webcam_shown());
    }

    #[test]
    fn dropped_driver_reports_failure() {
        let (mut control, events) = channel();
        drop(events);
        assert!(!control.trigger_snapshot());
        // No frame is coming, so the live preview stays up
        assert!(control.is_webcam_shown());
    }

    #[test]
    fn switching_needs_two_devices() {
        let (mut control, _events) = channel();
        let cam = |id: &str| VideoDevice {
            id: id.into(),
            label: id.into(),
        };
        control.set_available_devices(&[cam("a")]);
        assert!(!control.multiple_webcams_available());
        control.set_available_devices(&[cam("a"), cam("b")]);
        assert!(control.multiple_webcams_available());
        control.camera_switched("b");
        assert_eq!(control.device_id(), Some("b"));
    }

    #[tokio::test]
    async fn recv_ends_when_control_dropped() {
        let (control, mut events) = channel();
        control.show_next_webcam(DeviceSwitch::Previous);
        drop(control);
        assert_eq!(
            events.recv().await,
            Some(WebcamCommand::Switch(DeviceSwitch::Previous))
        );
        assert_eq!(events.recv().await, None);
    }
}
