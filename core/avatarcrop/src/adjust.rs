use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::geometry::Rectangle;
use crate::AvatarConfig;

/// Scale applied to the far corner by [`Command::ZoomIn`].
pub const ZOOM_IN_FACTOR: f64 = 1.05;
/// Scale applied to the far corner by [`Command::ZoomOut`].
pub const ZOOM_OUT_FACTOR: f64 = 0.95;

/// Smallest width or height an adjusted crop may have, in pixels.
const MIN_EXTENT: f64 = 1.0;

/// Discrete edit applied to the active crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Command {
    /// Shift the crop left by one step.
    MoveLeft,
    /// Shift the crop right by one step.
    MoveRight,
    /// Shift the crop up by one step.
    MoveUp,
    /// Shift the crop down by one step.
    MoveDown,
    /// Scale the far corner by [`ZOOM_IN_FACTOR`].
    ZoomIn,
    /// Scale the far corner by [`ZOOM_OUT_FACTOR`].
    ZoomOut,
}

impl Command {
    /// Map a `KeyboardEvent.code` value to a command.
    ///
    /// With `invert_vertical` the arrow-up key moves the crop down and
    /// arrow-down moves it up, matching an older key binding.
    pub fn from_key_code(code: &str, invert_vertical: bool) -> Option<Self> {
        let cmd = match code {
            "ArrowLeft" => Command::MoveLeft,
            "ArrowRight" => Command::MoveRight,
            "ArrowUp" if invert_vertical => Command::MoveDown,
            "ArrowUp" => Command::MoveUp,
            "ArrowDown" if invert_vertical => Command::MoveUp,
            "ArrowDown" => Command::MoveDown,
            "Equal" | "NumpadAdd" => Command::ZoomIn,
            "Minus" | "NumpadSubtract" => Command::ZoomOut,
            _ => return None,
        };
        Some(cmd)
    }
}

/// Keyboard-driven editor for the active crop rectangle.
///
/// Commands are ignored until [`CropAdjuster::enable_manual_edit`] is called;
/// once enabled, manual edit stays on for the rest of the session.
#[derive(Debug, Clone)]
pub struct CropAdjuster {
    rectangle: Rectangle,
    manual_edit: bool,
    step: f64,
    invert_vertical_keys: bool,
    /// Image bounds to clamp to after every command, when enabled.
    bounds: Option<(f64, f64)>,
    clamp_to_image: bool,
}

impl CropAdjuster {
    /// Create an adjuster with manual edit off, using the step and key
    /// binding settings of `config`.
    pub fn new(config: &AvatarConfig) -> Self {
        Self {
            rectangle: Rectangle::default(),
            manual_edit: false,
            step: config.step,
            invert_vertical_keys: config.invert_vertical_keys,
            bounds: None,
            clamp_to_image: config.clamp_to_image,
        }
    }

    /// Current crop rectangle.
    pub fn rectangle(&self) -> Rectangle {
        self.rectangle
    }

    /// Replace the rectangle wholesale, e.g. after a new capture was analysed.
    pub fn set_rectangle(&mut self, rectangle: Rectangle) {
        self.rectangle = rectangle;
    }

    /// Record the source image size used when clamping is enabled.
    pub fn set_image_bounds(&mut self, width: u32, height: u32) {
        self.bounds = Some((width as f64, height as f64));
    }

    /// Whether commands are being applied.
    pub fn is_manual_edit_enabled(&self) -> bool {
        self.manual_edit
    }

    /// Turn manual edit on for the rest of the session.
    pub fn enable_manual_edit(&mut self) {
        self.manual_edit = true;
    }

    /// Apply `command`. Returns whether the rectangle was updated.
    ///
    /// A command whose result would be narrower or shorter than one pixel is
    /// refused and leaves the rectangle as it was.
    pub fn apply(&mut self, command: Command) -> bool {
        if !self.manual_edit {
            return false;
        }
        let r = self.rectangle;
        let next = match command {
            Command::MoveLeft => r.translated(-self.step, 0.0),
            Command::MoveRight => r.translated(self.step, 0.0),
            Command::MoveUp => r.translated(0.0, -self.step),
            Command::MoveDown => r.translated(0.0, self.step),
            Command::ZoomIn => r.scaled_far_corner(ZOOM_IN_FACTOR),
            Command::ZoomOut => r.scaled_far_corner(ZOOM_OUT_FACTOR),
        };
        let next = match (self.clamp_to_image, self.bounds) {
            (true, Some((w, h))) => next.shifted_within(w, h),
            _ => next,
        };
        // Zooming out far enough pulls the far corner past the near one
        if !next.is_well_formed() || next.width() < MIN_EXTENT || next.height() < MIN_EXTENT {
            debug!(?command, rectangle = ?r, "adjustment would collapse the crop, ignored");
            return false;
        }
        self.rectangle = next;
        trace!(?command, rectangle = ?self.rectangle, "crop adjusted");
        true
    }

    /// Apply the command bound to a key code, if any.
    pub fn apply_key(&mut self, code: &str) -> bool {
        match Command::from_key_code(code, self.invert_vertical_keys) {
            Some(command) => self.apply(command),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn enabled(rect: Rectangle) -> CropAdjuster {
        let mut adj = CropAdjuster::new(&AvatarConfig::default());
        adj.set_rectangle(rect);
        adj.enable_manual_edit();
        adj
    }

    fn assert_close(a: Rectangle, b: Rectangle) {
        for (x, y) in [(a.x1, b.x1), (a.y1, b.y1), (a.x2, b.x2), (a.y2, b.y2)] {
            assert!((x - y).abs() < EPS, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn disabled_ignores_commands() {
        let rect = Rectangle::new(10.0, 20.0, 110.0, 220.0);
        let mut adj = CropAdjuster::new(&AvatarConfig::default());
        adj.set_rectangle(rect);
        for cmd in [
            Command::MoveLeft,
            Command::MoveRight,
            Command::MoveUp,
            Command::MoveDown,
            Command::ZoomIn,
            Command::ZoomOut,
        ] {
            assert!(!adj.apply(cmd));
        }
        assert_eq!(adj.rectangle(), rect);
    }

    #[test]
    fn moves_use_step() {
        let mut adj = enabled(Rectangle::new(10.0, 20.0, 110.0, 220.0));
        adj.apply(Command::MoveRight);
        assert_eq!(adj.rectangle(), Rectangle::new(20.0, 20.0, 120.0, 220.0));
        adj.apply(Command::MoveUp);
        assert_eq!(adj.rectangle(), Rectangle::new(20.0, 10.0, 120.0, 210.0));
        adj.apply(Command::MoveDown);
        adj.apply(Command::MoveLeft);
        assert_eq!(adj.rectangle(), Rectangle::new(10.0, 20.0, 110.0, 220.0));
    }

    #[test]
    fn right_then_left_round_trips() {
        let rect = Rectangle::new(3.5, 7.25, 303.5, 407.25);
        let mut adj = enabled(rect);
        for _ in 0..37 {
            adj.apply(Command::MoveRight);
        }
        for _ in 0..37 {
            adj.apply(Command::MoveLeft);
        }
        assert_close(adj.rectangle(), rect);
    }

    #[test]
    fn zoom_in_then_out_drifts() {
        let rect = Rectangle::new(0.0, 0.0, 200.0, 400.0);
        let mut adj = enabled(rect);
        adj.apply(Command::ZoomIn);
        adj.apply(Command::ZoomOut);
        let r = adj.rectangle();
        assert_eq!(r.x1, 0.0);
        assert_eq!(r.y1, 0.0);
        // 1.05 * 0.95 = 0.9975
        assert!((r.x2 - 199.5).abs() < EPS);
        assert!((r.y2 - 399.0).abs() < EPS);
        assert!(r.x2 < rect.x2);
    }

    #[test]
    fn key_codes_map_to_commands() {
        assert_eq!(Command::from_key_code("ArrowUp", false), Some(Command::MoveUp));
        assert_eq!(Command::from_key_code("ArrowUp", true), Some(Command::MoveDown));
        assert_eq!(Command::from_key_code("ArrowDown", true), Some(Command::MoveUp));
        assert_eq!(Command::from_key_code("Equal", false), Some(Command::ZoomIn));
        assert_eq!(Command::from_key_code("Minus", false), Some(Command::ZoomOut));
        assert_eq!(Command::from_key_code("KeyA", false), None);
    }

    #[test]
    fn apply_key_honours_configured_step() {
        let config = AvatarConfig::default().step(5.0);
        let mut adj = CropAdjuster::new(&config);
        adj.set_rectangle(Rectangle::from_size(35.0, 45.0));
        adj.enable_manual_edit();
        assert!(adj.apply_key("ArrowDown"));
        assert_eq!(adj.rectangle(), Rectangle::new(0.0, 5.0, 35.0, 50.0));
        assert!(!adj.apply_key("Space"));
    }

    #[test]
    fn clamping_is_opt_in() {
        let rect = Rectangle::new(0.0, 0.0, 100.0, 100.0);

        let mut free = enabled(rect);
        free.set_image_bounds(100, 100);
        free.apply(Command::MoveLeft);
        assert_eq!(free.rectangle().x1, -10.0);

        let mut clamped = CropAdjuster::new(&AvatarConfig::default().clamp_to_image(true));
        clamped.set_rectangle(rect);
        clamped.set_image_bounds(100, 100);
        clamped.enable_manual_edit();
        // Already at the left edge: the crop keeps its size and stays put
        assert!(clamped.apply(Command::MoveLeft));
        assert_eq!(clamped.rectangle(), rect);
    }

    #[test]
    fn clamped_move_keeps_size() {
        let mut adj = CropAdjuster::new(&AvatarConfig::default().clamp_to_image(true));
        adj.set_rectangle(Rectangle::new(5.0, 0.0, 55.0, 50.0));
        adj.set_image_bounds(100, 100);
        adj.enable_manual_edit();
        adj.apply(Command::MoveLeft);
        assert_eq!(adj.rectangle(), Rectangle::new(0.0, 0.0, 50.0, 50.0));
        adj.apply(Command::MoveLeft);
        assert_eq!(adj.rectangle(), Rectangle::new(0.0, 0.0, 50.0, 50.0));
    }

    #[test]
    fn repeated_zoom_out_keeps_crop_well_formed() {
        let mut adj = enabled(Rectangle::new(500.0, 50.0, 725.0, 350.0));
        // 725 * 0.95^7 > 500 but 725 * 0.95^8 < 500
        for _ in 0..7 {
            assert!(adj.apply(Command::ZoomOut));
        }
        let last = adj.rectangle();
        for _ in 0..10 {
            assert!(!adj.apply(Command::ZoomOut));
        }
        let r = adj.rectangle();
        assert_eq!(r, last);
        assert!(r.is_well_formed());
        assert!(r.x2 > r.x1 && r.y2 > r.y1);
        assert!(r.pixel_region(1000, 1000).is_some());
    }

    #[test]
    fn zoom_in_with_negative_corner_is_refused() {
        let rect = Rectangle::new(-100.0, -100.0, -10.0, 50.0);
        let mut adj = enabled(rect);
        // x2 * 1.05 = -10.5 is still right of x1, the crop only shrinks
        assert!(adj.apply(Command::ZoomIn));
        let mut adj = enabled(Rectangle::new(-100.0, 0.0, -98.0, 50.0));
        // x2 * 1.05 = -102.9 would cross x1
        assert!(!adj.apply(Command::ZoomIn));
        assert_eq!(adj.rectangle(), Rectangle::new(-100.0, 0.0, -98.0, 50.0));
    }
}
