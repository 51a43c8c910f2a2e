use avatarcrop::{AvatarConfig, AvatarError, CropAdjuster, CropReconciler, CropSuggestion, FaceRegion, Rectangle};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// Crop settings, passed as a JavaScript object.
///
/// All fields are optional. When a `preset` is specified, its defaults apply
/// and individual fields override them.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CropperOptions {
    pub preset: Option<String>,
    pub target_width: Option<f64>,
    pub target_height: Option<f64>,
    pub min_scale: Option<f64>,
    pub boost_weight: Option<f64>,
    pub vertical_divisor: Option<f64>,
    pub horizontal_offset: Option<f64>,
    pub detect_eyes: Option<bool>,
    pub step: Option<f64>,
    pub invert_vertical_keys: Option<bool>,
    pub clamp_to_image: Option<bool>,
}

/// Options object in the shape the `smartcrop` JS library expects.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SmartcropOptions {
    width: f64,
    height: f64,
    min_scale: f64,
    boost: Vec<avatarcrop::BoostRegion>,
}

fn string_to_preset(preset: &str) -> Result<avatarcrop::Preset, JsValue> {
    match preset {
        "passport" => Ok(avatarcrop::Preset::Passport),
        "compact" => Ok(avatarcrop::Preset::Compact),
        "portrait" => Ok(avatarcrop::Preset::Portrait),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown preset: {preset}"),
        )),
    }
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert an `AvatarError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: AvatarError) -> JsValue {
    let code = match &e {
        AvatarError::DecodeError(_) => "DECODE_ERROR",
        AvatarError::ZeroDimensions => "ZERO_DIMENSIONS",
        AvatarError::EncodeError(_) => "ENCODE_ERROR",
        AvatarError::InvalidDataUrl(_) => "INVALID_DATA_URL",
        AvatarError::Base64(_) => "INVALID_BASE64",
        AvatarError::InvalidTargetSize { .. } => "INVALID_TARGET_SIZE",
        AvatarError::InvalidDivisor(_) => "INVALID_DIVISOR",
        AvatarError::InvalidStep(_) => "INVALID_STEP",
        AvatarError::InvalidBoostWeight(_) => "INVALID_BOOST_WEIGHT",
        AvatarError::Config(_) => "INVALID_OPTIONS",
        AvatarError::ClassifierLoad(_) => "CLASSIFIER_LOAD",
        AvatarError::DetectorNotReady => "DETECTOR_NOT_READY",
        AvatarError::CropFailed(_) => "CROP_FAILED",
        AvatarError::NoCapture => "NO_CAPTURE",
        AvatarError::Validation(_) => "VALIDATION_FAILED",
        AvatarError::EmptyValidationResponse => "EMPTY_VALIDATION_RESPONSE",
    };
    make_error(code, &e.to_string())
}

fn parse_options(options: JsValue) -> Result<CropperOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(CropperOptions::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))
    }
}

/// Build a validated `AvatarConfig` from parsed `CropperOptions`.
fn build_config(opts: &CropperOptions) -> Result<AvatarConfig, JsValue> {
    let mut config = AvatarConfig::default();
    if let Some(ref p) = opts.preset {
        config = config.preset(string_to_preset(p)?);
    }
    if let (Some(w), Some(h)) = (opts.target_width, opts.target_height) {
        config = config.target_size(w, h);
    } else if opts.target_width.is_some() || opts.target_height.is_some() {
        return Err(make_error(
            "INVALID_OPTIONS",
            "targetWidth and targetHeight must be given together",
        ));
    }
    if let Some(s) = opts.min_scale {
        config = config.min_scale(s);
    }
    if let Some(w) = opts.boost_weight {
        config = config.boost_weight(w);
    }
    if let Some(k) = opts.vertical_divisor {
        config = config.vertical_divisor(k);
    }
    if let Some(o) = opts.horizontal_offset {
        config = config.horizontal_offset(o);
    }
    if let Some(e) = opts.detect_eyes {
        config = config.detect_eyes(e);
    }
    if let Some(s) = opts.step {
        config = config.step(s);
    }
    if let Some(i) = opts.invert_vertical_keys {
        config = config.invert_vertical_keys(i);
    }
    if let Some(c) = opts.clamp_to_image {
        config = config.clamp_to_image(c);
    }
    config.validate().map_err(to_js_error)?;
    Ok(config)
}

fn config_from_js(options: JsValue) -> Result<AvatarConfig, JsValue> {
    build_config(&parse_options(options)?)
}

/// Crop rectangle in source-image pixels, as used by the image cropper widget.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

#[wasm_bindgen]
impl CropRect {
    #[wasm_bindgen(constructor)]
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> CropRect {
        CropRect { x1, y1, x2, y2 }
    }
}

impl From<Rectangle> for CropRect {
    fn from(r: Rectangle) -> Self {
        CropRect::new(r.x1, r.y1, r.x2, r.y2)
    }
}

impl From<CropRect> for Rectangle {
    fn from(r: CropRect) -> Self {
        Rectangle::new(r.x1, r.y1, r.x2, r.y2)
    }
}

/// Result of [`AvatarCropper::reconcile`].
#[wasm_bindgen]
pub struct AutoCrop {
    rect: CropRect,
    face_count: usize,
    eye_message: Option<String>,
    notice: Option<String>,
}

#[wasm_bindgen]
impl AutoCrop {
    #[wasm_bindgen(getter)]
    pub fn rect(&self) -> CropRect {
        self.rect
    }

    #[wasm_bindgen(getter, js_name = "faceCount")]
    pub fn face_count(&self) -> usize {
        self.face_count
    }

    /// "Pass" or "No eyes in the photo" when eye detection ran.
    #[wasm_bindgen(getter, js_name = "eyeMessage")]
    pub fn eye_message(&self) -> Option<String> {
        self.eye_message.clone()
    }

    /// Text to show in a transient notice, if any.
    #[wasm_bindgen(getter)]
    pub fn notice(&self) -> Option<String> {
        self.notice.clone()
    }
}

/// Reconciles face detections with a smartcrop top crop.
#[wasm_bindgen]
pub struct AvatarCropper {
    config: AvatarConfig,
    reconciler: CropReconciler,
}

impl AvatarCropper {
    fn from_config(config: AvatarConfig) -> Self {
        let reconciler = CropReconciler::new(&config);
        Self { config, reconciler }
    }

    fn reconcile_faces(&self, faces: &[FaceRegion], top_crop: Option<&CropSuggestion>) -> AutoCrop {
        let out = self.reconciler.reconcile_suggestion(faces, top_crop);
        AutoCrop {
            rect: out.rectangle.into(),
            face_count: out.face_count,
            eye_message: out.eye_check.map(|c| c.to_string()),
            notice: out.notice.map(|n| n.to_string()),
        }
    }
}

#[wasm_bindgen]
impl AvatarCropper {
    /// @param options - Optional object with fields: preset, targetWidth,
    ///   targetHeight, minScale, boostWeight, verticalDivisor,
    ///   horizontalOffset, detectEyes, step, invertVerticalKeys, clampToImage
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<AvatarCropper, JsValue> {
        Ok(Self::from_config(config_from_js(options)?))
    }

    /// Options for `smartcrop.crop()` with one boost region per face.
    ///
    /// @param faces - Array of `{x, y, width, height}` face boxes
    #[wasm_bindgen(js_name = "cropOptions")]
    pub fn crop_options(&self, faces: JsValue) -> Result<JsValue, JsValue> {
        let faces = parse_faces(faces)?;
        let options = self.reconciler.crop_options(&faces);
        let smartcrop = SmartcropOptions {
            width: options.target_width,
            height: options.target_height,
            min_scale: options.min_scale,
            boost: options.boost,
        };
        serde_wasm_bindgen::to_value(&smartcrop)
            .map_err(|e| make_error("SERIALIZE_ERROR", &e.to_string()))
    }

    /// Turn detected faces and smartcrop's `topCrop` into the crop to show.
    ///
    /// @param faces - Array of `{x, y, width, height, eyeCount?}` face boxes
    /// @param topCrop - `{x, y, width, height}`, or null when cropping failed
    pub fn reconcile(&self, faces: JsValue, top_crop: JsValue) -> Result<AutoCrop, JsValue> {
        let faces = parse_faces(faces)?;
        let top_crop: Option<CropSuggestion> = if top_crop.is_undefined() || top_crop.is_null() {
            None
        } else {
            Some(
                serde_wasm_bindgen::from_value(top_crop)
                    .map_err(|e| make_error("INVALID_TOP_CROP", &format!("invalid topCrop: {e}")))?,
            )
        };
        Ok(self.reconcile_faces(&faces, top_crop.as_ref()))
    }

    /// Crop used when no face is found.
    #[wasm_bindgen(js_name = "defaultRect")]
    pub fn default_rect(&self) -> CropRect {
        self.reconciler.default_rectangle().into()
    }

    /// A keyboard crop editor sharing this cropper's settings.
    pub fn editor(&self) -> CropEditor {
        CropEditor {
            adjuster: CropAdjuster::new(&self.config),
        }
    }
}

fn parse_faces(faces: JsValue) -> Result<Vec<FaceRegion>, JsValue> {
    if faces.is_undefined() || faces.is_null() {
        return Ok(Vec::new());
    }
    serde_wasm_bindgen::from_value(faces)
        .map_err(|e| make_error("INVALID_FACES", &format!("invalid faces: {e}")))
}

/// Keyboard-driven editor for the active crop.
#[wasm_bindgen]
pub struct CropEditor {
    adjuster: CropAdjuster,
}

#[wasm_bindgen]
impl CropEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<CropEditor, JsValue> {
        let config = config_from_js(options)?;
        Ok(CropEditor {
            adjuster: CropAdjuster::new(&config),
        })
    }

    #[wasm_bindgen(getter)]
    pub fn rect(&self) -> CropRect {
        self.adjuster.rectangle().into()
    }

    #[wasm_bindgen(setter)]
    pub fn set_rect(&mut self, rect: CropRect) {
        self.adjuster.set_rectangle(rect.into());
    }

    #[wasm_bindgen(js_name = "setImageBounds")]
    pub fn set_image_bounds(&mut self, width: u32, height: u32) {
        self.adjuster.set_image_bounds(width, height);
    }

    #[wasm_bindgen(js_name = "enableManualEdit")]
    pub fn enable_manual_edit(&mut self) {
        self.adjuster.enable_manual_edit();
    }

    #[wasm_bindgen(getter, js_name = "manualEditEnabled")]
    pub fn manual_edit_enabled(&self) -> bool {
        self.adjuster.is_manual_edit_enabled()
    }

    /// Apply the command bound to a `KeyboardEvent.code`. Returns whether the
    /// crop changed, so the caller knows to `preventDefault()`.
    #[wasm_bindgen(js_name = "applyKey")]
    pub fn apply_key(&mut self, code: &str) -> bool {
        self.adjuster.apply_key(code)
    }
}

/// Strip the `data:<mime>;base64,` header from a data URL.
#[wasm_bindgen(js_name = "stripDataUrlHeader")]
pub fn strip_data_url_header(data_url: &str) -> Result<String, JsValue> {
    avatarcrop::data_url::strip_header(data_url)
        .map(str::to_owned)
        .map_err(to_js_error)
}

/// JSON body for the validation endpoint, built from the cropped data URL.
#[wasm_bindgen(js_name = "validationRequestBody")]
pub fn validation_request_body(cropped_data_url: &str) -> Result<String, JsValue> {
    avatarcrop::validation::ValidationRequest::from_data_url(cropped_data_url)
        .and_then(|req| req.to_json())
        .map_err(to_js_error)
}

/// Verdict returned by the validation endpoint.
#[wasm_bindgen]
pub struct Verdict {
    inner: avatarcrop::ValidationVerdict,
}

#[wasm_bindgen]
impl Verdict {
    #[wasm_bindgen(getter)]
    pub fn message(&self) -> String {
        self.inner.message.clone()
    }

    /// Background-removed image as a PNG data URL, if the endpoint sent one.
    #[wasm_bindgen(getter, js_name = "imageRemovedBackground")]
    pub fn image_removed_background(&self) -> Option<String> {
        self.inner.background_removed_data_url()
    }
}

/// Parse the validation endpoint's JSON response body.
#[wasm_bindgen(js_name = "parseValidationResponse")]
pub fn parse_validation_response(body: &str) -> Result<Verdict, JsValue> {
    avatarcrop::validation::parse_response(body)
        .map(|inner| Verdict { inner })
        .map_err(to_js_error)
}
