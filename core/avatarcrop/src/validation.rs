use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::data_url;
use crate::error::AvatarError;
#[cfg(feature = "http")]
use crate::AvatarConfig;

/// Default address of the photo validation endpoint.
pub const DEFAULT_VALIDATION_URL: &str = "http://127.0.0.1:8000/api/image/";

/// JSON body posted to the validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationRequest<'a> {
    /// Bare base64 image, data-URL header stripped.
    pub image: &'a str,
}

impl<'a> ValidationRequest<'a> {
    /// Build a request from a data URL such as `data:image/png;base64,...`.
    pub fn from_data_url(data_url: &'a str) -> Result<Self, AvatarError> {
        Ok(Self {
            image: data_url::strip_header(data_url)?,
        })
    }

    /// Serialize to the request body.
    pub fn to_json(&self) -> Result<String, AvatarError> {
        serde_json::to_string(self).map_err(|e| AvatarError::Validation(e.to_string()))
    }
}

/// First result returned by the validation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Outcome reported by the endpoint, shown to the user.
    pub message: String,
    /// Base64 PNG with the background removed, without a data-URL header.
    #[serde(default)]
    pub image_removed_background: Option<String>,
}

impl ValidationVerdict {
    /// Decoded PNG bytes of the background-removed image, if one was returned.
    pub fn background_removed_png(&self) -> Option<Result<Vec<u8>, AvatarError>> {
        self.image_removed_background
            .as_deref()
            .map(data_url::decode_base64)
    }

    /// The background-removed image as a displayable PNG data URL.
    pub fn background_removed_data_url(&self) -> Option<String> {
        self.image_removed_background
            .as_deref()
            .map(|payload| format!("{}{payload}", data_url::PNG_DATA_URL_HEADER))
    }
}

/// Parse the endpoint's response body: a JSON array whose first element is
/// the verdict.
pub fn parse_response(body: &str) -> Result<ValidationVerdict, AvatarError> {
    let verdicts: Vec<ValidationVerdict> =
        serde_json::from_str(body).map_err(|e| AvatarError::Validation(e.to_string()))?;
    verdicts
        .into_iter()
        .next()
        .ok_or(AvatarError::EmptyValidationResponse)
}

/// Backend that checks a cropped photo and removes its background.
#[async_trait]
pub trait Validator: Send + Sync {
    /// Validate a bare base64 image (no data-URL header).
    async fn validate(&self, image_base64: &str) -> Result<ValidationVerdict, AvatarError>;
}

/// [`Validator`] that posts to the HTTP validation endpoint.
#[cfg(feature = "http")]
pub struct HttpValidator {
    client: reqwest::Client,
    url: String,
}

#[cfg(feature = "http")]
impl HttpValidator {
    /// Validator posting to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// Validator posting to [`AvatarConfig::validation_url`].
    pub fn from_config(config: &AvatarConfig) -> Self {
        Self::new(config.validation_url.clone())
    }

    /// Endpoint this validator posts to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
impl Default for HttpValidator {
    fn default() -> Self {
        Self::new(DEFAULT_VALIDATION_URL)
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl Validator for HttpValidator {
    async fn validate(&self, image_base64: &str) -> Result<ValidationVerdict, AvatarError> {
        let body = self
            .client
            .post(&self.url)
            .json(&ValidationRequest {
                image: image_base64,
            })
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AvatarError::Validation(e.to_string()))?
            .text()
            .await
            .map_err(|e| AvatarError::Validation(e.to_string()))?;
        tracing::debug!(url = %self.url, bytes = body.len(), "validation response");
        parse_response(&body)
    }
}
