//! Character recognizer client.
//!
//! Two flows end in one predicted character that is inserted at the caret:
//!
//! - a freehand drawing, uploaded as a PNG to `POST {url}/predict`;
//! - an IMU capture session, bracketed by `POST {url}/start` and
//!   `POST {url}/stop`, where `stop` answers with the prediction.

use std::time::Duration;

use reqwest::blocking::multipart;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::join_url;

/// Multipart field the drawing is uploaded under.
pub const DRAWING_FIELD: &str = "drawing";

#[derive(Debug, Error)]
pub enum RecognizerError {
    #[error("recognizer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("recognizer rejected the request: {0}")]
    Rejected(String),

    #[error("malformed recognizer response: {0}")]
    Malformed(String),
}

/// A predicted character.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub character: String,
    /// 0.0 to 1.0
    pub confidence: f32,
}

impl Prediction {
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }
}

#[derive(Debug, Deserialize)]
struct PredictionBody {
    character: Option<String>,
    confidence: Option<f32>,
    error: Option<String>,
    message: Option<String>,
    status: Option<String>,
}

pub struct RecognizerClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl RecognizerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RecognizerError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.to_string(),
        })
    }

    /// Upload a PNG drawing and return the predicted character.
    pub fn predict(&self, png: Vec<u8>) -> Result<Prediction, RecognizerError> {
        let part = multipart::Part::bytes(png)
            .file_name("drawing.png")
            .mime_str("image/png")?;
        let form = multipart::Form::new().part(DRAWING_FIELD, part);

        let text = self
            .http
            .post(join_url(&self.base_url, "/predict"))
            .multipart(form)
            .send()?
            .text()?;
        let prediction = parse_prediction(&text)?;
        debug!(character = %prediction.character, confidence = prediction.confidence, "drawing recognized");
        Ok(prediction)
    }

    /// Begin an IMU capture session.
    pub fn start_capture(&self) -> Result<(), RecognizerError> {
        let text = self
            .http
            .post(join_url(&self.base_url, "/start"))
            .send()?
            .text()?;
        let body = parse_body(&text)?;
        match body.status.as_deref() {
            Some("started") => {
                info!("imu capture started");
                Ok(())
            }
            _ => Err(RecognizerError::Rejected(
                body.message
                    .or(body.error)
                    .unwrap_or_else(|| "failed to start collection".to_string()),
            )),
        }
    }

    /// End the IMU capture session and return its prediction.
    pub fn stop_capture(&self) -> Result<Prediction, RecognizerError> {
        let text = self
            .http
            .post(join_url(&self.base_url, "/stop"))
            .send()?
            .text()?;
        let prediction = parse_prediction(&text)?;
        info!(character = %prediction.character, "imu capture stopped");
        Ok(prediction)
    }
}

/// Parse `{character, confidence}` or `{error, message}`.
pub fn parse_prediction(body: &str) -> Result<Prediction, RecognizerError> {
    let body = parse_body(body)?;
    if let Some(error) = body.error {
        return Err(RecognizerError::Rejected(body.message.unwrap_or(error)));
    }
    match body.character.filter(|c| !c.is_empty()) {
        Some(character) => Ok(Prediction {
            character,
            confidence: body.confidence.unwrap_or(0.0),
        }),
        None => Err(RecognizerError::Malformed(
            body.message
                .unwrap_or_else(|| "no prediction received".to_string()),
        )),
    }
}

fn parse_body(body: &str) -> Result<PredictionBody, RecognizerError> {
    serde_json::from_str(body).map_err(|e| RecognizerError::Malformed(e.to_string()))
}
