//! HTTP glue for the meter-reading backend.
//!
//! Transport failures are errors; wire-level `success: false` is data
//! (the outcome enums below). A rejected login or an unreadable meter
//! photo is an expected flow, not a fault.

use anyhow::{anyhow, Context, Result};
use reqwest::multipart;
use serde::de::DeserializeOwned;

use crate::capture::PreparedPhoto;
use crate::flow::{MeterType, Operator};
use crate::settings::SettingsStore;

mod types;

pub use types::SaveRequest;
use types::{LoginRequest, LoginResponse, OcrResponse, ReadingValue, SaveResponse};

#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Accepted(Operator),
    Rejected,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OcrOutcome {
    Recognized { reading: String, image_path: String },
    Unreadable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Saved,
    Rejected(String),
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    settings: SettingsStore,
}

impl ApiClient {
    pub fn new(settings: SettingsStore) -> Self {
        Self {
            http: reqwest::Client::new(),
            settings,
        }
    }

    /// The base URL is read from settings on every call, so an address
    /// change takes effect without restarting the app.
    fn endpoint(&self, path: &str) -> String {
        join_endpoint(&self.settings.server().base_url, path)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let resp = self
            .http
            .post(self.endpoint("/api/login"))
            .json(&LoginRequest { username, password })
            .send()
            .await
            .map_err(|err| anyhow!("cannot reach the server: {err}"))?;

        let envelope: LoginResponse = decode_envelope(resp).await?;
        if envelope.success {
            let user = envelope
                .user
                .ok_or_else(|| anyhow!("login response is missing the user object"))?;
            Ok(LoginOutcome::Accepted(user))
        } else {
            Ok(LoginOutcome::Rejected)
        }
    }

    pub async fn recognize(
        &self,
        photo: &PreparedPhoto,
        meter_type: MeterType,
    ) -> Result<OcrOutcome> {
        let part = multipart::Part::bytes(photo.jpeg.clone())
            .file_name(photo.file_name.clone())
            .mime_str("image/jpeg")
            .context("invalid mime type for photo upload")?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("meter_type", meter_type.as_str());

        let resp = self
            .http
            .post(self.endpoint("/api/ocr"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| anyhow!("cannot reach the server: {err}"))?;

        let envelope: OcrResponse = decode_envelope(resp).await?;
        if !envelope.success {
            return Ok(OcrOutcome::Unreadable);
        }

        let image_path = envelope.image_path.unwrap_or_default();
        if image_path.is_empty() {
            return Err(anyhow!("OCR response is missing the stored image path"));
        }
        let reading = envelope
            .reading
            .map(ReadingValue::into_text)
            .unwrap_or_default();
        Ok(OcrOutcome::Recognized {
            reading,
            image_path,
        })
    }

    pub async fn save(&self, request: &SaveRequest) -> Result<SaveOutcome> {
        let resp = self
            .http
            .post(self.endpoint("/api/save"))
            .json(request)
            .send()
            .await
            .map_err(|err| anyhow!("cannot reach the server: {err}"))?;

        let envelope: SaveResponse = decode_envelope(resp).await?;
        if envelope.success {
            Ok(SaveOutcome::Saved)
        } else {
            Ok(SaveOutcome::Rejected(
                envelope.error.unwrap_or_else(|| "save failed".to_string()),
            ))
        }
    }
}

fn join_endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

async fn decode_envelope<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    let status = resp.status();
    let body = resp
        .bytes()
        .await
        .context("failed to read server response")?;
    parse_envelope(status, &body)
}

/// A parseable `{success, ...}` envelope wins over the HTTP status;
/// the status is only surfaced when the body is not the expected JSON.
fn parse_envelope<T: DeserializeOwned>(status: reqwest::StatusCode, body: &[u8]) -> Result<T> {
    match serde_json::from_slice(body) {
        Ok(envelope) => Ok(envelope),
        Err(err) if status.is_success() => {
            Err(anyhow!("could not decode server response: {err}"))
        }
        Err(_) => Err(anyhow!("server returned {status}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn envelope_wins_over_error_status() {
        let resp: SaveResponse = parse_envelope(
            StatusCode::UNPROCESSABLE_ENTITY,
            br#"{"success":false,"error":"room 204 already recorded today"}"#,
        )
        .unwrap();
        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("room 204 already recorded today"));
    }

    #[test]
    fn unparseable_error_body_reports_status() {
        let err = parse_envelope::<SaveResponse>(
            StatusCode::BAD_GATEWAY,
            b"<html>Bad Gateway</html>",
        )
        .unwrap_err();
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn unparseable_ok_body_reports_decode_failure() {
        let err =
            parse_envelope::<SaveResponse>(StatusCode::OK, b"not json at all").unwrap_err();
        assert!(err.to_string().contains("decode"));
    }

    #[test]
    fn endpoint_join_trims_trailing_slash() {
        assert_eq!(
            join_endpoint("http://192.168.1.20:3000/", "/api/login"),
            "http://192.168.1.20:3000/api/login"
        );
        assert_eq!(
            join_endpoint("http://localhost:3000", "/api/ocr"),
            "http://localhost:3000/api/ocr"
        );
    }
}
