//! Wire types for the three backend endpoints. Field names match the
//! server exactly, so no serde renames here.

use serde::{Deserialize, Serialize};

use crate::flow::{MeterType, Operator};

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub user: Option<Operator>,
}

/// OCR estimates arrive as either a JSON string or a bare number,
/// depending on the server build.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReadingValue {
    Text(String),
    Number(f64),
}

impl ReadingValue {
    pub fn into_text(self) -> String {
        match self {
            ReadingValue::Text(text) => text,
            ReadingValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    (value as i64).to_string()
                } else {
                    value.to_string()
                }
            }
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(default)]
    pub reading: Option<ReadingValue>,
    #[serde(default)]
    pub image_path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveRequest {
    pub reading: String,
    pub image_path: String,
    pub room_number: String,
    pub meter_type: MeterType,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_accepts_string_and_number() {
        let text: OcrResponse =
            serde_json::from_str(r#"{"success":true,"reading":"00412","image_path":"uploads/a.jpg"}"#)
                .unwrap();
        assert_eq!(text.reading.unwrap().into_text(), "00412");

        let number: OcrResponse =
            serde_json::from_str(r#"{"success":true,"reading":412,"image_path":"uploads/a.jpg"}"#)
                .unwrap();
        assert_eq!(number.reading.unwrap().into_text(), "412");
    }

    #[test]
    fn fractional_readings_keep_their_decimals() {
        let resp: OcrResponse =
            serde_json::from_str(r#"{"success":true,"reading":412.5,"image_path":"uploads/a.jpg"}"#)
                .unwrap();
        assert_eq!(resp.reading.unwrap().into_text(), "412.5");
    }

    #[test]
    fn failed_ocr_omits_optional_fields() {
        let resp: OcrResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.reading.is_none());
        assert!(resp.image_path.is_none());
    }

    #[test]
    fn rejected_login_has_no_user() {
        let resp: LoginResponse = serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(!resp.success);
        assert!(resp.user.is_none());
    }

    #[test]
    fn save_request_uses_server_field_names() {
        let request = SaveRequest {
            reading: "00123".into(),
            image_path: "uploads/meter.jpg".into(),
            room_number: "204".into(),
            meter_type: MeterType::Electric,
            user_id: 7,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["meter_type"], "electric");
        assert_eq!(json["image_path"], "uploads/meter.jpg");
        assert_eq!(json["room_number"], "204");
        assert_eq!(json["user_id"], 7);
    }
}
