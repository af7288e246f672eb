use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Login,
    Menu,
    Capture,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::Login
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MeterType {
    Water,
    Electric,
}

impl Default for MeterType {
    fn default() -> Self {
        MeterType::Water
    }
}

impl MeterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeterType::Water => "water",
            MeterType::Electric => "electric",
        }
    }
}

/// Authenticated user as returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub screen: Screen,
    pub operator: Option<Operator>,
    pub meter_type: MeterType,
    /// Correlates log lines for one pass through the capture screen.
    pub capture_id: Option<String>,
    pub photo_path: Option<PathBuf>,
    /// Storage path returned by the OCR endpoint; empty until a photo
    /// upload has succeeded.
    pub server_image_path: String,
    pub reading: String,
    pub room_number: String,
    pub busy: bool,
    pub logged_in_at: Option<DateTime<Utc>>,
}

impl Default for FlowState {
    fn default() -> Self {
        Self {
            screen: Screen::Login,
            operator: None,
            meter_type: MeterType::Water,
            capture_id: None,
            photo_path: None,
            server_image_path: String::new(),
            reading: String::new(),
            room_number: String::new(),
            busy: false,
            logged_in_at: None,
        }
    }
}

impl FlowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn complete_login(&mut self, operator: Operator, at: DateTime<Utc>) {
        *self = Self {
            screen: Screen::Menu,
            operator: Some(operator),
            logged_in_at: Some(at),
            ..Self::default()
        };
    }

    pub fn logout(&mut self) {
        *self = Self::default();
    }

    pub fn begin_capture(&mut self, meter_type: MeterType, capture_id: String) -> Result<()> {
        if self.operator.is_none() {
            bail!("not logged in");
        }
        self.meter_type = meter_type;
        self.capture_id = Some(capture_id);
        self.clear_capture_fields();
        self.screen = Screen::Capture;
        Ok(())
    }

    pub fn back_to_menu(&mut self) {
        self.capture_id = None;
        self.clear_capture_fields();
        self.screen = Screen::Menu;
    }

    pub fn set_photo(&mut self, path: PathBuf) {
        self.photo_path = Some(path);
    }

    pub fn apply_estimate(&mut self, reading: String, server_image_path: String) {
        self.reading = reading;
        self.server_image_path = server_image_path;
    }

    pub fn record_entry(&mut self, room_number: String, reading: String) {
        self.room_number = room_number;
        self.reading = reading;
    }

    /// Required-field checks before submission: room, uploaded photo,
    /// reading, in that order.
    pub fn validate_for_save(&self) -> Result<()> {
        if self.room_number.trim().is_empty() {
            bail!("please enter the room number");
        }
        if self.server_image_path.is_empty() {
            bail!("please take a photo first");
        }
        if self.reading.trim().is_empty() {
            bail!("please enter the meter reading");
        }
        Ok(())
    }

    pub fn complete_save(&mut self) {
        self.capture_id = None;
        self.clear_capture_fields();
        self.screen = Screen::Menu;
    }

    /// Takes the single-outstanding-request guard. Fails while another
    /// network call is in flight.
    pub fn begin_request(&mut self) -> Result<()> {
        if self.busy {
            bail!("a request is already in progress");
        }
        self.busy = true;
        Ok(())
    }

    pub fn finish_request(&mut self) {
        self.busy = false;
    }

    fn clear_capture_fields(&mut self) {
        self.photo_path = None;
        self.server_image_path.clear();
        self.reading.clear();
        self.room_number.clear();
    }
}
