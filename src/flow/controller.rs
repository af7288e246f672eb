use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    api::{ApiClient, LoginOutcome, OcrOutcome, SaveOutcome, SaveRequest},
    capture,
    flow::{FlowState, MeterType, Screen},
};

#[derive(Serialize, Clone)]
struct FlowStateChangedEvent {
    state: FlowState,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct ReadingSavedEvent {
    room_number: String,
    meter_type: MeterType,
    reading: String,
}

/// Result of attaching a photo: the new state plus whether the server
/// could read the dials. `recognized == false` means the operator has
/// to type the value.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CaptureUpdate {
    pub state: FlowState,
    pub recognized: bool,
}

#[derive(Clone)]
pub struct FlowController {
    state: Arc<Mutex<FlowState>>,
    api: ApiClient,
    app_handle: AppHandle,
}

impl FlowController {
    pub fn new(app_handle: AppHandle, api: ApiClient) -> Self {
        Self {
            state: Arc::new(Mutex::new(FlowState::new())),
            api,
            app_handle,
        }
    }

    pub async fn get_state(&self) -> FlowState {
        self.state.lock().await.clone()
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<FlowState> {
        if username.trim().is_empty() || password.is_empty() {
            bail!("please fill in both fields");
        }

        self.begin_request().await?;
        let outcome = self.api.login(username, password).await;

        let result = {
            let mut state = self.state.lock().await;
            state.finish_request();
            match outcome {
                Ok(LoginOutcome::Accepted(operator)) => {
                    info!("operator {} logged in", operator.username);
                    state.complete_login(operator, Utc::now());
                    Ok(state.clone())
                }
                Ok(LoginOutcome::Rejected) => Err(anyhow!("invalid username or password")),
                Err(err) => Err(err),
            }
        };

        self.emit_state_changed().await;
        result
    }

    pub async fn logout(&self) -> Result<FlowState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            if let Some(operator) = &state.operator {
                info!("operator {} logged out", operator.username);
            }
            state.logout();
            state.clone()
        };
        self.emit_state_changed().await;
        Ok(snapshot)
    }

    pub async fn select_meter(&self, meter_type: MeterType) -> Result<FlowState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            let capture_id = Uuid::new_v4().to_string();
            state.begin_capture(meter_type, capture_id)?;
            info!(
                "capture {} started for {} meter",
                state.capture_id.as_deref().unwrap_or("?"),
                meter_type.as_str()
            );
            state.clone()
        };
        self.emit_state_changed().await;
        Ok(snapshot)
    }

    pub async fn back_to_menu(&self) -> Result<FlowState> {
        let snapshot = {
            let mut state = self.state.lock().await;
            state.back_to_menu();
            state.clone()
        };
        self.emit_state_changed().await;
        Ok(snapshot)
    }

    /// Prepares the picked file, records it, and submits it for OCR.
    /// An unreadable meter is not an error: the photo stays on screen
    /// and any previous estimate is discarded so a stale stored image
    /// cannot be submitted with a fresh photo.
    pub async fn attach_photo(&self, path: PathBuf) -> Result<CaptureUpdate> {
        let photo = capture::prepare_photo(&path)?;

        let (meter_type, capture_id) = {
            let mut state = self.state.lock().await;
            if state.screen != Screen::Capture {
                bail!("no capture in progress");
            }
            state.set_photo(photo.source.clone());
            (
                state.meter_type,
                state.capture_id.clone().unwrap_or_default(),
            )
        };

        info!(
            "capture {}: submitting {} ({} bytes) for OCR",
            capture_id,
            path.display(),
            photo.jpeg.len()
        );

        self.begin_request().await?;
        let outcome = self.api.recognize(&photo, meter_type).await;

        let result = {
            let mut state = self.state.lock().await;
            state.finish_request();
            match outcome {
                Ok(OcrOutcome::Recognized {
                    reading,
                    image_path,
                }) => {
                    info!("capture {}: estimated reading {}", capture_id, reading);
                    state.apply_estimate(reading, image_path);
                    Ok(CaptureUpdate {
                        state: state.clone(),
                        recognized: true,
                    })
                }
                Ok(OcrOutcome::Unreadable) => {
                    info!("capture {}: server could not read the dials", capture_id);
                    state.apply_estimate(String::new(), String::new());
                    Ok(CaptureUpdate {
                        state: state.clone(),
                        recognized: false,
                    })
                }
                Err(err) => Err(err),
            }
        };

        self.emit_state_changed().await;
        result
    }

    pub async fn save_reading(&self, room_number: String, reading: String) -> Result<FlowState> {
        let request = {
            let mut state = self.state.lock().await;
            if state.screen != Screen::Capture {
                bail!("no capture in progress");
            }
            let operator = state
                .operator
                .clone()
                .ok_or_else(|| anyhow!("not logged in"))?;
            state.record_entry(room_number, reading);
            state.validate_for_save()?;
            SaveRequest {
                reading: state.reading.trim().to_string(),
                image_path: state.server_image_path.clone(),
                room_number: state.room_number.trim().to_string(),
                meter_type: state.meter_type,
                user_id: operator.id,
            }
        };

        self.begin_request().await?;
        let outcome = self.api.save(&request).await;

        let result = {
            let mut state = self.state.lock().await;
            state.finish_request();
            match outcome {
                Ok(SaveOutcome::Saved) => {
                    info!(
                        "saved {} reading {} for room {}",
                        request.meter_type.as_str(),
                        request.reading,
                        request.room_number
                    );
                    state.complete_save();
                    Ok(state.clone())
                }
                Ok(SaveOutcome::Rejected(message)) => Err(anyhow!(message)),
                Err(err) => Err(err),
            }
        };

        self.emit_state_changed().await;
        if result.is_ok() {
            self.emit_reading_saved(&request).await;
        }
        result
    }

    /// Takes the busy guard and broadcasts the new state so the
    /// frontend can disable its buttons while the request runs.
    async fn begin_request(&self) -> Result<()> {
        {
            let mut state = self.state.lock().await;
            state.begin_request()?;
        }
        self.emit_state_changed().await;
        Ok(())
    }

    async fn emit_state_changed(&self) {
        let state = self.state.lock().await.clone();
        let payload = FlowStateChangedEvent { state };
        if let Err(err) = self.app_handle.emit("flow-state-changed", payload) {
            warn!("failed to emit flow-state-changed: {err}");
        }
    }

    async fn emit_reading_saved(&self, request: &SaveRequest) {
        let payload = ReadingSavedEvent {
            room_number: request.room_number.clone(),
            meter_type: request.meter_type,
            reading: request.reading.clone(),
        };
        if let Err(err) = self.app_handle.emit("reading-saved", payload) {
            warn!("failed to emit reading-saved: {err}");
        }
    }
}
