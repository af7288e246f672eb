use std::path::PathBuf;

use tauri::State;

use crate::{
    flow::{CaptureUpdate, FlowController, FlowState, MeterType},
    AppState,
};

fn controller_from_state(state: &State<'_, AppState>) -> FlowController {
    state.flow.clone()
}

#[tauri::command]
pub async fn get_flow_state(state: State<'_, AppState>) -> Result<FlowState, String> {
    Ok(controller_from_state(&state).get_state().await)
}

#[tauri::command]
pub async fn login(
    state: State<'_, AppState>,
    username: String,
    password: String,
) -> Result<FlowState, String> {
    controller_from_state(&state)
        .login(&username, &password)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn logout(state: State<'_, AppState>) -> Result<FlowState, String> {
    controller_from_state(&state)
        .logout()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn select_meter(
    state: State<'_, AppState>,
    meter_type: MeterType,
) -> Result<FlowState, String> {
    controller_from_state(&state)
        .select_meter(meter_type)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn back_to_menu(state: State<'_, AppState>) -> Result<FlowState, String> {
    controller_from_state(&state)
        .back_to_menu()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn attach_meter_photo(
    state: State<'_, AppState>,
    path: PathBuf,
) -> Result<CaptureUpdate, String> {
    controller_from_state(&state)
        .attach_photo(path)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn save_reading(
    state: State<'_, AppState>,
    room_number: String,
    reading: String,
) -> Result<FlowState, String> {
    controller_from_state(&state)
        .save_reading(room_number, reading)
        .await
        .map_err(|e| e.to_string())
}
