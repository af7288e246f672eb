mod api;
mod capture;
mod flow;
mod settings;

use api::ApiClient;
use flow::{
    commands::{
        attach_meter_photo, back_to_menu, get_flow_state, login, logout, save_reading,
        select_meter,
    },
    FlowController,
};
use settings::{ServerSettings, SettingsStore};
use tauri::{Emitter, Manager, State};

pub(crate) struct AppState {
    pub(crate) flow: FlowController,
    pub(crate) settings: SettingsStore,
}

#[tauri::command]
fn get_server_settings(state: State<AppState>) -> Result<ServerSettings, String> {
    Ok(state.settings.server())
}

#[tauri::command]
fn set_server_settings(
    settings: ServerSettings,
    state: State<AppState>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .settings
        .update_server(settings.clone())
        .map_err(|e| e.to_string())?;

    app_handle
        .emit("server-settings-updated", &settings)
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("MeterScan starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;

                let api_client = ApiClient::new(settings_store.clone());
                let flow_controller = FlowController::new(app.handle().clone(), api_client);

                app.manage(AppState {
                    flow: flow_controller,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_flow_state,
            login,
            logout,
            select_meter,
            back_to_menu,
            attach_meter_photo,
            save_reading,
            get_server_settings,
            set_server_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
