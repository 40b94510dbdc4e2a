pub mod alert;
pub mod audio;
pub mod backend;
pub mod events;
pub mod notify;
pub mod session;
pub mod settings;
pub mod stats;

#[cfg(feature = "tauri")]
mod commands;

pub use backend::{DetectorClient, HttpDetectorClient};
pub use session::SessionController;

#[cfg(feature = "tauri")]
use settings::SettingsStore;

#[cfg(feature = "tauri")]
pub(crate) struct AppState {
    pub(crate) controller: SessionController,
    pub(crate) settings: SettingsStore,
}

#[cfg(feature = "tauri")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;

    use crate::commands::*;
    use crate::events::AppHandleSink;
    use tauri::Manager;

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("Vigil starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = SettingsStore::new(settings_path)?;

                let backend = Arc::new(HttpDetectorClient::new(
                    settings_store.get().backend_url,
                ));
                let sink = Arc::new(AppHandleSink::new(app.handle().clone()));

                // The controller spawns its perpetual clock task, so build
                // it inside the async runtime.
                let controller = tauri::async_runtime::block_on(async move {
                    SessionController::new(backend, sink)
                });

                app.manage(AppState {
                    controller,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            start_detection,
            stop_detection,
            get_session_state,
            get_session_stats,
            analyze_image,
            preview_camera,
            close_alert,
            dismiss_notification,
            list_notifications,
            get_settings,
            update_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
