use tauri::State;
use uuid::Uuid;

use crate::backend::CameraPreview;
use crate::notify::Notification;
use crate::session::SessionState;
use crate::settings::ClientSettings;
use crate::stats::StatsSnapshot;
use crate::AppState;

#[tauri::command]
pub async fn start_detection(state: State<'_, AppState>) -> Result<SessionState, String> {
    let camera_index = state.settings.get().camera_index;
    Ok(state.controller.start_session(camera_index).await)
}

#[tauri::command]
pub async fn stop_detection(state: State<'_, AppState>) -> Result<SessionState, String> {
    Ok(state.controller.stop_session().await)
}

#[tauri::command]
pub async fn get_session_state(state: State<'_, AppState>) -> Result<SessionState, String> {
    Ok(state.controller.current_state().await)
}

#[tauri::command]
pub async fn get_session_stats(state: State<'_, AppState>) -> Result<StatsSnapshot, String> {
    Ok(state.controller.stats().snapshot().await)
}

#[tauri::command]
pub async fn analyze_image(
    state: State<'_, AppState>,
    bytes: Vec<u8>,
    file_name: String,
) -> Result<(), String> {
    state.controller.analyze_image(bytes, file_name).await;
    Ok(())
}

#[tauri::command]
pub async fn preview_camera(
    state: State<'_, AppState>,
    camera_index: u32,
) -> Result<CameraPreview, String> {
    state
        .controller
        .preview_camera(camera_index)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn close_alert(state: State<'_, AppState>) -> Result<(), String> {
    state.controller.close_alert().await;
    Ok(())
}

#[tauri::command]
pub async fn dismiss_notification(state: State<'_, AppState>, id: String) -> Result<(), String> {
    let id = Uuid::parse_str(&id).map_err(|e| e.to_string())?;
    state.controller.dismiss_notification(id).await;
    Ok(())
}

#[tauri::command]
pub async fn list_notifications(state: State<'_, AppState>) -> Result<Vec<Notification>, String> {
    Ok(state.controller.notifier().active().await)
}

#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<ClientSettings, String> {
    Ok(state.settings.get())
}

#[tauri::command]
pub fn update_settings(
    state: State<'_, AppState>,
    settings: ClientSettings,
) -> Result<(), String> {
    state.settings.update(settings).map_err(|e| e.to_string())
}
