use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::models::SettingsEntry;
use crate::services::{display_value, safe_settings};
use crate::startup::AppState;

#[tracing::instrument(skip(state))]
pub async fn list_settings(
    State(state): State<AppState>,
) -> Result<Json<Vec<SettingsEntry>>, AppError> {
    let snapshot = safe_settings(&state.config.raw_settings());

    let entries = snapshot
        .iter()
        .map(|(key, value)| SettingsEntry::new(key.as_str(), display_value(value)))
        .collect();

    Ok(Json(entries))
}

#[tracing::instrument(skip(state))]
pub async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<SettingsEntry>, AppError> {
    let snapshot = safe_settings(&state.config.raw_settings());

    match snapshot.get(&key) {
        Some(value) => Ok(Json(SettingsEntry::new(key.as_str(), display_value(value)))),
        None => Err(AppError::NotFound(anyhow::anyhow!(
            "Setting not found: {}",
            key
        ))),
    }
}
