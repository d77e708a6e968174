use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::models::{StatusReport, STATUS_PK};
use crate::services::run_probes;
use crate::startup::AppState;

pub const STATUS_ERROR_CODE: &str = "StatusError";

/// Build a fresh probe set, run it and fail unless every check passed.
async fn check_status(state: &AppState) -> Result<StatusReport, AppError> {
    let probe = (state.probes)(state.config.as_ref());
    let report = run_probes(probe.as_ref()).await;

    if !report.is_healthy() {
        return Err(
            AppError::coded(STATUS_ERROR_CODE, report.to_string()).with_data(report.error_data()),
        );
    }

    Ok(report)
}

#[tracing::instrument(skip(state))]
pub async fn list_status(
    State(state): State<AppState>,
) -> Result<Json<Vec<StatusReport>>, AppError> {
    let report = check_status(&state).await?;
    Ok(Json(vec![report]))
}

#[tracing::instrument(skip(state))]
pub async fn get_status(
    State(state): State<AppState>,
    Path(pk): Path<String>,
) -> Result<Json<StatusReport>, AppError> {
    if pk != STATUS_PK {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "Status object not found: {}",
            pk
        )));
    }

    Ok(Json(check_status(&state).await?))
}
