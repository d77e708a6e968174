use axum::Json;
use serde_json::Value;
use service_core::error::AppError;

pub const TEST_ERROR_CODE: &str = "TestError";
pub const TEST_ERROR_MESSAGE: &str = "This is a test.";

/// Always fails. Lets operators confirm that error reporting is wired up in a
/// deployed environment.
#[tracing::instrument]
pub async fn trigger_error() -> Result<Json<Vec<Value>>, AppError> {
    Err(AppError::coded(TEST_ERROR_CODE, TEST_ERROR_MESSAGE))
}
