use axum::{
    extract::{Multipart, State},
    Json,
};
use bytes::Bytes;
use serde_json::{json, Value};
use tracing::error;

use crate::auth::{Claims, Role};
use crate::errors::AppError;
use crate::resumes::service::{
    discard_resume_file, resume_format, save_resume, store_resume_file,
};
use crate::state::AppState;

/// Multipart field carrying the file.
const RESUME_FIELD: &str = "resume";

/// POST /api/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    claims: Claims,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    claims.require_role(Role::Applicant)?;
    let user_id = claims.user_id()?;

    let (file_name, data) = read_resume_field(multipart).await?;
    resume_format(&file_name)?;
    if data.is_empty() {
        return Err(AppError::Validation("resume file is empty".to_string()));
    }

    let parsed = state
        .resume_parser
        .parse(data.clone())
        .await
        .map_err(|e| AppError::ResumeParser(e.to_string()))?;

    let key = store_resume_file(&state.s3, &state.config.s3_bucket, user_id, &file_name, data).await?;
    if let Err(e) = save_resume(&state.db, user_id, &key, &parsed).await {
        error!(user_id, key = %key, "Resume row not saved; discarding uploaded file");
        discard_resume_file(&state.s3, &state.config.s3_bucket, &key).await;
        return Err(e);
    }

    Ok(Json(json!({ "message": "Resume data saved successfully" })))
}

async fn read_resume_field(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    let invalid = |e: axum::extract::multipart::MultipartError| {
        AppError::Validation(format!("failed to parse form data: {e}"))
    };

    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() != Some(RESUME_FIELD) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("resume must be sent as a file".to_string()))?;
        let data = field.bytes().await.map_err(invalid)?;
        return Ok((file_name, data));
    }

    Err(AppError::Validation(format!(
        "missing '{RESUME_FIELD}' file field"
    )))
}
