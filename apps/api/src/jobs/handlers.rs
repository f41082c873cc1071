use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{Claims, Role};
use crate::errors::AppError;
use crate::jobs::service::{apply_for_job, create_job, get_job_with_applicants, list_jobs};
use crate::models::job::{Job, NewJob};
use crate::state::AppState;

/// POST /api/admin/job
pub async fn handle_create_job(
    State(state): State<AppState>,
    claims: Claims,
    Json(req): Json<NewJob>,
) -> Result<(StatusCode, Json<Job>), AppError> {
    claims.require_role(Role::Admin)?;
    let job = create_job(&state.db, &req, claims.user_id()?).await?;
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let jobs = list_jobs(&state.db).await?;
    Ok(Json(json!({ "jobs": jobs })))
}

/// GET /api/jobs/apply/:job_id
pub async fn handle_apply(
    State(state): State<AppState>,
    claims: Claims,
    Path(job_id): Path<i64>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    claims.require_role(Role::Applicant)?;
    apply_for_job(&state.db, claims.user_id()?, job_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "applied successfully" })),
    ))
}

/// GET /api/admin/job/:job_id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let (job, applicants) = get_job_with_applicants(&state.db, job_id).await?;
    Ok(Json(json!({ "job": job, "applicants": applicants })))
}
