pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::auth::{require, Role};
use crate::jobs::handlers as jobs;
use crate::resumes::handlers as resumes;
use crate::state::AppState;
use crate::users::handlers as users;

/// Resumes routinely exceed Axum's 2 MB default.
const MAX_RESUME_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let tokens = state.tokens.clone();

    Router::new()
        .route("/health", get(health::health_handler))
        // Public
        .route("/api/signup", post(users::handle_signup))
        .route("/api/login", post(users::handle_login))
        // Admin
        .route(
            "/api/admin/job",
            require(post(jobs::handle_create_job), tokens.clone(), Role::Admin),
        )
        .route(
            "/api/admin/job/:job_id",
            require(get(jobs::handle_get_job), tokens.clone(), Role::Admin),
        )
        .route(
            "/api/admin/applicants",
            require(get(users::handle_list_applicants), tokens.clone(), Role::Admin),
        )
        .route(
            "/api/admin/applicant/:applicant_id",
            require(get(users::handle_get_applicant), tokens.clone(), Role::Admin),
        )
        // Applicant
        .route(
            "/api/jobs",
            require(get(jobs::handle_list_jobs), tokens.clone(), Role::Applicant),
        )
        .route(
            "/api/jobs/apply/:job_id",
            require(get(jobs::handle_apply), tokens.clone(), Role::Applicant),
        )
        .route(
            "/api/upload",
            require(
                post(resumes::handle_upload).layer(DefaultBodyLimit::max(MAX_RESUME_BYTES)),
                tokens,
                Role::Applicant,
            ),
        )
        .with_state(state)
}
