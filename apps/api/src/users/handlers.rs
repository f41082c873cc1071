use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::auth::{Claims, Role};
use crate::errors::AppError;
use crate::models::user::NewUser;
use crate::state::AppState;
use crate::users::service::{authenticate, create_user, get_applicant, list_applicants};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Sent by clients but not trusted: the token carries the stored role.
    #[serde(default, rename = "userType", alias = "UserType", alias = "user_type")]
    pub user_type: Option<String>,
}

/// POST /api/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    create_user(&state.db, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "User Registered Successfully" })),
    ))
}

/// POST /api/login
/// Returns the token both in the body and in the `Authorization` header.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    let (user_id, role) = authenticate(&state.db, &req.email, &req.password).await?;

    if let Some(claimed) = req.user_type.as_deref() {
        if claimed.parse::<Role>().ok() != Some(role) {
            debug!(user_id, claimed, stored = %role, "Login userType differs from stored role");
        }
    }

    let token = state.tokens.issue(user_id, role)?;
    info!(user_id, %role, "Issued token");
    login_response(&token)
}

/// 201 with the token in the body and in the `Authorization` header.
pub fn login_response(token: &str) -> Result<Response, AppError> {
    let header_value = HeaderValue::from_str(token).map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        StatusCode::CREATED,
        [(header::AUTHORIZATION, header_value)],
        Json(json!({ "message": token })),
    )
        .into_response())
}

/// GET /api/admin/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    claims: Claims,
) -> Result<Json<Value>, AppError> {
    claims.require_role(Role::Admin)?;
    let applicants = list_applicants(&state.db).await?;
    Ok(Json(json!({ "applicants": applicants })))
}

/// GET /api/admin/applicant/:applicant_id
pub async fn handle_get_applicant(
    State(state): State<AppState>,
    claims: Claims,
    Path(applicant_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    claims.require_role(Role::Admin)?;
    let applicant = get_applicant(&state.db, applicant_id).await?;
    Ok(Json(json!({ "applicant": applicant })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_accepts_each_user_type_spelling() {
        for key in ["userType", "UserType", "user_type"] {
            let body = format!(r#"{{"email":"a@b.io","password":"pw","{key}":"applicant"}}"#);
            let req: LoginRequest = serde_json::from_str(&body).unwrap();
            assert_eq!(req.user_type.as_deref(), Some("applicant"));
        }

        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.io","password":"pw"}"#).unwrap();
        assert!(req.user_type.is_none());
    }

    #[tokio::test]
    async fn test_login_response_carries_token_twice() {
        let token = "eyJhbGciOiJSUzI1NiJ9.eyJzdWIiOiI0MiJ9.c2ln";
        let response = login_response(token).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::AUTHORIZATION).unwrap(),
            token
        );

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["message"], token);
    }

    #[test]
    fn test_login_response_rejects_unprintable_token() {
        assert!(matches!(
            login_response("bad\ntoken"),
            Err(AppError::Internal(_))
        ));
    }
}
