use anyhow::anyhow;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::auth::Role;
use crate::errors::AppError;
use crate::models::user::{ApplicantProfile, Credentials, NewUser, User};
use crate::users::password::{hash_password_blocking, verify_password_blocking};

const APPLICANT_PROFILE_QUERY: &str = r#"
    SELECT u.id, u.name, u.email, u.address, u.user_type, u.profile_headline,
           r.skills, r.education, r.experience, r.phone
    FROM users AS u
    JOIN resumes AS r ON u.id = r.user_id
"#;

/// Checks a signup request and returns the role it asks for.
pub fn validate_new_user(new_user: &NewUser) -> Result<Role, AppError> {
    if new_user.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let email = new_user.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    if new_user.password.is_empty() {
        return Err(AppError::Validation("password is required".to_string()));
    }
    new_user
        .user_type
        .parse::<Role>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

pub async fn create_user(pool: &PgPool, new_user: &NewUser) -> Result<User, AppError> {
    let role = validate_new_user(new_user)?;
    let email = new_user.email.trim().to_lowercase();
    let password_hash = hash_password_blocking(new_user.password.clone()).await?;

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (name, email, address, user_type, password_hash, profile_headline)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(new_user.name.trim())
    .bind(&email)
    .bind(&new_user.address)
    .bind(role.as_str())
    .bind(&password_hash)
    .bind(&new_user.profile_headline)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::Conflict(format!("a user with email {email} already exists"))
        }
        other => AppError::Database(other),
    })?;

    info!(user_id = user.id, role = %role, "Registered user");
    Ok(user)
}

pub async fn find_credentials(pool: &PgPool, email: &str) -> Result<Option<Credentials>, AppError> {
    Ok(sqlx::query_as::<_, Credentials>(
        "SELECT id, password_hash, user_type FROM users WHERE email = $1",
    )
    .bind(email.trim().to_lowercase())
    .fetch_optional(pool)
    .await?)
}

/// Verifies a password against stored credentials and yields the identity
/// to put in a token. The role always comes from storage.
pub async fn check_credentials(
    credentials: &Credentials,
    password: &str,
) -> Result<(i64, Role), AppError> {
    if !verify_password_blocking(credentials.password_hash.clone(), password.to_string()).await? {
        return Err(AppError::Unauthorized);
    }
    let role = credentials.user_type.parse::<Role>().map_err(|e| {
        AppError::Internal(anyhow!("user {} has a corrupt role: {e}", credentials.id))
    })?;
    Ok((credentials.id, role))
}

/// Login lookup. Unknown email and wrong password are indistinguishable.
pub async fn authenticate(pool: &PgPool, email: &str, password: &str) -> Result<(i64, Role), AppError> {
    let Some(credentials) = find_credentials(pool, email).await? else {
        warn!("Login attempt for unknown email");
        return Err(AppError::Unauthorized);
    };
    let result = check_credentials(&credentials, password).await;
    if matches!(result, Err(AppError::Unauthorized)) {
        warn!(user_id = credentials.id, "Login attempt with wrong password");
    }
    result
}

pub async fn list_applicants(pool: &PgPool) -> Result<Vec<ApplicantProfile>, AppError> {
    Ok(sqlx::query_as::<_, ApplicantProfile>(&format!(
        "{APPLICANT_PROFILE_QUERY} ORDER BY u.id"
    ))
    .fetch_all(pool)
    .await?)
}

pub async fn get_applicant(pool: &PgPool, applicant_id: i64) -> Result<Vec<ApplicantProfile>, AppError> {
    let profiles = sqlx::query_as::<_, ApplicantProfile>(&format!(
        "{APPLICANT_PROFILE_QUERY} WHERE u.id = $1"
    ))
    .bind(applicant_id)
    .fetch_all(pool)
    .await?;

    if profiles.is_empty() {
        return Err(AppError::NotFound(format!("Applicant {applicant_id} not found")));
    }
    Ok(profiles)
}
