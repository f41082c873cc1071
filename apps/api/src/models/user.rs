use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub user_type: String,
    #[serde(skip)]
    pub password_hash: String,
    pub profile_headline: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    pub user_type: String,
    pub password: String,
    #[serde(default)]
    pub profile_headline: String,
}

/// What the login flow needs to authenticate a user and mint a token.
#[derive(Debug, Clone, FromRow)]
pub struct Credentials {
    pub id: i64,
    pub password_hash: String,
    pub user_type: String,
}

/// A user joined with their parsed resume.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ApplicantProfile {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub address: String,
    pub user_type: String,
    pub profile_headline: String,
    pub skills: Value,
    pub education: Value,
    pub experience: Value,
    pub phone: Option<String>,
}
