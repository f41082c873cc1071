use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub posted_on: DateTime<Utc>,
    pub total_applications: i32,
    pub company_name: String,
    pub posted_by: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewJob {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub company_name: String,
}

/// A user who applied for a job, as shown to admins.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Applicant {
    pub name: String,
    pub email: String,
}
