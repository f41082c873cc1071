use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ResumeRow {
    pub id: i64,
    pub user_id: i64,
    pub resume_file_addr: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub skills: Value,
    pub education: Value,
    pub experience: Value,
    pub created_at: DateTime<Utc>,
}

/// Fields extracted by the resume parsing service.
/// The list fields are kept as raw JSON; their shape varies per resume.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParsedResume {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default = "empty_list")]
    pub skills: Value,
    #[serde(default = "empty_list")]
    pub education: Value,
    #[serde(default = "empty_list")]
    pub experience: Value,
}

fn empty_list() -> Value {
    Value::Array(Vec::new())
}
