use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::resume::{ParsedResume, ResumeRow};

/// Accepted resume formats: (extension, content type).
const ALLOWED_FORMATS: [(&str, &str); 2] = [
    ("pdf", "application/pdf"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// Returns the lowercase extension and content type of an accepted upload.
pub fn resume_format(file_name: &str) -> Result<(&'static str, &'static str), AppError> {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    ALLOWED_FORMATS
        .iter()
        .find(|(allowed, _)| *allowed == ext)
        .copied()
        .ok_or_else(|| {
            AppError::Validation(
                "unsupported file format. Only PDF and DOCX files are allowed.".to_string(),
            )
        })
}

pub fn resume_object_key(user_id: i64, ext: &str) -> String {
    format!("resumes/{}/{}.{}", user_id, Uuid::new_v4(), ext)
}

/// Uploads the original file and returns its object key.
pub async fn store_resume_file(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    user_id: i64,
    file_name: &str,
    data: Bytes,
) -> Result<String, AppError> {
    let (ext, content_type) = resume_format(file_name)?;
    let key = resume_object_key(user_id, ext);

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(data))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Uploaded resume to s3://{}/{}", bucket, key);
    Ok(key)
}

/// Best-effort removal of an uploaded file whose resume row never landed.
/// Failure is logged with the key so the object can be cleaned up by hand.
pub async fn discard_resume_file(s3: &aws_sdk_s3::Client, bucket: &str, key: &str) {
    match s3.delete_object().bucket(bucket).key(key).send().await {
        Ok(_) => info!("Removed orphaned resume s3://{}/{}", bucket, key),
        Err(e) => warn!(bucket, key, error = %e, "Failed to remove orphaned resume"),
    }
}

pub async fn save_resume(
    pool: &PgPool,
    user_id: i64,
    file_addr: &str,
    parsed: &ParsedResume,
) -> Result<ResumeRow, AppError> {
    let row = sqlx::query_as::<_, ResumeRow>(
        r#"
        INSERT INTO resumes
            (user_id, resume_file_addr, name, email, phone, skills, education, experience)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(file_addr)
    .bind(&parsed.name)
    .bind(&parsed.email)
    .bind(&parsed.phone)
    .bind(&parsed.skills)
    .bind(&parsed.education)
    .bind(&parsed.experience)
    .fetch_one(pool)
    .await?;

    info!(resume_id = row.id, user_id, "Saved parsed resume");
    Ok(row)
}
