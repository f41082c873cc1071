use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::job::{Applicant, Job, NewJob};

pub fn validate_new_job(new_job: &NewJob) -> Result<(), AppError> {
    if new_job.title.trim().is_empty() {
        return Err(AppError::Validation("title is required".to_string()));
    }
    if new_job.company_name.trim().is_empty() {
        return Err(AppError::Validation("company_name is required".to_string()));
    }
    Ok(())
}

pub async fn create_job(pool: &PgPool, new_job: &NewJob, posted_by: i64) -> Result<Job, AppError> {
    validate_new_job(new_job)?;

    let job = sqlx::query_as::<_, Job>(
        r#"
        INSERT INTO jobs (title, description, posted_on, total_applications, company_name, posted_by)
        VALUES ($1, $2, NOW(), 0, $3, $4)
        RETURNING *
        "#,
    )
    .bind(new_job.title.trim())
    .bind(&new_job.description)
    .bind(new_job.company_name.trim())
    .bind(posted_by)
    .fetch_one(pool)
    .await?;

    info!(job_id = job.id, posted_by, "Created job");
    Ok(job)
}

pub async fn list_jobs(pool: &PgPool) -> Result<Vec<Job>, AppError> {
    Ok(
        sqlx::query_as::<_, Job>("SELECT * FROM jobs ORDER BY posted_on DESC, id DESC")
            .fetch_all(pool)
            .await?,
    )
}

/// Records one application per (user, job) and bumps the job's counter.
/// Both writes commit together.
pub async fn apply_for_job(pool: &PgPool, user_id: i64, job_id: i64) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    // Row lock serialises concurrent applications to the same job.
    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
        .bind(job_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound(format!("Job {job_id} not found")));
    }

    let already_applied: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM applications WHERE user_id = $1 AND job_id = $2)",
    )
    .bind(user_id)
    .bind(job_id)
    .fetch_one(&mut *tx)
    .await?;
    if already_applied {
        return Err(AppError::Conflict(
            "user has already applied for this job".to_string(),
        ));
    }

    sqlx::query("INSERT INTO applications (user_id, job_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE jobs SET total_applications = total_applications + 1 WHERE id = $1")
        .bind(job_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    info!(user_id, job_id, "Recorded job application");
    Ok(())
}

pub async fn get_job_with_applicants(
    pool: &PgPool,
    job_id: i64,
) -> Result<(Job, Vec<Applicant>), AppError> {
    let job = sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
        .bind(job_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))?;

    let applicants = sqlx::query_as::<_, Applicant>(
        r#"
        SELECT u.name, u.email
        FROM users u
        JOIN applications a ON u.id = a.user_id
        WHERE a.job_id = $1
        ORDER BY a.applied_on
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    Ok((job, applicants))
}
