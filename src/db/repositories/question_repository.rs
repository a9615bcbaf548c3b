use crate::db::connection::DbPool;
use crate::db::models::Question;
use chrono::{DateTime, Utc};
use sqlx::Error;
use uuid::Uuid;

pub async fn create_question(
    pool: &DbPool,
    text: &str,
    published_at: DateTime<Utc>,
) -> Result<Question, Error> {
    let question_id = Uuid::now_v7();

    sqlx::query_as::<_, Question>(
        "INSERT INTO questions (id, text, published_at) VALUES ($1, $2, $3) RETURNING id, text, published_at",
    )
    .bind(question_id)
    .bind(text)
    .bind(published_at)
    .fetch_one(pool)
    .await
}

pub async fn get_question(pool: &DbPool, question_id: Uuid) -> Result<Option<Question>, Error> {
    sqlx::query_as::<_, Question>("SELECT id, text, published_at FROM questions WHERE id = $1")
        .bind(question_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_published_questions(
    pool: &DbPool,
    now: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Question>, Error> {
    sqlx::query_as::<_, Question>(
        "SELECT id, text, published_at FROM questions WHERE published_at <= $1 ORDER BY published_at DESC LIMIT $2",
    )
    .bind(now)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Choices go with the question through `ON DELETE CASCADE`.
pub async fn delete_question(pool: &DbPool, question_id: Uuid) -> Result<bool, Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(question_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
