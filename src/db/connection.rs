use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::time::Duration;

pub type DbPool = Pool<Postgres>;

pub async fn init_db(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .max_lifetime(Duration::from_secs(30 * 60))
        .idle_timeout(Duration::from_secs(10 * 60))
        .connect(database_url)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS questions (
            id UUID PRIMARY KEY,
            text VARCHAR(200) NOT NULL,
            published_at TIMESTAMP WITH TIME ZONE NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS choices (
            id UUID PRIMARY KEY,
            question_id UUID NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
            text VARCHAR(200) NOT NULL,
            votes INT NOT NULL DEFAULT 0 CHECK (votes >= 0)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_questions_published_at ON questions(published_at DESC)
        "#,
    )
    .execute(&pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_choices_question_id ON choices(question_id)
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

pub fn pool_stats(pool: &DbPool) -> String {
    let size = pool.size() as usize;
    let num_idle = pool.num_idle();
    format!(
        "Pool stats: size={}, idle={}, in_use={}",
        size,
        num_idle,
        size.saturating_sub(num_idle)
    )
}
