use crate::db::connection::DbPool;
use crate::db::models::Choice;
use sqlx::Error;
use uuid::Uuid;

pub async fn add_choice(pool: &DbPool, question_id: Uuid, text: &str) -> Result<Choice, Error> {
    let choice_id = Uuid::now_v7();

    sqlx::query_as::<_, Choice>(
        "INSERT INTO choices (id, question_id, text) VALUES ($1, $2, $3) RETURNING id, question_id, text, votes",
    )
    .bind(choice_id)
    .bind(question_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

pub async fn get_choices(pool: &DbPool, question_id: Uuid) -> Result<Vec<Choice>, Error> {
    sqlx::query_as::<_, Choice>(
        "SELECT id, question_id, text, votes FROM choices WHERE question_id = $1 ORDER BY id",
    )
    .bind(question_id)
    .fetch_all(pool)
    .await
}

/// Bumps the tally in a single statement so concurrent votes never lose an
/// increment. Returns `None` when the choice does not belong to the question.
pub async fn increment_votes(
    pool: &DbPool,
    question_id: Uuid,
    choice_id: Uuid,
) -> Result<Option<Choice>, Error> {
    sqlx::query_as::<_, Choice>(
        "UPDATE choices SET votes = votes + 1 WHERE id = $1 AND question_id = $2 RETURNING id, question_id, text, votes",
    )
    .bind(choice_id)
    .bind(question_id)
    .fetch_optional(pool)
    .await
}
