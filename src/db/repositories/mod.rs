pub mod choice_repository;
pub mod memory_repository;
pub mod question_repository;

pub use choice_repository::*;
pub use memory_repository::InMemoryPollRepository;
pub use question_repository::*;

use crate::db::connection::DbPool;
use crate::db::models::{Choice, Question};
use crate::error::PollError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage for questions and their choices.
///
/// Lookups hand back `Option` and leave the "not found" decision to the
/// caller. Deleting a question removes its choices as well.
#[async_trait]
pub trait PollRepository: Send + Sync {
    async fn create_question(
        &self,
        text: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Question, PollError>;

    async fn add_choice(&self, question_id: Uuid, text: &str) -> Result<Choice, PollError>;

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>, PollError>;

    /// Questions with `published_at <= now`, newest first, at most `limit`.
    async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Question>, PollError>;

    async fn get_choices(&self, question_id: Uuid) -> Result<Vec<Choice>, PollError>;

    /// Adds one vote to `choice_id` if it belongs to `question_id`.
    async fn increment_votes(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<Choice>, PollError>;

    async fn delete_question(&self, question_id: Uuid) -> Result<bool, PollError>;
}

#[derive(Clone)]
pub struct PgPollRepository {
    pool: DbPool,
}

impl PgPollRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PollRepository for PgPollRepository {
    async fn create_question(
        &self,
        text: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Question, PollError> {
        Ok(question_repository::create_question(&self.pool, text, published_at).await?)
    }

    async fn add_choice(&self, question_id: Uuid, text: &str) -> Result<Choice, PollError> {
        Ok(choice_repository::add_choice(&self.pool, question_id, text).await?)
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>, PollError> {
        Ok(question_repository::get_question(&self.pool, question_id).await?)
    }

    async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Question>, PollError> {
        Ok(question_repository::get_published_questions(&self.pool, now, limit).await?)
    }

    async fn get_choices(&self, question_id: Uuid) -> Result<Vec<Choice>, PollError> {
        Ok(choice_repository::get_choices(&self.pool, question_id).await?)
    }

    async fn increment_votes(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<Choice>, PollError> {
        Ok(choice_repository::increment_votes(&self.pool, question_id, choice_id).await?)
    }

    async fn delete_question(&self, question_id: Uuid) -> Result<bool, PollError> {
        Ok(question_repository::delete_question(&self.pool, question_id).await?)
    }
}
