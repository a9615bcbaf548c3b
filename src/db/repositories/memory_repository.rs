use crate::db::models::{Choice, Question};
use crate::db::repositories::PollRepository;
use crate::error::PollError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Store {
    questions: Vec<Question>,
    choices: Vec<Choice>,
}

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct InMemoryPollRepository {
    store: Mutex<Store>,
}

impl InMemoryPollRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PollRepository for InMemoryPollRepository {
    async fn create_question(
        &self,
        text: &str,
        published_at: DateTime<Utc>,
    ) -> Result<Question, PollError> {
        let question = Question {
            id: Uuid::now_v7(),
            text: text.to_string(),
            published_at,
        };
        self.store.lock().await.questions.push(question.clone());
        Ok(question)
    }

    async fn add_choice(&self, question_id: Uuid, text: &str) -> Result<Choice, PollError> {
        let mut store = self.store.lock().await;
        if !store.questions.iter().any(|q| q.id == question_id) {
            return Err(PollError::QuestionNotFound);
        }

        let choice = Choice {
            id: Uuid::now_v7(),
            question_id,
            text: text.to_string(),
            votes: 0,
        };
        store.choices.push(choice.clone());
        Ok(choice)
    }

    async fn get_question(&self, question_id: Uuid) -> Result<Option<Question>, PollError> {
        let store = self.store.lock().await;
        Ok(store.questions.iter().find(|q| q.id == question_id).cloned())
    }

    async fn latest_published(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Question>, PollError> {
        let store = self.store.lock().await;
        let mut published: Vec<Question> = store
            .questions
            .iter()
            .filter(|q| q.published_at <= now)
            .cloned()
            .collect();
        published.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        published.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(published)
    }

    async fn get_choices(&self, question_id: Uuid) -> Result<Vec<Choice>, PollError> {
        let store = self.store.lock().await;
        Ok(store
            .choices
            .iter()
            .filter(|c| c.question_id == question_id)
            .cloned()
            .collect())
    }

    async fn increment_votes(
        &self,
        question_id: Uuid,
        choice_id: Uuid,
    ) -> Result<Option<Choice>, PollError> {
        let mut store = self.store.lock().await;
        let Some(choice) = store
            .choices
            .iter_mut()
            .find(|c| c.id == choice_id && c.question_id == question_id)
        else {
            return Ok(None);
        };

        choice.votes = choice.votes.checked_add(1).ok_or_else(|| {
            PollError::DatabaseError(format!("vote count overflow on choice {choice_id}"))
        })?;
        Ok(Some(choice.clone()))
    }

    async fn delete_question(&self, question_id: Uuid) -> Result<bool, PollError> {
        let mut store = self.store.lock().await;
        let before = store.questions.len();
        store.questions.retain(|q| q.id != question_id);
        if store.questions.len() == before {
            return Ok(false);
        }
        store.choices.retain(|c| c.question_id != question_id);
        Ok(true)
    }
}
