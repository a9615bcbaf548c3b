use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Longest text accepted for a question or a choice.
pub const MAX_TEXT_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Question {
    pub id: Uuid,
    pub text: String,
    pub published_at: DateTime<Utc>,
}

impl Question {
    /// True when the question went out within the last day, `now` included.
    /// Future questions are never recent.
    pub fn was_published_recently(&self, now: DateTime<Utc>) -> bool {
        now - TimeDelta::days(1) < self.published_at && self.published_at <= now
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Choice {
    pub id: Uuid,
    pub question_id: Uuid,
    pub text: String,
    pub votes: i32,
}
