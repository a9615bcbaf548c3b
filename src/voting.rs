use crate::db::models::{Choice, MAX_TEXT_LEN, Question};
use crate::db::repositories::PollRepository;
use crate::error::PollError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// How many questions the index shows.
pub const LATEST_QUESTIONS_LIMIT: i64 = 5;

/// The last five questions published at or before `now`, newest first.
/// Questions scheduled for later stay hidden.
pub async fn latest_questions(
    repo: &dyn PollRepository,
    now: DateTime<Utc>,
) -> Result<Vec<Question>, PollError> {
    repo.latest_published(now, LATEST_QUESTIONS_LIMIT).await
}

/// Path segments that are not identifiers cannot name a question.
pub fn parse_question_id(raw: &str) -> Result<Uuid, PollError> {
    Uuid::parse_str(raw.trim()).map_err(|_| PollError::QuestionNotFound)
}

pub async fn find_question(
    repo: &dyn PollRepository,
    question_id: Uuid,
) -> Result<Question, PollError> {
    repo.get_question(question_id)
        .await?
        .ok_or(PollError::QuestionNotFound)
}

/// Records one vote for the submitted choice of `question`.
///
/// A missing submission, a value that is not an identifier, or a choice of
/// some other question all end in `MissingOrInvalidChoice` with nothing
/// written.
pub async fn cast_vote(
    repo: &dyn PollRepository,
    question: &Question,
    submitted: Option<&str>,
) -> Result<Choice, PollError> {
    let choice_id = submitted
        .map(str::trim)
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(PollError::MissingOrInvalidChoice)?;

    repo.increment_votes(question.id, choice_id)
        .await?
        .ok_or(PollError::MissingOrInvalidChoice)
}

pub async fn create_question(
    repo: &dyn PollRepository,
    text: &str,
    published_at: Option<DateTime<Utc>>,
    choices: &[String],
) -> Result<(Question, Vec<Choice>), PollError> {
    let text = validate_text("question", text)?;
    let choice_texts = choices
        .iter()
        .map(|choice| validate_text("choice", choice))
        .collect::<Result<Vec<_>, _>>()?;

    let question = repo
        .create_question(text, published_at.unwrap_or_else(Utc::now))
        .await?;

    let mut created = Vec::with_capacity(choice_texts.len());
    for choice_text in choice_texts {
        created.push(repo.add_choice(question.id, choice_text).await?);
    }

    Ok((question, created))
}

pub async fn add_choice(
    repo: &dyn PollRepository,
    question_id: Uuid,
    text: &str,
) -> Result<Choice, PollError> {
    let text = validate_text("choice", text)?;
    let question = find_question(repo, question_id).await?;
    repo.add_choice(question.id, text).await
}

pub async fn delete_question(
    repo: &dyn PollRepository,
    question_id: Uuid,
) -> Result<(), PollError> {
    if repo.delete_question(question_id).await? {
        Ok(())
    } else {
        Err(PollError::QuestionNotFound)
    }
}

fn validate_text<'a>(field: &str, text: &'a str) -> Result<&'a str, PollError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PollError::InvalidRequest(format!("{field} text is empty")));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(PollError::InvalidRequest(format!(
            "{field} text is longer than {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::InMemoryPollRepository;
    use assert_matches::assert_matches;
    use chrono::TimeDelta;

    async fn create_question_days_ago(
        repo: &InMemoryPollRepository,
        text: &str,
        days: i64,
    ) -> Question {
        repo.create_question(text, Utc::now() + TimeDelta::days(days))
            .await
            .unwrap()
    }

    async fn question_with_choices(repo: &InMemoryPollRepository) -> (Question, Choice, Choice) {
        let question = create_question_days_ago(repo, "Pick one", -1).await;
        let first = repo.add_choice(question.id, "First").await.unwrap();
        let second = repo.add_choice(question.id, "Second").await.unwrap();
        (question, first, second)
    }

    async fn votes_of(repo: &InMemoryPollRepository, question_id: Uuid) -> Vec<i32> {
        repo.get_choices(question_id)
            .await
            .unwrap()
            .iter()
            .map(|c| c.votes)
            .collect()
    }

    #[tokio::test]
    async fn no_questions_gives_empty_list() {
        let repo = InMemoryPollRepository::new();
        let latest = latest_questions(&repo, Utc::now()).await.unwrap();
        assert!(latest.is_empty());
    }

    #[tokio::test]
    async fn future_question_is_hidden() {
        let repo = InMemoryPollRepository::new();
        create_question_days_ago(&repo, "Future question.", 30).await;
        let latest = latest_questions(&repo, Utc::now()).await.unwrap();
        assert!(latest.is_empty());
    }

    #[tokio::test]
    async fn only_past_questions_are_listed_newest_first() {
        let repo = InMemoryPollRepository::new();
        create_question_days_ago(&repo, "Past question 1.", -30).await;
        create_question_days_ago(&repo, "Future question.", 30).await;
        create_question_days_ago(&repo, "Past question 2.", -5).await;

        let latest = latest_questions(&repo, Utc::now()).await.unwrap();
        let texts: Vec<&str> = latest.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["Past question 2.", "Past question 1."]);
    }

    #[tokio::test]
    async fn list_is_capped_at_five() {
        let repo = InMemoryPollRepository::new();
        for days in 1..=8 {
            create_question_days_ago(&repo, &format!("Q{days}"), -days).await;
        }
        let latest = latest_questions(&repo, Utc::now()).await.unwrap();
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].text, "Q1");
        assert_eq!(latest[4].text, "Q5");
    }

    #[test]
    fn malformed_question_id_is_not_found() {
        for raw in ["abc", "42", ""] {
            assert_matches!(parse_question_id(raw), Err(PollError::QuestionNotFound));
        }
        let id = Uuid::now_v7();
        assert_eq!(parse_question_id(&id.to_string()).unwrap(), id);
    }

    #[tokio::test]
    async fn unknown_question_is_not_found() {
        let repo = InMemoryPollRepository::new();
        let result = find_question(&repo, Uuid::now_v7()).await;
        assert_matches!(result, Err(PollError::QuestionNotFound));
    }

    #[tokio::test]
    async fn vote_increments_only_the_selected_choice() {
        let repo = InMemoryPollRepository::new();
        let (question, _first, second) = question_with_choices(&repo).await;

        let voted = cast_vote(&repo, &question, Some(&second.id.to_string()))
            .await
            .unwrap();
        assert_eq!(voted.id, second.id);
        assert_eq!(voted.votes, 1);
        assert_eq!(votes_of(&repo, question.id).await, [0, 1]);
    }

    #[tokio::test]
    async fn repeated_votes_all_count() {
        let repo = InMemoryPollRepository::new();
        let (question, first, _second) = question_with_choices(&repo).await;
        let submitted = first.id.to_string();

        for _ in 0..4 {
            cast_vote(&repo, &question, Some(&submitted)).await.unwrap();
        }
        assert_eq!(votes_of(&repo, question.id).await, [4, 0]);
    }

    #[tokio::test]
    async fn missing_choice_changes_nothing() {
        let repo = InMemoryPollRepository::new();
        let (question, _, _) = question_with_choices(&repo).await;

        let result = cast_vote(&repo, &question, None).await;
        assert_matches!(result, Err(PollError::MissingOrInvalidChoice));
        assert_eq!(votes_of(&repo, question.id).await, [0, 0]);
    }

    #[tokio::test]
    async fn garbage_choice_changes_nothing() {
        let repo = InMemoryPollRepository::new();
        let (question, _, _) = question_with_choices(&repo).await;

        for submitted in ["", "  ", "42", "not-a-uuid"] {
            let result = cast_vote(&repo, &question, Some(submitted)).await;
            assert_matches!(result, Err(PollError::MissingOrInvalidChoice));
        }
        assert_eq!(votes_of(&repo, question.id).await, [0, 0]);
    }

    #[tokio::test]
    async fn choice_of_another_question_is_rejected() {
        let repo = InMemoryPollRepository::new();
        let (question, _, _) = question_with_choices(&repo).await;
        let (_, foreign, _) = question_with_choices(&repo).await;

        let result = cast_vote(&repo, &question, Some(&foreign.id.to_string())).await;
        assert_matches!(result, Err(PollError::MissingOrInvalidChoice));
        assert_eq!(votes_of(&repo, question.id).await, [0, 0]);
        assert_eq!(votes_of(&repo, foreign.question_id).await, [0, 0]);
    }

    #[tokio::test]
    async fn create_question_validates_text() {
        let repo = InMemoryPollRepository::new();

        let empty = create_question(&repo, "   ", None, &[]).await;
        assert_matches!(empty, Err(PollError::InvalidRequest(_)));

        let long_choice = vec!["x".repeat(MAX_TEXT_LEN + 1)];
        let too_long = create_question(&repo, "Fine", None, &long_choice).await;
        assert_matches!(too_long, Err(PollError::InvalidRequest(_)));

        assert!(latest_questions(&repo, Utc::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_question_stores_choices_in_order() {
        let repo = InMemoryPollRepository::new();
        let choices = vec!["Not much".to_string(), "The sky".to_string()];

        let (question, created) = create_question(&repo, " What's up? ", None, &choices)
            .await
            .unwrap();
        assert_eq!(question.text, "What's up?");
        assert_eq!(created.len(), 2);

        let stored: Vec<String> = repo
            .get_choices(question.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.text)
            .collect();
        assert_eq!(stored, choices);
    }

    #[tokio::test]
    async fn add_choice_to_unknown_question_fails() {
        let repo = InMemoryPollRepository::new();
        let result = add_choice(&repo, Uuid::now_v7(), "Orphan").await;
        assert_matches!(result, Err(PollError::QuestionNotFound));
    }

    #[tokio::test]
    async fn delete_twice_reports_not_found() {
        let repo = InMemoryPollRepository::new();
        let (question, _, _) = question_with_choices(&repo).await;

        delete_question(&repo, question.id).await.unwrap();
        let again = delete_question(&repo, question.id).await;
        assert_matches!(again, Err(PollError::QuestionNotFound));
    }
}
