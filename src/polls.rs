use crate::db::models::{Choice, Question};
use crate::error::PollError;
use crate::sse::{PollEvent, VoteCast};
use crate::startup::AppState;
use crate::voting;
use axum::{
    extract::{Extension, Form, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

// Request/Response DTOs
#[derive(Debug, Deserialize)]
pub struct CreateQuestionRequest {
    pub text: String,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddChoiceRequest {
    pub text: String,
}

/// The vote form. `choice` is absent when nothing was selected.
#[derive(Debug, Deserialize)]
pub struct VoteForm {
    pub choice: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    pub id: Uuid,
    pub text: String,
    pub published_at: String,
    pub was_published_recently: bool,
}

impl QuestionResponse {
    pub fn new(question: Question, now: DateTime<Utc>) -> Self {
        Self {
            was_published_recently: question.was_published_recently(now),
            id: question.id,
            text: question.text,
            published_at: question.published_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChoiceResponse {
    pub id: Uuid,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChoiceWithVotesResponse {
    pub id: Uuid,
    pub text: String,
    pub votes: i32,
}

impl From<Choice> for ChoiceWithVotesResponse {
    fn from(choice: Choice) -> Self {
        Self {
            id: choice.id,
            text: choice.text,
            votes: choice.votes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub latest_question_list: Vec<QuestionResponse>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub question: QuestionResponse,
    pub choices: Vec<ChoiceResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl DetailResponse {
    fn new(question: Question, choices: Vec<Choice>, now: DateTime<Utc>) -> Self {
        Self {
            question: QuestionResponse::new(question, now),
            choices: choices
                .into_iter()
                .map(|c| ChoiceResponse {
                    id: c.id,
                    text: c.text,
                })
                .collect(),
            error_message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub question: QuestionResponse,
    pub choices: Vec<ChoiceWithVotesResponse>,
    pub total_votes: i64,
}

impl ResultsResponse {
    pub fn new(question: Question, choices: Vec<Choice>, now: DateTime<Utc>) -> Self {
        let total_votes = choices.iter().map(|c| i64::from(c.votes)).sum();
        Self {
            question: QuestionResponse::new(question, now),
            choices: choices.into_iter().map(Into::into).collect(),
            total_votes,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreateQuestionResponse {
    pub question: QuestionResponse,
    pub choices: Vec<ChoiceResponse>,
}

pub fn results_path(question_id: Uuid) -> String {
    format!("/polls/{question_id}/results")
}

/// Latest published questions
pub async fn index(
    Extension(app_state): Extension<AppState>,
) -> Result<impl IntoResponse, PollError> {
    let now = Utc::now();
    let questions = voting::latest_questions(app_state.repo.as_ref(), now).await?;

    let response = IndexResponse {
        latest_question_list: questions
            .into_iter()
            .map(|q| QuestionResponse::new(q, now))
            .collect(),
    };

    Ok((StatusCode::OK, Json(response)))
}

/// A single question with its choices, ready for voting
pub async fn detail(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    let repo = app_state.repo.as_ref();
    let question = voting::find_question(repo, question_id).await?;
    let choices = repo.get_choices(question_id).await?;

    Ok((
        StatusCode::OK,
        Json(DetailResponse::new(question, choices, Utc::now())),
    ))
}

/// Vote tallies for a question
pub async fn results(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    let repo = app_state.repo.as_ref();
    let question = voting::find_question(repo, question_id).await?;
    let choices = repo.get_choices(question_id).await?;

    Ok((
        StatusCode::OK,
        Json(ResultsResponse::new(question, choices, Utc::now())),
    ))
}

/// Cast a vote for one choice of a question.
///
/// Redirects to the results on success so a reload does not post twice.
/// A missing or foreign choice redisplays the question with an error.
pub async fn vote(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
    form: Option<Form<VoteForm>>,
) -> Result<Response, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    let repo = app_state.repo.as_ref();
    let question = voting::find_question(repo, question_id).await?;
    let submitted = form.and_then(|Form(form)| form.choice);

    match voting::cast_vote(repo, &question, submitted.as_deref()).await {
        Ok(choice) => {
            info!(%question_id, choice_id = %choice.id, votes = choice.votes, "vote recorded");

            // No subscribers is fine.
            let _ = app_state.events.send(PollEvent::VoteCast(VoteCast {
                question_id,
                choice_id: choice.id,
                new_vote_count: choice.votes,
            }));

            Ok(Redirect::to(&results_path(question_id)).into_response())
        }
        Err(err @ PollError::MissingOrInvalidChoice) => {
            warn!(%question_id, submitted = ?submitted, "vote without a valid choice");

            let choices = repo.get_choices(question_id).await?;
            let mut response = DetailResponse::new(question, choices, Utc::now());
            response.error_message = Some(err.to_string());

            Ok((StatusCode::OK, Json(response)).into_response())
        }
        Err(e) => Err(e),
    }
}

/// Create a question, optionally with its choices
pub async fn create_question(
    Extension(app_state): Extension<AppState>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, PollError> {
    let (question, choices) = voting::create_question(
        app_state.repo.as_ref(),
        &payload.text,
        payload.published_at,
        &payload.choices,
    )
    .await?;

    info!(question_id = %question.id, choices = choices.len(), "question created");

    let response = CreateQuestionResponse {
        question: QuestionResponse::new(question, Utc::now()),
        choices: choices
            .into_iter()
            .map(|c| ChoiceResponse {
                id: c.id,
                text: c.text,
            })
            .collect(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Add a choice to an existing question
pub async fn add_choice(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
    Json(payload): Json<AddChoiceRequest>,
) -> Result<impl IntoResponse, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    let choice = voting::add_choice(app_state.repo.as_ref(), question_id, &payload.text).await?;

    info!(%question_id, choice_id = %choice.id, "choice added");

    Ok((StatusCode::CREATED, Json(ChoiceWithVotesResponse::from(choice))))
}

/// Delete a question together with its choices
pub async fn delete_question(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
) -> Result<impl IntoResponse, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    voting::delete_question(app_state.repo.as_ref(), question_id).await?;

    info!(%question_id, "question deleted");
    let _ = app_state.events.send(PollEvent::QuestionDeleted(question_id));

    Ok(StatusCode::NO_CONTENT)
}
