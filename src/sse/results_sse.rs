use crate::db::PollRepository;
use crate::error::PollError;
use crate::polls::ResultsResponse;
use crate::sse::models::PollEvent;
use crate::startup::AppState;
use crate::voting;
use axum::{
    extract::{Extension, Path},
    response::sse::{Event, KeepAlive, Sse},
};
use chrono::Utc;
use futures::stream::Stream;
use serde_json::json;
use std::{convert::Infallible, time::Duration};
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;
use uuid::Uuid;

/// Current tallies as an event named `name`, or an `error` event when they
/// cannot be loaded.
async fn results_event(
    repo: &dyn PollRepository,
    question_id: Uuid,
    name: &str,
) -> Result<Event, Event> {
    let snapshot = match repo.get_question(question_id).await {
        Ok(Some(question)) => match repo.get_choices(question_id).await {
            Ok(choices) => Ok(ResultsResponse::new(question, choices, Utc::now())),
            Err(_) => Err("Failed to load choices"),
        },
        Ok(None) => Err("Question not found"),
        Err(_) => Err("Database error"),
    };

    match snapshot {
        Ok(results) => Ok(Event::default()
            .event(name)
            .data(json!(results).to_string())),
        Err(message) => Err(Event::default()
            .event("error")
            .data(json!({ "error": message }).to_string())),
    }
}

/// Streams the tallies of one question: an `init` snapshot, then a
/// `vote_update` after each vote on it, until the question is deleted.
/// Unknown questions get a 404 instead of a stream.
pub async fn results_sse(
    Extension(app_state): Extension<AppState>,
    Path(question_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, PollError> {
    let question_id = voting::parse_question_id(&question_id)?;
    let mut rx = app_state.events.subscribe();
    voting::find_question(app_state.repo.as_ref(), question_id).await?;

    let stream = async_stream::stream! {
        match results_event(app_state.repo.as_ref(), question_id, "init").await {
            Ok(event) => yield Ok(event),
            Err(event) => {
                yield Ok(event);
                return;
            }
        }

        loop {
            let refresh = match rx.recv().await {
                Ok(PollEvent::VoteCast(vote)) => vote.question_id == question_id,
                Ok(PollEvent::QuestionDeleted(deleted)) if deleted == question_id => {
                    yield Ok(Event::default()
                        .event("question_deleted")
                        .data(json!({ "question_id": question_id }).to_string()));
                    break;
                }
                Ok(PollEvent::QuestionDeleted(_)) => false,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("results stream for {question_id} lagged by {skipped} events");
                    true
                }
                Err(RecvError::Closed) => break,
            };

            if refresh {
                match results_event(app_state.repo.as_ref(), question_id, "vote_update").await {
                    Ok(event) => yield Ok(event),
                    Err(event) => {
                        yield Ok(event);
                        break;
                    }
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keep-alive"),
    ))
}
