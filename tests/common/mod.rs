#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, Response};
use chrono::{TimeDelta, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use polls_backend::db::{Choice, InMemoryPollRepository, PollRepository, Question};
use polls_backend::startup::{AppState, build_router};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// Router over a fresh in-memory repository, with the same layers as `main`.
pub fn build_test_app() -> TestApp {
    let state = AppState::new(Arc::new(InMemoryPollRepository::new()));
    TestApp {
        router: build_router(state.clone()),
        state,
    }
}

impl TestApp {
    pub fn repo(&self) -> &dyn PollRepository {
        self.state.repo.as_ref()
    }

    /// A question published `days` from now (negative for the past).
    pub async fn create_question(&self, text: &str, days: i64) -> Question {
        self.repo()
            .create_question(text, Utc::now() + TimeDelta::days(days))
            .await
            .expect("question should be stored")
    }

    pub async fn add_choice(&self, question: &Question, text: &str) -> Choice {
        self.repo()
            .add_choice(question.id, text)
            .await
            .expect("choice should be stored")
    }

    pub async fn votes(&self, question: &Question) -> Vec<i32> {
        self.repo()
            .get_choices(question.id)
            .await
            .expect("choices should load")
            .into_iter()
            .map(|c| c.votes)
            .collect()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router should not fail")
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post_form(&self, uri: &str, body: &str) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, uri: &str, body: serde_json::Value) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

/// Next server-sent event from a streaming body, or `None` once the stream
/// has ended. Panics if nothing arrives within a second.
pub async fn next_event(body: &mut Body) -> Option<String> {
    let frame = tokio::time::timeout(std::time::Duration::from_secs(1), body.frame())
        .await
        .expect("stream should produce a frame or end")?
        .expect("frame should be readable");
    let data = frame.into_data().expect("frame should carry data");
    Some(String::from_utf8(data.to_vec()).expect("event should be UTF-8"))
}
