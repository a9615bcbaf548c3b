use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct VoteCast {
    pub question_id: Uuid,
    pub choice_id: Uuid,
    pub new_vote_count: i32,
}

#[derive(Debug, Clone)]
pub enum PollEvent {
    VoteCast(VoteCast),
    QuestionDeleted(Uuid),
}

pub type EventSender = tokio::sync::broadcast::Sender<PollEvent>;

pub fn create_event_broadcaster() -> EventSender {
    let (tx, _rx) = tokio::sync::broadcast::channel(100);
    tx
}
