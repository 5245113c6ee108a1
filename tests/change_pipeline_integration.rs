//! Entity changes committed through units of work become room events that
//! reach live participants and hot storage, in commit order.

mod common;

use tokio_util::sync::CancellationToken;

use interview_room::domain::events::event_types;
use interview_room::domain::foundation::{QuestionId, UserId};
use interview_room::domain::room::{
    ParticipantType, Room, RoomConfiguration, RoomQuestion, RoomQuestionEvaluation,
    RoomQuestionState, RoomStatus,
};

use common::fixture;

#[tokio::test]
async fn question_switch_fans_out_state_and_editor_events() {
    let f = fixture();
    let room = Room::new("Systems design").with_status(RoomStatus::Active);
    let first = RoomQuestion::new(room.id, QuestionId::new()).with_code_template("// first");
    let second = RoomQuestion::new(room.id, QuestionId::new()).with_code_template("// second");
    f.entities.seed(room.clone()).await;
    f.entities.seed(first.clone()).await;
    f.entities.seed(second.clone()).await;
    let expert = f.join(room.id, UserId::new(), ParticipantType::Expert);

    f.services
        .lifecycle
        .activate_question(room.id, first.id, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        expert.types(),
        vec![
            event_types::CHANGE_ROOM_QUESTION_STATE,
            event_types::CHANGE_CODE_EDITOR,
            event_types::CHANGE_CODE_EDITOR_ENABLED_STATE,
        ]
    );
    assert_eq!(expert.frames()[1]["value"]["content"], "// first");

    f.services
        .lifecycle
        .activate_question(room.id, second.id, None, &CancellationToken::new())
        .await
        .unwrap();

    let first_after: RoomQuestion = f.entities.get(*first.id.as_uuid()).await.unwrap();
    let config: RoomConfiguration = f.entities.get(*room.id.as_uuid()).await.unwrap();
    assert_eq!(first_after.state, RoomQuestionState::Closed);
    assert_eq!(first_after.code_snapshot.as_deref(), Some("// first"));
    assert_eq!(config.active_question_id, Some(second.id));
    assert_eq!(config.code_editor_content.as_deref(), Some("// second"));

    let types = expert.types();
    assert_eq!(
        &types[3..],
        &[
            event_types::CHANGE_ROOM_QUESTION_STATE,
            event_types::CHANGE_ROOM_QUESTION_STATE,
            event_types::CHANGE_CODE_EDITOR,
        ]
    );
}

#[tokio::test]
async fn closing_room_disables_editor_and_records_state() {
    let f = fixture();
    let room = Room::new("Frontend").with_status(RoomStatus::Active);
    let mut config = RoomConfiguration::new(room.id);
    config.code_editor_enabled = true;
    f.entities.seed(room.clone()).await;
    f.entities.seed(config).await;
    let examinee = f.join(room.id, UserId::new(), ParticipantType::Examinee);
    let closer = UserId::new();

    f.services
        .lifecycle
        .close_room(room.id, Some(closer), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        examinee.types(),
        vec![
            event_types::CHANGE_ROOM_STATUS,
            event_types::CHANGE_CODE_EDITOR_ENABLED_STATE,
        ]
    );
    let frames = examinee.frames();
    assert_eq!(frames[0]["value"]["current"], "Close");
    assert_eq!(frames[0]["createdById"], serde_json::json!(closer));
    assert_eq!(frames[1]["value"]["enabled"], false);

    let state = f
        .services
        .live
        .state_reader
        .latest_state(room.id)
        .await
        .unwrap();
    let state_types: Vec<_> = state.iter().map(|e| e.event_type().to_string()).collect();
    assert_eq!(
        state_types,
        vec![
            event_types::CHANGE_ROOM_STATUS,
            event_types::CHANGE_CODE_EDITOR_ENABLED_STATE,
        ]
    );
}

#[tokio::test]
async fn evaluation_change_is_attributed_to_the_evaluator() {
    let f = fixture();
    let room = Room::new("Algorithms").with_status(RoomStatus::Review);
    let question = RoomQuestion::new(room.id, QuestionId::new());
    let evaluator = UserId::new();
    f.entities.seed(room.clone()).await;
    f.entities.seed(question.clone()).await;
    let other_expert = f.join(room.id, UserId::new(), ParticipantType::Expert);

    let mut evaluation = RoomQuestionEvaluation::new(question.id, evaluator);
    evaluation.mark = Some(4);
    evaluation.review = Some("Clear reasoning".to_string());
    let mut uow = f.services.units.begin().with_actor(evaluator);
    uow.add(evaluation);
    let summary = uow.commit().await.unwrap();

    assert_eq!(summary.added, 1);
    assert_eq!(summary.post_commit_failures, 0);
    let frames = other_expert.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], event_types::CHANGE_ROOM_QUESTION_EVALUATION);
    assert_eq!(frames[0]["value"]["mark"], 4);
    assert_eq!(frames[0]["createdById"], serde_json::json!(evaluator));
}

#[tokio::test]
async fn activation_in_closed_room_changes_nothing() {
    let f = fixture();
    let room = Room::new("r").with_status(RoomStatus::Close);
    let question = RoomQuestion::new(room.id, QuestionId::new());
    f.entities.seed(room.clone()).await;
    f.entities.seed(question.clone()).await;
    let viewer = f.join(room.id, UserId::new(), ParticipantType::Viewer);

    let result = f
        .services
        .lifecycle
        .activate_question(room.id, question.id, None, &CancellationToken::new())
        .await;

    assert!(result.is_err());
    let stored: RoomQuestion = f.entities.get(*question.id.as_uuid()).await.unwrap();
    assert_eq!(stored.state, RoomQuestionState::Open);
    assert!(viewer.frames().is_empty());
    assert_eq!(f.hot.len(room.id).await, 0);
}
