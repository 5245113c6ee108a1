//! Live delivery: fan-out isolation, per-room ordering under concurrency,
//! targeted signals and inbound message handling.

mod common;

use std::sync::Arc;

use chrono::Duration;
use serde_json::json;

use interview_room::application::live::{DispatchOutcome, InboundMessage, LiveSession};
use interview_room::domain::events::{event_types, RoomEvent};
use interview_room::domain::foundation::{ConnectionId, RoomId, Timestamp, UserId};
use interview_room::domain::room::{ParticipantType, RoomConfiguration};
use interview_room::ports::{
    ConnectionRegistry, RoomEventSink, TransportConnection, TransportError,
};

use common::{fixture, TestConnection};

fn session(room_id: RoomId, user_id: UserId, participant_type: ParticipantType) -> LiveSession {
    LiveSession {
        room_id,
        user_id,
        participant_type,
        connection_id: ConnectionId::new(),
    }
}

#[tokio::test]
async fn one_failing_connection_does_not_affect_the_others() {
    let f = fixture();
    let room = RoomId::new();
    let healthy: Vec<_> = (0..4)
        .map(|_| f.join(room, UserId::new(), ParticipantType::Viewer))
        .collect();
    let broken = TestConnection::broken(TransportError::Backpressure);
    f.services
        .registry
        .register(room, UserId::new(), ParticipantType::Expert, broken.clone());

    f.services
        .dispatcher
        .publish(RoomEvent::new(room, event_types::REACTION, json!({"reaction": "like"}), false))
        .await;

    for connection in &healthy {
        assert_eq!(connection.types(), vec![event_types::REACTION]);
    }
    assert!(broken.frames().is_empty());
    assert_eq!(f.services.registry.connection_count(room), 5);
}

#[tokio::test]
async fn concurrent_publishers_produce_one_order_for_everyone() {
    let f = fixture();
    let room = RoomId::new();
    let a = f.join(room, UserId::new(), ParticipantType::Expert);
    let b = f.join(room, UserId::new(), ParticipantType::Examinee);
    let dispatcher = f.services.dispatcher.clone();

    let tasks: Vec<_> = (0..8)
        .map(|producer| {
            let dispatcher = Arc::clone(&dispatcher);
            tokio::spawn(async move {
                for i in 0..10 {
                    let event = RoomEvent::new(
                        room,
                        event_types::CHAT_MESSAGE,
                        json!({ "message": format!("{}-{}", producer, i) }),
                        false,
                    );
                    dispatcher.publish(event).await;
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let ids = |c: &TestConnection| -> Vec<String> {
        c.frames()
            .iter()
            .map(|f| f["id"].as_str().unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(ids(&a).len(), 80);
    assert_eq!(ids(&a), ids(&b));

    // Each producer's own messages keep their relative order.
    for producer in 0..8 {
        let prefix = format!("{}-", producer);
        let own: Vec<String> = a
            .frames()
            .iter()
            .filter_map(|f| f["value"]["message"].as_str().map(str::to_string))
            .filter(|m| m.starts_with(&prefix))
            .collect();
        let expected: Vec<String> = (0..10).map(|i| format!("{}{}", prefix, i)).collect();
        assert_eq!(own, expected);
    }
}

#[tokio::test]
async fn late_joiner_sees_latest_stateful_events() {
    let f = fixture();
    let room = RoomId::new();
    let base = Timestamp::now().minus(Duration::minutes(5));
    for (offset, content) in ["a", "ab", "abc"].into_iter().enumerate() {
        let event = RoomEvent::new(
            room,
            event_types::CHANGE_CODE_EDITOR,
            json!({ "content": content }),
            true,
        )
        .with_created_at(base.plus(Duration::seconds(offset as i64)));
        f.services.dispatcher.publish(event).await;
    }
    f.services
        .dispatcher
        .publish(RoomEvent::new(room, event_types::CHAT_MESSAGE, json!({"message": "hi"}), false))
        .await;

    let state = f
        .services
        .live
        .state_reader
        .latest_state(room)
        .await
        .unwrap();

    assert_eq!(state.len(), 1);
    assert_eq!(state[0].payload()["content"], "abc");
}

#[tokio::test]
async fn chat_message_reaches_whole_room() {
    let f = fixture();
    let room = RoomId::new();
    let author = UserId::new();
    let author_conn = f.join(room, author, ParticipantType::Examinee);
    let expert_conn = f.join(room, UserId::new(), ParticipantType::Expert);

    let outcome = f
        .services
        .live
        .dispatcher
        .dispatch(
            &session(room, author, ParticipantType::Examinee),
            InboundMessage::new("chat-message", json!("hello")),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Handled);
    for connection in [&author_conn, &expert_conn] {
        let frames = connection.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], event_types::CHAT_MESSAGE);
        assert_eq!(frames[0]["value"]["message"], "hello");
        assert_eq!(frames[0]["createdById"], json!(author));
    }
    assert_eq!(f.hot.len(room).await, 1);
}

#[tokio::test]
async fn video_signal_reaches_only_its_target() {
    let f = fixture();
    let room = RoomId::new();
    let sender = UserId::new();
    let target = UserId::new();
    let sender_conn = f.join(room, sender, ParticipantType::Expert);
    let target_tab_one = f.join(room, target, ParticipantType::Examinee);
    let target_tab_two = f.join(room, target, ParticipantType::Examinee);
    let bystander = f.join(room, UserId::new(), ParticipantType::Viewer);

    f.services
        .live
        .dispatcher
        .dispatch(
            &session(room, sender, ParticipantType::Expert),
            InboundMessage::new(
                "sending-signal",
                json!({ "to": target, "signal": { "sdp": "offer" } }),
            ),
        )
        .await
        .unwrap();

    for connection in [&target_tab_one, &target_tab_two] {
        let frames = connection.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], event_types::SENDING_SIGNAL);
        assert_eq!(frames[0]["value"]["from"], json!(sender));
        assert_eq!(frames[0]["value"]["signal"]["sdp"], "offer");
    }
    assert!(sender_conn.frames().is_empty());
    assert!(bystander.frames().is_empty());
    assert_eq!(f.hot.len(room).await, 0);
}

#[tokio::test]
async fn code_edit_is_derived_from_configuration_change() {
    let f = fixture();
    let room = RoomId::new();
    let mut config = RoomConfiguration::new(room);
    config.code_editor_enabled = true;
    f.entities.seed(config).await;
    let examinee = UserId::new();
    let expert_conn = f.join(room, UserId::new(), ParticipantType::Expert);

    f.services
        .live
        .dispatcher
        .dispatch(
            &session(room, examinee, ParticipantType::Examinee),
            InboundMessage::new("code", json!("fn main() {}")),
        )
        .await
        .unwrap();

    let frames = expert_conn.frames();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["type"], event_types::CHANGE_CODE_EDITOR);
    assert_eq!(frames[0]["value"]["content"], "fn main() {}");
    assert_eq!(frames[0]["stateful"], true);
    let stored: RoomConfiguration = f.entities.get(*room.as_uuid()).await.unwrap();
    assert_eq!(stored.code_editor_content.as_deref(), Some("fn main() {}"));
}

#[tokio::test]
async fn unknown_message_type_is_ignored() {
    let f = fixture();
    let room = RoomId::new();
    let viewer = f.join(room, UserId::new(), ParticipantType::Viewer);

    let outcome = f
        .services
        .live
        .dispatcher
        .dispatch(
            &session(room, UserId::new(), ParticipantType::Viewer),
            InboundMessage::new("wave", json!(null)),
        )
        .await
        .unwrap();

    assert_eq!(outcome, DispatchOutcome::Ignored);
    assert!(viewer.frames().is_empty());
}

#[tokio::test]
async fn disconnected_participant_stops_receiving() {
    let f = fixture();
    let room = RoomId::new();
    let leaving = TestConnection::healthy();
    f.services
        .registry
        .register(room, UserId::new(), ParticipantType::Viewer, leaving.clone());
    let staying = f.join(room, UserId::new(), ParticipantType::Viewer);

    f.services.registry.unregister(leaving.id());
    f.services
        .dispatcher
        .publish(RoomEvent::new(room, event_types::REACTION, json!("like"), false))
        .await;

    assert!(leaving.frames().is_empty());
    assert_eq!(staying.frames().len(), 1);
}
