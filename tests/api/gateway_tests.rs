//! End-to-end WebSocket gateway tests against in-memory stores.

use futures::SinkExt;
use serde_json::json;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::common::{
    connect, expect_silence, next_event, next_frame, send_json, InMemoryChats, TestApp,
};

fn two_person_chat() -> InMemoryChats {
    InMemoryChats::new()
        .with_participant("c1", 1)
        .with_participant("c1", 2)
}

#[tokio::test]
async fn test_upgrade_without_token_is_rejected() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;

    let result = tokio_tungstenite::connect_async(format!("ws://{}/gateway", addr)).await;

    match result {
        Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
        other => panic!("expected 401, got {:?}", other.map(|(_, r)| r.status())),
    }
    assert_eq!(app.state.gateway.online_count(), 0);
}

#[tokio::test]
async fn test_message_reaches_both_participants_once() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;
    let mut alice = connect(addr, 1).await;
    let mut bob = connect(addr, 2).await;
    app.wait_for_online(2).await;

    send_json(
        &mut alice,
        json!({"type": "chat_message", "chat_id": "c1", "message_id": "m1", "content": "hi"}),
    )
    .await;

    for socket in [&mut alice, &mut bob] {
        let event = next_event(socket).await;
        assert_eq!(event["type"], "chat_message");
        assert_eq!(event["chat_id"], "c1");
        assert_eq!(event["message_id"], "m1");
        assert_eq!(event["sender_id"], 1);
        assert_eq!(event["content"], "hi");
        assert!(event["sent_at"].is_string());
    }

    // Resubmission is stored once and not re-broadcast
    send_json(
        &mut alice,
        json!({"type": "chat_message", "chat_id": "c1", "message_id": "m1", "content": "hi"}),
    )
    .await;
    send_json(
        &mut alice,
        json!({"type": "read_receipt", "chat_id": "c1", "message_id": "m1"}),
    )
    .await;

    let event = next_event(&mut bob).await;
    assert_eq!(event["type"], "read_receipt");
    assert_eq!(event["user_id"], 1);
    expect_silence(&mut alice).await;

    assert_eq!(app.chats.message_count(), 1);
    assert_eq!(app.chats.receipt("c1", 1).as_deref(), Some("m1"));
}

#[tokio::test]
async fn test_typing_is_stored_and_excludes_typist() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;
    let mut alice = connect(addr, 1).await;
    let mut bob = connect(addr, 2).await;
    app.wait_for_online(2).await;

    send_json(
        &mut alice,
        json!({"type": "typing", "chat_id": "c1", "is_typing": true}),
    )
    .await;

    let event = next_event(&mut bob).await;
    assert_eq!(event["type"], "typing");
    assert_eq!(event["is_typing"], true);
    assert!(app.typing.is_typing("c1", 1));
    expect_silence(&mut alice).await;

    send_json(
        &mut alice,
        json!({"type": "typing", "chat_id": "c1", "is_typing": false}),
    )
    .await;
    assert_eq!(next_event(&mut bob).await["is_typing"], false);
    assert!(!app.typing.is_typing("c1", 1));
}

#[tokio::test]
async fn test_leave_then_join_round_trip() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;
    let mut alice = connect(addr, 1).await;
    let mut bob = connect(addr, 2).await;
    app.wait_for_online(2).await;

    send_json(&mut alice, json!({"type": "leave_chat", "chat_id": "c1"})).await;
    assert_eq!(next_event(&mut alice).await["type"], "leave_chat");
    assert_eq!(next_event(&mut bob).await["type"], "leave_chat");

    // No longer joined locally, so messages are dropped
    send_json(
        &mut alice,
        json!({"type": "chat_message", "chat_id": "c1", "message_id": "m1", "content": "x"}),
    )
    .await;

    send_json(&mut alice, json!({"type": "join_chat", "chat_id": "c1"})).await;

    let ack = next_event(&mut alice).await;
    assert_eq!(ack["type"], "join_chat");
    assert_eq!(ack["user_id"], 1);
    assert_eq!(next_event(&mut bob).await["type"], "join_chat");
    expect_silence(&mut alice).await;

    assert_eq!(app.chats.message_count(), 0);
}

#[tokio::test]
async fn test_garbage_and_binary_frames_keep_connection_open() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;
    let mut alice = connect(addr, 1).await;
    app.wait_for_online(1).await;

    alice.send(Message::text("{not json")).await.unwrap();
    alice
        .send(Message::text(r#"{"type":"presence","chat_id":"c1"}"#))
        .await
        .unwrap();
    alice
        .send(Message::binary(vec![0u8, 1, 2]))
        .await
        .unwrap();
    send_json(&mut alice, json!({"type": "typing", "is_typing": true})).await;

    send_json(
        &mut alice,
        json!({"type": "chat_message", "chat_id": "c1", "message_id": "m9", "content": "still here"}),
    )
    .await;

    let event = next_event(&mut alice).await;
    assert_eq!(event["message_id"], "m9");
    assert_eq!(app.state.gateway.online_count(), 1);
}

#[tokio::test]
async fn test_reconnect_supersedes_previous_connection() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;

    let mut first = connect(addr, 1).await;
    app.wait_for_online(1).await;
    let mut second = connect(addr, 1).await;

    match next_frame(&mut first).await {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), 4000),
        other => panic!("expected close frame, got {:?}", other),
    }

    // The old connection's teardown must not evict the new one
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert_eq!(app.state.gateway.online_count(), 1);

    let mut bob = connect(addr, 2).await;
    app.wait_for_online(2).await;
    send_json(
        &mut bob,
        json!({"type": "chat_message", "chat_id": "c1", "message_id": "m1", "content": "ping"}),
    )
    .await;

    assert_eq!(next_event(&mut second).await["content"], "ping");
}

#[tokio::test]
async fn test_disconnect_removes_user_from_registry() {
    let app = TestApp::new(two_person_chat());
    let addr = app.spawn().await;
    let mut alice = connect(addr, 1).await;
    app.wait_for_online(1).await;

    alice.close(None).await.unwrap();

    app.wait_for_online(0).await;
}
