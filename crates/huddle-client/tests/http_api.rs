//! The HTTP client against a real server bound on an ephemeral port.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use huddle_client::events::{self, ChatEvent};
use huddle_client::{AuthContext, ChatApi, ChatConfig, ChatInterface, ClientError, HttpApi};
use huddle_server::{build_router, AppState, ServerConfig};
use huddle_shared::protocol::ScheduleRequest;
use huddle_shared::{MeetingId, User};

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(AppState::new(ServerConfig::default()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn api(base: &str, token: Option<&str>) -> HttpApi {
    HttpApi::new(base, token.map(str::to_string), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_group_and_messages_roundtrip() {
    let base = spawn_server().await;
    let alice = api(&base, Some("alice-token"));
    let bob = api(&base, Some("bob-token"));

    let group = alice.fetch_group().await.unwrap();
    assert_eq!(group.name, "General");
    assert_eq!(group.member_names(), "alice, bob");

    let sent = bob.send_message("hello alice").await.unwrap();
    assert!(sent.proposed_meeting.is_none());
    assert_eq!(sent.message.user, Some(User::new(2, "bob")));

    let messages = alice.fetch_messages().await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].id, sent.message.id);
}

#[tokio::test]
async fn test_meeting_intent_then_schedule_and_availability() {
    let base = spawn_server().await;
    let alice = api(&base, Some("alice-token"));

    let sent = alice.send_message("let's schedule a call tomorrow").await.unwrap();
    let meeting = sent.proposed_meeting.expect("meeting proposal");
    assert_eq!(meeting.description, "let's schedule a call tomorrow");

    let request = ScheduleRequest::new(meeting.id, Utc::now());
    alice.schedule_meeting(&request).await.unwrap();
    alice.update_availability(meeting.id, true).await.unwrap();
}

#[tokio::test]
async fn test_server_errors_carry_message() {
    let base = spawn_server().await;
    let alice = api(&base, Some("alice-token"));

    let err = alice
        .schedule_meeting(&ScheduleRequest::new(MeetingId(404), Utc::now()))
        .await
        .unwrap_err();
    match err {
        ClientError::Server { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Meeting not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let base = spawn_server().await;
    let err = api(&base, None).fetch_group().await.unwrap_err();
    assert!(matches!(err, ClientError::Server { status: 401, .. }));
}

#[tokio::test]
async fn test_chat_interface_against_server() {
    let base = spawn_server().await;
    let (tx, mut rx) = events::channel();
    let chat = ChatInterface::new(
        Arc::new(api(&base, Some("alice-token"))),
        AuthContext::new(Some(User::new(1, "alice"))),
        ChatConfig {
            poll_interval: Duration::from_millis(50),
            ..ChatConfig::default()
        },
        tx,
    );
    chat.mount();

    while chat.group().is_none() {
        rx.recv().await.unwrap();
    }

    let result = chat
        .send_text("can we meet later?")
        .await
        .unwrap()
        .expect("message sent");
    assert!(result.proposed_meeting.is_some());
    assert!(chat.scheduler_view().is_some());

    chat.select_slot_index(0).unwrap();
    assert!(chat.confirm_meeting().await.unwrap());
    assert!(chat.pending_meeting().is_none());

    // The confirmation text arrives through polling.
    loop {
        if let ChatEvent::MessagesUpdated { count } = rx.recv().await.unwrap() {
            if count >= 2 {
                break;
            }
        }
    }
    let messages = chat.messages();
    assert!(messages
        .iter()
        .any(|m| m.content.starts_with("Meeting scheduled at ")));

    chat.unmount();
}
