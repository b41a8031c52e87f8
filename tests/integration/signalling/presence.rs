use std::time::Duration;

use huddle::api::control::MeetingRepository;
use huddle_client_api_proto::{Command, Event};

use super::{test_conf, TestMember, TestServer};

#[actix_rt::test]
async fn announces_arrival_and_departure() {
    let server = TestServer::start();
    let url = server.url("presence");

    let mut bob = TestMember::connect(&url, "bob", Some("Bob")).await.unwrap();
    let mut alice =
        TestMember::connect(&url, "alice", Some("Alice")).await.unwrap();

    alice.send(&Command::Join).await;
    assert_eq!(
        bob.expect_event().await,
        Event::UserJoined {
            user_id: "alice".into(),
            user_name: "Alice".into(),
        },
    );
    alice.expect_silence().await;

    alice.close().await;
    assert_eq!(
        bob.expect_event().await,
        Event::UserLeft {
            user_id: "alice".into(),
            user_name: "Alice".into(),
        },
    );
}

#[actix_rt::test]
async fn connecting_alone_announces_nothing() {
    let server = TestServer::start();
    let url = server.url("quiet");

    let mut bob = TestMember::connect(&url, "bob", None).await.unwrap();
    let _alice = TestMember::connect(&url, "alice", None).await.unwrap();

    bob.expect_silence().await;
}

#[actix_rt::test]
async fn departure_is_announced_without_prior_join() {
    let server = TestServer::start();
    let url = server.url("silent-leaver");

    let mut bob = TestMember::connect(&url, "bob", None).await.unwrap();
    let alice = TestMember::connect(&url, "alice", None).await.unwrap();

    drop(alice);
    assert_eq!(
        bob.expect_event().await,
        Event::UserLeft {
            user_id: "alice".into(),
            user_name: "alice".into(),
        },
    );
}

#[actix_rt::test]
async fn room_disappears_when_last_member_leaves() {
    let server = TestServer::start();
    let url = server.url("42");

    let alice = TestMember::connect(&url, "alice", None).await.unwrap();
    assert!(server.rooms.contains(&"meeting_42".into()));

    alice.close().await;
    assert!(server.wait_room_gone("42").await);

    let _bob = TestMember::connect(&url, "bob", None).await.unwrap();
    assert!(server.rooms.contains(&"meeting_42".into()));
}

#[actix_rt::test]
async fn reconnect_replaces_previous_connection() {
    let server = TestServer::start();
    let url = server.url("flaky");

    let mut bob = TestMember::connect(&url, "bob", None).await.unwrap();
    let mut old = TestMember::connect(&url, "alice", None).await.unwrap();
    let mut new = TestMember::connect(&url, "alice", None).await.unwrap();

    assert_eq!(old.expect_close().await, awc::ws::CloseCode::Normal);
    bob.expect_silence().await;

    new.send(&Command::Join).await;
    let event = bob.expect_event().await;
    assert!(crate::enum_eq!(Event::UserJoined, event));
}

#[actix_rt::test]
async fn idle_connection_is_closed_and_announced() {
    let mut conf = test_conf();
    conf.rpc.idle_timeout = Duration::from_secs(1);
    conf.rpc.ping_interval = Duration::from_millis(200);
    let server = TestServer::start_with(conf, MeetingRepository::new(true));
    let url = server.url("heartbeat");

    let mut bob = TestMember::connect(&url, "bob", None).await.unwrap();
    let mut alice = TestMember::connect(&url, "alice", None).await.unwrap();

    // Bob answers pings while waiting, Alice doesn't read anything.
    assert_eq!(
        bob.expect_event().await,
        Event::UserLeft {
            user_id: "alice".into(),
            user_name: "alice".into(),
        },
    );
    assert_eq!(alice.expect_close().await, awc::ws::CloseCode::Away);
}
