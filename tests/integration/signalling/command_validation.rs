use huddle_client_api_proto::{Command, Event};

use super::{TestMember, TestServer};

/// Sends multiple invalid frames and asserts that they were neither relayed
/// nor closed the connection.
#[actix_rt::test]
async fn malformed_frames_are_dropped() {
    let server = TestServer::start();
    let url = server.url("validation");

    let mut a = TestMember::connect(&url, "a", None).await.unwrap();
    let mut b = TestMember::connect(&url, "b", None).await.unwrap();

    a.send_text(r#"{"type":"chat","text":"hi"}"#).await;
    a.send_text(r#"{"type":"offer"}"#).await;
    a.send_text(r#"{"sdp":"X"}"#).await;
    a.send_text("definitely not json").await;
    a.send_binary(b"\x00\x01\x02").await;

    b.expect_silence().await;

    a.send(&Command::Offer {
        sdp: "X".into(),
        to: None,
    })
    .await;
    assert_eq!(
        b.expect_event().await,
        Event::Offer {
            sdp: "X".into(),
            from: "a".into(),
        },
    );
    a.expect_silence().await;
}

#[actix_rt::test]
async fn unknown_fields_are_ignored() {
    let server = TestServer::start();
    let url = server.url("lenient");

    let mut a = TestMember::connect(&url, "a", None).await.unwrap();
    let mut b = TestMember::connect(&url, "b", None).await.unwrap();

    a.send_text(r#"{"type":"answer","sdp":"Y","userId":"forged"}"#)
        .await;

    assert_eq!(
        b.expect_event().await,
        Event::Answer {
            sdp: "Y".into(),
            from: "a".into(),
        },
    );
}

#[actix_rt::test]
async fn fragmented_command_is_reassembled() {
    let server = TestServer::start();
    let url = server.url("fragmented");

    let mut a = TestMember::connect(&url, "a", None).await.unwrap();
    let mut b = TestMember::connect(&url, "b", None).await.unwrap();

    a.send_fragmented(vec![
        r#"{"type":"offer","#.to_owned(),
        r#""sdp":"#.to_owned(),
        r#""X"}"#.to_owned(),
    ])
    .await;

    assert_eq!(
        b.expect_event().await,
        Event::Offer {
            sdp: "X".into(),
            from: "a".into(),
        },
    );
    a.expect_silence().await;
}

#[actix_rt::test]
async fn oversized_fragmented_command_is_dropped() {
    let server = TestServer::start();
    let url = server.url("oversized");

    let mut a = TestMember::connect(&url, "a", None).await.unwrap();
    let mut b = TestMember::connect(&url, "b", None).await.unwrap();

    let filler = "x".repeat(600 * 1024);
    a.send_fragmented(vec![
        format!(r#"{{"type":"offer","sdp":"{}"#, filler),
        filler,
        r#""}"#.to_owned(),
    ])
    .await;

    b.expect_silence().await;

    a.send(&Command::Offer {
        sdp: "Y".into(),
        to: None,
    })
    .await;
    assert_eq!(
        b.expect_event().await,
        Event::Offer {
            sdp: "Y".into(),
            from: "a".into(),
        },
    );
}
