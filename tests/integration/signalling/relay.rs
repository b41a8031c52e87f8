use huddle_client_api_proto::{Command, Event};
use serde_json::json;

use super::{TestMember, TestServer};

async fn three_members(
    server: &TestServer,
    meeting: &str,
) -> (TestMember, TestMember, TestMember) {
    let url = server.url(meeting);
    (
        TestMember::connect(&url, "a", None).await.unwrap(),
        TestMember::connect(&url, "b", None).await.unwrap(),
        TestMember::connect(&url, "c", None).await.unwrap(),
    )
}

#[actix_rt::test]
async fn offer_reaches_everyone_but_sender() {
    let server = TestServer::start();
    let (mut a, mut b, mut c) = three_members(&server, "offer").await;

    a.send(&Command::Offer {
        sdp: "X".into(),
        to: None,
    })
    .await;

    let expected = Event::Offer {
        sdp: "X".into(),
        from: "a".into(),
    };
    assert_eq!(b.expect_event().await, expected);
    assert_eq!(c.expect_event().await, expected);
    a.expect_silence().await;
}

#[actix_rt::test]
async fn answer_and_candidates_keep_order() {
    let server = TestServer::start();
    let (mut a, mut b, _c) = three_members(&server, "order").await;

    b.send(&Command::Answer {
        sdp: "Y".into(),
        to: Some("a".into()),
    })
    .await;
    for i in 0..5 {
        b.send(&Command::IceCandidate {
            candidate: json!({"candidate": format!("candidate:{}", i)}),
            to: Some("a".into()),
        })
        .await;
    }

    assert_eq!(
        a.expect_event().await,
        Event::Answer {
            sdp: "Y".into(),
            from: "b".into(),
        },
    );
    for i in 0..5 {
        assert_eq!(
            a.expect_event().await,
            Event::IceCandidate {
                candidate: json!({"candidate": format!("candidate:{}", i)}),
                from: "b".into(),
            },
        );
    }
    b.expect_silence().await;
}

#[actix_rt::test]
async fn addressed_offer_reaches_target_only() {
    let server = TestServer::start();
    let (mut a, mut b, mut c) = three_members(&server, "direct").await;

    a.send_text(r#"{"type":"offer","sdp":"X","to":"c"}"#).await;

    assert_eq!(
        c.expect_event().await,
        Event::Offer {
            sdp: "X".into(),
            from: "a".into(),
        },
    );
    a.expect_silence().await;
    b.expect_silence().await;
}

#[actix_rt::test]
async fn rooms_are_isolated() {
    let server = TestServer::start();
    let mut a = TestMember::connect(&server.url("one"), "a", None)
        .await
        .unwrap();
    let mut b = TestMember::connect(&server.url("two"), "b", None)
        .await
        .unwrap();

    a.send(&Command::Join).await;
    a.send(&Command::Offer {
        sdp: "X".into(),
        to: None,
    })
    .await;

    b.expect_silence().await;
}
