//! Integration tests for the WebSocket edit/update flow.

mod common;

use aukpad::cache::{Cache, MemoryCache};
use aukpad::config::Config;
use common::{TestServer, eventually};
use std::sync::Arc;
use std::time::Duration;

const QUIET: Duration = Duration::from_millis(200);

#[tokio::test]
async fn new_room_starts_empty() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (_client, text, ver) = server.join("fresh").await.expect("Failed to join");
    assert_eq!(text, "");
    assert_eq!(ver, 0);
}

#[tokio::test]
async fn edit_reaches_other_sessions_but_not_sender() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (mut alice, _, _) = server.join("room").await.expect("alice join");
    let (mut bob, _, _) = server.join("room").await.expect("bob join");

    alice.edit("hello\nworld").await.expect("send edit");

    let update = bob.recv().await.expect("bob update");
    assert_eq!(update["type"], "update");
    assert_eq!(update["text"], "hello\nworld");
    assert_eq!(update["ver"], 1);
    assert_eq!(update["clientId"], alice.client_id());

    assert!(alice.is_quiet(QUIET).await, "sender must not receive its own update");
}

#[tokio::test]
async fn versions_increase_without_gaps() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (mut writer, _, _) = server.join("seq").await.expect("writer join");
    let (mut reader, _, _) = server.join("seq").await.expect("reader join");

    for i in 1..=5 {
        writer.edit(&format!("rev {i}")).await.expect("send edit");
    }
    for i in 1..=5u64 {
        let update = reader.recv().await.expect("update");
        assert_eq!(update["ver"], i);
        assert_eq!(update["text"], format!("rev {i}"));
    }

    let (_late, text, ver) = server.join("seq").await.expect("late join");
    assert_eq!(text, "rev 5");
    assert_eq!(ver, 5);
}

#[tokio::test]
async fn raw_endpoint_reflects_edits() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (mut client, _, _) = server.join("rawr").await.expect("join");
    let body = "línea uno\nzwei 🦀\n";
    client.edit(body).await.expect("send edit");

    let url = server.url("/rawr/raw");
    let seen = eventually(|| {
        let url = url.clone();
        async move {
            match reqwest::get(&url).await {
                Ok(resp) => resp.text().await.map(|t| t == body).unwrap_or(false),
                Err(_) => false,
            }
        }
    })
    .await;
    assert!(seen, "raw text never matched the edit");
}

#[tokio::test]
async fn oversize_edit_is_rejected_for_sender_only() {
    let mut config = Config::default();
    config.limits.max_text_bytes = 8;
    let server = TestServer::spawn_with(config, Cache::disabled())
        .await
        .expect("Failed to spawn test server");
    let (mut alice, _, _) = server.join("tiny").await.expect("alice join");
    let (mut bob, _, _) = server.join("tiny").await.expect("bob join");

    alice.edit("123456789").await.expect("send oversize edit");
    let error = alice.recv().await.expect("error frame");
    assert_eq!(error["type"], "error");
    assert_eq!(error["message"], "Text too large. Max size: 8 bytes");
    assert!(bob.is_quiet(QUIET).await, "rejected edit must not be broadcast");

    // The session stays usable and no version was consumed.
    alice.edit("ok").await.expect("send edit");
    let update = bob.recv().await.expect("bob update");
    assert_eq!(update["ver"], 1);
    assert_eq!(update["text"], "ok");
}

#[tokio::test]
async fn other_message_types_are_ignored() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (mut alice, _, _) = server.join("noop").await.expect("alice join");
    let (mut bob, _, _) = server.join("noop").await.expect("bob join");

    alice
        .send_raw(tokio_tungstenite::tungstenite::Message::Text(
            r#"{"type":"cursor","pos":3}"#.into(),
        ))
        .await
        .expect("send");
    assert!(bob.is_quiet(QUIET).await);

    alice.edit("still here").await.expect("send edit");
    let update = bob.recv().await.expect("bob update");
    assert_eq!(update["ver"], 1);
}

#[tokio::test]
async fn non_string_client_id_is_echoed() {
    let server = TestServer::spawn().await.expect("Failed to spawn test server");
    let (mut alice, _, _) = server.join("opaque").await.expect("alice join");
    let (mut bob, _, _) = server.join("opaque").await.expect("bob join");

    alice
        .send_raw(tokio_tungstenite::tungstenite::Message::Text(
            r#"{"type":"edit","ver":0,"text":"hi","clientId":12345}"#.into(),
        ))
        .await
        .expect("send");
    let update = bob.recv().await.expect("bob update");
    assert_eq!(update["text"], "hi");
    assert_eq!(update["ver"], 1);
    assert_eq!(update["clientId"], 12345);

    // The sender's session is still open.
    alice.edit("again").await.expect("send edit");
    let update = bob.recv().await.expect("bob update");
    assert_eq!(update["ver"], 2);
    assert_eq!(update["clientId"], alice.client_id());
}

#[tokio::test]
async fn rooms_survive_restart_through_cache() {
    let cache = Cache::new(Arc::new(MemoryCache::new(Duration::from_secs(3600))));

    {
        let first = TestServer::spawn_with(Config::default(), cache.clone())
            .await
            .expect("Failed to spawn first server");
        let (mut writer, _, _) = first.join("keep").await.expect("writer join");
        let (mut reader, _, _) = first.join("keep").await.expect("reader join");
        writer.edit("persisted").await.expect("send edit");
        writer.edit("persisted twice").await.expect("send edit");
        reader.recv().await.expect("first update");
        reader.recv().await.expect("second update");
    }

    let second = TestServer::spawn_with(Config::default(), cache)
        .await
        .expect("Failed to spawn second server");
    let (_client, text, ver) = second.join("keep").await.expect("join after restart");
    assert_eq!(text, "persisted twice");
    assert_eq!(ver, 2);
}
