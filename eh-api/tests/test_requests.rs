//! Integration tests for request construction.
//!
//! Tests bearer authentication, token replacement, URL resolution, JSON and
//! raw body encoding, query arguments, success body parsing, and the
//! domain endpoints against a mock server.

mod common;

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eh_api::{BodyEncoding, Payload, RequestOptions};

// ---- Authentication ----

#[tokio::test]
async fn sends_bearer_token_and_json_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/current"))
        .and(header("authorization", "Bearer abc123"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("abc123"));
    let user = client.user().await.unwrap();
    assert_eq!(user, Some(json!({"id": 7})));
}

#[tokio::test]
async fn omits_authorization_without_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = common::client_for(&server, None);
    client.devices().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(common::header_value(&requests[0], "authorization").is_none());
}

#[tokio::test]
async fn set_auth_changes_header_of_next_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("first"));
    client.devices().await.unwrap();
    client.set_auth(Some("second".into())).await;
    client.devices().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let tokens: Vec<_> = requests
        .iter()
        .map(|r| common::header_value(r, "authorization"))
        .collect();
    assert_eq!(
        tokens,
        vec![Some("Bearer first".to_string()), Some("Bearer second".to_string())]
    );
}

#[tokio::test]
async fn in_flight_call_keeps_its_token_across_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(503).set_delay(Duration::from_millis(300)))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("first"));
    let in_flight = tokio::spawn({
        let client = client.clone();
        async move { client.devices().await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    client.set_auth(Some("second".into())).await;
    in_flight.await.unwrap().unwrap();
    client.devices().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let tokens: Vec<_> = requests
        .iter()
        .filter_map(|r| common::header_value(r, "authorization"))
        .collect();
    assert_eq!(tokens, vec!["Bearer first", "Bearer first", "Bearer second"]);
}

// ---- URL resolution ----

#[tokio::test]
async fn relative_url_is_joined_to_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rooms/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
        .expect(2)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    client.get("rooms/1", RequestOptions::new()).await.unwrap();
    client.get("/rooms/1", RequestOptions::new()).await.unwrap();
}

#[tokio::test]
async fn absolute_url_is_not_modified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_with_base(&common::unused_local_url(), Some("t"));
    let url = format!("{}/elsewhere", server.uri());
    let result = client.get(&url, RequestOptions::new()).await.unwrap();
    assert_eq!(result, Some(json!({"ok": true})));
}

// ---- Body encoding ----

#[tokio::test]
async fn post_serializes_json_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices/4/action"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"action": "on", "level": 80})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"queued": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let result = client
        .post(
            "devices/4/action",
            Some(Payload::from(json!({"action": "on", "level": 80}))),
            RequestOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"queued": true})));
}

#[tokio::test]
async fn raw_encoding_sends_payload_unmodified() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/devices/4/state"))
        .and(header("content-type", "text/plain"))
        .and(body_string("on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    client
        .put(
            "devices/4/state",
            Some(Payload::from("on")),
            RequestOptions::new().raw("text/plain"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn raw_encoding_form_encodes_json_objects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/devices/4/action"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("state=on"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let result = client
        .post(
            "devices/4/action",
            Some(json!({"state": "on"}).into()),
            RequestOptions::new().raw("application/x-www-form-urlencoded"),
        )
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"ok": true})));
}

#[tokio::test]
async fn content_type_argument_is_stripped_from_query() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/devices/4/state"))
        .and(query_param("state", "1"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("state=on"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let options = RequestOptions::new().with_args([
        ("content_type", "application/x-www-form-urlencoded"),
        ("state", "1"),
    ]);
    assert_eq!(
        options.encoding,
        BodyEncoding::Raw("application/x-www-form-urlencoded".into())
    );
    client
        .put("devices/4/state", Some(Payload::from("state=on")), options)
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query_pairs().all(|(k, _)| k != "content_type"));
}

#[tokio::test]
async fn empty_payload_sends_no_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/devices/4"))
        .respond_with(ResponseTemplate::new(204))
        .expect(3)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    client
        .delete("devices/4", Some(Payload::from(json!({}))), RequestOptions::new())
        .await
        .unwrap();
    client
        .delete("devices/4", Some(Payload::from(json!(false))), RequestOptions::new())
        .await
        .unwrap();
    client
        .delete("devices/4", None, RequestOptions::new())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.body.is_empty()));
}

#[tokio::test]
async fn query_arguments_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(query_param("room", "kitchen"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let options = RequestOptions::new()
        .query("room", "kitchen")
        .with_args([("limit", "5")]);
    client.get("devices", options).await.unwrap();
}

// ---- Success bodies ----

#[tokio::test]
async fn non_json_success_body_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    assert_eq!(client.user().await.unwrap(), None);
}

#[tokio::test]
async fn no_content_yields_none() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let result = client
        .delete("devices/1", None, RequestOptions::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn get_json_deserializes_body() {
    #[derive(Debug, Deserialize)]
    struct Room {
        id: u32,
        name: String,
    }

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rooms"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 1, "name": "Kitchen"}, {"id": 2, "name": "Hall"}])),
        )
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let rooms: Vec<Room> = client
        .get_json("rooms", RequestOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(rooms.len(), 2);
    assert_eq!(rooms[1].id, 2);
    assert_eq!(rooms[0].name, "Kitchen");
}

// ---- Endpoints ----

#[tokio::test]
async fn self_test_queries_devices() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .and(header("authorization", "Bearer 123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("123"));
    client.self_test().await.unwrap();
}

#[tokio::test]
async fn concurrent_calls_share_one_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(8)
        .mount(&server)
        .await;

    let client = common::client_for(&server, Some("t"));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.devices().await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), Some(json!([])));
    }
}
