use crate::common::{Harness, USER_JSON};
use feed_client::application::models::user::User;
use feed_client::application::services::user_service::{UserService, UserServiceImpl};
use feed_client::constants::CREDENTIAL_STORAGE_KEY;
use feed_client::error::AppError;
use feed_client::presentation::navigation::Route;
use feed_client::storage::local::{FileStorage, KeyValueStorage};
use feed_client::transport::http_client::FeedHttpClient;
use feed_client::transport::model::{OutcomeClass, RequestDescriptor};
use feed_client::utils::logger::setup_logger;
use mockito::{Matcher, Server};
use pretty_assertions::assert_eq;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

#[tokio::test]
async fn test_first_try_success() {
    setup_logger();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer a1")
        .with_status(200)
        .with_body(USER_JSON)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    let user: User = harness
        .transport
        .request::<(), User>(Method::GET, "users/me", None)
        .await
        .unwrap();

    assert_eq!(user.email, "ada@example.com");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_single_401_renews_and_retries_once() {
    setup_logger();
    let mut server = Server::new_async().await;
    let stale = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .with_body(r#"{"detail": "Unauthorized"}"#)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "fresh", "token_type": "bearer"}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(USER_JSON)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let service = UserServiceImpl::new(harness.config.clone(), harness.transport.clone());
    let user = service.current_user().await.unwrap();

    assert_eq!(user.display_name(), "Ada Lovelace");
    assert_eq!(harness.current_token().as_deref(), Some("fresh"));
    assert!(harness.routes.try_recv().is_err());
    stale.assert_async().await;
    refresh.assert_async().await;
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_renewal_rejected_ends_session() {
    setup_logger();
    let mut server = Server::new_async().await;
    let call = server
        .mock("GET", "/users/me")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(401)
        .with_body(r#"{"detail": "Refresh token not found. Please login again."}"#)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let result = harness
        .transport
        .send(RequestDescriptor::get("users/me"))
        .await;

    assert!(matches!(result, Err(AppError::Unauthenticated)));
    assert_eq!(harness.current_token(), None);
    assert_eq!(harness.routes.try_recv().unwrap(), Route::Login);
    call.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_retry_also_401_is_terminal() {
    setup_logger();
    let mut server = Server::new_async().await;
    let call = server
        .mock("GET", "/users/me")
        .with_status(401)
        .expect(2)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "fresh"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let err = harness
        .transport
        .send(RequestDescriptor::get("users/me"))
        .await
        .unwrap_err();

    assert_eq!(err.class(), OutcomeClass::Unauthenticated);
    assert_eq!(harness.current_token(), None);
    assert_eq!(harness.routes.try_recv().unwrap(), Route::Login);
    call.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_401s_share_one_renewal() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _stale = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect_at_most(2)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "fresh"}"#)
        .expect(1)
        .create_async()
        .await;
    let fresh = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(USER_JSON)
        .expect(2)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("stale"));
    let (a, b) = tokio::join!(
        harness.transport.send(RequestDescriptor::get("users/me")),
        harness.transport.send(RequestDescriptor::get("users/me")),
    );

    assert!(a.is_ok() && b.is_ok());
    refresh.assert_async().await;
    fresh.assert_async().await;
}

#[tokio::test]
async fn test_concurrent_401s_on_dead_session_end_it_once() {
    setup_logger();
    let mut server = Server::new_async().await;
    let calls = server
        .mock("GET", "/users/me")
        .with_status(401)
        .expect(3)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let (a, b, c) = tokio::join!(
        harness.transport.send(RequestDescriptor::get("users/me")),
        harness.transport.send(RequestDescriptor::get("users/me")),
        harness.transport.send(RequestDescriptor::get("users/me")),
    );

    for result in [a, b, c] {
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }
    assert_eq!(harness.current_token(), None);
    assert_eq!(harness.routes.try_recv().unwrap(), Route::Login);
    assert!(harness.routes.try_recv().is_err());
    calls.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_policy_rejection_carries_detail() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/posts/7/like")
        .with_status(400)
        .with_body(r#"{"detail": "You cannot like your own post"}"#)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    match harness.transport.send(RequestDescriptor::post("posts/7/like")).await {
        Err(AppError::RejectedByPolicy { status, detail }) => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(detail, "You cannot like your own post");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(harness.current_token().as_deref(), Some("a1"));
}

#[tokio::test]
async fn test_validation_detail_list_is_kept() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/posts/")
        .with_status(400)
        .with_body(r#"{"detail": [{"msg": "field required"}]}"#)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    let err = harness
        .transport
        .send(RequestDescriptor::post("posts/"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("field required"));
}

#[tokio::test]
async fn test_server_error_is_transient_and_not_retried() {
    setup_logger();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/posts/7")
        .with_status(503)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("a1"));
    let err = harness
        .transport
        .send(RequestDescriptor::get("posts/7"))
        .await
        .unwrap_err();

    assert_eq!(err.class(), OutcomeClass::TransientFailure);
    assert!(!err.is_expected());
    assert_eq!(harness.current_token().as_deref(), Some("a1"));
    assert!(harness.routes.try_recv().is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_network_failure_is_transient() {
    setup_logger();
    // nothing listens on port 9
    let harness = Harness::new("http://127.0.0.1:9", Some("a1"));
    let err = harness
        .transport
        .send(RequestDescriptor::get("posts/7"))
        .await
        .unwrap_err();
    assert_eq!(err.class(), OutcomeClass::TransientFailure);
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization() {
    setup_logger();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/posts/")
        .match_query(Matcher::Any)
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"{"total": 0, "posts": []}"#)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), None);
    let response = harness
        .transport
        .send(RequestDescriptor::get("posts/?skip=0&limit=10"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_renewed_credential_survives_restart() {
    setup_logger();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    let mut server = Server::new_async().await;
    let _stale = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "fresh"}"#)
        .create_async()
        .await;
    let _fresh = server
        .mock("GET", "/users/me")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(USER_JSON)
        .create_async()
        .await;

    let storage = Arc::new(FileStorage::new(path.clone()));
    let harness = Harness::with_storage(&server.url(), Some("stale"), storage);
    harness
        .transport
        .send(RequestDescriptor::get("users/me"))
        .await
        .unwrap();

    let reopened = FileStorage::new(path.clone());
    assert_eq!(
        reopened.get(CREDENTIAL_STORAGE_KEY).unwrap().as_deref(),
        Some("fresh")
    );
}
