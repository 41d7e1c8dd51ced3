use crate::common::Harness;
use feed_client::application::services::post_service::{LikeApi, PostServiceImpl};
use feed_client::presentation::like_toggle::{
    LikeToggle, ReconciledState, ToggleSnapshot, LIKED_MESSAGE, POLICY_REJECTED_MESSAGE,
    TRANSIENT_FAILURE_MESSAGE, UNAUTHENTICATED_MESSAGE,
};
use feed_client::presentation::navigation::Route;
use feed_client::presentation::notification::{
    ChannelNotifier, Notification, NotificationKind,
};
use feed_client::transport::model::OutcomeClass;
use feed_client::utils::logger::setup_logger;
use mockito::Server;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

fn create_toggle(
    harness: &Harness,
    initial: ToggleSnapshot,
) -> (LikeToggle, UnboundedReceiver<Notification>) {
    let likes: Arc<dyn LikeApi> = Arc::new(PostServiceImpl::new(
        harness.config.clone(),
        harness.transport.clone(),
    ));
    let (notifier, toasts) = ChannelNotifier::channel();
    (
        LikeToggle::new(42, initial, likes, Arc::new(notifier)),
        toasts,
    )
}

#[tokio::test]
async fn test_like_commits_to_server_state() {
    setup_logger();
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/posts/42/like")
        .match_header("authorization", "Bearer a1")
        .with_status(200)
        .with_body(r#"{"state": "liked"}"#)
        .expect(1)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    let (toggle, mut toasts) = create_toggle(&harness, ToggleSnapshot::new(false, 5));
    let outcome = toggle.toggle().await;

    assert_eq!(outcome, ReconciledState::Committed(ToggleSnapshot::new(true, 6)));
    assert_eq!(toasts.try_recv().unwrap(), Notification::success(LIKED_MESSAGE));
    assert!(toasts.try_recv().is_err());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_self_like_rolls_back() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/posts/42/like")
        .with_status(400)
        .with_body(r#"{"detail": "You cannot like your own post"}"#)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    let (toggle, mut toasts) = create_toggle(&harness, ToggleSnapshot::new(false, 5));

    assert_eq!(
        toggle.toggle().await,
        ReconciledState::RolledBack {
            snapshot: ToggleSnapshot::new(false, 5),
            class: OutcomeClass::RejectedByPolicy,
        }
    );
    let toast = toasts.try_recv().unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message, POLICY_REJECTED_MESSAGE);
}

#[tokio::test]
async fn test_expired_session_is_renewed_transparently() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _stale = server
        .mock("POST", "/posts/42/like")
        .match_header("authorization", "Bearer stale")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"access_token": "fresh"}"#)
        .expect(1)
        .create_async()
        .await;
    let _fresh = server
        .mock("POST", "/posts/42/like")
        .match_header("authorization", "Bearer fresh")
        .with_status(200)
        .with_body(r#"{"status": "unliked"}"#)
        .expect(1)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let (toggle, mut toasts) = create_toggle(&harness, ToggleSnapshot::new(true, 3));

    assert_eq!(
        toggle.toggle().await,
        ReconciledState::Committed(ToggleSnapshot::new(false, 2))
    );
    assert!(toasts.try_recv().is_err());
    assert!(harness.routes.try_recv().is_err());
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_dead_session_asks_for_login() {
    setup_logger();
    let mut server = Server::new_async().await;
    let like = server
        .mock("POST", "/posts/42/like")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let _refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(401)
        .create_async()
        .await;

    let mut harness = Harness::new(&server.url(), Some("stale"));
    let (toggle, mut toasts) = create_toggle(&harness, ToggleSnapshot::new(false, 5));
    let outcome = toggle.toggle().await;

    assert_eq!(outcome.snapshot(), ToggleSnapshot::new(false, 5));
    assert_eq!(
        toasts.try_recv().unwrap(),
        Notification::error(UNAUTHENTICATED_MESSAGE)
    );
    assert_eq!(harness.routes.try_recv().unwrap(), Route::Login);
    assert_eq!(harness.current_token(), None);
    like.assert_async().await;
}

#[tokio::test]
async fn test_repeated_failures_end_where_they_started() {
    setup_logger();
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("POST", "/posts/42/like")
        .with_status(500)
        .expect(4)
        .create_async()
        .await;

    let harness = Harness::new(&server.url(), Some("a1"));
    let initial = ToggleSnapshot::new(true, 1);
    let (toggle, mut toasts) = create_toggle(&harness, initial);
    let mut visible = toggle.subscribe();

    for _ in 0..4 {
        let outcome = toggle.toggle().await;
        assert_eq!(outcome.snapshot(), initial);
        assert_eq!(
            toasts.try_recv().unwrap(),
            Notification::error(TRANSIENT_FAILURE_MESSAGE)
        );
    }
    assert_eq!(*visible.borrow_and_update(), initial);
}
