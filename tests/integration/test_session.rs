use super::helpers::{FakeAuth, session_for, spawn_thread, user};
use comments::{
    application::{comments::dto::AddCommentRequest, session::store::SessionStore},
    domain::session::identity::{AuthEvent, OAuthProvider},
};
use std::{sync::Arc, sync::atomic::Ordering, time::Duration};

#[tokio::test]
async fn starts_signed_out_and_finishes_loading() {
    let auth = Arc::new(FakeAuth::default());
    let sessions = SessionStore::new(auth.clone());
    assert!(sessions.current().loading);

    let _subscription = sessions.start().await;

    let state = sessions.current();
    assert_eq!(state.identity, None);
    assert!(!state.loading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn existing_session_is_picked_up_on_start() {
    let ada = user("Ada");
    let app = spawn_thread(Some(&ada)).await;
    assert_eq!(app.sessions.identity().map(|u| u.id), Some(ada.id));
}

#[tokio::test]
async fn failed_session_query_still_clears_loading() {
    let auth = Arc::new(FakeAuth::default());
    auth.fail_session.store(true, Ordering::SeqCst);
    let sessions = SessionStore::new(auth.clone());

    let _subscription = sessions.start().await;

    let state = sessions.current();
    assert!(!state.loading);
    assert_eq!(state.identity, None);
    assert_eq!(state.error.as_deref(), Some("connection refused"));
}

#[tokio::test]
async fn sign_in_during_initial_query_is_not_overwritten_by_its_answer() {
    let ada = user("Ada");
    let auth = Arc::new(FakeAuth::default());
    let gate = auth.pause_session_queries();
    let sessions = SessionStore::new(auth.clone());
    let mut watcher = sessions.watch();

    let sign_in_meanwhile = async {
        gate.entered.notified().await;
        auth.sign_in_as(&ada);
        watcher
            .wait_for(|state| state.identity.is_some())
            .await
            .expect("store dropped");
        gate.release.notify_one();
    };
    let (_subscription, ()) = tokio::join!(sessions.start(), sign_in_meanwhile);

    let state = sessions.current();
    assert_eq!(state.identity.map(|u| u.id), Some(ada.id));
    assert!(!state.loading);
}

#[tokio::test]
async fn every_auth_event_overwrites_the_identity() {
    let ada = user("Ada");
    let grace = user("Grace");
    let app = spawn_thread(None).await;

    app.auth.sign_in_as(&ada);
    app.wait_for_identity(Some(ada.id)).await;

    app.auth.sign_in_as(&grace);
    app.wait_for_identity(Some(grace.id)).await;

    app.auth.sign_out_now();
    app.wait_for_identity(None).await;
}

#[tokio::test]
async fn applied_events_are_visible_to_watchers() {
    let ada = user("Ada");
    let app = spawn_thread(None).await;
    let mut watcher = app.sessions.watch();

    app.sessions.apply_event(&AuthEvent::signed_in(session_for(&ada)));

    assert!(watcher.has_changed().expect("store dropped"));
    let seen = watcher.borrow_and_update().identity.clone();
    assert_eq!(seen.map(|u| u.id), Some(ada.id));
}

#[tokio::test]
async fn dropping_the_subscription_stops_updates() {
    let ada = user("Ada");
    let mut app = spawn_thread(None).await;

    drop(app.subscription.take());
    app.auth.sign_in_as(&ada);
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(app.sessions.identity(), None);
}

#[tokio::test]
async fn sign_in_returns_provider_url() {
    let app = spawn_thread(None).await;

    let url = app
        .sessions
        .sign_in(OAuthProvider::Github, Some("https://blog.test/posts/hello-world"))
        .await
        .expect("sign-in url");

    assert!(url.contains("provider=github"));
    assert!(url.contains("redirect_to=https://blog.test/posts/hello-world"));
    assert_eq!(app.sessions.current().error, None);
}

#[tokio::test]
async fn sign_out_clears_identity_and_blocks_commenting() {
    let ada = user("Ada");
    let app = spawn_thread(Some(&ada)).await;

    assert!(app.sessions.sign_out().await);
    assert_eq!(app.sessions.identity(), None);

    let posted = app
        .thread
        .add_comment(AddCommentRequest::top_level("late"))
        .await;
    assert!(!posted);
    assert!(app.tables.rows("comments").is_empty());
}
