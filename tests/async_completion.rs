//! Completions delivered from tokio tasks instead of the dispatching stack.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use nav_router::updater::TimedUpdater;
use nav_router::{NavUrl, Router};

mod common;

use common::{describe, screen};

fn timed_router(delay: Duration, log: Arc<Mutex<Vec<String>>>) -> Router {
    let updater = TimedUpdater::current(delay)
        .unwrap()
        .inspect(move |update| log.lock().unwrap().push(describe(update)));
    Router::builder()
        .updater(updater)
        .routes(|r| {
            r.route("/home", screen("Home"))
                .route("/home/feed", screen("Feed"))
                .route("/list/:id", screen("List"));
        })
        .unwrap()
        .build()
}

#[tokio::test]
async fn test_queued_transitions_complete_in_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let router = timed_router(Duration::from_millis(10), log.clone());
    let (tx, mut rx) = mpsc::unbounded_channel();

    for url in ["/home/feed", "/list/7", "/list/8"] {
        let tx = tx.clone();
        router
            .transition()
            .to(url)
            .queued()
            .on_complete(move |result| {
                let _ = tx.send(result.map(|report| report.to.to_string()));
            })
            .start();
    }
    drop(tx);
    assert!(router.is_transitioning());
    assert_eq!(router.queued(), 2);

    let mut completed = Vec::new();
    while let Some(result) = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("transitions timed out")
    {
        completed.push(result.unwrap());
    }

    assert_eq!(completed, vec!["/home/feed", "/list/7", "/list/8"]);
    assert_eq!(router.current_url(), NavUrl::parse("/list/8"));
    assert!(!router.is_transitioning());
    assert_eq!(
        *log.lock().unwrap(),
        vec![
            "push /home -> Home",
            "push /home/feed -> Feed",
            "pop_to_root",
            "push /list/:id {id=7} -> List",
            "replace /list/:id {id=8} -> List",
        ]
    );
}

#[tokio::test]
async fn test_rejection_while_animating() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let router = timed_router(Duration::from_millis(50), log);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let first = tx.clone();
    router
        .transition()
        .to("/home")
        .on_complete(move |result| {
            let _ = first.send(("first", result.is_ok()));
        })
        .start();
    router
        .transition()
        .to("/list/1")
        .on_complete(move |result| {
            let _ = tx.send(("second", result.is_ok()));
        })
        .start();

    // The rejection is immediate; the first transition finishes later.
    assert_eq!(rx.recv().await, Some(("second", false)));
    assert_eq!(rx.recv().await, Some(("first", true)));
    assert_eq!(router.current_url().to_string(), "/home");
}

#[tokio::test]
async fn test_completion_from_another_thread() {
    let router = Router::builder()
        .updater(|_update: nav_router::Update, done: nav_router::Completion| {
            std::thread::spawn(move || done.complete());
        })
        .routes(|r| {
            r.route("/home", screen("Home"));
        })
        .unwrap()
        .build();

    let (tx, rx) = tokio::sync::oneshot::channel();
    router
        .transition()
        .to("/home")
        .on_complete(move |result| {
            let _ = tx.send(result.is_ok());
        })
        .start();

    let ok = tokio::time::timeout(Duration::from_secs(5), rx)
        .await
        .expect("completion timed out")
        .unwrap();
    assert!(ok);
    assert_eq!(router.current_url().to_string(), "/home");
}
