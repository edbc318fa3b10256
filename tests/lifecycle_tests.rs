//! Lifecycle integration tests: a live listener, graceful shutdown and
//! bind failures.

use std::time::Duration;

use breeze::{AppManager, Error, ListenOptions, RouteRegistrar};
use tokio::net::TcpListener;
use tokio::time::sleep;

mod common;
use common::send_text;

#[tokio::test]
async fn listen_serves_requests_and_stops_on_shutdown() {
    let port = 28310;

    let mut manager = AppManager::new();
    let app = manager.initialize();
    let mut reg = RouteRegistrar::new();
    reg.route("/health").get(send_text("ok")).expect("registers");
    reg.attach_to(&app).expect("routes attach");

    let shutdown = manager.shutdown_handle();
    let server = tokio::spawn(async move {
        manager
            .listen(ListenOptions {
                host: "127.0.0.1".into(),
                port,
                ..ListenOptions::default()
            })
            .await
    });

    // Give the listener a moment to bind.
    sleep(Duration::from_millis(200)).await;

    let response = reqwest::get(format!("http://127.0.0.1:{port}/health"))
        .await
        .expect("server is reachable");
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.expect("body"), "ok");

    shutdown.trigger();
    let result = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after shutdown")
        .expect("server task completes");
    assert!(result.is_ok(), "listen returned an error: {result:?}");
}

#[tokio::test]
async fn listen_on_an_occupied_port_surfaces_the_bind_error() {
    let port = 28311;
    let _occupant = TcpListener::bind(("127.0.0.1", port))
        .await
        .expect("test occupant binds");

    let mut manager = AppManager::new();
    manager.initialize();
    let err = manager
        .listen(ListenOptions {
            host: "127.0.0.1".into(),
            port,
            ..ListenOptions::default()
        })
        .await
        .expect_err("port is occupied");
    assert!(matches!(err, Error::Server(_)));
}

#[tokio::test]
async fn launch_initializes_and_serves_in_one_call() {
    let port = 28312;

    let mut manager = AppManager::new();
    let shutdown = manager.shutdown_handle();

    let server = tokio::spawn(async move {
        manager
            .launch(ListenOptions {
                host: "127.0.0.1".into(),
                port,
                ..ListenOptions::default()
            })
            .await
    });

    sleep(Duration::from_millis(200)).await;

    // No routes were attached, so any path answers 404. The point is that
    // launch bound the port without a prior initialize call.
    let response = reqwest::get(format!("http://127.0.0.1:{port}/anything"))
        .await
        .expect("server is reachable");
    assert_eq!(response.status(), 404);

    shutdown.trigger();
    let handle = tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server stops after shutdown")
        .expect("server task completes")
        .expect("launch succeeds");
    assert!(!handle.router().has_routes());
}
