//! A panicking handler becomes a generic 500; the detail only reaches the log.

mod common;

use std::io;
use std::sync::{Arc, Mutex};

use axum::{http::Method, routing::get};
use common::{TestServer, assert_envelope};
use notesapp_server::{FeatureModule, Route};
use reqwest::StatusCode;

const LEAKY_DETAIL: &str = "connection string postgres://admin:hunter2@db rejected";

struct Exploding;

impl FeatureModule for Exploding {
    fn name(&self) -> &'static str {
        "exploding"
    }

    fn routes(&self) -> Vec<Route> {
        vec![Route::public(
            Method::GET,
            "/explode",
            get(|| async {
                if LEAKY_DETAIL.is_empty() {
                    return "unreachable";
                }
                panic!("{LEAKY_DETAIL}")
            }),
        )]
    }
}

/// Log sink shared with the test body.
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Single-threaded runtime: the server tasks run on this thread and see the
// scoped subscriber.
#[tokio::test(flavor = "current_thread")]
async fn panic_becomes_generic_server_fault() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let srv = TestServer::spawn_with(vec![Box::new(Exploding)]).await;
    let res = srv.client.get(srv.url("/explode")).send().await.unwrap();

    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id on the response");

    assert_envelope(
        res,
        StatusCode::INTERNAL_SERVER_ERROR,
        "error",
        "an internal failure occurred",
    )
    .await;

    let logged = logs.contents();
    assert!(logged.contains(LEAKY_DETAIL), "{logged}");
    assert!(logged.contains(&request_id), "{logged}");
}

#[tokio::test]
async fn server_keeps_serving_after_a_panic() {
    let srv = TestServer::spawn_with(vec![Box::new(Exploding)]).await;

    let res = srv.client.get(srv.url("/explode")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.text().await.unwrap();
    assert!(!body.contains("hunter2"), "{body}");

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}
