//! Scripted HTTP responder for driver unit tests.
//!
//! Each route is a fixed `(method, path) -> (status, body)` answer; anything
//! unscripted gets a 404 envelope. `GET /_api/version` is answered by default
//! so [`ArangoClient::connect`] succeeds.
use super::client::{ArangoClient, ClientOptions};
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Clone)]
struct Shared {
    script: Arc<BTreeMap<String, (u16, Value)>>,
    requests: Arc<Mutex<Vec<String>>>,
}

pub(crate) struct ScriptedServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    pub(crate) fn start(routes: Vec<(&str, &str, u16, Value)>) -> Self {
        let mut script: BTreeMap<String, (u16, Value)> = routes
            .into_iter()
            .map(|(method, path, status, body)| (format!("{method} {path}"), (status, body)))
            .collect();
        script
            .entry("GET /_api/version".to_string())
            .or_insert((200, json!({"server": "arango", "version": "3.11.0"})));
        let shared = Shared {
            script: Arc::new(script),
            requests: Arc::default(),
        };
        let requests = Arc::clone(&shared.requests);
        let app = Router::new().fallback(respond).with_state(shared);

        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind scripted server");
                sender
                    .send(listener.local_addr().expect("local addr"))
                    .expect("report address");
                axum::serve(listener, app).await.expect("serve");
            });
        });
        let addr = receiver.recv().expect("scripted server address");
        Self { addr, requests }
    }

    pub(crate) fn client(&self) -> ArangoClient {
        ArangoClient::connect(&ClientOptions {
            endpoint: format!("http://{}", self.addr),
            user: "root".to_string(),
            password: String::new(),
            timeout: Duration::from_secs(5),
        })
        .expect("connect to scripted server")
    }

    /// Requests seen so far, as `METHOD /path`.
    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log").clone()
    }

    pub(crate) fn saw(&self, method: &str, path: &str) -> bool {
        let wanted = format!("{method} {path}");
        self.requests().iter().any(|line| *line == wanted)
    }
}

async fn respond(State(shared): State<Shared>, request: Request) -> (StatusCode, Json<Value>) {
    let line = format!("{} {}", request.method(), request.uri().path());
    shared.requests.lock().expect("request log").push(line.clone());
    let (status, body) = shared.script.get(&line).cloned().unwrap_or_else(|| {
        (
            404,
            json!({"error": true, "code": 404, "errorNum": 404, "errorMessage": "unknown path"}),
        )
    });
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}
