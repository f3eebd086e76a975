//! Shared test infrastructure for integration tests.
//!
//! `FakeArango` is an in-process axum server that answers the subset of the
//! ArangoDB REST API the walkthrough uses, with in-memory state. Queries are
//! not parsed as AQL: a cursor request filters the collection named after
//! the first `IN` by `name == @name`, and removes the matches when the query
//! contains `REMOVE`.

use axum::extract::{Path, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, VecDeque};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use tempfile::TempDir;

pub type Documents = BTreeMap<String, Map<String, Value>>;

type Shared = Arc<Mutex<FakeState>>;
type Reply = (StatusCode, Json<Value>);

/// One request as seen by the fake server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

struct OpenCursor {
    database: String,
    remaining: VecDeque<Value>,
    batch_size: usize,
}

#[derive(Default)]
struct FakeState {
    databases: BTreeMap<String, BTreeMap<String, Documents>>,
    cursors: BTreeMap<String, OpenCursor>,
    next_id: u64,
    requests: Vec<RecordedRequest>,
}

pub struct FakeArango {
    addr: SocketAddr,
    state: Shared,
}

impl FakeArango {
    pub fn start() -> Self {
        let state: Shared = Arc::default();
        let app = router(Arc::clone(&state));
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let runtime = tokio::runtime::Builder::new_multi_thread()
                .worker_threads(2)
                .enable_all()
                .build()
                .expect("tokio runtime");
            runtime.block_on(async move {
                let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                    .await
                    .expect("bind fake server");
                sender
                    .send(listener.local_addr().expect("fake server address"))
                    .expect("report fake server address");
                axum::serve(listener, app).await.expect("serve fake server");
            });
        });
        let addr = receiver.recv().expect("fake server started");
        Self { addr, state }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn documents(&self, database: &str, collection: &str) -> Option<Documents> {
        let state = self.state.lock().expect("fake state lock");
        state.databases.get(database)?.get(collection).cloned()
    }

    pub fn has_database(&self, database: &str) -> bool {
        let state = self.state.lock().expect("fake state lock");
        state.databases.contains_key(database)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        let state = self.state.lock().expect("fake state lock");
        state.requests.clone()
    }

    /// Store a document directly, creating its database and collection.
    pub fn seed_document(&self, database: &str, collection: &str, document: Value) {
        let mut state = self.state.lock().expect("fake state lock");
        let Value::Object(mut document) = document else {
            panic!("seed document must be an object");
        };
        let key = document
            .get("_key")
            .and_then(Value::as_str)
            .expect("seed document needs _key")
            .to_string();
        document.insert("_id".to_string(), json!(format!("{collection}/{key}")));
        document.insert("_rev".to_string(), json!("_seed"));
        state
            .databases
            .entry(database.to_string())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .insert(key, document);
    }
}

/// Run the walkthrough binary against `endpoint` with an empty config file so
/// the caller's own config and environment do not leak in.
pub fn run_walkthrough(endpoint: &str, extra_args: &[&str]) -> Output {
    let config_dir = TempDir::new().expect("create temp dir");
    let config_path: PathBuf = config_dir.path().join("config.json");
    std::fs::write(&config_path, r#"{"schema_version": 1}"#).expect("write config");

    Command::new(env!("CARGO_BIN_EXE_arango-walkthrough"))
        .arg("--endpoint")
        .arg(endpoint)
        .arg("--config")
        .arg(&config_path)
        .args(extra_args)
        .env_remove("RUST_LOG")
        .env_remove("ARANGO_USER")
        .env_remove("ARANGO_PASSWORD")
        .output()
        .expect("run arango-walkthrough")
}

pub fn stdout_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Number of stdout lines exactly equal to `line`.
pub fn count_lines(text: &str, line: &str) -> usize {
    text.lines().filter(|candidate| *candidate == line).count()
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/_api/version", get(version))
        .route("/_db/{db}/_api/database", post(create_database))
        .route(
            "/_db/{db}/_api/database/{name}",
            axum::routing::delete(drop_database),
        )
        .route("/_db/{db}/_api/collection", post(create_collection))
        .route("/_db/{db}/_api/document/{collection}", post(insert))
        .route(
            "/_db/{db}/_api/document/{collection}/{key}",
            get(read).patch(update).delete(remove),
        )
        .route("/_db/{db}/_api/cursor", post(query))
        .route(
            "/_db/{db}/_api/cursor/{id}",
            put(continue_cursor).delete(discard_cursor),
        )
        .layer(middleware::from_fn_with_state(Arc::clone(&state), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let authorization = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state
        .lock()
        .expect("fake state lock")
        .requests
        .push(RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            authorization,
        });
    next.run(request).await
}

fn reply((status, body): (u16, Value)) -> Reply {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(body),
    )
}

async fn version() -> Reply {
    reply((
        200,
        json!({"server": "arango", "version": "3.11.0", "license": "community"}),
    ))
}

async fn create_database(State(state): State<Shared>, Json(body): Json<Value>) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    let name = body["name"].as_str().unwrap_or_default().to_string();
    if state.databases.contains_key(&name) {
        return reply(error(409, 1207, "duplicate database name"));
    }
    state.databases.insert(name, BTreeMap::new());
    reply((201, json!({"error": false, "code": 201, "result": true})))
}

async fn drop_database(
    State(state): State<Shared>,
    Path((_db, name)): Path<(String, String)>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    if state.databases.remove(&name).is_none() {
        return reply(error(404, 1228, "database not found"));
    }
    reply((200, json!({"error": false, "code": 200, "result": true})))
}

async fn create_collection(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    let name = body["name"].as_str().unwrap_or_default().to_string();
    state.next_id += 1;
    let id = state.next_id.to_string();
    let Some(collections) = state.databases.get_mut(&db) else {
        return reply(error(404, 1228, "database not found"));
    };
    if collections.contains_key(&name) {
        return reply(error(409, 1207, "duplicate name"));
    }
    collections.insert(name.clone(), BTreeMap::new());
    reply((
        200,
        json!({"error": false, "code": 200, "id": id, "name": name, "type": 2, "status": 3}),
    ))
}

async fn insert(
    State(state): State<Shared>,
    Path((db, collection)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(insert_document(&mut state, &db, &collection, &body))
}

async fn read(
    State(state): State<Shared>,
    Path((db, collection, key)): Path<(String, String, String)>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(document_by_key(&mut state, "GET", &db, &collection, &key, &Value::Null))
}

async fn update(
    State(state): State<Shared>,
    Path((db, collection, key)): Path<(String, String, String)>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(document_by_key(&mut state, "PATCH", &db, &collection, &key, &body))
}

async fn remove(
    State(state): State<Shared>,
    Path((db, collection, key)): Path<(String, String, String)>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(document_by_key(&mut state, "DELETE", &db, &collection, &key, &Value::Null))
}

async fn query(
    State(state): State<Shared>,
    Path(db): Path<String>,
    Json(body): Json<Value>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(open_cursor(&mut state, &db, &body))
}

async fn continue_cursor(
    State(state): State<Shared>,
    Path((_db, id)): Path<(String, String)>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    reply(next_batch(&mut state, &id))
}

async fn discard_cursor(
    State(state): State<Shared>,
    Path((_db, id)): Path<(String, String)>,
) -> Reply {
    let mut state = state.lock().expect("fake state lock");
    if state.cursors.remove(&id).is_none() {
        return reply(error(404, 1600, "cursor not found"));
    }
    reply((202, json!({"error": false, "code": 202, "id": id})))
}

fn error(code: u16, error_num: u32, message: &str) -> (u16, Value) {
    (
        code,
        json!({"error": true, "code": code, "errorNum": error_num, "errorMessage": message}),
    )
}

fn meta(document: &Map<String, Value>) -> Value {
    json!({"_id": document["_id"], "_key": document["_key"], "_rev": document["_rev"]})
}

fn collection_mut<'a>(
    state: &'a mut FakeState,
    db: &str,
    collection: &str,
) -> Result<&'a mut Documents, (u16, Value)> {
    state
        .databases
        .get_mut(db)
        .ok_or_else(|| error(404, 1228, "database not found"))?
        .get_mut(collection)
        .ok_or_else(|| error(404, 1203, "collection or view not found"))
}

fn insert_document(state: &mut FakeState, db: &str, collection: &str, body: &Value) -> (u16, Value) {
    state.next_id += 1;
    let generated = state.next_id;
    let documents = match collection_mut(state, db, collection) {
        Ok(documents) => documents,
        Err(response) => return response,
    };
    let Value::Object(mut document) = body.clone() else {
        return error(400, 1227, "invalid document type");
    };
    let key = document
        .get("_key")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| generated.to_string());
    if documents.contains_key(&key) {
        return error(
            409,
            1210,
            &format!("unique constraint violated - in index primary of type primary over '_key'; conflicting key: {key}"),
        );
    }
    document.insert("_key".to_string(), json!(key));
    document.insert("_id".to_string(), json!(format!("{collection}/{key}")));
    document.insert("_rev".to_string(), json!(format!("_r{generated}")));
    let response = meta(&document);
    documents.insert(key, document);
    (202, response)
}

fn document_by_key(
    state: &mut FakeState,
    method: &str,
    db: &str,
    collection: &str,
    key: &str,
    body: &Value,
) -> (u16, Value) {
    state.next_id += 1;
    let revision = format!("_r{}", state.next_id);
    let documents = match collection_mut(state, db, collection) {
        Ok(documents) => documents,
        Err(response) => return response,
    };
    let Some(document) = documents.get_mut(key) else {
        return error(404, 1202, "document not found");
    };
    match method {
        "GET" => (200, Value::Object(document.clone())),
        "PATCH" => {
            if let Value::Object(partial) = body {
                for (name, value) in partial {
                    if !name.starts_with('_') {
                        document.insert(name.clone(), value.clone());
                    }
                }
            }
            document.insert("_rev".to_string(), json!(revision));
            (202, meta(document))
        }
        "DELETE" => {
            let response = meta(document);
            documents.remove(key);
            (202, response)
        }
        _ => error(405, 405, "method not supported"),
    }
}

fn open_cursor(state: &mut FakeState, db: &str, body: &Value) -> (u16, Value) {
    let query = body["query"].as_str().unwrap_or_default();
    let Some(collection) = query
        .split_whitespace()
        .skip_while(|token| *token != "IN")
        .nth(1)
    else {
        return error(400, 1501, "syntax error");
    };
    let name = body["bindVars"]["name"].clone();
    let remove = query.contains("REMOVE");
    let batch_size = body["batchSize"].as_u64().unwrap_or(1000) as usize;
    let with_count = body["count"].as_bool().unwrap_or(false);

    let documents = match collection_mut(state, db, collection) {
        Ok(documents) => documents,
        Err(response) => return response,
    };
    let matching: Vec<String> = documents
        .iter()
        .filter(|(_, document)| document.get("name") == Some(&name))
        .map(|(key, _)| key.clone())
        .collect();
    let mut results = VecDeque::new();
    for key in matching {
        let document = if remove {
            documents.remove(&key)
        } else {
            documents.get(&key).cloned()
        };
        if let Some(document) = document {
            results.push_back(Value::Object(document));
        }
    }

    let total = results.len();
    let first: Vec<Value> = results.drain(..batch_size.min(total)).collect();
    let mut response = json!({"error": false, "code": 201, "result": first, "hasMore": !results.is_empty()});
    if with_count {
        response["count"] = json!(total);
    }
    if !results.is_empty() {
        state.next_id += 1;
        let id = state.next_id.to_string();
        response["id"] = json!(id);
        state.cursors.insert(
            id,
            OpenCursor {
                database: db.to_string(),
                remaining: results,
                batch_size,
            },
        );
    }
    (201, response)
}

fn next_batch(state: &mut FakeState, id: &str) -> (u16, Value) {
    let Some(cursor) = state.cursors.get_mut(id) else {
        return error(404, 1600, "cursor not found");
    };
    let take = cursor.batch_size.min(cursor.remaining.len());
    let batch: Vec<Value> = cursor.remaining.drain(..take).collect();
    let has_more = !cursor.remaining.is_empty();
    let database = cursor.database.clone();
    if !has_more {
        state.cursors.remove(id);
    }
    (
        200,
        json!({"error": false, "code": 200, "result": batch, "hasMore": has_more, "id": id, "database": database}),
    )
}
