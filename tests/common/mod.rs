//! 测试用的内存 MyCloudX 服务器

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "secret123";

#[derive(Default)]
pub struct StubState {
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub fail_list: AtomicBool,
    pub requests: AtomicUsize,
}

pub struct StubServer {
    pub addr: SocketAddr,
    pub state: Arc<StubState>,
}

impl StubServer {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        let app = Router::new()
            .route("/auth", post(auth))
            .route("/upload", post(upload))
            .route("/list", get(list))
            .route("/download/{name}", get(download))
            .route("/delete/{name}", delete(remove))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }

    pub fn put(&self, name: &str, contents: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.to_vec());
    }

    pub fn names(&self) -> Vec<String> {
        self.state.files.lock().unwrap().keys().cloned().collect()
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: String,
}

type Shared = State<Arc<StubState>>;

fn authorized(state: &StubState, token: &str) -> Result<(), StatusCode> {
    state.requests.fetch_add(1, Ordering::SeqCst);
    if token == TOKEN {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

type Reply = Result<Json<Value>, StatusCode>;

async fn auth(State(state): Shared, mut multipart: Multipart) -> Reply {
    let mut token = String::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("token") {
            token = field.text().await.unwrap_or_default();
        }
    }
    authorized(&state, &token).map(|_| Json(json!({ "ok": true })))
}

async fn upload(State(state): Shared, mut multipart: Multipart) -> Reply {
    let mut token = String::new();
    let mut file = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("token") => token = field.text().await.unwrap_or_default(),
            Some("file") => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let bytes = field.bytes().await.unwrap_or_default();
                file = Some((name, bytes.to_vec()));
            }
            _ => {}
        }
    }
    authorized(&state, &token)?;
    let (name, bytes) = file.ok_or(StatusCode::UNPROCESSABLE_ENTITY)?;
    state.files.lock().unwrap().insert(name.clone(), bytes);
    Ok(Json(json!({ "filename": name })))
}

async fn list(State(state): Shared, Query(q): Query<TokenQuery>) -> Reply {
    authorized(&state, &q.token)?;
    if state.fail_list.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }
    let files: Vec<String> = state.files.lock().unwrap().keys().cloned().collect();
    Ok(Json(json!({ "files": files })))
}

async fn download(
    State(state): Shared,
    Path(name): Path<String>,
    Query(q): Query<TokenQuery>,
) -> Result<Vec<u8>, StatusCode> {
    authorized(&state, &q.token)?;
    let bytes = state.files.lock().unwrap().get(&name).cloned();
    bytes.ok_or(StatusCode::NOT_FOUND)
}

async fn remove(
    State(state): Shared,
    Path(name): Path<String>,
    Query(q): Query<TokenQuery>,
) -> Reply {
    authorized(&state, &q.token)?;
    let removed = state.files.lock().unwrap().remove(&name);
    match removed {
        Some(_) => Ok(Json(json!({ "deleted": name }))),
        None => Err(StatusCode::NOT_FOUND),
    }
}
