//! Shared harness: the router served in-process over memory backends, plus a
//! stub chat-completions endpoint standing in for the language model.

#![allow(dead_code)]

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use book_question_pipeline::infra::config::{ExtractionOptions, LlmConfig};
use book_question_pipeline::infra::llm::{ChatModel, OpenAiClient};
use book_question_pipeline::storage::catalog::MemoryCatalog;
use book_question_pipeline::storage::objects::MemoryObjectStore;
use book_question_pipeline::{transport, BookService};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub struct LlmStub {
    pub base_url: String,
    /// Every chat request body the stub received.
    pub requests: Arc<Mutex<Vec<Value>>>,
}

#[derive(Clone)]
struct StubState {
    reply: String,
    requests: Arc<Mutex<Vec<Value>>>,
}

async fn chat_completions(State(state): State<StubState>, Json(body): Json<Value>) -> Json<Value> {
    state.requests.lock().await.push(body);
    Json(json!({
        "choices": [
            { "index": 0, "message": { "role": "assistant", "content": state.reply } }
        ]
    }))
}

/// Serves `/chat/completions` answering every request with `reply`.
pub async fn spawn_llm_stub(reply: &str) -> LlmStub {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route("/chat/completions", post(chat_completions))
        .with_state(StubState {
            reply: reply.to_string(),
            requests: requests.clone(),
        });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    LlmStub {
        base_url: format!("http://127.0.0.1:{}", port),
        requests,
    }
}

pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub catalog: Arc<MemoryCatalog>,
    pub objects: Arc<MemoryObjectStore>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn post_json(&self, path: &str, body: Value) -> (u16, Value) {
        let resp = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap())
    }

    pub async fn post_empty(&self, path: &str) -> (u16, Value) {
        let resp = self.client.post(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap())
    }

    pub async fn get_json(&self, path: &str) -> (u16, Value) {
        let resp = self.client.get(self.url(path)).send().await.unwrap();
        let status = resp.status().as_u16();
        (status, resp.json::<Value>().await.unwrap())
    }
}

/// Starts the API on an ephemeral port. `llm_base_url = None` leaves the API key unset.
pub async fn spawn_app(llm_base_url: Option<&str>, strict_parse: bool) -> TestApp {
    let catalog = Arc::new(MemoryCatalog::new());
    let objects = Arc::new(MemoryObjectStore::new());

    let llm = llm_base_url.map(|base_url| {
        let client = OpenAiClient::new(&LlmConfig {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(10),
        })
        .unwrap();
        Arc::new(client) as Arc<dyn ChatModel>
    });

    let service = BookService::new(
        catalog.clone(),
        objects.clone(),
        llm,
        ExtractionOptions {
            strict_parse,
            ..ExtractionOptions::default()
        },
    );
    service.ensure_buckets().await.unwrap();

    TestApp {
        base_url: serve(service).await,
        client: reqwest::Client::new(),
        catalog,
        objects,
    }
}

/// Serves an already built service; returns its base URL.
pub async fn serve(service: BookService) -> String {
    let router = transport::http::create_router(transport::http::AppState {
        book_service: Arc::new(service),
    });

    // Bind to an ephemeral port to avoid conflicts if an API server is already running.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://127.0.0.1:{}", port)
}

pub fn question(number: i32, text: &str) -> Value {
    json!({
        "questionNumber": number,
        "questionText": text,
        "choice1": "Leaf",
        "choice2": "Root",
        "choice3": "Stem",
        "choice4": "Flower",
        "correctChoice": "Leaf",
        "category": "Plants",
        "difficultyLevel": "easy"
    })
}
