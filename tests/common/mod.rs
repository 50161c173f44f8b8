// Shared fixtures for router-level tests
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

use learning_assistant_api::{
    config::{Config, IngestionMode},
    db::InMemoryDocumentStore,
    ingestion::HashEmbedder,
    llm::{GenerationRequest, TextGenerator},
    routes::create_router,
    state::AppState,
    storage::LocalBlobStore,
    views::Views,
};

pub const BOUNDARY: &str = "learning-assistant-test-boundary";

/// Build a PDF with one page per entry; each `\n`-separated line becomes its own text object
pub fn make_pdf(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids = Vec::new();
    for page_text in pages {
        let mut operations = Vec::new();
        for (i, line) in page_text.lines().enumerate() {
            let y = 760 - (i as i64) * 14;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new("Td", vec![40.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(line)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => font_id,
                },
            },
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(Object::from(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Page text of `lines` short study sentences, tagged with the page number
pub fn study_page(page: usize, lines: usize) -> String {
    const TOPICS: [&str; 6] = [
        "mitochondria convert nutrients into usable chemical energy",
        "ribosomes assemble proteins from amino acid chains",
        "the nucleus stores genetic information as DNA",
        "chloroplasts capture light energy in plant cells",
        "the cell membrane controls what enters and leaves",
        "enzymes lower the activation energy of reactions",
    ];

    (0..lines)
        .map(|i| format!("Page {} fact {}: {}.", page, i + 1, TOPICS[i % TOPICS.len()]))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generator that records every request and answers with a fixed reply
pub struct RecordingGenerator {
    reply: Result<String, String>,
    calls: AtomicUsize,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.requests.lock().unwrap().last().map(|r| r.prompt.clone())
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

/// Router wired with in-memory store, temp-dir blobs, hash embedder and a recording generator
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<InMemoryDocumentStore>,
    pub generator: Arc<RecordingGenerator>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub fn new(mode: IngestionMode, generator: RecordingGenerator) -> Self {
        Self::with_config(generator, |config| config.ingestion.mode = mode)
    }

    /// App whose configuration is adjusted by `configure` before the router is built
    pub fn with_config(generator: RecordingGenerator, configure: impl FnOnce(&mut Config)) -> Self {
        let upload_dir = tempfile::tempdir().unwrap();

        let mut config = Config::default();
        config.ingestion.mode = IngestionMode::Inline;
        config.storage.upload_dir = upload_dir.path().display().to_string();
        configure(&mut config);

        let store = Arc::new(InMemoryDocumentStore::default());
        let generator = Arc::new(generator);

        let state = AppState::new(
            config,
            store.clone(),
            Arc::new(LocalBlobStore::new(upload_dir.path())),
            Arc::new(HashEmbedder::default()),
            generator.clone(),
            Views::new().unwrap(),
        );

        Self {
            router: create_router(state.clone()),
            state,
            store,
            generator,
            upload_dir,
        }
    }

    pub fn inline(generator: RecordingGenerator) -> Self {
        Self::new(IngestionMode::Inline, generator)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    pub async fn send_json(&self, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let (status, body) = self.send(request).await;
        let json = serde_json::from_str(&body)
            .unwrap_or_else(|e| panic!("response was not JSON ({}): {}", e, body));
        (status, json)
    }

    /// Upload and return the new document id
    pub async fn upload(&self, filename: &str, bytes: &[u8]) -> String {
        let (status, body) = self.send_json(upload_request(filename, bytes)).await;
        assert_eq!(status, StatusCode::CREATED, "upload failed: {}", body);
        body["document_id"].as_str().unwrap().to_string()
    }

    /// Number of files written under the upload directory
    pub fn stored_file_count(&self) -> usize {
        count_files(self.upload_dir.path())
    }
}

/// Files under `dir`, recursively
pub fn count_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| {
                    let path = e.path();
                    if path.is_dir() {
                        count_files(&path)
                    } else {
                        1
                    }
                })
                .sum()
        })
        .unwrap_or(0)
}

pub fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request_with_field(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/upload_pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(field, filename, bytes)))
        .unwrap()
}

pub fn upload_request(filename: &str, bytes: &[u8]) -> Request<Body> {
    upload_request_with_field("pdf_file", filename, bytes)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
