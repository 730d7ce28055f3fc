//! Test harness for the book HTTP API.
//!
//! Serves the full application router over an in-memory store, with store
//! doubles that count calls, fail, or stall.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use booklist_app::modules::{
    self,
    books::{
        models::{Book, BookDocument},
        store::{BookStore, MemoryBookStore, StoreError},
    },
};
use booklist_kernel::{settings::Settings, ModuleRegistry};
use mongodb::bson::{oid::ObjectId, Document};
use serde_json::{json, Value};

/// Memory store that records how often each operation was called.
#[derive(Debug, Default)]
pub struct CountingStore {
    pub inner: MemoryBookStore,
    pub finds: AtomicUsize,
    pub inserts: AtomicUsize,
    pub updates: AtomicUsize,
    pub deletes: AtomicUsize,
}

impl CountingStore {
    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    /// Read a book directly from the collection, bypassing HTTP.
    pub async fn get(&self, id: &str) -> Option<Book> {
        let id = ObjectId::parse_str(id).expect("valid object id");
        self.inner.get(id).await.unwrap().map(Book::from)
    }
}

#[async_trait]
impl BookStore for CountingStore {
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find_all().await
    }

    async fn insert_one(&self, book: &BookDocument) -> Result<ObjectId, StoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_one(book).await
    }

    async fn update_one_by_id(&self, id: ObjectId, set: Document) -> Result<u64, StoreError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_one_by_id(id, set).await
    }

    async fn delete_one_by_id(&self, id: ObjectId) -> Result<u64, StoreError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_one_by_id(id).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Store whose every call fails with the given backend message.
pub struct FailingStore(pub &'static str);

#[async_trait]
impl BookStore for FailingStore {
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError> {
        Err(StoreError::Backend(self.0.to_string()))
    }

    async fn insert_one(&self, _book: &BookDocument) -> Result<ObjectId, StoreError> {
        Err(StoreError::Backend(self.0.to_string()))
    }

    async fn update_one_by_id(&self, _id: ObjectId, _set: Document) -> Result<u64, StoreError> {
        Err(StoreError::Backend(self.0.to_string()))
    }

    async fn delete_one_by_id(&self, _id: ObjectId) -> Result<u64, StoreError> {
        Err(StoreError::Backend(self.0.to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Backend(self.0.to_string()))
    }
}

/// Store that never answers within any reasonable timeout.
pub struct StalledStore;

impl StalledStore {
    async fn stall() {
        tokio::time::sleep(Duration::from_secs(60)).await;
    }
}

#[async_trait]
impl BookStore for StalledStore {
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError> {
        Self::stall().await;
        Ok(Vec::new())
    }

    async fn insert_one(&self, book: &BookDocument) -> Result<ObjectId, StoreError> {
        Self::stall().await;
        Ok(book.id)
    }

    async fn update_one_by_id(&self, _id: ObjectId, _set: Document) -> Result<u64, StoreError> {
        Self::stall().await;
        Ok(0)
    }

    async fn delete_one_by_id(&self, _id: ObjectId) -> Result<u64, StoreError> {
        Self::stall().await;
        Ok(0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Self::stall().await;
        Ok(())
    }
}

/// Build a test server for `store` using the full application router.
pub fn server_with(store: Arc<dyn BookStore>, settings: Settings) -> TestServer {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, store, &settings);

    let app = booklist_http::build_router(&registry, &settings);
    TestServer::new(app).expect("Failed to create test server")
}

/// Test server over a counting in-memory store.
pub fn counting_server() -> (TestServer, Arc<CountingStore>) {
    let store = Arc::new(CountingStore::default());
    let server = server_with(store.clone(), Settings::default());
    (server, store)
}

pub fn dune() -> Value {
    json!({ "title": "Dune", "author": "Herbert", "year": 1965 })
}

/// Create a book and return its `data.book` object.
pub async fn create(server: &TestServer, body: Value) -> Value {
    let response = server.post("/book").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json::<Value>()["data"]["book"].clone()
}
