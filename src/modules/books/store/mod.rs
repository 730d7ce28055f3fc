//! Persistence for the book collection.
//!
//! Handlers talk to a [`BookStore`]; the MongoDB collection and an in-process
//! collection both implement it.

mod memory;
mod mongo;

pub use memory::MemoryBookStore;
pub use mongo::MongoBookStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use booklist_kernel::settings::{DatabaseBackend, DatabaseSettings};
use mongodb::bson::{self, oid::ObjectId, Document};
use thiserror::Error;

use super::models::BookDocument;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Any error reported by the database itself, passed through verbatim.
    #[error("{0}")]
    Backend(String),

    #[error("store operation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("malformed book document: {0}")]
    Codec(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<mongodb::bson::de::Error> for StoreError {
    fn from(err: mongodb::bson::de::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        StoreError::Codec(err.to_string())
    }
}

/// Document-store operations used by the book handlers.
///
/// Update and delete report how many documents they touched; a count of zero
/// is not an error.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Every book, in store order.
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError>;

    /// Insert a new book and return the identifier the store recorded.
    async fn insert_one(&self, book: &BookDocument) -> Result<ObjectId, StoreError>;

    /// Merge `set` into the book with identifier `id`; returns the match count.
    async fn update_one_by_id(&self, id: ObjectId, set: Document) -> Result<u64, StoreError>;

    /// Remove the book with identifier `id`; returns the deleted count.
    async fn delete_one_by_id(&self, id: ObjectId) -> Result<u64, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Decode one listed document. A document that does not fit the book layout
/// is logged and skipped so that it cannot fail the whole listing.
pub(crate) fn decode_listed(document: Document) -> Option<BookDocument> {
    let id = document.get("_id").map(ToString::to_string);
    match bson::from_document::<BookDocument>(document) {
        Ok(book) => Some(book),
        Err(e) => {
            tracing::warn!(id = ?id, error = %e, "skipping malformed book document");
            None
        }
    }
}

/// Await a store call for at most `limit`, abandoning it afterwards.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}

/// Create the store selected by `database.backend`.
pub async fn connect(settings: &DatabaseSettings) -> anyhow::Result<Arc<dyn BookStore>> {
    match settings.backend {
        DatabaseBackend::Mongo => {
            let database = booklist_db::connect(settings)
                .await
                .with_context(|| "failed to connect book store")?;
            Ok(Arc::new(MongoBookStore::new(database, &settings.collection)))
        }
        DatabaseBackend::Memory => {
            tracing::warn!("using in-memory book store; data is lost on restart");
            Ok(Arc::new(MemoryBookStore::new()))
        }
    }
}
