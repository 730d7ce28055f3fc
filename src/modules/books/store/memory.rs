use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Document};
use tokio::sync::RwLock;

use super::{decode_listed, BookStore, StoreError};
use crate::modules::books::models::BookDocument;

/// Book collection held in process memory.
///
/// Books are kept as BSON documents in insertion order, and updates merge
/// the `$set` fields into the stored document the way the database does.
#[derive(Debug, Default)]
pub struct MemoryBookStore {
    documents: RwLock<Vec<Document>>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read one book straight from the collection.
    pub async fn get(&self, id: ObjectId) -> Result<Option<BookDocument>, StoreError> {
        let documents = self.documents.read().await;
        documents
            .iter()
            .find(|document| has_id(document, id))
            .map(|document| bson::from_document(document.clone()).map_err(StoreError::from))
            .transpose()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn has_id(document: &Document, id: ObjectId) -> bool {
    document.get_object_id("_id").is_ok_and(|stored| stored == id)
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents.iter().cloned().filter_map(decode_listed).collect())
    }

    async fn insert_one(&self, book: &BookDocument) -> Result<ObjectId, StoreError> {
        let document = bson::to_document(book)?;
        let mut documents = self.documents.write().await;

        if documents.iter().any(|existing| has_id(existing, book.id)) {
            return Err(StoreError::Backend(format!(
                "E11000 duplicate key error collection: books index: _id_ dup key: {{ _id: ObjectId('{}') }}",
                book.id.to_hex()
            )));
        }

        documents.push(document);
        Ok(book.id)
    }

    async fn update_one_by_id(&self, id: ObjectId, set: Document) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;

        match documents.iter_mut().find(|document| has_id(document, id)) {
            Some(document) => {
                for (key, value) in set {
                    document.insert(key, value);
                }
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_one_by_id(&self, id: ObjectId) -> Result<u64, StoreError> {
        let mut documents = self.documents.write().await;

        match documents.iter().position(|document| has_id(document, id)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::models::{timestamp_now, Book, BookUpdate, CreateBook};
    use mongodb::bson::doc;

    fn document(title: &str) -> BookDocument {
        let book = CreateBook {
            title: title.to_string(),
            author: "Herbert".to_string(),
            year: 1965,
        }
        .into_book(ObjectId::new(), timestamp_now());
        BookDocument::from(&book)
    }

    #[tokio::test]
    async fn keeps_insertion_order() {
        let store = MemoryBookStore::new();
        let first = document("Dune");
        let second = document("Dune Messiah");

        store.insert_one(&first).await.unwrap();
        store.insert_one(&second).await.unwrap();

        assert_eq!(store.find_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn rejects_duplicate_ids() {
        let store = MemoryBookStore::new();
        let book = document("Dune");

        store.insert_one(&book).await.unwrap();
        let err = store.insert_one(&book).await.unwrap_err();

        assert!(err.to_string().contains("duplicate key"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn update_merges_only_given_fields() {
        let store = MemoryBookStore::new();
        let book = document("Dune");
        store.insert_one(&book).await.unwrap();

        let later = timestamp_now() + chrono::Duration::seconds(5);
        let update = BookUpdate {
            year: Some(1966),
            ..Default::default()
        };
        let matched = store
            .update_one_by_id(book.id, update.set_document(later))
            .await
            .unwrap();
        assert_eq!(matched, 1);

        let stored = Book::from(store.get(book.id).await.unwrap().unwrap());
        let original = Book::from(book);
        assert_eq!(stored.title, original.title);
        assert_eq!(stored.author, original.author);
        assert_eq!(stored.year, 1966);
        assert_eq!(stored.created_at, original.created_at);
        assert_eq!(stored.updated_at, later);
    }

    #[tokio::test]
    async fn update_and_delete_of_unknown_id_match_nothing() {
        let store = MemoryBookStore::new();
        let missing = ObjectId::new();

        let set = BookUpdate::default().set_document(timestamp_now());
        assert_eq!(store.update_one_by_id(missing, set).await.unwrap(), 0);
        assert_eq!(store.delete_one_by_id(missing).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn delete_removes_the_document() {
        let store = MemoryBookStore::new();
        let book = document("Dune");
        store.insert_one(&book).await.unwrap();

        assert_eq!(store.delete_one_by_id(book.id).await.unwrap(), 1);
        assert_eq!(store.delete_one_by_id(book.id).await.unwrap(), 0);
        assert!(store.is_empty().await);
        assert!(store.get(book.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_books_stored_with_a_double_year() {
        let store = MemoryBookStore::new();
        let id = ObjectId::new();
        store.documents.write().await.push(doc! {
            "_id": id,
            "title": "Dune",
            "author": "Herbert",
            "year": 1965.0,
            "created_at": bson::DateTime::now(),
        });

        let books = store.find_all().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].id, id);
        assert_eq!(books[0].year, 1965);
    }

    #[tokio::test]
    async fn malformed_documents_do_not_fail_the_listing() {
        let store = MemoryBookStore::new();
        let book = document("Dune");
        store.insert_one(&book).await.unwrap();
        store.documents.write().await.push(doc! {
            "_id": ObjectId::new(),
            "title": "Untitled",
            "year": "unknown",
        });

        assert_eq!(store.find_all().await.unwrap(), vec![book]);
        assert_eq!(store.len().await, 2);
    }
}
