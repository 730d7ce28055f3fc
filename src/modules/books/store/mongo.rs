use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Collection, Database,
};

use super::{decode_listed, BookStore, StoreError};
use crate::modules::books::models::{id_filter, BookDocument};

/// Book collection backed by a MongoDB deployment.
#[derive(Debug, Clone)]
pub struct MongoBookStore {
    database: Database,
    collection: Collection<BookDocument>,
}

impl MongoBookStore {
    pub fn new(database: Database, collection: &str) -> Self {
        let collection = database.collection::<BookDocument>(collection);
        Self {
            database,
            collection,
        }
    }
}

#[async_trait]
impl BookStore for MongoBookStore {
    async fn find_all(&self) -> Result<Vec<BookDocument>, StoreError> {
        let mut cursor = self
            .collection
            .clone_with_type::<Document>()
            .find(doc! {})
            .await?;

        let mut books = Vec::new();
        while cursor.advance().await? {
            if let Some(book) = decode_listed(cursor.deserialize_current()?) {
                books.push(book);
            }
        }
        Ok(books)
    }

    async fn insert_one(&self, book: &BookDocument) -> Result<ObjectId, StoreError> {
        let result = self.collection.insert_one(book).await?;

        result.inserted_id.as_object_id().ok_or_else(|| {
            StoreError::Codec(format!(
                "inserted id is not an ObjectId: {}",
                result.inserted_id
            ))
        })
    }

    async fn update_one_by_id(&self, id: ObjectId, set: Document) -> Result<u64, StoreError> {
        let result = self
            .collection
            .update_one(id_filter(id), doc! { "$set": set })
            .await?;
        Ok(result.matched_count)
    }

    async fn delete_one_by_id(&self, id: ObjectId) -> Result<u64, StoreError> {
        let result = self.collection.delete_one(id_filter(id)).await?;
        Ok(result.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        booklist_db::ping(&self.database)
            .await
            .map_err(|e| StoreError::Backend(format!("{:#}", e)))
    }
}
