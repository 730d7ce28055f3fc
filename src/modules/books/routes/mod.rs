//! HTTP handlers for the book collection.
//!
//! Every handler issues at most one store call, bounded by the configured
//! operation timeout, and answers with an [`Envelope`].

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use booklist_http::{AppError, Envelope};
use mongodb::bson::oid::ObjectId;
use serde_json::json;

use super::models::{timestamp_now, Book, BookDocument, BookUpdate, CreateBook, ValidationError};
use super::store::{bounded, BookStore, StoreError};

/// Dependencies shared by the book handlers.
#[derive(Clone)]
pub struct BooksState {
    store: Arc<dyn BookStore>,
    operation_timeout: Duration,
    strict_updates: bool,
}

impl BooksState {
    pub fn new(store: Arc<dyn BookStore>, operation_timeout: Duration, strict_updates: bool) -> Self {
        Self {
            store,
            operation_timeout,
            strict_updates,
        }
    }

    pub fn store(&self) -> &Arc<dyn BookStore> {
        &self.store
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Internal(anyhow::Error::new(err))
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// Build the router serving the book endpoints.
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/book", post(create_book))
        .route("/book/{id}", put(update_book).delete(delete_book))
        .route("/books/health", get(health_check))
        .with_state(state)
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn parse_id(raw: &str) -> Result<ObjectId, AppError> {
    ObjectId::parse_str(raw).map_err(|e| AppError::bad_request(e.to_string()))
}

/// `GET /books`
pub async fn list_books(State(state): State<BooksState>) -> Result<Envelope, AppError> {
    let documents = bounded(state.operation_timeout, state.store.find_all()).await?;
    let books: Vec<Book> = documents.into_iter().map(Book::from).collect();

    tracing::debug!(count = books.len(), "listed books");

    Ok(Envelope::success(
        StatusCode::OK,
        Some(json!({ "books": books })),
    ))
}

/// `POST /book` and `POST /books`
pub async fn create_book(
    State(state): State<BooksState>,
    payload: Result<Json<CreateBook>, JsonRejection>,
) -> Result<Envelope, AppError> {
    let payload = parse_body(payload)?;
    payload.validate()?;
    payload.ensure_content()?;

    let book = payload.into_book(ObjectId::new(), timestamp_now());
    let document = BookDocument::from(&book);

    let inserted_id = bounded(state.operation_timeout, state.store.insert_one(&document)).await?;

    tracing::info!(book_id = %inserted_id, title = %book.title, "book created");

    Ok(Envelope::success(
        StatusCode::CREATED,
        Some(json!({ "book": book, "inserted_id": inserted_id.to_hex() })),
    ))
}

/// `PUT /book/{id}`: merge the supplied fields into the stored book.
///
/// The response echoes the update as received, not the resulting book.
pub async fn update_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<BookUpdate>, JsonRejection>,
) -> Result<Envelope, AppError> {
    let update = parse_body(payload)?;
    update.validate(state.strict_updates)?;
    let id = parse_id(&raw_id)?;

    tracing::debug!(book_id = %id, fields = ?update.fields(), "updating book");

    let set = update.set_document(timestamp_now());
    let matched = bounded(
        state.operation_timeout,
        state.store.update_one_by_id(id, set),
    )
    .await?;

    if matched == 0 {
        tracing::info!(book_id = %id, "update matched no book");
    } else {
        tracing::info!(book_id = %id, "book updated");
    }

    Ok(Envelope::success(
        StatusCode::OK,
        Some(json!({ "book": update })),
    ))
}

/// `DELETE /book/{id}`
pub async fn delete_book(
    State(state): State<BooksState>,
    Path(raw_id): Path<String>,
) -> Result<Envelope, AppError> {
    let id = parse_id(&raw_id)?;

    let deleted = bounded(state.operation_timeout, state.store.delete_one_by_id(id)).await?;

    if deleted == 0 {
        tracing::info!(book_id = %id, "delete matched no book");
    } else {
        tracing::info!(book_id = %id, "book deleted");
    }

    Ok(Envelope::success(StatusCode::OK, None))
}

async fn health_check(State(state): State<BooksState>) -> Result<&'static str, AppError> {
    bounded(state.operation_timeout, state.store.ping()).await?;
    Ok("books module is healthy")
}
