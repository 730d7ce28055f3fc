use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message returned when a create payload carries blank content.
pub const EMPTY_DATA_MESSAGE: &str = "Data can't be empty";

/// A book as returned to API clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Store identifier, rendered as a 24-character hex string
    #[serde(rename = "_id", with = "object_id_hex")]
    pub id: ObjectId,
    pub title: String,
    pub author: String,
    /// Publication year
    pub year: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Persisted layout of a book in the `books` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub author: String,
    /// Written as a 64-bit integer; other clients may have stored an
    /// `int32` or an integral double.
    #[serde(deserialize_with = "stored_year::deserialize")]
    pub year: i64,
    pub created_at: bson::DateTime,
    /// Absent on records written before updates were tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<bson::DateTime>,
}

impl From<&Book> for BookDocument {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year,
            created_at: to_bson_datetime(book.created_at),
            updated_at: Some(to_bson_datetime(book.updated_at)),
        }
    }
}

impl From<BookDocument> for Book {
    fn from(document: BookDocument) -> Self {
        let created_at = to_chrono(document.created_at);
        Self {
            id: document.id,
            title: document.title,
            author: document.author,
            year: document.year,
            created_at,
            updated_at: document.updated_at.map(to_chrono).unwrap_or(created_at),
        }
    }
}

/// Current time at the store's millisecond precision, so that a freshly
/// created book compares equal to its persisted form.
pub fn timestamp_now() -> DateTime<Utc> {
    to_chrono(bson::DateTime::now())
}

fn to_bson_datetime(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(value.timestamp_millis())
}

fn to_chrono(value: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from(value.to_system_time())
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{}", EMPTY_DATA_MESSAGE)]
    Empty,
}

/// Body of a create request.
///
/// Missing fields default to empty values so that they are reported by
/// validation rather than by the JSON parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub year: i64,
}

impl CreateBook {
    /// Required-field check: every field must hold a non-zero value.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::Required { field: "title" });
        }
        if self.author.is_empty() {
            return Err(ValidationError::Required { field: "author" });
        }
        if self.year == 0 {
            return Err(ValidationError::Required { field: "year" });
        }
        Ok(())
    }

    /// Content check: text fields must not be blank and the year must be set.
    pub fn ensure_content(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) || is_blank(&self.author) || self.year == 0 {
            return Err(ValidationError::Empty);
        }
        Ok(())
    }

    pub fn into_book(self, id: ObjectId, now: DateTime<Utc>) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            year: self.year,
            created_at: now,
            updated_at: now,
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Body of an update request. `None` leaves the stored value untouched;
/// `Some` overwrites it, including `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
}

impl BookUpdate {
    /// With `strict` set, present fields must satisfy the create rules.
    /// Otherwise any present value is accepted.
    pub fn validate(&self, strict: bool) -> Result<(), ValidationError> {
        if !strict {
            return Ok(());
        }
        if self.title.as_deref().is_some_and(is_blank) {
            return Err(ValidationError::Required { field: "title" });
        }
        if self.author.as_deref().is_some_and(is_blank) {
            return Err(ValidationError::Required { field: "author" });
        }
        if self.year == Some(0) {
            return Err(ValidationError::Required { field: "year" });
        }
        Ok(())
    }

    /// Names of the fields present in this update.
    pub fn fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::with_capacity(3);
        if self.title.is_some() {
            fields.push("title");
        }
        if self.author.is_some() {
            fields.push("author");
        }
        if self.year.is_some() {
            fields.push("year");
        }
        fields
    }

    /// Fields for a `$set`: the present fields plus `updated_at`.
    pub fn set_document(&self, updated_at: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        if let Some(title) = &self.title {
            set.insert("title", title.as_str());
        }
        if let Some(author) = &self.author {
            set.insert("author", author.as_str());
        }
        if let Some(year) = self.year {
            set.insert("year", year);
        }
        set.insert("updated_at", to_bson_datetime(updated_at));
        set
    }
}

/// Filter selecting one book by identifier.
pub fn id_filter(id: ObjectId) -> Document {
    doc! { "_id": id }
}

mod object_id_hex {
    use mongodb::bson::oid::ObjectId;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &ObjectId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ObjectId, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ObjectId::parse_str(&hex).map_err(D::Error::custom)
    }
}

mod stored_year {
    use serde::{
        de::{Error, Visitor},
        Deserializer,
    };
    use std::fmt;

    struct YearVisitor;

    impl<'de> Visitor<'de> for YearVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("an integral year")
        }

        fn visit_i32<E: Error>(self, value: i32) -> Result<i64, E> {
            Ok(value.into())
        }

        fn visit_i64<E: Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(E::custom)
        }

        fn visit_f64<E: Error>(self, value: f64) -> Result<i64, E> {
            if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
                Ok(value as i64)
            } else {
                Err(E::custom(format!("year {value} is not an integer")))
            }
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(YearVisitor)
    }
}
