//! Booklist application library
//!
//! CRUD over a collection of books stored in MongoDB, served over HTTP.

pub mod modules;

pub use modules::books::{
    models::{Book, BookUpdate, CreateBook},
    store::{BookStore, MemoryBookStore, MongoBookStore},
    BooksModule,
};
