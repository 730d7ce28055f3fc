pub mod models;
pub mod routes;
pub mod store;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use booklist_kernel::{settings::Settings, InitCtx, Module};

use routes::BooksState;
use store::BookStore;

/// The book collection: CRUD routes over an injected [`BookStore`].
pub struct BooksModule {
    state: BooksState,
}

impl BooksModule {
    pub fn new(store: Arc<dyn BookStore>, settings: &Settings) -> Self {
        Self {
            state: BooksState::new(
                store,
                settings.database.operation_timeout(),
                settings.books.strict_updates,
            ),
        }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        // Startup does not wait for the store; requests fail until it is up.
        if let Err(e) = store::bounded(
            ctx.settings.database.operation_timeout(),
            self.state.store().ping(),
        )
        .await
        {
            tracing::warn!(module = self.name(), error = %e, "book store is not reachable");
        }

        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            backend = ?ctx.settings.database.backend,
            strict_updates = ctx.settings.books.strict_updates,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let envelope = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Envelope" }
                    }
                }
            })
        };
        let id_parameter = serde_json::json!({
            "name": "id",
            "in": "path",
            "required": true,
            "description": "Book identifier (24-character hex ObjectId)",
            "schema": { "type": "string" }
        });
        let create = serde_json::json!({
            "summary": "Create a book",
            "tags": ["Books"],
            "requestBody": {
                "required": true,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/CreateBook" }
                    }
                }
            },
            "responses": {
                "201": envelope("Created; data holds `book` and `inserted_id`"),
                "400": envelope("Malformed body or validation failure"),
                "500": envelope("Store failure")
            }
        });

        Some(serde_json::json!({
            "paths": {
                "/books": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "responses": {
                            "200": envelope("All books under data.books"),
                            "500": envelope("Store failure")
                        }
                    },
                    "post": create.clone()
                },
                "/book": {
                    "post": create
                },
                "/book/{id}": {
                    "put": {
                        "summary": "Partially update a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/BookUpdate" }
                                }
                            }
                        },
                        "responses": {
                            "200": envelope("Updated; data.book echoes the request"),
                            "400": envelope("Malformed body, identifier, or validation failure"),
                            "500": envelope("Store failure")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book",
                        "tags": ["Books"],
                        "parameters": [id_parameter],
                        "responses": {
                            "200": envelope("Deleted"),
                            "400": envelope("Malformed identifier"),
                            "500": envelope("Store failure")
                        }
                    }
                },
                "/books/health": {
                    "get": {
                        "summary": "Book store health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "OK",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            },
                            "500": envelope("Store unreachable")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "_id": { "type": "string", "description": "Unique identifier" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "year": { "type": "integer", "format": "int64" },
                            "created_at": { "type": "string", "format": "date-time" },
                            "updated_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["_id", "title", "author", "year", "created_at", "updated_at"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1 },
                            "author": { "type": "string", "minLength": 1 },
                            "year": { "type": "integer", "format": "int64" }
                        },
                        "required": ["title", "author", "year"]
                    },
                    "BookUpdate": {
                        "type": "object",
                        "description": "Omitted or null fields are left unchanged",
                        "properties": {
                            "title": { "type": ["string", "null"] },
                            "author": { "type": ["string", "null"] },
                            "year": { "type": ["integer", "null"], "format": "int64" }
                        }
                    }
                }
            }
        }))
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(store: Arc<dyn BookStore>, settings: &Settings) -> Arc<dyn Module> {
    Arc::new(BooksModule::new(store, settings))
}
