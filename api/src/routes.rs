// ./api/src/routes.rs
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json as JsonResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use application::{ApplicationError, CatalogService, StatsService};
use domain::{Book, BookId};

/// Shared handles injected into every handler.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogService>,
    pub stats_service: Arc<StatsService>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/stats", get(get_stats_handler))
        // Book Endpoints
        .route("/books", get(list_books_handler).post(create_book_handler))
        .route("/books/search", get(search_books_handler))
        .route("/search", get(search_books_handler)) // Short alias
        .route(
            "/books/:id",
            get(get_book_handler)
                .put(update_book_handler)
                .delete(delete_book_handler),
        )
        .with_state(state)
}

// --- API Errors ---

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("Book '{0}' not found")]
    BookNotFound(BookId),
    #[error(transparent)]
    Application(#[from] ApplicationError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid book payload: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BookNotFound(id) => (StatusCode::NOT_FOUND, format!("Book '{}' not found", id)),
            ApiError::Application(err) => map_application_error(err),
        };
        (status, JsonResponse(ErrorBody { error: message })).into_response()
    }
}

/// Maps ApplicationError to an HTTP status and a client-facing message.
fn map_application_error(err: ApplicationError) -> (StatusCode, String) {
    match err {
        ApplicationError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        ApplicationError::DomainError(domain_err) => {
            warn!("Domain validation failed: {}", domain_err);
            (StatusCode::BAD_REQUEST, domain_err.to_string())
        }
        ApplicationError::SearchTimedOut(limit) => {
            error!("Search timed out after {:?}", limit);
            (
                StatusCode::GATEWAY_TIMEOUT,
                "Search did not finish in time".to_string(),
            )
        }
        ApplicationError::StorageUnavailable(msg) => {
            error!("Storage unavailable: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Could not save books data".to_string(),
            )
        }
        other @ (ApplicationError::DecodeError(_)
        | ApplicationError::SearchError(_)
        | ApplicationError::InfrastructureError(_)) => {
            error!("Underlying infrastructure error: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "An internal server error occurred".to_string(),
            )
        }
    }
}

// --- API Handlers ---

async fn health_check() -> impl IntoResponse {
    info!("Health check endpoint called");
    (StatusCode::OK, "OK")
}

async fn get_stats_handler(State(state): State<AppState>) -> Result<Response, ApiError> {
    info!("Received request to get statistics");
    let stats = state.stats_service.get_stats().await.map_err(|e| {
        error!("Failed to get statistics via handler: {}", e);
        e
    })?;
    Ok((StatusCode::OK, JsonResponse(stats)).into_response())
}

/// Handler for listing every book (GET /books).
async fn list_books_handler(State(state): State<AppState>) -> Response {
    let books = state.catalog.get_all().await;
    info!(count = books.len(), "Listing books");
    (StatusCode::OK, JsonResponse(books)).into_response()
}

/// Handler for creating a book (POST /books).
async fn create_book_handler(
    State(state): State<AppState>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(book) = payload?;
    info!(title = %book.title, "Received request to create book");
    let created = state.catalog.create(book).await?;
    Ok((StatusCode::CREATED, JsonResponse(created)).into_response())
}

/// Handler for fetching one book (GET /books/:id).
async fn get_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = BookId::new(id);
    match state.catalog.get_by_id(&id).await? {
        Some(book) => Ok((StatusCode::OK, JsonResponse(book)).into_response()),
        None => Err(ApiError::BookNotFound(id)),
    }
}

/// Handler for replacing a book (PUT /books/:id).
async fn update_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Book>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(book) = payload?;
    let id = BookId::new(id);
    info!(book_id = %id, "Received request to update book");
    match state.catalog.update(&id, book).await? {
        Some(updated) => Ok((StatusCode::OK, JsonResponse(updated)).into_response()),
        None => Err(ApiError::BookNotFound(id)),
    }
}

/// Handler for deleting a book (DELETE /books/:id).
async fn delete_book_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = BookId::new(id);
    info!(book_id = %id, "Received request to delete book");
    if state.catalog.delete(&id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::BookNotFound(id))
    }
}

#[derive(Deserialize, Debug)]
struct SearchParams {
    q: Option<String>,
}

/// Handler for keyword search (GET /books/search?q=... or /search?q=...).
async fn search_books_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let Some(keyword) = params.q else {
        return Err(ApiError::BadRequest(
            "No search keyword provided".to_string(),
        ));
    };
    info!(keyword = %keyword, "Received search request");
    let hits = state.catalog.search(&keyword).await?;
    Ok((StatusCode::OK, JsonResponse(hits)).into_response())
}
