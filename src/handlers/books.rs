//! Book handlers: list, create, read, update, soft delete, title search.

use crate::error::{AppError, ErrorBody, MessageBody};
use crate::extractors::{FieldMap, RecordId};
use crate::model::{Book, BookChanges, NewBook};
use crate::service::BookService;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::collections::HashMap;

#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    responses((status = 200, description = "Every book that is not deleted", body = [Book]))
)]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let books = BookService::list(state.store.as_ref()).await?;
    Ok((StatusCode::OK, Json(books)))
}

#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    FieldMap(body): FieldMap,
) -> Result<impl IntoResponse, AppError> {
    let book = BookService::create(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 200, description = "The book", body = Book),
        (status = 404, description = "No such book, or it was deleted", body = ErrorBody)
    )
)]
pub async fn read(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<impl IntoResponse, AppError> {
    let book = BookService::read(state.store.as_ref(), id).await?;
    Ok((StatusCode::OK, Json(book)))
}

/// Serves both PUT and PATCH.
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    request_body = BookChanges,
    responses(
        (status = 200, description = "Updated book", body = Book),
        (status = 404, description = "No such book, or it was deleted", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    FieldMap(body): FieldMap,
) -> Result<impl IntoResponse, AppError> {
    let book = BookService::update(state.store.as_ref(), id, body).await?;
    Ok((StatusCode::OK, Json(book)))
}

#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    params(("id" = i64, Path, description = "Book id")),
    responses(
        (status = 204, description = "Book soft-deleted"),
        (status = 404, description = "No such book, or it was already deleted", body = ErrorBody)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<impl IntoResponse, AppError> {
    BookService::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/books/search",
    tag = "books",
    params(("title" = String, Query, description = "Substring to look for in book titles")),
    responses(
        (status = 200, description = "Matching books", body = [Book]),
        (status = 404, description = "Nothing matched", body = MessageBody),
        (status = 422, description = "Missing or empty title", body = ErrorBody)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let books = BookService::search(state.store.as_ref(), params).await?;
    Ok((StatusCode::OK, Json(books)))
}
