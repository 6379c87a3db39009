//! Author handlers: list, create, read, update, delete.

use crate::error::{AppError, ErrorBody};
use crate::extractors::{FieldMap, RecordId};
use crate::model::{Author, AuthorChanges, NewAuthor};
use crate::service::AuthorService;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    responses((status = 200, description = "Every author", body = [Author]))
)]
pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let authors = AuthorService::list(state.store.as_ref()).await?;
    Ok((StatusCode::OK, Json(authors)))
}

#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    request_body = NewAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    FieldMap(body): FieldMap,
) -> Result<impl IntoResponse, AppError> {
    let author = AuthorService::create(state.store.as_ref(), body).await?;
    Ok((StatusCode::CREATED, Json(author)))
}

#[utoipa::path(
    get,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 200, description = "The author", body = Author),
        (status = 404, description = "No such author", body = ErrorBody)
    )
)]
pub async fn read(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<impl IntoResponse, AppError> {
    let author = AuthorService::read(state.store.as_ref(), id).await?;
    Ok((StatusCode::OK, Json(author)))
}

/// Serves both PUT and PATCH; only supplied fields are validated and applied.
#[utoipa::path(
    put,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i64, Path, description = "Author id")),
    request_body = AuthorChanges,
    responses(
        (status = 200, description = "Updated author", body = Author),
        (status = 404, description = "No such author", body = ErrorBody),
        (status = 422, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    RecordId(id): RecordId,
    FieldMap(body): FieldMap,
) -> Result<impl IntoResponse, AppError> {
    let author = AuthorService::update(state.store.as_ref(), id, body).await?;
    Ok((StatusCode::OK, Json(author)))
}

#[utoipa::path(
    delete,
    path = "/authors/{id}",
    tag = "authors",
    params(("id" = i64, Path, description = "Author id")),
    responses(
        (status = 204, description = "Author deleted"),
        (status = 404, description = "No such author", body = ErrorBody),
        (status = 409, description = "Author still has active books", body = ErrorBody)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    RecordId(id): RecordId,
) -> Result<impl IntoResponse, AppError> {
    AuthorService::delete(state.store.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}
