//! OpenAPI document for the resource routes.

use crate::error::{ErrorBody, ErrorDetail, MessageBody};
use crate::handlers::{authors, books};
use crate::model::{Author, AuthorChanges, Book, BookChanges, NewAuthor, NewBook};
use axum::Json;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(title = "Bookshelf API", description = "CRUD for authors and books, with soft-deleted books and title search."),
    paths(
        authors::list,
        authors::create,
        authors::read,
        authors::update,
        authors::delete,
        books::list,
        books::create,
        books::search,
        books::read,
        books::update,
        books::delete,
    ),
    components(schemas(
        Author,
        NewAuthor,
        AuthorChanges,
        Book,
        NewBook,
        BookChanges,
        ErrorBody,
        ErrorDetail,
        MessageBody
    )),
    tags(
        (name = "authors", description = "Authors"),
        (name = "books", description = "Books; deletes are soft")
    )
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
