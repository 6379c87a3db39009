//! Author and book resource routes.

use crate::handlers::{authors, books};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn author_routes(state: AppState) -> Router {
    Router::new()
        .route("/authors", get(authors::list).post(authors::create))
        .route(
            "/authors/:id",
            get(authors::read)
                .put(authors::update)
                .patch(authors::update)
                .delete(authors::delete),
        )
        .with_state(state)
}

/// `/books/search` is a literal route registered ahead of `/books/:id`, so "search" is never read as an id.
pub fn book_routes(state: AppState) -> Router {
    Router::new()
        .route("/books", get(books::list).post(books::create))
        .route("/books/search", get(books::search))
        .route(
            "/books/:id",
            get(books::read)
                .put(books::update)
                .patch(books::update)
                .delete(books::delete),
        )
        .with_state(state)
}
