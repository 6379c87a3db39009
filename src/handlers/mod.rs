//! HTTP handlers for author and book resources.

pub mod authors;
pub mod books;
