//! Author and book operations on top of the repository traits.

mod authors;
mod books;
pub mod validation;
pub use authors::AuthorService;
pub use books::BookService;
pub use validation::RequestValidator;
