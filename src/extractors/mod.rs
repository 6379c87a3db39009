//! Request extractors.

mod body;
mod id;
pub use body::FieldMap;
pub use id::RecordId;
