//! JSON object body for create and update requests.

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::collections::HashMap;

/// Top-level fields of a JSON object body. A missing or blank body is an empty field set,
/// so a bodyless PATCH is an empty update. Anything that is not a JSON object is a bad request.
#[derive(Debug, Default)]
pub struct FieldMap(pub HashMap<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for FieldMap
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        // Keeps the body-limit rejection (413) as axum renders it.
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        parse_fields(&bytes).map(FieldMap).map_err(IntoResponse::into_response)
    }
}

fn parse_fields(bytes: &[u8]) -> Result<HashMap<String, Value>, AppError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(HashMap::new());
    }
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| AppError::BadRequest(format!("malformed JSON body: {}", e)))?;
    match value {
        Value::Object(m) => Ok(m.into_iter().collect()),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_body_is_empty() {
        assert!(parse_fields(b"").unwrap().is_empty());
        assert!(parse_fields(b" \n").unwrap().is_empty());
    }

    #[test]
    fn object_fields_are_kept() {
        let fields = parse_fields(br#"{"title":"Dune","author_id":1}"#).unwrap();
        assert_eq!(fields.get("title"), Some(&Value::from("Dune")));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn truncated_or_non_object_json_is_a_bad_request() {
        assert!(matches!(parse_fields(br#"{"title":"#), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_fields(b"[1,2]"), Err(AppError::BadRequest(_))));
    }
}
