//! # Body Extraction
//!
//! Handlers take `Result<Json<T>, JsonRejection>` and pass it through these
//! helpers so malformed bodies become the standard 400 error body instead of
//! Axum's plain-text rejection. Field rules (name lengths, color format,
//! URLs) are enforced by the `certreg-core` constructors, which surface as
//! 422.

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::error::AppError;

/// Extract a JSON body, mapping deserialization errors to [`AppError::BadRequest`].
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result
        .map(|Json(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract an optional JSON body.
///
/// A request without a JSON content type yields `T::default()`; a present
/// but malformed body is still a 400.
pub fn extract_optional_json<T: Default>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    match result {
        Ok(Json(v)) => Ok(v),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(err) => Err(AppError::BadRequest(err.body_text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Payload {
        #[serde(default)]
        reason: Option<String>,
    }

    async fn parse(
        content_type: Option<&str>,
        body: &'static str,
    ) -> Result<Json<Payload>, JsonRejection> {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        Json::<Payload>::from_request(builder.body(Body::from(body)).unwrap(), &()).await
    }

    #[tokio::test]
    async fn valid_body_passes() {
        let parsed = extract_json(parse(Some("application/json"), r#"{"reason":"dup"}"#).await)
            .unwrap();
        assert_eq!(parsed.reason.as_deref(), Some("dup"));
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let err = extract_json(parse(Some("application/json"), "{not json").await).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn wrong_field_type_is_bad_request() {
        let err = extract_json(parse(Some("application/json"), r#"{"reason":7}"#).await)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn absent_optional_body_defaults() {
        let parsed = extract_optional_json(parse(None, "").await).unwrap();
        assert!(parsed.reason.is_none());
    }

    #[tokio::test]
    async fn malformed_optional_body_is_bad_request() {
        let err = extract_optional_json(parse(Some("application/json"), "[").await).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
