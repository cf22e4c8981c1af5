use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::errors::AppError;

/// JSON body extractor that reports the offending field on data errors.
///
/// Shape problems (unknown keys, wrong types, bad enum values) become
/// `AppError::Validation` with the JSON path; malformed JSON stays a 400.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        parse_json(&bytes).map(ValidJson)
    }
}

pub(crate) fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.into_inner();
        match inner.classify() {
            serde_json::error::Category::Data => {
                let field = if path == "." { "body".to_string() } else { path };
                AppError::validation(field, inner.to_string())
            }
            _ => AppError::bad_request(format!("malformed JSON body: {inner}")),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::ProfileUpdate;
    use crate::models::task::TaskCreateRequest;

    #[test]
    fn unknown_field_is_a_validation_error() {
        let err = parse_json::<ProfileUpdate>(br#"{"is_superadmin":true}"#).unwrap_err();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn bad_enum_value_names_the_field() {
        let err = parse_json::<TaskCreateRequest>(br#"{"title":"x","priority":"urgent"}"#).unwrap_err();
        match err {
            AppError::Validation { field, .. } => assert_eq!(field, "priority"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_is_a_bad_request() {
        let err = parse_json::<ProfileUpdate>(b"{not json").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
