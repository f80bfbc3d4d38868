//! Validated JSON extractor.

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use common::AppError;

/// JSON extractor that automatically validates the payload.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation(e.body_text()))?;

        value
            .validate()
            .map_err(|e| AppError::validation(first_message(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// First validation message, or the offending field's name when it has none.
fn first_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .into_iter()
        .next()
        .map(|(field, errors)| {
            errors
                .first()
                .and_then(|error| error.message.as_ref())
                .map(|msg| msg.to_string())
                .unwrap_or_else(|| format!("Invalid value for '{}'", field))
        })
        .unwrap_or_else(|| "Validation failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Title is required"))]
        title: String,
        #[validate(range(min = 1))]
        amount: i64,
    }

    #[test]
    fn test_uses_declared_message() {
        let sample = Sample {
            title: String::new(),
            amount: 5,
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(first_message(&errors), "Title is required");
    }

    #[test]
    fn test_falls_back_to_field_name() {
        let sample = Sample {
            title: "Spanish A1".to_string(),
            amount: 0,
        };
        let errors = sample.validate().unwrap_err();
        assert_eq!(first_message(&errors), "Invalid value for 'amount'");
    }
}
