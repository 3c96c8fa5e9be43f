use anyhow::anyhow;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::utils::errors::AppError;

/// Walks the error tree depth-first so nested DTOs (e.g. the registration
/// payload's inner profile struct) surface their messages too.
fn collect_messages(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", path));
                    out.push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => collect_messages(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_messages(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

fn format_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, "", &mut messages);
    messages.join(", ")
}

/// `Json<T>` that additionally runs the payload's `Validate` impl, turning
/// deserialization problems into readable 400s and validation failures into
/// 422s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::new(StatusCode::BAD_REQUEST, body_error(&rejection)))?;

        value.validate().map_err(|errors| {
            AppError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                anyhow!("{}", format_errors(&errors)),
            )
        })?;

        Ok(ValidatedJson(value))
    }
}

fn body_error(rejection: &JsonRejection) -> anyhow::Error {
    if matches!(rejection, JsonRejection::MissingJsonContentType(_)) {
        return anyhow!("Missing 'Content-Type: application/json' header");
    }

    let text = rejection.body_text();
    if let Some(rest) = text.split("missing field `").nth(1) {
        let field = rest.split('`').next().unwrap_or("unknown");
        return anyhow!("{} is required", field);
    }
    if text.contains("invalid type") {
        return anyhow!("Invalid field type in request");
    }

    anyhow!("Invalid request body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Inner {
        #[validate(email(message = "A valid email is required"))]
        email: String,
    }

    #[derive(Debug, Deserialize, Validate)]
    struct Outer {
        #[validate(nested)]
        user: Inner,
        #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
        password: String,
    }

    #[test]
    fn test_format_errors_uses_messages() {
        let inner = Inner {
            email: "nope".to_string(),
        };
        let errors = inner.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "A valid email is required");
    }

    #[test]
    fn test_format_errors_reaches_nested_fields() {
        let outer = Outer {
            user: Inner {
                email: "nope".to_string(),
            },
            password: "ok-password".to_string(),
        };
        let errors = outer.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "A valid email is required");
    }

    #[test]
    fn test_format_errors_joins_multiple() {
        let outer = Outer {
            user: Inner {
                email: "valid@example.com".to_string(),
            },
            password: "abc".to_string(),
        };
        let errors = outer.validate().unwrap_err();
        assert_eq!(format_errors(&errors), "Password must be at least 4 characters");
    }
}
