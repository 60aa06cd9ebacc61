use axum::extract::rejection::{JsonRejection, QueryRejection};
use validator::Validate;

use crate::error::{ApiError, FieldError};

pub fn validate<T: Validate>(value: &T) -> Result<(), ApiError> {
    value.validate().map_err(|err| {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| FieldError {
                    field: field.clone(),
                    message: error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| error.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|left, right| left.field.cmp(&right.field));
        ApiError::Validation {
            developer_message: None,
            fields,
        }
    })
}

pub fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

pub fn query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "must not be empty"))]
        name: String,
        #[validate(length(min = 1))]
        user_uuid: String,
    }

    #[test]
    fn field_errors_are_listed_per_field() {
        let sample = Sample {
            name: String::new(),
            user_uuid: String::new(),
        };
        let err = validate(&sample).expect_err("invalid");
        let ApiError::Validation { fields, .. } = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            fields,
            vec![
                FieldError {
                    field: "name".to_string(),
                    message: "must not be empty".to_string(),
                },
                FieldError {
                    field: "user_uuid".to_string(),
                    message: "length".to_string(),
                },
            ]
        );
    }

    #[test]
    fn valid_values_pass() {
        let sample = Sample {
            name: "Work".to_string(),
            user_uuid: "u1".to_string(),
        };
        assert!(validate(&sample).is_ok());
    }
}
