// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Error response types for REST APIv1
use super::{
    CODE_ACCESS_TOKEN_EXPIRED, CODE_INVALID_ACCESS_TOKEN, CODE_INVALID_LENGTH, CODE_INVALID_VALUE,
    CODE_MISSING_VALUE, CODE_OUT_OF_RANGE, CODE_VALUE_REQUIRED,
};
use crate::services::ServiceError;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::header::{self, HeaderValue, TryIntoHeaderValue};
use actix_web::http::StatusCode;
use actix_web::HttpRequest;
use actix_web::{body::BoxBody, HttpResponse, ResponseError};
use actix_web_httpauth::headers::www_authenticate::bearer::{Bearer, Error};
use database::DatabaseError;
use diesel::result::DatabaseErrorKind;
use itertools::Itertools;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use validator::ValidationErrors;

/// Error handler for the actix JSON extractor
///
/// Gets called when a incoming request results in an [`JsonPayloadError`].
/// Returns a `Bad Request` [`ApiError`] error with an appropriate error code and message.
pub fn json_error_handler(err: JsonPayloadError, _: &HttpRequest) -> actix_web::error::Error {
    let error_code = match err {
        JsonPayloadError::OverflowKnownLength { .. } | JsonPayloadError::Overflow { .. } => {
            "payload_overflow"
        }
        JsonPayloadError::ContentType => "invalid_content_type",
        JsonPayloadError::Deserialize(_) | JsonPayloadError::Serialize(_) => "invalid_json",
        _ => "invalid_payload",
    };
    ApiError::bad_request()
        .with_code(error_code)
        .with_message(err.to_string())
        .into()
}

/// Error handler for the actix query extractor, used for the pagination parameters
pub fn query_error_handler(err: QueryPayloadError, _: &HttpRequest) -> actix_web::error::Error {
    ApiError::bad_request()
        .with_code("invalid_query")
        .with_message(err.to_string())
        .into()
}

#[derive(Debug, Serialize)]
struct StandardErrorBody {
    // Machine readable error code
    code: Cow<'static, str>,
    // Human readable message
    message: Cow<'static, str>,
}

#[derive(Debug, Serialize)]
pub struct ValidationErrorEntry {
    /// The field related to the error
    /// It's a struct level error when no field is set
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Cow<'static, str>>,
    /// Machine readable error message
    code: Cow<'static, str>,
    /// Human readable error message
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<Cow<'static, str>>,
}

#[derive(Debug, Serialize)]
struct ValidationErrorBody {
    code: Cow<'static, str>,
    message: Cow<'static, str>,
    errors: Vec<ValidationErrorEntry>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ErrorBody {
    /// The standard error body
    Standard(StandardErrorBody),
    /// Special error body for validation errors
    Validation(ValidationErrorBody),
}

/// Error variants for the WWW Authenticate header
#[derive(Debug, Clone, Copy)]
pub enum AuthenticationError {
    MissingAccessToken,
    InvalidAccessToken,
    AccessTokenExpired,
    UnknownUser,
}

impl AuthenticationError {
    fn error(&self) -> Error {
        match self {
            Self::MissingAccessToken => Error::InvalidRequest,
            Self::InvalidAccessToken | Self::AccessTokenExpired | Self::UnknownUser => {
                Error::InvalidToken
            }
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::AccessTokenExpired => CODE_ACCESS_TOKEN_EXPIRED,
            _ => CODE_INVALID_ACCESS_TOKEN,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MissingAccessToken => "The request carries no bearer token",
            Self::InvalidAccessToken => "The provided access token is invalid",
            Self::AccessTokenExpired => "The provided access token expired",
            Self::UnknownUser => "The provided access token belongs to no known user",
        }
    }
}

/// The default REST API error
///
/// Can be build via the associated functions to represent various HTTP errors. Each
/// HTTP error has their default error code and message that get send in a JSON body.
/// The error code and message can be overwritten when creating an error.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    www_authenticate: Option<HeaderValue>,
    body: ErrorBody,
}

impl ApiError {
    fn new_standard<T>(status: StatusCode, code: T, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        Self {
            status,
            www_authenticate: None,
            body: ErrorBody::Standard(StandardErrorBody {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// Override the default code for an error
    pub fn with_code<T>(mut self, code: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        match &mut self.body {
            ErrorBody::Standard(std) => std.code = code.into(),
            ErrorBody::Validation(val) => val.code = code.into(),
        }

        self
    }

    /// Override the default message for an error
    pub fn with_message<T>(mut self, message: T) -> Self
    where
        T: Into<Cow<'static, str>>,
    {
        match &mut self.body {
            ErrorBody::Standard(std) => std.message = message.into(),
            ErrorBody::Validation(val) => val.message = message.into(),
        }

        self
    }

    /// Add an WWW Authenticate header to a response
    pub fn with_www_authenticate(mut self, authentication_error: AuthenticationError) -> Self {
        self.www_authenticate = Bearer::build()
            .error_description(authentication_error.message())
            .error(authentication_error.error())
            .finish()
            .try_into_value()
            .map_err(|e| log::error!("Unable to build WWW-Authenticate header, {}", e))
            .ok();

        self
    }

    /// Create a 401 Unauthorized error for the failed bearer authentication
    pub fn authentication(authentication_error: AuthenticationError) -> Self {
        Self::unauthorized()
            .with_code(authentication_error.code())
            .with_message(authentication_error.message())
            .with_www_authenticate(authentication_error)
    }

    /// Create a new 400 Bad Request error
    pub fn bad_request() -> Self {
        Self::new_standard(
            StatusCode::BAD_REQUEST,
            "bad_request",
            "Invalid request due to malformed syntax",
        )
    }

    /// Create a new 401 Unauthorized error
    pub fn unauthorized() -> Self {
        Self::new_standard(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Authentication failed",
        )
    }

    /// Create a new 403 Forbidden error
    pub fn forbidden() -> Self {
        Self::new_standard(
            StatusCode::FORBIDDEN,
            "forbidden",
            "Access to the requested resource is forbidden",
        )
    }

    /// Create a new 404 Not Found error
    pub fn not_found() -> Self {
        Self::new_standard(
            StatusCode::NOT_FOUND,
            "not_found",
            "A requested resource could not be found",
        )
    }

    /// Create a new 409 Conflict error
    pub fn conflict() -> Self {
        Self::new_standard(
            StatusCode::CONFLICT,
            "conflict",
            "The request conflicts with the state of the resource",
        )
    }

    /// Create a new 400 Bad Request error listing the invalid fields
    ///
    /// This error is normally created from [`ValidationErrors`] from the validator crate.
    /// The JSON body for this error additionally contains a list of errors for each invalid field.
    pub fn invalid_values<I>(errors: I) -> Self
    where
        I: IntoIterator<Item = ValidationErrorEntry>,
    {
        Self {
            status: StatusCode::BAD_REQUEST,
            www_authenticate: None,
            body: ErrorBody::Validation(ValidationErrorBody {
                code: "validation_failed".into(),
                message: "Some provided values are invalid".into(),
                errors: errors.into_iter().collect(),
            }),
        }
    }

    /// Create a new 500 Internal Server Error
    pub fn internal() -> Self {
        Self::new_standard(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_server_error",
            "An internal server error occurred",
        )
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.body {
            ErrorBody::Standard(StandardErrorBody { code, message }) => {
                write!(
                    f,
                    "status={}, code={}, message={}",
                    self.status, code, message
                )
            }
            ErrorBody::Validation(ValidationErrorBody {
                code,
                message,
                errors,
            }) => {
                write!(
                    f,
                    "status={}, code={}, message={}, errors={}",
                    self.status,
                    code,
                    message,
                    serde_json::to_string(errors)
                        .unwrap_or_else(|_| "unserializable errors".to_string())
                )
            }
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse<BoxBody> {
        let body = match serde_json::to_string(&self.body) {
            Ok(body) => body,
            Err(e) => {
                log::error!("Unable to serialize API error body, {}", e);
                return HttpResponse::InternalServerError().finish();
            }
        };

        let mut response = HttpResponse::new(self.status_code());

        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        if let Some(www_authenticate) = self.www_authenticate.clone() {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, www_authenticate);
        }

        response.set_body(BoxBody::new(body))
    }
}

impl From<crate::BlockingError> for ApiError {
    fn from(e: crate::BlockingError) -> Self {
        log::error!("REST API threw internal error from blocking error: {}", e);
        Self::internal()
    }
}

impl From<DatabaseError> for ApiError {
    fn from(db_error: DatabaseError) -> Self {
        match db_error {
            DatabaseError::NotFound => Self::not_found(),
            e if e.is_unique_violation() => Self::conflict(),
            DatabaseError::DieselError(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::ForeignKeyViolation,
                _,
            )) => Self::conflict(),
            e => {
                log::error!("REST API threw internal error from database error: {}", e);
                Self::internal()
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::NotFound(_) => Self::not_found().with_message(e.to_string()),
            ServiceError::Conflict { code, message } => {
                Self::conflict().with_code(code).with_message(message)
            }
            ServiceError::Forbidden(message) => Self::forbidden().with_message(message),
            ServiceError::Validation(errors) => Self::from(errors),
            ServiceError::Database(e) => Self::from(e),
        }
    }
}

impl From<ValidationErrors> for ApiError {
    /// Creates a 400 Bad Request response from the [`ValidationErrors`]
    ///
    /// Errors of nested structs are reported as if the struct was flattened in its JSON
    /// representation, so equally named fields of the outer and the inner struct cannot be
    /// told apart.
    fn from(validation_errors: ValidationErrors) -> Self {
        let mut entries = Vec::with_capacity(validation_errors.errors().len());

        collect_validation_errors(validation_errors, &mut entries);

        Self::invalid_values(entries)
    }
}

/// Convert [`ValidationErrors`] into multiple [`ValidationErrorEntries`](ValidationErrorEntry) and collect them in `entries`
fn collect_validation_errors(
    validation_errors: ValidationErrors,
    entries: &mut Vec<ValidationErrorEntry>,
) {
    for (field, error_kind) in validation_errors.into_errors() {
        let field: Option<Cow<'static, str>> = match field {
            "__all__" => None,
            field => Some(field.into()),
        };

        match error_kind {
            validator::ValidationErrorsKind::Field(v) => {
                for error in v {
                    entries.push(ValidationErrorEntry {
                        field: field.clone(),
                        code: convert_validation_code(&error.code),
                        message: error.message,
                    });
                }
            }
            validator::ValidationErrorsKind::Struct(inner_errors) => {
                collect_validation_errors(*inner_errors, entries);
            }
            validator::ValidationErrorsKind::List(list) => {
                let invalid_indexes = list.keys().take(15).join(", ");

                entries.push(ValidationErrorEntry {
                    field,
                    code: "invalid_values".into(),
                    message: Some(format!("Invalid values at index {invalid_indexes}").into()),
                })
            }
        };
    }
}

/// Maps the codes of the built-in validators, custom codes are kept as they are
fn convert_validation_code(code: &Cow<'static, str>) -> Cow<'static, str> {
    match code.as_ref() {
        "length" => CODE_INVALID_LENGTH.into(),
        "range" => CODE_OUT_OF_RANGE.into(),
        "required" => CODE_VALUE_REQUIRED.into(),
        "empty" => CODE_MISSING_VALUE.into(),
        "" => CODE_INVALID_VALUE.into(),
        _ => code.clone(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::services::CODE_CAPACITY_EXCEEDED;
    use pretty_assertions::assert_eq;
    use test_util::*;
    use validator::Validate;

    #[derive(Debug, Validate)]
    struct ValidationTester {
        #[validate(length(min = 1, max = 5))]
        title: String,
        #[validate(range(min = 1))]
        max_participants: i32,
        #[validate(required)]
        starts_at: Option<i64>,
        #[validate]
        location: InnerValidationTester,
    }

    #[derive(Debug, Validate)]
    struct InnerValidationTester {
        #[validate(length(max = 3, message = "Location too long"))]
        room: String,
    }

    #[test]
    fn api_validation_error() {
        let tester = ValidationTester {
            title: "looong".into(),
            max_participants: 0,
            starts_at: None,
            location: InnerValidationTester {
                room: "Room 42".into(),
            },
        };

        let mut api_error = match tester.validate() {
            Ok(_) => panic!("Validation should fail"),
            Err(err) => ApiError::from(err),
        };

        match &mut api_error.body {
            ErrorBody::Standard(_) => panic!("Expected validation error body"),
            ErrorBody::Validation(val) => val.errors.sort_by(|a, b| a.field.cmp(&b.field)),
        }

        assert_eq!(api_error.status, StatusCode::BAD_REQUEST);
        assert_eq_json!(
            api_error.body,
            {
                "code": "validation_failed",
                "message": "Some provided values are invalid",
                "errors": [
                  {
                    "field": "max_participants",
                    "code": "out_of_range"
                  },
                  {
                    "field": "room",
                    "code": "invalid_length",
                    "message": "Location too long"
                  },
                  {
                    "field": "starts_at",
                    "code": "value_required",
                  },
                  {
                    "field": "title",
                    "code": "invalid_length"
                  }
                ]
            }
        );
    }

    #[test]
    fn conflict_keeps_code_and_message() {
        let error = ApiError::from(ServiceError::capacity_exceeded());

        assert_eq!(error.status_code(), StatusCode::CONFLICT);
        assert_eq_json!(
            error.body,
            {
                "code": CODE_CAPACITY_EXCEEDED,
                "message": "The event has reached its maximum number of participants"
            }
        );
    }

    #[test]
    fn service_errors_map_to_status_codes() {
        assert_eq!(
            ApiError::from(ServiceError::NotFound("event")).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ServiceError::Forbidden("nope")).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::from(ServiceError::Database(DatabaseError::Custom("boom".into())))
                .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );

        let tester = InnerValidationTester {
            room: "Room 42".into(),
        };
        let errors = tester.validate().unwrap_err();
        let error = ApiError::from(ServiceError::Validation(errors));

        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
        assert!(matches!(error.body, ErrorBody::Validation(_)));
    }

    #[test]
    fn not_found_names_the_entity() {
        let error = ApiError::from(ServiceError::NotFound("invitation"));

        assert_eq_json!(
            error.body,
            {
                "code": "not_found",
                "message": "The requested invitation could not be found"
            }
        );
    }

    #[test]
    fn authentication_error_sets_www_authenticate() {
        let error = ApiError::authentication(AuthenticationError::AccessTokenExpired);
        let response = error.error_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        assert_eq_json!(
            error.body,
            {
                "code": "access_token_expired",
                "message": "The provided access token expired"
            }
        );
    }

    #[test]
    fn api_error_with_code() {
        let error = ApiError::not_found().with_code("custom_code");

        assert_eq_json!(
            error.body,
            {
                "code": "custom_code",
                "message": "A requested resource could not be found"
            }
        );
    }
}
