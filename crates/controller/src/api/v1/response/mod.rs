// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Response types for REST APIv1
//!
//! These all implement the [`Responder`] trait.
use actix_web::{body::BoxBody, HttpResponse, Responder};
use serde::Serialize;

pub mod error;
mod ok;

pub use error::{ApiError, AuthenticationError};
pub use ok::ApiResponse;

/// The default API Result
pub type DefaultApiResult<T> = Result<ApiResponse<T>, ApiError>;

// Validation error codes
pub const CODE_INVALID_LENGTH: &str = "invalid_length";
pub const CODE_OUT_OF_RANGE: &str = "out_of_range";
pub const CODE_VALUE_REQUIRED: &str = "value_required";
pub const CODE_MISSING_VALUE: &str = "missing_value";
pub const CODE_INVALID_VALUE: &str = "invalid_value";

// Authentication error codes
pub const CODE_INVALID_ACCESS_TOKEN: &str = "invalid_access_token";
pub const CODE_ACCESS_TOKEN_EXPIRED: &str = "access_token_expired";
pub const CODE_USER_BLOCKED: &str = "user_blocked";

/// Represents a 201 Created HTTP Response with the created resource as JSON body
pub struct Created<T>(pub T);

impl<T: Serialize> Responder for Created<T> {
    type Body = BoxBody;

    fn respond_to(self, _: &actix_web::HttpRequest) -> HttpResponse {
        HttpResponse::Created().json(self.0)
    }
}

/// Represents a 204 No Content HTTP Response
pub struct NoContent;

impl Responder for NoContent {
    type Body = BoxBody;

    fn respond_to(self, _: &actix_web::HttpRequest) -> HttpResponse {
        HttpResponse::NoContent().finish()
    }
}
