// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Bearer token verification
//!
//! Tokens are issued elsewhere and signed with a shared HS256 secret. The `sub` claim carries the
//! id of the user, which must exist in the database.
use controller_shared::settings::Authentication;
use jsonwebtoken::{DecodingKey, Validation};

mod jwt;

pub use jwt::{AccessTokenClaims, VerifyError};

/// Verifies access tokens with the configured secret
pub struct AuthContext {
    key: DecodingKey,
    validation: Validation,
}

impl AuthContext {
    pub fn from_settings(settings: &Authentication) -> Self {
        Self {
            key: DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
            validation: jwt::validation(settings.issuer.as_deref(), settings.leeway),
        }
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, VerifyError> {
        jwt::verify(&self.key, &self.validation, token)
    }
}
