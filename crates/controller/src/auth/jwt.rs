// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use db_storage::users::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Token Verification errors
///
/// The error messages will get displayed in a HTTP 401 response
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Not a valid JWT ({0})")]
    InvalidJwt(String),
    #[error("JWT has invalid claims")]
    InvalidClaims,
    #[error("JWT token expired")]
    Expired,
    #[error("JWT has an invalid signature")]
    InvalidSignature,
    #[error("JWT was issued by an unknown issuer")]
    InvalidIssuer,
}

/// Claims of the access tokens handed out by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject, the id of the user
    pub sub: UserId,
    /// Expires at, seconds since the unix epoch
    pub exp: i64,
    /// Issuer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Builds the validation rules for HS256 signed access tokens
pub(super) fn validation(issuer: Option<&str>, leeway: u64) -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = leeway;
    validation.validate_exp = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    if let Some(issuer) = issuer {
        validation.set_issuer(&[issuer]);
    }

    validation
}

/// Verify a raw JWT.
///
/// Returns `Err(_)` if the JWT is malformed, badly signed, issued by someone else or expired.
pub fn verify(
    key: &DecodingKey,
    validation: &Validation,
    token: &str,
) -> Result<AccessTokenClaims, VerifyError> {
    let token = decode::<AccessTokenClaims>(token, key, validation).map_err(|e| {
        log::debug!("Rejected access token, {}", e);

        match e.kind() {
            ErrorKind::ExpiredSignature => VerifyError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                VerifyError::InvalidSignature
            }
            ErrorKind::InvalidIssuer => VerifyError::InvalidIssuer,
            ErrorKind::Json(_) | ErrorKind::MissingRequiredClaim(_) => VerifyError::InvalidClaims,
            _ => VerifyError::InvalidJwt(e.to_string()),
        }
    })?;

    Ok(token.claims)
}

#[cfg(test)]
mod test {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use pretty_assertions::assert_eq;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"access-token-secret";

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn sign(claims: &AccessTokenClaims, secret: &[u8]) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    fn claims(exp: i64, iss: Option<&str>) -> AccessTokenClaims {
        AccessTokenClaims {
            sub: UserId::from(uuid::Uuid::from_u128(0xdead_beef)),
            exp,
            iss: iss.map(Into::into),
        }
    }

    #[test]
    fn valid_jwt() {
        let token = sign(&claims(now() + 200, None), SECRET);

        let verified = verify(
            &DecodingKey::from_secret(SECRET),
            &validation(None, 0),
            &token,
        )
        .expect("Valid JWT failed to verify");

        assert_eq!(
            verified.sub,
            UserId::from(uuid::Uuid::from_u128(0xdead_beef))
        );
    }

    #[test]
    fn expired_jwt() {
        let token = sign(&claims(now() - 100, None), SECRET);

        let result = verify(
            &DecodingKey::from_secret(SECRET),
            &validation(None, 0),
            &token,
        );

        assert_eq!(result.unwrap_err(), VerifyError::Expired);
    }

    #[test]
    fn leeway_accepts_recently_expired_jwt() {
        let token = sign(&claims(now() - 10, None), SECRET);

        verify(
            &DecodingKey::from_secret(SECRET),
            &validation(None, 30),
            &token,
        )
        .unwrap();
    }

    #[test]
    fn bad_signature() {
        let token = sign(&claims(now() + 200, None), b"some other secret");

        let result = verify(
            &DecodingKey::from_secret(SECRET),
            &validation(None, 0),
            &token,
        );

        assert_eq!(result.unwrap_err(), VerifyError::InvalidSignature);
    }

    #[test]
    fn wrong_issuer() {
        let token = sign(&claims(now() + 200, Some("https://other.example")), SECRET);

        let result = verify(
            &DecodingKey::from_secret(SECRET),
            &validation(Some("https://idp.example"), 0),
            &token,
        );

        assert_eq!(result.unwrap_err(), VerifyError::InvalidIssuer);
    }

    #[test]
    fn garbage_is_not_a_jwt() {
        let result = verify(
            &DecodingKey::from_secret(SECRET),
            &validation(None, 0),
            "definitely.not.a-jwt",
        );

        assert!(matches!(
            result,
            Err(VerifyError::InvalidJwt(_)) | Err(VerifyError::InvalidClaims)
        ));
    }
}
