// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Handles user Authentication in API requests
use crate::api::v1::response::{ApiError, AuthenticationError, CODE_USER_BLOCKED};
use crate::auth::{AuthContext, VerifyError};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::error::Error;
use actix_web::http::header::Header;
use actix_web::web::Data;
use actix_web::{HttpMessage, ResponseError};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use database::{Db, DatabaseError};
use db_storage::users::User;
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;

/// Middleware factory
///
/// Transforms into [`BearerAuthMiddleware`]
pub struct BearerAuth {
    pub db: Data<Db>,
    pub auth: Data<AuthContext>,
}

impl<S> Transform<S, ServiceRequest> for BearerAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Transform = BearerAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(BearerAuthMiddleware {
            service: Rc::new(service),
            db: self.db.clone(),
            auth: self.auth.clone(),
        }))
    }
}

/// Authentication middleware
///
/// Whenever an API request is received, the BearerAuthMiddleware will validate the access
/// token and provide the associated user as [`ReqData`](actix_web::web::ReqData) for the subsequent services.
pub struct BearerAuthMiddleware<S> {
    service: Rc<S>,
    db: Data<Db>,
    auth: Data<AuthContext>,
}

impl<S> Service<ServiceRequest> for BearerAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let db = self.db.clone();
        let auth = self.auth.clone();

        let token = match Authorization::<Bearer>::parse(&req) {
            Ok(authorization) => authorization.into_scheme().token().to_string(),
            Err(e) => {
                log::debug!("Unable to parse access token, {}", e);
                let error = ApiError::authentication(AuthenticationError::MissingAccessToken);
                let response = req.into_response(error.error_response());
                return Box::pin(ready(Ok(response)));
            }
        };

        Box::pin(async move {
            match check_access_token(db, auth, token).await {
                Ok(current_user) => {
                    req.extensions_mut().insert(current_user);
                    service.call(req).await
                }
                Err(error) => Ok(req.into_response(error.error_response())),
            }
        })
    }
}

/// Verifies the token and loads the user it was issued for
pub async fn check_access_token(
    db: Data<Db>,
    auth: Data<AuthContext>,
    token: String,
) -> Result<User, ApiError> {
    let claims = auth.verify_access_token(&token).map_err(|e| {
        log::debug!("Invalid access token, {}", e);

        match e {
            VerifyError::Expired => ApiError::authentication(AuthenticationError::AccessTokenExpired),
            _ => ApiError::authentication(AuthenticationError::InvalidAccessToken),
        }
    })?;

    let user_id = claims.sub;

    let current_user = crate::block(move || {
        let mut conn = db.get_conn()?;

        User::get(&mut conn, user_id)
    })
    .await?
    .map_err(|e| match e {
        DatabaseError::NotFound => {
            log::warn!("The requesting user {} could not be found in the database", user_id);
            ApiError::authentication(AuthenticationError::UnknownUser)
        }
        e => ApiError::from(e),
    })?;

    if current_user.is_blocked() {
        return Err(ApiError::forbidden()
            .with_code(CODE_USER_BLOCKED)
            .with_message("The user is blocked"));
    }

    Ok(current_user)
}
