// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Echoes the id of the request's tracing span in the `x-request-id` response header
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, HttpMessage};
use futures::future::{ready, LocalBoxFuture, Ready};
use futures::FutureExt;
use tracing_actix_web::RequestId;

/// Middleware factory
///
/// Must be wrapped by the [`TracingLogger`](tracing_actix_web::TracingLogger) which assigns the [`RequestId`].
#[derive(Clone)]
pub struct RequestIdHeader;

impl<S, B> Transform<S, ServiceRequest> for RequestIdHeader
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequestIdHeaderMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdHeaderMiddleware { service }))
    }
}

pub struct RequestIdHeaderMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdHeaderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    actix_web::dev::forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = req.extensions().get::<RequestId>().cloned();
        let fut = self.service.call(req);

        async move {
            let mut res = fut.await?;

            if let Some(request_id) = request_id {
                let value = HeaderValue::from_str(&request_id.to_string())?;

                let _ = res
                    .headers_mut()
                    .insert(HeaderName::from_static("x-request-id"), value);
            }

            Ok(res)
        }
        .boxed_local()
    }
}
