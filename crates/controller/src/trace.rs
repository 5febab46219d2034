// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header::USER_AGENT;
use actix_web::{Error, HttpMessage};
use anyhow::Result;
use controller_shared::settings::Logging;
use tracing::Span;
use tracing_actix_web::{RequestId, RootSpanBuilder};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Handle to replace the filter of the installed subscriber
pub type FilterHandle = reload::Handle<EnvFilter, Registry>;

pub fn init(settings: &Logging) -> Result<FilterHandle> {
    // Layer which acts as filter of traces and spans, swapped out on reload
    let (filter, handle) = reload::Layer::new(build_filter(settings)?);

    // FMT layer prints the trace events into stdout
    let fmt = tracing_subscriber::fmt::Layer::default();

    // Install the global logger
    Registry::default().with(filter).with(fmt).try_init()?;

    Ok(handle)
}

/// Applies the directives of reloaded logging settings
pub fn reload(handle: &FilterHandle, settings: &Logging) -> Result<()> {
    handle.reload(build_filter(settings)?)?;

    log::info!("Reloaded log filter");

    Ok(())
}

/// The filter is created from enviroment (RUST_LOG) and config file
fn build_filter(settings: &Logging) -> Result<EnvFilter> {
    let mut filter = EnvFilter::from_default_env();

    for directive in &settings.default_directives {
        filter = filter.add_directive(directive.parse()?);
    }

    Ok(filter)
}

pub struct ReducedSpanBuilder;

impl RootSpanBuilder for ReducedSpanBuilder {
    fn on_request_start(request: &ServiceRequest) -> Span {
        create_span(request)
    }

    fn on_request_end<B>(span: Span, outcome: &Result<ServiceResponse<B>, Error>) {
        match &outcome {
            Ok(response) => {
                if let Some(error) = response.response().error() {
                    handle_error(span, error)
                } else {
                    span.record("http.status_code", response.response().status().as_u16());
                }
            }
            Err(error) => handle_error(span, error),
        };
    }
}

fn handle_error(span: Span, error: &Error) {
    let response_error = error.as_response_error();
    span.record(
        "exception.message",
        &tracing::field::display(response_error),
    );
    let status_code = response_error.status_code();
    span.record("http.status_code", status_code.as_u16());

    if status_code.is_server_error() {
        log::error!("Request failed: {}", response_error);
    }
}

fn create_span(request: &ServiceRequest) -> Span {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    let http_route: std::borrow::Cow<'static, str> = request
        .match_pattern()
        .map(Into::into)
        .unwrap_or_else(|| "default".into());

    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(ToString::to_string)
        .unwrap_or_default();

    tracing::info_span!(
        "HTTP request",
        http.method = %request.method().as_str(),
        http.route = %http_route,
        http.target = %request.uri(),
        http.user_agent = %user_agent,
        http.status_code = tracing::field::Empty,
        request_id = %request_id,
        exception.message = tracing::field::Empty,
    )
}

#[cfg(test)]
mod test {
    use super::*;

    fn logging(directives: &[&str]) -> Logging {
        Logging {
            default_directives: directives.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn invalid_directive_is_rejected() {
        assert!(build_filter(&logging(&["gathr=LOUD"])).is_err());
    }

    #[test]
    fn reload_replaces_the_directives() {
        let (filter, handle) = reload::Layer::new(build_filter(&logging(&["gathr=INFO"])).unwrap());
        let _subscriber = Registry::default().with(filter);

        reload(&handle, &logging(&["gathr=TRACE", "actix_server=WARN"])).unwrap();

        let current = handle.with_current(|filter| filter.to_string()).unwrap();
        assert!(current.contains("gathr=trace"), "{current}");
        assert!(!current.contains("gathr=info"), "{current}");

        // The previous filter stays active when the new directives are invalid
        assert!(reload(&handle, &logging(&["gathr=LOUD"])).is_err());
        let current = handle.with_current(|filter| filter.to_string()).unwrap();
        assert!(current.contains("gathr=trace"), "{current}");
    }
}
