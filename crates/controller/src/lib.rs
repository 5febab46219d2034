// SPDX-FileCopyrightText: OpenTalk GmbH <mail@opentalk.eu>
//
// SPDX-License-Identifier: EUPL-1.2

//! Core library of the *Gathr Controller*
//!
//! # Example
//!
//! ```no_run
//! use gathr_controller_core::Controller;
//! use anyhow::Result;
//!
//! #[actix_web::main]
//! async fn main()  {
//!     gathr_controller_core::try_or_exit(run()).await;
//! }
//!
//! async fn run() -> Result<()> {
//!    if let Some(controller) = Controller::create("Gathr Controller").await? {
//!         controller.run().await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

use crate::api::v1::middleware::headers::RequestIdHeader;
use crate::api::v1::middleware::user_auth::BearerAuth;
use crate::api::v1::response::error::{json_error_handler, query_error_handler};
use crate::auth::AuthContext;
use crate::services::NotificationService;
use crate::settings::{Settings, SharedSettings};
use crate::trace::ReducedSpanBuilder;
use actix_cors::Cors;
use actix_web::http::header;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer, Scope};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use database::Db;
use std::net::Ipv6Addr;
use std::sync::Arc;
use tokio::signal::ctrl_c;
use tokio::signal::unix::{signal, SignalKind};
use tracing_actix_web::TracingLogger;

#[cfg(not(doc))]
mod api;
#[cfg(doc)]
pub mod api;

mod auth;
mod cli;
mod trace;

pub mod services;
pub mod settings;

#[derive(Debug, thiserror::Error)]
#[error("Blocking thread has panicked")]
pub struct BlockingError;

/// Custom version of `actix_web::web::block` which retains the current tracing span
pub async fn block<F, R>(f: F) -> Result<R, BlockingError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let span = tracing::Span::current();

    let fut = actix_rt::task::spawn_blocking(move || span.in_scope(f));

    fut.await.map_err(|_| BlockingError)
}

/// Wrapper of the main function. Correctly outputs the error to the logging utility or stderr.
pub async fn try_or_exit<T, F>(f: F) -> T
where
    F: std::future::Future<Output = Result<T>>,
{
    match f.await {
        Ok(ok) => ok,
        Err(err) => {
            if log::log_enabled!(log::Level::Error) {
                log::error!("Crashed with error: {:?}", err);
            } else {
                eprintln!("Crashed with error: {err:?}");
            }

            std::process::exit(-1);
        }
    }
}

/// Controller struct representation containing all fields required to drive the controller
pub struct Controller {
    /// Settings loaded on [Controller::create]
    pub startup_settings: Arc<Settings>,

    /// Cloneable shared settings, reloaded when receiving `SIGHUP`
    pub shared_settings: SharedSettings,

    /// CLI arguments
    args: cli::Args,

    db: Arc<Db>,

    auth: Arc<AuthContext>,

    notifications: NotificationService,

    log_filter: trace::FilterHandle,
}

impl Controller {
    /// Tries to create a controller from CLI arguments and then the settings.
    ///
    /// This can return Ok(None) which would indicate that the controller executed a CLI
    /// subprogram (e.g. `--reload`) and must now exit.
    ///
    /// Otherwise it will return itself which can then be run using [`Controller::run`]
    pub async fn create(program_name: &str) -> Result<Option<Self>> {
        let args = cli::parse_args().await?;

        // Some args run commands by them self and thus should exit here
        if !args.controller_should_start() {
            return Ok(None);
        }

        let settings = settings::load_settings(&args)?;

        let log_filter = trace::init(&settings.logging)?;

        log::info!("Starting {}", program_name);

        let controller = Self::init(settings, args, log_filter).await?;

        Ok(Some(controller))
    }

    #[tracing::instrument(err, skip_all)]
    async fn init(
        settings: Settings,
        args: cli::Args,
        log_filter: trace::FilterHandle,
    ) -> Result<Self> {
        let settings = Arc::new(settings);
        let shared_settings: SharedSettings = Arc::new(ArcSwap::from(settings.clone()));

        db_storage::migrations::migrate_from_url(&settings.database.url)
            .await
            .context("Failed to migrate database")?;

        // Connect to postgres
        let db = Arc::new(Db::connect(&settings.database).context("Failed to connect to database")?);

        let auth = Arc::new(AuthContext::from_settings(&settings.authentication));

        let notifications = NotificationService::new(db.clone());

        Ok(Self {
            startup_settings: settings,
            shared_settings,
            args,
            db,
            auth,
            notifications,
            log_filter,
        })
    }

    /// Runs the controller until a fatal error occurred or a shutdown is requested (e.g. SIGTERM).
    pub async fn run(self) -> Result<()> {
        let http_server = {
            let cors = self.startup_settings.http.cors.clone();

            let db = Data::from(self.db.clone());
            let auth = Data::from(self.auth.clone());
            let notifications = Data::new(self.notifications.clone());

            HttpServer::new(move || {
                let cors = setup_cors(&cors);

                App::new()
                    .wrap(RequestIdHeader)
                    .wrap(TracingLogger::<ReducedSpanBuilder>::new())
                    .wrap(cors)
                    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
                    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
                    .app_data(db.clone())
                    .app_data(notifications.clone())
                    .service(v1_scope(db.clone(), auth.clone()))
            })
        };

        let address = (Ipv6Addr::UNSPECIFIED, self.startup_settings.http.port);

        let http_server = http_server.bind(address).with_context(|| {
            format!("Failed to bind http server to {}:{}", address.0, address.1)
        })?;

        log::info!("Startup finished");

        let http_server = http_server.disable_signals().run();
        let http_server_handle = http_server.handle();

        let mut reload_signal =
            signal(SignalKind::hangup()).context("Failed to register SIGHUP signal handler")?;

        actix_rt::spawn(http_server);

        // Wait for either SIGTERM or SIGHUP and handle them accordingly
        loop {
            tokio::select! {
                _ = ctrl_c() => {
                    log::info!("Got termination signal, exiting");
                    break;
                }
                _ = reload_signal.recv() => {
                    log::info!("Got reload signal, reloading");

                    self.reload();
                }
            }
        }

        http_server_handle.stop(true).await;

        log::info!("HTTP server stopped, goodbye!");

        Ok(())
    }
}

impl Controller {
    /// Reloads the settings file and applies the logging section
    fn reload(&self) {
        if let Err(e) = settings::reload_settings(self.shared_settings.clone(), &self.args.config) {
            log::error!("Failed to reload settings, {}", e);
            return;
        }

        if let Err(e) = trace::reload(&self.log_filter, &self.shared_settings.load().logging) {
            log::error!("Failed to apply reloaded logging settings, {:?}", e);
        }
    }
}

fn v1_scope(db: Data<Db>, auth: Data<AuthContext>) -> Scope {
    use api::v1::{events, invitations, notifications, participants, users};

    // every v1 endpoint requires an authenticated user
    web::scope("/v1").service(
        web::scope("")
            .wrap(BearerAuth { db, auth })
            .service(users::get_me)
            .service(users::patch_status)
            .service(notifications::get_notifications)
            .service(notifications::mark_read)
            .service(events::new_event)
            .service(events::get_events)
            .service(events::get_event)
            .service(events::patch_event)
            .service(events::delete_event)
            .service(participants::join)
            .service(participants::leave)
            .service(participants::get_participants)
            .service(participants::patch_status)
            .service(participants::patch_role)
            .service(invitations::new_invitation)
            .service(invitations::get_invitations)
            .service(invitations::get_event_invitations)
            .service(invitations::accept)
            .service(invitations::decline)
            .service(invitations::revoke),
    )
}

fn setup_cors(settings: &settings::HttpCors) -> Cors {
    let mut cors = Cors::default();

    for origin in &settings.allowed_origin {
        cors = cors.allowed_origin(origin)
    }

    cors.allowed_header(header::CONTENT_TYPE)
        .allowed_header(header::AUTHORIZATION)
        .allow_any_method()
}
