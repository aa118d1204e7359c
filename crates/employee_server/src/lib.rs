//! HTTP/JSON surface for the employee directory.
//!
//! # Routes
//! - `GET /api/employees` — joined employee listing.
//! - `GET /api/employees/last-id` — highest stored `emp_id` (0 when empty).
//! - `POST /api/employees`, `POST /api/employees/create` — create across all
//!   three collections; `emp_id` is allocated when absent or zero.
//! - `PUT /api/employees/{id}` — partial update, department/language upserted.
//! - `DELETE /api/employees/{id}` — delete employee and related rows.
//!
//! Everything else is served from the built single-page app directory, with
//! `index.html` as the fallback for client-side routes.
//!
//! # Consistency
//! Writes touch each collection separately. A failure part way through is
//! reported as a 500 and earlier collection writes stay in place.

use std::{sync::Arc, time::Instant};

use axum::{
    extract::Request,
    http::{header::CONTENT_TYPE, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
    Router,
};
use log::{debug, info};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::Config;
use error::ServerError;
use routes::{
    create_employee_handler, delete_employee_handler, last_id_handler, list_employees_handler,
    method_not_allowed_handler, non_numeric_id_handler, update_employee_handler,
};
use state::AppState;

/// Builds the full router: API routes, SPA fallback, CORS and request logs.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE]);

    let static_dir = &state.config.static_dir;
    let spa = ServeDir::new(static_dir).fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route(
            "/api/employees",
            get(list_employees_handler).post(create_employee_handler),
        )
        .route("/api/employees/create", post(create_employee_handler))
        .route(
            "/api/employees/last-id",
            get(last_id_handler)
                .put(non_numeric_id_handler)
                .delete(non_numeric_id_handler),
        )
        .route(
            "/api/employees/{id}",
            put(update_employee_handler).delete(delete_employee_handler),
        )
        .method_not_allowed_fallback(method_not_allowed_handler)
        .fallback_service(spa)
        .layer(middleware::from_fn(log_request))
        .layer(cors)
        .with_state(state)
}

/// Opens the store, binds the listener and serves until Ctrl-C or SIGTERM.
pub async fn start_server(config: Config) -> Result<(), ServerError> {
    info!("event=server_start module=http status=start");
    let address = config.socket_addr();
    let state = AppState::new(config)?;

    let listener = TcpListener::bind(address).await?;
    info!("event=server_start module=http status=ok address={address}");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=http status=ok");
    Ok(())
}

async fn log_request(request: Request, next: Next) -> Response {
    let started_at = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_owned();

    let response = next.run(request).await;

    let line = format!(
        "event=http_request module=http method={method} path={path} http_status={} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    if path.starts_with("/api/") {
        info!("{line}");
    } else {
        debug!("{line}");
    }
    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            log::error!("event=shutdown_signal module=http status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
        info!("event=shutdown_signal module=http status=ok signal=ctrl_c");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("event=shutdown_signal module=http status=ok signal=terminate");
            }
            Err(err) => {
                log::error!(
                    "event=shutdown_signal module=http status=error signal=terminate error={err}"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
