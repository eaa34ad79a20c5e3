//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling: one spawned task per
//! inbound connection, no shared mutable state beyond the process-wide
//! store client held in `AppState`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtCodec;
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes::{self, BoxBody};

/// Shared application state
///
/// Constructed once at startup; every component receives its collaborators
/// from here rather than reaching for process-wide globals.
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub codec: JwtCodec,
}

impl AppState {
    pub fn new(args: Args, mongo: MongoClient) -> Self {
        let codec = JwtCodec::new(&args.secret_key);
        Self { args, mongo, codec }
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<(), crate::types::ApiError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Taskgate listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("{} {}", method, path);

    // Auth routes (/auth/*) - these consume the request
    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    // Task routes (/tasks, /tasks/{id}) - token-gated
    if path == "/tasks" || path.starts_with("/tasks/") {
        if let Some(response) = routes::handle_tasks_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(not_found_response(&path));
    }

    let response = match (method, path.as_str()) {
        (Method::GET, "/") => to_boxed(routes::root_info()),

        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => {
            to_boxed(routes::health_check(Arc::clone(&state)))
        }

        // Version info for deployment verification
        (Method::GET, "/version") => to_boxed(routes::version_info()),

        (Method::OPTIONS, _) => routes::cors_preflight(),

        _ => not_found_response(&path),
    };

    Ok(response)
}

fn to_boxed(resp: Response<Full<Bytes>>) -> Response<BoxBody> {
    resp.map(|body| body.map_err(|never| match never {}).boxed())
}

fn not_found_response(path: &str) -> Response<BoxBody> {
    let body = serde_json::json!({ "error": format!("Not found: {}", path) }).to_string();

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(routes::full_body(body))
        .unwrap()
}
