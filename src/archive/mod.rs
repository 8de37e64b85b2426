use std::sync::Arc;

use axum::{
    body::boxed,
    extract::Path,
    response::{IntoResponse, Response},
    routing::get,
    Extension, Router,
};
use hyper::{Body, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    error::Error,
    response::{ApiResponse, ResponseType},
};

pub use request::ArchiveRequest;

mod headers;
pub mod process;
pub mod relay;
mod request;
mod session;

use process::ArchiveProcess;
use relay::Relay;
use session::Session;

pub async fn handler(
    Extension(config): Extension<Arc<Config>>,
    Extension(shutdown): Extension<CancellationToken>,
    response_type: ResponseType,
    Path(identifier): Path<String>,
) -> Result<Response, ApiResponse<Error>> {
    start_session(&config, &shutdown, &identifier)
        .await
        .map_err(|err| {
            match &err {
                Error::NotFound | Error::InvalidIdentifier => {
                    log::info!("Rejected archive request for {:?}: {}", identifier, err)
                }
                _ => log::error!("Cannot stream archive of {:?}: {}", identifier, err),
            }
            ApiResponse(response_type, err)
        })
}

async fn start_session(
    config: &Config,
    shutdown: &CancellationToken,
    identifier: &str,
) -> Result<Response, Error> {
    let request = ArchiveRequest::resolve(&config.root, identifier, &config.extension).await?;
    let headers = headers::archive_headers(&request, &config.content_type)?;

    // Spawned before the headers leave, so a spawn failure is still a clean 500.
    let mut process = ArchiveProcess::new();
    process.spawn(&config.archiver, request.path())?;

    let (sender, body) = Body::channel();
    Session::new(
        request,
        process,
        sender,
        Relay::new(config.chunk_size),
        config.timeout,
        shutdown.child_token(),
    )
    .spawn();

    Ok((StatusCode::OK, headers, boxed(body)).into_response())
}

pub fn router(config: Arc<Config>, shutdown: CancellationToken) -> Router {
    Router::new()
        .route("/archive/:identifier", get(handler))
        .route("/archive/:identifier/", get(handler))
        .route_layer(Extension(config))
        .route_layer(Extension(shutdown))
}
