use std::{net::SocketAddr, sync::Arc};

use axum::{
    http::Request,
    middleware::{self, Next},
    response::Response,
    Router, Server,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use crate::{options::Options, storage::Root};

mod archive;
mod config;
mod error;
mod index;
mod misc;
mod options;
mod response;
mod storage;

async fn logger<B>(req: Request<B>, next: Next<B>) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let res = next.run(req).await;
    log::info!("{} {} {}", method, path, res.status().as_u16());
    res
}

async fn shutdown_signal(token: CancellationToken) {
    let interrupt = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            exit_error!("Cannot listen for interruption signal: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => exit_error!("Cannot listen for termination signal: {}", err),
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => (),
        _ = terminate => (),
    }
    log::warn!("Shutting down, cancelling running downloads");
    token.cancel();
}

#[tokio::main]
async fn main() {
    let options = Options::parse();
    env_logger::Builder::new()
        .filter_level(options.log_level())
        .init();

    let root = Root::open(&options.root)
        .await
        .unwrap_or_else(|err| exit_error!("Invalid root directory: {}", err));
    let config = Arc::new(options.config(root));
    log::info!(
        "Serving archives of {} built with `{}`",
        config.root.path().display(),
        config.archiver
    );

    let shutdown = CancellationToken::new();
    let app = Router::new()
        .merge(index::router())
        .merge(archive::router(config, shutdown.clone()))
        .layer(middleware::from_fn(logger));

    let address = SocketAddr::new(options.address, options.port);
    log::info!("App is running on: {}", address);
    Server::try_bind(&address)
        .unwrap_or_else(|err| exit_error!("Cannot bind {}: {}", address, err))
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .unwrap_or_else(|err| exit_error!("Server stopped: {}", err));
}
