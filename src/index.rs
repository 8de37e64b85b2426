use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use hyper::{header, StatusCode};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "public/"]
struct Assets;

async fn handler() -> Response {
    match Assets::get("index.html") {
        Some(file) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html")],
            file.data,
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/", get(handler))
        .route("/index.html", get(handler))
}
