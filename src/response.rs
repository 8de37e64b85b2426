use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, RequestParts},
    response::{IntoResponse, Response},
    Json,
};
use hyper::{header::ACCEPT, http::HeaderValue, HeaderMap, StatusCode};
use serde::Serialize;

pub trait ApiHeader {
    fn status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    fn additional_headers(&self) -> HeaderMap {
        HeaderMap::default()
    }

    fn success(&self) -> bool {
        true
    }
}

pub trait SingleLine {
    fn single_lined(&self) -> String;
}

#[derive(Copy, Clone, PartialEq, Debug)]
pub enum ResponseType {
    Json,
    Text,
}

impl Default for ResponseType {
    fn default() -> Self {
        Self::Json
    }
}

impl ResponseType {
    // First supported media type listed wins, quality values are not considered.
    pub fn from_accept(header: Option<&HeaderValue>) -> Self {
        let header = match header.and_then(|h| h.to_str().ok()) {
            Some(header) => header,
            None => return Self::default(),
        };
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .find_map(|media| match media.trim() {
                "text/plain" => Some(Self::Text),
                "application/json" => Some(Self::Json),
                _ => None,
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl<B: Send> FromRequest<B> for ResponseType {
    type Rejection = Infallible;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        Ok(Self::from_accept(req.headers().get(ACCEPT)))
    }
}

#[derive(Debug)]
pub struct ApiResponse<T>(pub ResponseType, pub T);

impl<T> IntoResponse for ApiResponse<T>
where
    T: ApiHeader + Serialize + SingleLine,
{
    fn into_response(self) -> Response {
        (
            self.1.status_code(),
            self.1.additional_headers(),
            match self.0 {
                ResponseType::Json => {
                    #[derive(Serialize)]
                    struct JsonResponse<T> {
                        success: bool,
                        #[serde(flatten)]
                        data: T,
                    }
                    Json(JsonResponse {
                        success: self.1.success(),
                        data: self.1,
                    })
                    .into_response()
                }
                ResponseType::Text => self.1.single_lined().into_response(),
            },
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use hyper::http::HeaderValue;

    use super::ResponseType;

    #[test]
    fn negotiation() {
        let negotiate = |h: &'static str| ResponseType::from_accept(Some(&HeaderValue::from_static(h)));

        assert_eq!(ResponseType::from_accept(None), ResponseType::Json);
        assert_eq!(negotiate("text/plain"), ResponseType::Text);
        assert_eq!(negotiate("application/json"), ResponseType::Json);
        assert_eq!(negotiate("text/html, text/plain;q=0.9"), ResponseType::Text);
        assert_eq!(negotiate("application/json, text/plain"), ResponseType::Json);
        assert_eq!(negotiate("*/*"), ResponseType::Json);
    }
}
