//! API error and JSON response helpers.

use crate::application::WeatherError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const JSON_UTF8: &str = "application/json; charset=utf-8";

/// JSON body sent with an explicit UTF-8 content type.
pub struct Utf8Json<T>(pub T);

impl<T: Serialize> IntoResponse for Utf8Json<T> {
    fn into_response(self) -> Response {
        let mut response = Json(self.0).into_response();
        // Serialization failures come back as plain text; leave those alone.
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
        if is_json {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_UTF8));
        }
        response
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Errors surfaced to API clients as `{"error": message}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing parameter: {0}")]
    ParameterMissing(&'static str),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("weather data unavailable")]
    WeatherUnavailable,

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ParameterMissing(_) | Self::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            Self::WeatherUnavailable => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<WeatherError> for ApiError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Upstream(e) => {
                tracing::warn!("weather request failed: {}", e);
                Self::WeatherUnavailable
            }
            WeatherError::Shaping(e) => {
                tracing::error!("weather shaping failed: {}", e);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status(), Utf8Json(body)).into_response()
    }
}
