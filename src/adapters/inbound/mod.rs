mod api_error;
mod api_server;

pub use api_error::{ApiError, Utf8Json, JSON_UTF8};
pub use api_server::{router, ApiServer, ApiState, CoordinateParams, HealthResponse, SearchParams};
