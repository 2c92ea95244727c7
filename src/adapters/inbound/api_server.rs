//! HTTP API Server
//!
//! JSON endpoints for weather, geocoding, place search and IP location,
//! plus the bundled front-end assets.

use super::api_error::{ApiError, Utf8Json};
use crate::application::{LocationService, WeatherService};
use crate::domain::services::client_identity;
use crate::domain::value_objects::{Coordinates, SearchQuery};
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{rejection::QueryRejection, ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

const FAVICON_SVG: &str = "<svg xmlns='http://www.w3.org/2000/svg' viewBox='0 0 64 64'><circle cx='32' cy='32' r='28' fill='#4FC3F7'/><path d='M18 36c3-8 16-8 19 0 5 0 7 3 7 6 0 4-3 7-7 7H23c-4 0-7-3-7-7 0-3 2-6 2-6z' fill='#fff'/></svg>";

/// Latitude/longitude query parameters, kept as strings so missing and
/// malformed values can be told apart.
#[derive(Debug, Default, Deserialize)]
pub struct CoordinateParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub weather: String,
    pub cached_entries: usize,
}

#[derive(Debug, Serialize)]
struct AddressResponse {
    address: String,
}

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<crate::domain::entities::Place>,
}

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    pub location: Arc<LocationService>,
    pub weather: Arc<WeatherService>,
    /// Directory holding `index.html` and the `/static` assets
    pub static_dir: PathBuf,
}

impl ApiState {
    pub fn new(
        location: Arc<LocationService>,
        weather: Arc<WeatherService>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            location,
            weather,
            static_dir: static_dir.into(),
        }
    }
}

/// Build the application router.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/weather", get(weather_handler))
        .route("/api/location/ip", get(ip_location_handler))
        .route("/api/location/geocode", get(geocode_handler))
        .route("/api/location/search", get(search_handler))
        .route("/favicon.ico", get(favicon_handler))
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .nest_service("/static", static_files)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub struct ApiServer {
    listen_addr: SocketAddr,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: SocketAddr, state: ApiState) -> Self {
        Self { listen_addr, state }
    }

    /// Serve until `shutdown` fires, then drain in-flight requests.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let app = router(self.state);

        let listener = TcpListener::bind(self.listen_addr).await?;
        tracing::info!("weather relay listening on {}", self.listen_addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

// ===== Parameter parsing =====

fn parse_degrees(name: &'static str, raw: Option<&str>, limit: f64) -> Result<f64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::ParameterMissing(name))?;
    let value: f64 = raw
        .parse()
        .map_err(|_| ApiError::InvalidParameter(format!("{} is not a number", name)))?;
    if !value.is_finite() || value.abs() > limit {
        return Err(ApiError::InvalidParameter(format!("{} out of range", name)));
    }
    Ok(value)
}

fn parse_coordinates(params: &CoordinateParams) -> Result<Coordinates, ApiError> {
    let lat = parse_degrees("lat", params.lat.as_deref(), 90.0)?;
    let lng = parse_degrees("lng", params.lng.as_deref(), 180.0)?;
    Ok(Coordinates::new(lat, lng))
}

fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiError> {
    params
        .map(|Query(p)| p)
        .map_err(|e| ApiError::InvalidParameter(e.body_text()))
}

// ===== Handlers =====

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let weather = if state.weather.is_live() {
        "live"
    } else {
        "synthetic"
    };
    Utf8Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        weather: weather.to_string(),
        cached_entries: state.location.cached_entries() + state.weather.cached_entries(),
    })
}

async fn weather_handler(
    State(state): State<ApiState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let coords = parse_coordinates(&query_params(params)?)?;
    let report = state.weather.report(coords).await?;
    Ok(Utf8Json(report).into_response())
}

async fn ip_location_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    connection: Option<ConnectInfo<SocketAddr>>,
) -> impl IntoResponse {
    let client = client_identity::resolve(&headers, connection.map(|ConnectInfo(addr)| addr));
    Utf8Json(state.location.locate(client).await)
}

async fn geocode_handler(
    State(state): State<ApiState>,
    params: Result<Query<CoordinateParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let coords = parse_coordinates(&query_params(params)?)?;
    let address = state.location.reverse_geocode(coords).await;
    Ok(Utf8Json(AddressResponse { address }).into_response())
}

async fn search_handler(
    State(state): State<ApiState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let params = query_params(params)?;
    let query = params
        .q
        .as_deref()
        .and_then(SearchQuery::parse)
        .ok_or(ApiError::ParameterMissing("q"))?;

    let results = state.location.search(query).await;
    Ok(Utf8Json(SearchResponse { results }).into_response())
}

async fn favicon_handler() -> impl IntoResponse {
    (
        [
            (header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=86400")),
            (header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml")),
        ],
        FAVICON_SVG,
    )
}

async fn index_handler(State(state): State<ApiState>) -> Response {
    let path = state.static_dir.join("index.html");
    match tokio::fs::read_to_string(&path).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::warn!("cannot read {}: {}", path.display(), e);
            (StatusCode::NOT_FOUND, Utf8Json(serde_json::json!({"error": "index not found"})))
                .into_response()
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::adapters::inbound::api_error::JSON_UTF8;
    use crate::adapters::outbound::BuiltinPlaces;
    use crate::application::location_service::{geocode_chain, ip_locate_chain, search_chain};
    use crate::domain::entities::IpLocation;
    use crate::domain::ports::{Provider, ProviderError};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    // ===== Mock Implementations =====

    struct Fixed<Out> {
        outcome: Result<Out, ProviderError>,
        calls: AtomicUsize,
    }

    impl<Out> Fixed<Out> {
        fn new(outcome: Result<Out, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl<Req, Out> Provider<Req, Out> for Fixed<Out>
    where
        Req: Send + Sync,
        Out: Clone + Send + Sync,
    {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn attempt(&self, _req: &Req) -> Result<Out, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    struct TestProviders {
        city: Arc<Fixed<String>>,
        ip: Arc<Fixed<IpLocation>>,
    }

    fn shanghai() -> IpLocation {
        IpLocation {
            lat: 31.2304,
            lng: 121.4737,
            address: "中国上海市".to_string(),
        }
    }

    fn create_test_app_with(weather: WeatherService, static_dir: &str) -> (Router, TestProviders) {
        let providers = TestProviders {
            city: Fixed::new(Ok("浙江省杭州市西湖区".to_string())),
            ip: Fixed::new(Ok(shanghai())),
        };
        let timeout = Duration::from_millis(200);
        let location = LocationService::new(
            geocode_chain(providers.city.clone(), None, timeout),
            search_chain(Arc::new(BuiltinPlaces::new()), None, timeout),
            ip_locate_chain(providers.ip.clone(), timeout),
            Duration::from_secs(60),
            64,
        );
        let state = ApiState::new(Arc::new(location), Arc::new(weather), static_dir);
        (router(state), providers)
    }

    fn create_test_app() -> (Router, TestProviders) {
        create_test_app_with(WeatherService::synthetic(), "/nonexistent-static-dir")
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header("origin", "https://example.com")
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    // ===== Health =====

    #[tokio::test]
    async fn test_health_handler() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get_request("/health")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_UTF8);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["weather"], "synthetic");
    }

    // ===== Weather =====

    #[tokio::test]
    async fn test_weather_synthetic_without_token() {
        let (app, _) = create_test_app();
        let response = app
            .oneshot(get_request("/api/weather?lng=120.15&lat=30.25"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_UTF8);
        let body = json_body(response).await;
        assert_eq!(body["synthetic"], true);
        assert_eq!(body["hourly"].as_array().unwrap().len(), 24);
    }

    #[tokio::test]
    async fn test_weather_missing_parameter_is_400() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get_request("/api/weather?lng=120.15")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()[header::CONTENT_TYPE], JSON_UTF8);
        let body = json_body(response).await;
        assert_eq!(body["error"], "missing parameter: lat");
    }

    #[tokio::test]
    async fn test_weather_upstream_failure_is_502() {
        let provider: Arc<Fixed<Value>> = Fixed::new(Err(ProviderError::Http { status: 500 }));
        let weather = WeatherService::live(provider, Duration::from_millis(200), Duration::from_secs(60), 8);
        let (app, _) = create_test_app_with(weather, "/nonexistent-static-dir");

        let response = app
            .oneshot(get_request("/api/weather?lng=120.15&lat=30.25"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = json_body(response).await;
        assert_eq!(body, json!({"error": "weather data unavailable"}));
    }

    // ===== Geocode =====

    #[tokio::test]
    async fn test_geocode_returns_address() {
        let (app, providers) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/geocode?lat=30.25&lng=120.15"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!({"address": "浙江省杭州市西湖区"}));
        assert_eq!(providers.city.calls(), 1);
    }

    #[tokio::test]
    async fn test_geocode_invalid_parameter_is_400() {
        let (app, providers) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/geocode?lat=north&lng=120.15"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "invalid parameter: lat is not a number");
        assert_eq!(providers.city.calls(), 0);
    }

    #[tokio::test]
    async fn test_geocode_out_of_range_is_400() {
        let (app, _) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/geocode?lat=95&lng=120.15"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    // ===== Search =====

    #[tokio::test]
    async fn test_search_missing_q_is_400() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get_request("/api/location/search")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "missing parameter: q");
    }

    #[tokio::test]
    async fn test_search_blank_q_is_400() {
        let (app, _) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/search?q=%20%20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_uses_builtin_table() {
        let (app, _) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/search?q=%E6%9D%AD%E5%B7%9E"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["name"], "杭州");
    }

    #[tokio::test]
    async fn test_search_no_match_is_empty_list() {
        let (app, _) = create_test_app();
        let response = app
            .oneshot(get_request("/api/location/search?q=atlantis"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({"results": []}));
    }

    // ===== IP location =====

    #[tokio::test]
    async fn test_ip_location_private_client_gets_default() {
        let (app, providers) = create_test_app();
        let request = Request::builder()
            .uri("/api/location/ip")
            .header("x-forwarded-for", "10.0.0.1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body, json!({"lat": 39.9042, "lng": 116.4074, "address": "北京市"}));
        assert_eq!(providers.ip.calls(), 0);
    }

    #[tokio::test]
    async fn test_ip_location_uses_first_public_header_address() {
        let (app, providers) = create_test_app();
        let request = Request::builder()
            .uri("/api/location/ip")
            .header("cf-connecting-ip", "10.0.0.5")
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        let body = json_body(response).await;
        assert_eq!(body["address"], "中国上海市");
        assert_eq!(providers.ip.calls(), 1);
    }

    #[tokio::test]
    async fn test_ip_location_uses_connection_address() {
        let (app, providers) = create_test_app();
        let mut request = get_request("/api/location/ip");
        request
            .extensions_mut()
            .insert(ConnectInfo("198.51.100.23:40000".parse::<SocketAddr>().unwrap()));

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(json_body(response).await["lat"], 31.2304);
        assert_eq!(providers.ip.calls(), 1);
    }

    // ===== Assets =====

    #[tokio::test]
    async fn test_favicon_is_svg() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get_request("/favicon.ico")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/svg+xml");
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, max-age=86400"
        );
    }

    #[tokio::test]
    async fn test_index_missing_is_404() {
        let (app, _) = create_test_app();
        let response = app.oneshot(get_request("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_index_and_static_served_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>天气</h1>").unwrap();
        std::fs::write(dir.path().join("app.js"), "console.log(1)").unwrap();
        let static_dir = dir.path().to_str().unwrap().to_string();

        let (app, _) = create_test_app_with(WeatherService::synthetic(), &static_dir);

        let response = app.clone().oneshot(get_request("/index.html")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), "<h1>天气</h1>");

        let response = app.oneshot(get_request("/static/app.js")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[test]
    fn test_parse_coordinates() {
        let params = CoordinateParams {
            lat: Some(" 30.25 ".to_string()),
            lng: Some("120.15".to_string()),
        };
        let coords = parse_coordinates(&params).unwrap();
        assert_eq!(coords.lat, 30.25);
        assert_eq!(coords.lng, 120.15);

        let missing = CoordinateParams::default();
        assert!(matches!(
            parse_coordinates(&missing),
            Err(ApiError::ParameterMissing("lat"))
        ));

        let nan = CoordinateParams {
            lat: Some("NaN".to_string()),
            lng: Some("1".to_string()),
        };
        assert!(matches!(parse_coordinates(&nan), Err(ApiError::InvalidParameter(_))));
    }
}
