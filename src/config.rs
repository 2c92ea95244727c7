use crate::infrastructure::response_cache::{DEFAULT_MAX_ENTRIES, DEFAULT_TTL};
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Listener
    pub host: String,
    pub port: u16,
    pub static_dir: String,
    pub debug: bool,

    // Provider credentials; absent means the provider is not used
    pub caiyun_token: Option<String>,
    pub amap_key: Option<String>,

    // Provider endpoints
    pub caiyun_base_url: String,
    pub amap_base_url: String,
    pub meituan_base_url: String,

    // Per-stage deadlines
    pub provider_timeout_ms: u64,
    pub weather_timeout_ms: u64,

    // Response cache
    pub cache_ttl_secs: u64,
    pub cache_max_entries: usize,
    pub cache_gc_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            static_dir: "static".to_string(),
            debug: false,
            caiyun_token: None,
            amap_key: None,
            caiyun_base_url: "https://api.caiyunapp.com".to_string(),
            amap_base_url: "https://restapi.amap.com".to_string(),
            meituan_base_url: "https://apimobile.meituan.com".to_string(),
            provider_timeout_ms: 3000,
            weather_timeout_ms: 10_000,
            cache_ttl_secs: DEFAULT_TTL.as_secs(),
            cache_max_entries: DEFAULT_MAX_ENTRIES,
            cache_gc_interval_secs: 60,
        }
    }
}

impl Config {
    /// Socket address to bind. A bare IPv6 host is bracketed first; an
    /// unparsable host falls back to all IPv4 interfaces.
    pub fn listen_addr(&self) -> SocketAddr {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        format!("{}:{}", host, self.port).parse().unwrap_or_else(|_| {
            tracing::warn!("invalid HOST {:?}, binding 0.0.0.0", self.host);
            SocketAddr::from(([0, 0, 0, 0], self.port))
        })
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn weather_timeout(&self) -> Duration {
        Duration::from_millis(self.weather_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn cache_gc_interval(&self) -> Duration {
        Duration::from_secs(self.cache_gc_interval_secs.max(1))
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(|name| std::env::var(name).ok())
}

/// Build a [`Config`] from an arbitrary variable lookup.
pub fn load_config_from<F>(var: F) -> anyhow::Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let defaults = Config::default();

    let string = |name: &str, default: String| var(name).unwrap_or(default);
    let secret = |name: &str| {
        var(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let host = string("HOST", defaults.host);

    let port = var("PORT")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.port);

    let static_dir = string("RELAY_STATIC_DIR", defaults.static_dir);

    let debug = var("DEBUG").is_some();

    let caiyun_token = secret("CAIYUN_API_TOKEN");
    let amap_key = secret("AMAP_API_KEY");

    let caiyun_base_url = string("CAIYUN_BASE_URL", defaults.caiyun_base_url);
    let amap_base_url = string("AMAP_BASE_URL", defaults.amap_base_url);
    let meituan_base_url = string("MEITUAN_BASE_URL", defaults.meituan_base_url);

    let provider_timeout_ms = var("RELAY_PROVIDER_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.provider_timeout_ms);

    let weather_timeout_ms = var("RELAY_WEATHER_TIMEOUT_MS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.weather_timeout_ms);

    let cache_ttl_secs = var("RELAY_CACHE_TTL_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.cache_ttl_secs);

    let cache_max_entries = var("RELAY_CACHE_MAX_ENTRIES")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.cache_max_entries);

    let cache_gc_interval_secs = var("RELAY_CACHE_GC_INTERVAL_SECS")
        .and_then(|v| v.parse().ok())
        .unwrap_or(defaults.cache_gc_interval_secs);

    Ok(Config {
        host,
        port,
        static_dir,
        debug,
        caiyun_token,
        amap_key,
        caiyun_base_url,
        amap_base_url,
        meituan_base_url,
        provider_timeout_ms,
        weather_timeout_ms,
        cache_ttl_secs,
        cache_max_entries,
        cache_gc_interval_secs,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        load_config_from(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.provider_timeout(), Duration::from_secs(3));
        assert_eq!(cfg.weather_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(300));
        assert!(cfg.caiyun_token.is_none());
        assert!(cfg.amap_key.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        let cfg = load(&[]);
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.static_dir, "static");
        assert_eq!(cfg.cache_max_entries, 1024);
        assert!(!cfg.debug);
    }

    #[test]
    fn test_load_config_overrides() {
        let cfg = load(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "9001"),
            ("CAIYUN_API_TOKEN", "tok"),
            ("AMAP_API_KEY", "key"),
            ("RELAY_PROVIDER_TIMEOUT_MS", "1500"),
            ("RELAY_CACHE_TTL_SECS", "30"),
            ("MEITUAN_BASE_URL", "http://127.0.0.1:9999"),
            ("DEBUG", "1"),
        ]);
        assert_eq!(cfg.listen_addr(), "127.0.0.1:9001".parse::<SocketAddr>().unwrap());
        assert_eq!(cfg.caiyun_token.as_deref(), Some("tok"));
        assert_eq!(cfg.amap_key.as_deref(), Some("key"));
        assert_eq!(cfg.provider_timeout(), Duration::from_millis(1500));
        assert_eq!(cfg.cache_ttl(), Duration::from_secs(30));
        assert_eq!(cfg.meituan_base_url, "http://127.0.0.1:9999");
        assert!(cfg.debug);
    }

    #[test]
    fn test_unparsable_numbers_fall_back() {
        let cfg = load(&[("PORT", "eighty"), ("RELAY_CACHE_MAX_ENTRIES", "-1")]);
        assert_eq!(cfg.port, 8000);
        assert_eq!(cfg.cache_max_entries, 1024);
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let cfg = load(&[("CAIYUN_API_TOKEN", "  "), ("AMAP_API_KEY", "")]);
        assert!(cfg.caiyun_token.is_none());
        assert!(cfg.amap_key.is_none());
    }

    #[test]
    fn test_ipv6_host_is_bracketed() {
        let cfg = load(&[("HOST", "::"), ("PORT", "8080")]);
        assert_eq!(cfg.listen_addr(), "[::]:8080".parse::<SocketAddr>().unwrap());

        let cfg = load(&[("HOST", "[::1]")]);
        assert_eq!(cfg.listen_addr(), "[::1]:8000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_invalid_host_binds_all_interfaces() {
        let cfg = load(&[("HOST", "not a host")]);
        assert_eq!(cfg.listen_addr(), SocketAddr::from(([0, 0, 0, 0], 8000)));
    }

    #[test]
    fn test_gc_interval_never_zero() {
        let cfg = load(&[("RELAY_CACHE_GC_INTERVAL_SECS", "0")]);
        assert_eq!(cfg.cache_gc_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_config_reads_process_env() {
        assert!(load_config().is_ok());
    }
}
