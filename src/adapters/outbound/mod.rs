mod amap;
mod builtin_places;
mod caiyun_weather;
mod http;
mod meituan;

pub use amap::{AmapGeocoder, AmapPlaceSearch, DEFAULT_BASE_URL as AMAP_BASE_URL};
pub use builtin_places::BuiltinPlaces;
pub use caiyun_weather::{CaiyunWeather, DEFAULT_BASE_URL as CAIYUN_BASE_URL};
pub use http::{build_client, CLIENT_TIMEOUT};
pub use meituan::{MeituanCityLookup, MeituanIpLocator, DEFAULT_BASE_URL as MEITUAN_BASE_URL};
