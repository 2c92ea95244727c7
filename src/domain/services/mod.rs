pub mod address;
pub mod client_identity;
pub mod weather_shaper;
