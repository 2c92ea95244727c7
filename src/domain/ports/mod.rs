mod place_directory;
mod provider;

pub use place_directory::{MatchMode, PlaceDirectory};
pub use provider::{Provider, ProviderError};
