//! Provider abstraction.
//!
//! A `Provider` is any backend that can answer a media search: torrent
//! indexers (Jackett), metadata resolvers (TMDB) and the local catalog.

mod jackett;
mod tmdb;
mod types;

pub use jackett::JackettProvider;
pub use tmdb::TmdbProvider;
pub use types::*;

use crate::config::ProviderConfig;

/// Construct a provider from its configuration entry.
pub fn build_provider(config: &ProviderConfig) -> Result<Box<dyn Provider>, ProviderFailure> {
    match config {
        ProviderConfig::Jackett(cfg) => Ok(Box::new(JackettProvider::new(cfg.clone())?)),
        ProviderConfig::Tmdb(cfg) => Ok(Box::new(TmdbProvider::new(cfg.clone())?)),
    }
}
