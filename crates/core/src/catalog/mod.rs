//! Local media catalog.
//!
//! A persistent set of known media items. It is searched like any other
//! provider (through [`CatalogProvider`]) and can also cache results found
//! by remote providers.

mod provider;
mod sqlite;
mod types;

pub use provider::CatalogProvider;
pub(crate) use sqlite::db_err;
pub use sqlite::SqliteCatalog;
pub use types::*;

use crate::media::{MediaResult, MediaType};

/// Trait for catalog storage.
///
/// Methods block; async callers should run them on a blocking thread.
pub trait MediaCatalog: Send + Sync {
    /// Items whose title contains the query (case-insensitive), in insertion order.
    fn search(&self, query: &CatalogSearchQuery) -> Result<Vec<CatalogItem>, CatalogError>;

    /// Insert an item, or refresh the row with the same origin provider and source ID.
    fn upsert(&self, item: &NewCatalogItem) -> Result<UpsertOutcome, CatalogError>;

    /// Cache search results.
    ///
    /// Returns the number of new items added (not updates).
    fn upsert_results(&self, results: &[MediaResult]) -> Result<u32, CatalogError>;

    /// Get a specific item by ID.
    fn get(&self, id: i64) -> Result<CatalogItem, CatalogError>;

    /// Remove an item. Fails with `NotFound` if absent.
    fn remove(&self, id: i64) -> Result<(), CatalogError>;

    /// Get catalog statistics.
    fn stats(&self) -> Result<CatalogStats, CatalogError>;

    /// Clear all stored items.
    fn clear(&self) -> Result<(), CatalogError>;

    /// Insert `items` only if the catalog holds nothing. Returns how many were inserted.
    fn seed_if_empty(&self, items: &[NewCatalogItem]) -> Result<u32, CatalogError>;
}

/// Sample items used to seed an empty catalog.
pub fn default_seed() -> Vec<NewCatalogItem> {
    [
        ("Inception", MediaType::Movie, "2010"),
        ("The Shining", MediaType::Movie, "1980"),
        ("The Lord of the Rings", MediaType::Book, "1954"),
        ("Dune", MediaType::Book, "1965"),
        ("Dark Side of the Moon", MediaType::Music, "1973"),
        ("Stranger Things", MediaType::Show, "2016"),
    ]
    .into_iter()
    .map(|(title, media_type, year)| NewCatalogItem::new(title, media_type).with_year(year))
    .collect()
}
