//! Catalog whose storage is never reachable.

use crate::catalog::{
    CatalogError, CatalogItem, CatalogSearchQuery, CatalogStats, MediaCatalog, NewCatalogItem,
    UpsertOutcome,
};
use crate::media::MediaResult;

/// Every operation fails with [`CatalogError::StorageUnavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableCatalog;

fn unavailable<T>() -> Result<T, CatalogError> {
    Err(CatalogError::StorageUnavailable(
        "database is not reachable".to_string(),
    ))
}

impl MediaCatalog for UnavailableCatalog {
    fn search(&self, _query: &CatalogSearchQuery) -> Result<Vec<CatalogItem>, CatalogError> {
        unavailable()
    }

    fn upsert(&self, _item: &NewCatalogItem) -> Result<UpsertOutcome, CatalogError> {
        unavailable()
    }

    fn upsert_results(&self, _results: &[MediaResult]) -> Result<u32, CatalogError> {
        unavailable()
    }

    fn get(&self, _id: i64) -> Result<CatalogItem, CatalogError> {
        unavailable()
    }

    fn remove(&self, _id: i64) -> Result<(), CatalogError> {
        unavailable()
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        unavailable()
    }

    fn clear(&self) -> Result<(), CatalogError> {
        unavailable()
    }

    fn seed_if_empty(&self, _items: &[NewCatalogItem]) -> Result<u32, CatalogError> {
        unavailable()
    }
}
