//! SQLite-backed media catalog.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::functions::FunctionFlags;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Transaction};
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{
    CatalogError, CatalogItem, CatalogSearchQuery, CatalogStats, MediaCatalog, NewCatalogItem,
    UpsertOutcome,
};
use crate::media::{MediaResult, MediaType};

/// How long to wait for a pooled connection before reporting the store unavailable.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

const ITEM_COLUMNS: &str = "id, title, media_type, year, origin_provider, origin_source_id, \
                            metadata, first_seen_at, last_seen_at, seen_count";

/// SQLite-backed media catalog with a pooled set of connections.
pub struct SqliteCatalog {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteCatalog {
    /// Open (or create) the catalog database at `path` with up to `pool_size` connections.
    pub fn new(path: &Path, pool_size: u32) -> Result<Self, CatalogError> {
        Self::open(path, pool_size, CONNECTION_TIMEOUT)
    }

    /// Like [`SqliteCatalog::new`] with an explicit wait for pooled connections.
    pub fn open(
        path: &Path,
        pool_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
            init_connection(conn)
        });
        let catalog = Self::build(manager, pool_size.max(1), connection_timeout)?;
        info!(path = %path.display(), pool_size, "Opened catalog database");
        Ok(catalog)
    }

    /// Create an in-memory catalog (useful for testing).
    ///
    /// Every SQLite in-memory connection is its own database, so the pool holds
    /// a single connection.
    pub fn in_memory() -> Result<Self, CatalogError> {
        let manager = SqliteConnectionManager::memory().with_init(init_connection);
        Self::build(manager, 1, CONNECTION_TIMEOUT)
    }

    fn build(
        manager: SqliteConnectionManager,
        pool_size: u32,
        connection_timeout: Duration,
    ) -> Result<Self, CatalogError> {
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(connection_timeout)
            .build(manager)
            .map_err(|e| {
                CatalogError::StorageUnavailable(format!("Failed to create connection pool: {}", e))
            })?;

        let catalog = Self { pool };
        let conn = catalog.conn()?;
        Self::initialize_schema(&conn)?;
        drop(conn);
        Ok(catalog)
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CatalogError> {
        conn.execute_batch(
            r#"
            -- One row per known media item; origin columns are NULL for items added directly
            CREATE TABLE IF NOT EXISTS media_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                media_type TEXT NOT NULL,
                year TEXT,
                origin_provider TEXT,
                origin_source_id TEXT,
                metadata TEXT NOT NULL DEFAULT '{}',
                first_seen_at TEXT NOT NULL,
                last_seen_at TEXT NOT NULL,
                seen_count INTEGER NOT NULL DEFAULT 1,
                UNIQUE(origin_provider, origin_source_id)
            );

            CREATE INDEX IF NOT EXISTS idx_media_items_title ON media_items(title);
            CREATE INDEX IF NOT EXISTS idx_media_items_type ON media_items(media_type);

            -- Content profiles; config is a JSON object
            CREATE TABLE IF NOT EXISTS profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                type TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                config TEXT NOT NULL DEFAULT '{}'
            );
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    pub(crate) fn conn(
        &self,
    ) -> Result<PooledConnection<SqliteConnectionManager>, CatalogError> {
        self.pool
            .get()
            .map_err(|e| CatalogError::StorageUnavailable(e.to_string()))
    }

    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<CatalogItem> {
        let media_type: String = row.get(2)?;
        let metadata: String = row.get(6)?;
        let first_seen_str: String = row.get(7)?;
        let last_seen_str: String = row.get(8)?;

        Ok(CatalogItem {
            id: row.get(0)?,
            title: row.get(1)?,
            media_type: MediaType::parse_lenient(&media_type),
            year: row.get(3)?,
            origin_provider: row.get(4)?,
            origin_source_id: row.get(5)?,
            metadata: serde_json::from_str::<Map<String, Value>>(&metadata).unwrap_or_default(),
            first_seen_at: parse_timestamp(&first_seen_str),
            last_seen_at: parse_timestamp(&last_seen_str),
            seen_count: row.get(9)?,
        })
    }

    /// Insert or refresh one item inside an open transaction.
    fn upsert_in(tx: &Transaction, item: &NewCatalogItem) -> Result<UpsertOutcome, CatalogError> {
        item.validate()?;
        let now = Utc::now().to_rfc3339();
        let metadata = serde_json::to_string(&item.metadata)
            .map_err(|e| CatalogError::Invalid(e.to_string()))?;

        let existing: Option<i64> = match (&item.origin_provider, &item.origin_source_id) {
            (Some(provider), Some(source_id)) => tx
                .query_row(
                    "SELECT id FROM media_items
                     WHERE origin_provider = ?1 AND origin_source_id = ?2",
                    params![provider, source_id],
                    |row| row.get(0),
                )
                .optional()
                .map_err(db_err)?,
            _ => None,
        };

        if let Some(id) = existing {
            tx.execute(
                "UPDATE media_items
                 SET title = ?1, media_type = ?2, year = ?3, metadata = ?4,
                     last_seen_at = ?5, seen_count = seen_count + 1
                 WHERE id = ?6",
                params![
                    item.title.trim(),
                    item.media_type.as_str(),
                    &item.year,
                    &metadata,
                    &now,
                    id
                ],
            )
            .map_err(db_err)?;
            return Ok(UpsertOutcome { id, created: false });
        }

        tx.execute(
            "INSERT INTO media_items
                (title, media_type, year, origin_provider, origin_source_id, metadata,
                 first_seen_at, last_seen_at, seen_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7, 1)",
            params![
                item.title.trim(),
                item.media_type.as_str(),
                &item.year,
                &item.origin_provider,
                &item.origin_source_id,
                &metadata,
                &now,
            ],
        )
        .map_err(db_err)?;

        Ok(UpsertOutcome {
            id: tx.last_insert_rowid(),
            created: true,
        })
    }
}

impl MediaCatalog for SqliteCatalog {
    fn search(&self, query: &CatalogSearchQuery) -> Result<Vec<CatalogItem>, CatalogError> {
        let conn = self.conn()?;
        let pattern = format!("%{}%", escape_like(&query.query.trim().to_lowercase()));
        let limit = query.limit.map(i64::from).unwrap_or(-1);

        let mut stmt = conn
            .prepare(&format!(
                r"SELECT {} FROM media_items
                  WHERE unicode_lower(title) LIKE ?1 ESCAPE '\'
                  ORDER BY id ASC
                  LIMIT ?2",
                ITEM_COLUMNS
            ))
            .map_err(db_err)?;

        let rows = stmt
            .query_map(params![&pattern, limit], Self::row_to_item)
            .map_err(db_err)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(db_err)?);
        }

        debug!(query = %query.query, results = items.len(), "Catalog search");
        Ok(items)
    }

    fn upsert(&self, item: &NewCatalogItem) -> Result<UpsertOutcome, CatalogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let outcome = Self::upsert_in(&tx, item)?;
        tx.commit().map_err(db_err)?;
        Ok(outcome)
    }

    fn upsert_results(&self, results: &[MediaResult]) -> Result<u32, CatalogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let mut new_count = 0;

        for result in results {
            if Self::upsert_in(&tx, &NewCatalogItem::from_result(result))?.created {
                new_count += 1;
            }
        }

        tx.commit().map_err(db_err)?;
        debug!(results = results.len(), new = new_count, "Cached results in catalog");
        Ok(new_count)
    }

    fn get(&self, id: i64) -> Result<CatalogItem, CatalogError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM media_items WHERE id = ?1", ITEM_COLUMNS),
            params![id],
            Self::row_to_item,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => CatalogError::NotFound(id.to_string()),
            other => db_err(other),
        })
    }

    fn remove(&self, id: i64) -> Result<(), CatalogError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM media_items WHERE id = ?1", params![id])
            .map_err(db_err)?;

        if removed == 0 {
            return Err(CatalogError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let conn = self.conn()?;

        let (total_items, cached_items, oldest, newest): (
            i64,
            i64,
            Option<String>,
            Option<String>,
        ) = conn
            .query_row(
                "SELECT COUNT(*),
                        COUNT(origin_provider),
                        MIN(first_seen_at),
                        MAX(last_seen_at)
                 FROM media_items",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .map_err(db_err)?;

        let mut stmt = conn
            .prepare("SELECT media_type, COUNT(*) FROM media_items GROUP BY media_type")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))
            .map_err(db_err)?;

        let mut by_media_type = std::collections::BTreeMap::new();
        for row in rows {
            let (media_type, count) = row.map_err(db_err)?;
            by_media_type.insert(media_type, count as u64);
        }

        Ok(CatalogStats {
            total_items: total_items as u64,
            by_media_type,
            cached_items: cached_items as u64,
            oldest_entry: oldest.as_deref().map(parse_timestamp),
            newest_entry: newest.as_deref().map(parse_timestamp),
        })
    }

    fn clear(&self) -> Result<(), CatalogError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM media_items", []).map_err(db_err)?;
        Ok(())
    }

    fn seed_if_empty(&self, items: &[NewCatalogItem]) -> Result<u32, CatalogError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;

        let count: i64 = tx
            .query_row("SELECT COUNT(*) FROM media_items", [], |row| row.get(0))
            .map_err(db_err)?;
        if count > 0 {
            return Ok(0);
        }

        let mut inserted = 0;
        for item in items {
            Self::upsert_in(&tx, item)?;
            inserted += 1;
        }
        tx.commit().map_err(db_err)?;

        info!(items = inserted, "Seeded empty catalog");
        Ok(inserted)
    }
}

/// Map a rusqlite error, treating lock contention and unopenable files as unavailability.
pub(crate) fn db_err(e: rusqlite::Error) -> CatalogError {
    match &e {
        rusqlite::Error::SqliteFailure(err, _)
            if matches!(
                err.code,
                ErrorCode::CannotOpen | ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
            ) =>
        {
            CatalogError::StorageUnavailable(e.to_string())
        }
        _ => CatalogError::Database(e.to_string()),
    }
}

/// Per-connection setup shared by file and in-memory catalogs.
///
/// SQLite's `LOWER` only folds ASCII, so searches compare titles through
/// `unicode_lower`, which lowercases the same way the query is lowercased.
fn init_connection(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| Ok(ctx.get::<Option<String>>(0)?.map(|s| s.to_lowercase())),
    )
}

/// Escape LIKE wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_seed;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn seeded() -> SqliteCatalog {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog.seed_if_empty(&default_seed()).unwrap();
        catalog
    }

    fn titles(items: &[CatalogItem]) -> Vec<&str> {
        items.iter().map(|i| i.title.as_str()).collect()
    }

    #[test]
    fn test_search_substring_case_insensitive() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog
            .seed_if_empty(&[
                NewCatalogItem::new("Inception", MediaType::Movie).with_year("2010"),
                NewCatalogItem::new("Dune", MediaType::Book).with_year("1965"),
            ])
            .unwrap();

        let items = catalog.search(&CatalogSearchQuery::new("du")).unwrap();
        assert_eq!(titles(&items), vec!["Dune"]);

        let items = catalog.search(&CatalogSearchQuery::new("INCEP")).unwrap();
        assert_eq!(titles(&items), vec!["Inception"]);
        assert_eq!(items[0].year.as_deref(), Some("2010"));
        assert_eq!(items[0].media_type, MediaType::Movie);
    }

    #[test]
    fn test_search_folds_non_ascii_case() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog
            .upsert(&NewCatalogItem::new("L'ÉCOLE DES FEMMES", MediaType::Book))
            .unwrap();
        catalog
            .upsert(&NewCatalogItem::new("Ёжик в тумане", MediaType::Movie))
            .unwrap();

        let items = catalog.search(&CatalogSearchQuery::new("école")).unwrap();
        assert_eq!(titles(&items), vec!["L'ÉCOLE DES FEMMES"]);

        let items = catalog.search(&CatalogSearchQuery::new("ЁЖИК")).unwrap();
        assert_eq!(titles(&items), vec!["Ёжик в тумане"]);
    }

    #[test]
    fn test_empty_query_returns_everything_in_id_order() {
        let catalog = seeded();
        let items = catalog.search(&CatalogSearchQuery::new("")).unwrap();
        assert_eq!(
            titles(&items),
            vec![
                "Inception",
                "The Shining",
                "The Lord of the Rings",
                "Dune",
                "Dark Side of the Moon",
                "Stranger Things",
            ]
        );
    }

    #[test]
    fn test_search_limit() {
        let catalog = seeded();
        let query = CatalogSearchQuery {
            query: "the".to_string(),
            limit: Some(2),
        };
        let items = catalog.search(&query).unwrap();
        assert_eq!(titles(&items), vec!["The Shining", "The Lord of the Rings"]);
    }

    #[test]
    fn test_search_escapes_wildcards() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        catalog
            .upsert(&NewCatalogItem::new("100% Pure", MediaType::Music))
            .unwrap();
        catalog
            .upsert(&NewCatalogItem::new("1000 Pure Hits", MediaType::Music))
            .unwrap();

        let items = catalog.search(&CatalogSearchQuery::new("100%")).unwrap();
        assert_eq!(titles(&items), vec!["100% Pure"]);

        assert!(catalog.search(&CatalogSearchQuery::new("_")).unwrap().is_empty());
    }

    #[test]
    fn test_upsert_by_origin_refreshes_existing_row() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let item =
            NewCatalogItem::new("Inception", MediaType::Movie).with_origin("tmdb", "movie:27205");

        let first = catalog.upsert(&item).unwrap();
        assert!(first.created);

        let updated = item.clone().with_year("2010");
        let second = catalog.upsert(&updated).unwrap();
        assert!(!second.created);
        assert_eq!(second.id, first.id);

        let stored = catalog.get(first.id).unwrap();
        assert_eq!(stored.year.as_deref(), Some("2010"));
        assert_eq!(stored.seen_count, 2);
        assert!(stored.last_seen_at >= stored.first_seen_at);
    }

    #[test]
    fn test_upsert_without_origin_always_inserts() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let item = NewCatalogItem::new("Dune", MediaType::Book);
        let a = catalog.upsert(&item).unwrap();
        let b = catalog.upsert(&item).unwrap();
        assert!(a.created && b.created);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_upsert_rejects_blank_title() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let err = catalog
            .upsert(&NewCatalogItem::new(" ", MediaType::Other))
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
    }

    #[test]
    fn test_upsert_results_counts_new_rows() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let results = vec![
            MediaResult::new("tmdb", "movie:1", "Alien", MediaType::Movie)
                .with_metadata("vote_average", 8.2),
            MediaResult::new("tmdb", "movie:2", "Aliens", MediaType::Movie),
        ];

        assert_eq!(catalog.upsert_results(&results).unwrap(), 2);
        assert_eq!(catalog.upsert_results(&results).unwrap(), 0);

        let items = catalog.search(&CatalogSearchQuery::new("alien")).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].origin_provider.as_deref(), Some("tmdb"));
        assert_eq!(items[0].metadata["vote_average"], 8.2);
        assert_eq!(items[0].seen_count, 2);
    }

    #[test]
    fn test_get_and_remove() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let outcome = catalog
            .upsert(&NewCatalogItem::new("Dune", MediaType::Book))
            .unwrap();

        assert_eq!(catalog.get(outcome.id).unwrap().title, "Dune");
        catalog.remove(outcome.id).unwrap();

        assert!(matches!(catalog.get(outcome.id), Err(CatalogError::NotFound(_))));
        assert!(matches!(catalog.remove(outcome.id), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_stats() {
        let catalog = seeded();
        catalog
            .upsert(
                &NewCatalogItem::new("Arrival", MediaType::Movie)
                    .with_origin("tmdb", "movie:329865"),
            )
            .unwrap();

        let stats = catalog.stats().unwrap();
        assert_eq!(stats.total_items, 7);
        assert_eq!(stats.cached_items, 1);
        assert_eq!(stats.by_media_type["movie"], 3);
        assert_eq!(stats.by_media_type["book"], 2);
        assert!(stats.oldest_entry.is_some());
        assert!(stats.newest_entry.is_some());
    }

    #[test]
    fn test_empty_stats() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        let stats = catalog.stats().unwrap();
        assert_eq!(stats.total_items, 0);
        assert!(stats.by_media_type.is_empty());
        assert!(stats.oldest_entry.is_none());
    }

    #[test]
    fn test_seed_only_when_empty_and_clear() {
        let catalog = SqliteCatalog::in_memory().unwrap();
        assert_eq!(catalog.seed_if_empty(&default_seed()).unwrap(), 6);
        assert_eq!(catalog.seed_if_empty(&default_seed()).unwrap(), 0);

        catalog.clear().unwrap();
        assert_eq!(catalog.stats().unwrap().total_items, 0);
        assert_eq!(catalog.seed_if_empty(&default_seed()).unwrap(), 6);
    }

    #[test]
    fn test_file_catalog_persists_and_serves_concurrent_readers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("catalog.db");

        {
            let catalog = SqliteCatalog::new(&path, 4).unwrap();
            catalog.seed_if_empty(&default_seed()).unwrap();
        }

        let catalog = Arc::new(SqliteCatalog::new(&path, 4).unwrap());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                std::thread::spawn(move || catalog.search(&CatalogSearchQuery::new("du")).unwrap())
            })
            .collect();

        for handle in handles {
            let items = handle.join().unwrap();
            assert_eq!(titles(&items), vec!["Dune"]);
        }
    }

    #[test]
    fn test_unopenable_path_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("nested").join("catalog.db");

        let result = SqliteCatalog::open(&path, 1, Duration::from_millis(200));
        assert!(matches!(result, Err(CatalogError::StorageUnavailable(_))));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("plain"), "plain");
    }
}
