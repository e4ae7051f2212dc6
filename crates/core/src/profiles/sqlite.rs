//! Profiles stored alongside the catalog in its SQLite database.

use rusqlite::{params, Row};
use serde_json::{Map, Value};
use tracing::info;

use super::{NewProfile, Profile, ProfileStore};
use crate::catalog::{db_err, CatalogError, SqliteCatalog};

const PROFILE_COLUMNS: &str = "id, name, type, description, config";

fn row_to_profile(row: &Row) -> rusqlite::Result<Profile> {
    let config: String = row.get(4)?;
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        profile_type: row.get(2)?,
        description: row.get(3)?,
        config: serde_json::from_str::<Map<String, Value>>(&config).unwrap_or_default(),
    })
}

fn config_json(profile: &NewProfile) -> Result<String, CatalogError> {
    serde_json::to_string(&profile.config).map_err(|e| CatalogError::Invalid(e.to_string()))
}

impl ProfileStore for SqliteCatalog {
    fn create_profile(&self, profile: &NewProfile) -> Result<Profile, CatalogError> {
        profile.validate()?;
        let config = config_json(profile)?;
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO profiles (name, type, description, config) VALUES (?1, ?2, ?3, ?4)",
            params![
                profile.name.trim(),
                profile.profile_type.trim(),
                &profile.description,
                &config
            ],
        )
        .map_err(db_err)?;
        let id = conn.last_insert_rowid();
        drop(conn);

        info!(id, name = %profile.name.trim(), "Created profile");
        self.get_profile(id)
    }

    fn get_profile(&self, id: i64) -> Result<Profile, CatalogError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
            params![id],
            row_to_profile,
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                CatalogError::NotFound(format!("profile {}", id))
            }
            other => db_err(other),
        })
    }

    fn list_profiles(&self) -> Result<Vec<Profile>, CatalogError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM profiles ORDER BY id ASC", PROFILE_COLUMNS))
            .map_err(db_err)?;
        let rows = stmt.query_map([], row_to_profile).map_err(db_err)?;

        let mut profiles = Vec::new();
        for row in rows {
            profiles.push(row.map_err(db_err)?);
        }
        Ok(profiles)
    }

    fn update_profile(&self, id: i64, profile: &NewProfile) -> Result<Profile, CatalogError> {
        profile.validate()?;
        let config = config_json(profile)?;
        let conn = self.conn()?;

        let updated = conn
            .execute(
                "UPDATE profiles SET name = ?1, type = ?2, description = ?3, config = ?4
                 WHERE id = ?5",
                params![
                    profile.name.trim(),
                    profile.profile_type.trim(),
                    &profile.description,
                    &config,
                    id
                ],
            )
            .map_err(db_err)?;
        drop(conn);

        if updated == 0 {
            return Err(CatalogError::NotFound(format!("profile {}", id)));
        }
        self.get_profile(id)
    }

    fn delete_profile(&self, id: i64) -> Result<(), CatalogError> {
        let conn = self.conn()?;
        let removed = conn
            .execute("DELETE FROM profiles WHERE id = ?1", params![id])
            .map_err(db_err)?;

        if removed == 0 {
            return Err(CatalogError::NotFound(format!("profile {}", id)));
        }
        info!(id, "Deleted profile");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MediaCatalog;
    use tempfile::TempDir;

    #[test]
    fn test_create_get_and_list_in_creation_order() {
        let store = SqliteCatalog::in_memory().unwrap();
        let films = store
            .create_profile(
                &NewProfile::new(" Films ", "movies")
                    .with_description("Feature films")
                    .with_config("quality", "1080p"),
            )
            .unwrap();
        let shows = store.create_profile(&NewProfile::new("Shows", "shows")).unwrap();

        assert_eq!(films.name, "Films");
        assert_eq!(films.config["quality"], "1080p");
        assert_eq!(store.get_profile(films.id).unwrap(), films);

        let names: Vec<_> = store
            .list_profiles()
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Films", "Shows"]);
        assert!(shows.id > films.id);
    }

    #[test]
    fn test_update_replaces_fields() {
        let store = SqliteCatalog::in_memory().unwrap();
        let created = store
            .create_profile(&NewProfile::new("Films", "movies").with_config("quality", "720p"))
            .unwrap();

        let updated = store
            .update_profile(created.id, &NewProfile::new("Cinema", "movies"))
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Cinema");
        assert!(updated.config.is_empty());

        assert!(matches!(
            store.update_profile(999, &NewProfile::new("Ghost", "movies")),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_and_missing_profiles() {
        let store = SqliteCatalog::in_memory().unwrap();
        let created = store.create_profile(&NewProfile::new("Music", "music")).unwrap();

        store.delete_profile(created.id).unwrap();
        assert!(matches!(
            store.get_profile(created.id),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_profile(created.id),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn test_invalid_profile_rejected_before_storage() {
        let store = SqliteCatalog::in_memory().unwrap();
        assert!(matches!(
            store.create_profile(&NewProfile::new("", "movies")),
            Err(CatalogError::Invalid(_))
        ));
        assert!(store.list_profiles().unwrap().is_empty());
    }

    #[test]
    fn test_profiles_survive_reopen_and_catalog_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("findarr.db");

        let store = SqliteCatalog::new(&path, 2).unwrap();
        store.create_profile(&NewProfile::new("Books", "books")).unwrap();
        store.clear().unwrap();
        drop(store);

        let reopened = SqliteCatalog::new(&path, 2).unwrap();
        let profiles = reopened.list_profiles().unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].profile_type, "books");
    }
}
