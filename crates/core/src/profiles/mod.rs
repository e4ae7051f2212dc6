//! Content profiles.
//!
//! A profile names a kind of content the user collects (movies, shows, a
//! YouTube channel...) together with an opaque JSON configuration. Profiles
//! live in the catalog database and share its error type.

mod sqlite;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog::CatalogError;

/// A stored profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    /// Free-form content type, for example `movies` or `youtube`.
    #[serde(rename = "type")]
    pub profile_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

/// Fields for creating or replacing a profile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub profile_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: Map<String, Value>,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, profile_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            profile_type: profile_type.into(),
            description: String::new(),
            config: Map::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_config(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.config.insert(key.to_string(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.name.trim().is_empty() {
            return Err(CatalogError::Invalid("profile name cannot be empty".to_string()));
        }
        if self.profile_type.trim().is_empty() {
            return Err(CatalogError::Invalid("profile type cannot be empty".to_string()));
        }
        Ok(())
    }
}

/// Trait for profile storage.
///
/// Methods block; async callers should run them on a blocking thread.
pub trait ProfileStore: Send + Sync {
    fn create_profile(&self, profile: &NewProfile) -> Result<Profile, CatalogError>;

    fn get_profile(&self, id: i64) -> Result<Profile, CatalogError>;

    /// Every profile, in creation order.
    fn list_profiles(&self) -> Result<Vec<Profile>, CatalogError>;

    /// Replace every field of an existing profile.
    fn update_profile(&self, id: i64, profile: &NewProfile) -> Result<Profile, CatalogError>;

    /// Fails with `NotFound` if absent.
    fn delete_profile(&self, id: i64) -> Result<(), CatalogError>;
}
