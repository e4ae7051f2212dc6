//! Provider registry.
//!
//! Holds every provider the search engine can fan out to, keyed by provider
//! ID. Reads (snapshots taken by concurrent searches) share a read lock;
//! registration and removal take the write lock.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::provider::{Provider, ProviderKind};

/// Priority assigned by [`ProviderRegistry::register`]. Lower ranks win merges.
pub const DEFAULT_PRIORITY: u32 = 100;

/// Errors returned by registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("Provider not found: {0}")]
    NotFound(String),

    #[error("Invalid provider ID: {0:?}")]
    InvalidId(String),
}

/// How a provider is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Merge priority rank. When two providers report the same item, the
    /// lower rank wins.
    pub priority: u32,
    /// Replace an existing provider with the same ID instead of failing.
    /// The replacement keeps the original registration position.
    pub replace: bool,
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            priority: DEFAULT_PRIORITY,
            replace: false,
        }
    }
}

impl RegisterOptions {
    pub fn with_priority(priority: u32) -> Self {
        Self {
            priority,
            ..Default::default()
        }
    }

    pub fn replacing(mut self) -> Self {
        self.replace = true;
        self
    }
}

/// A registered provider together with its merge priority and position.
#[derive(Clone)]
pub struct Registration {
    provider: Arc<dyn Provider>,
    priority: u32,
    sequence: u64,
}

impl Registration {
    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    /// Registration order; lower registered earlier.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn info(&self) -> ProviderInfo {
        ProviderInfo {
            id: self.provider.id().to_string(),
            name: self.provider.name().to_string(),
            kind: self.provider.kind(),
            priority: self.priority,
        }
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.provider.id())
            .field("kind", &self.provider.kind())
            .field("priority", &self.priority)
            .field("sequence", &self.sequence)
            .finish()
    }
}

/// Providers picked for one search, taken under a single read lock.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Matching registrations, in registration order.
    pub registrations: Vec<Registration>,
    /// Requested IDs that are not registered, once each, in request order.
    pub missing: Vec<String>,
}

/// Public description of a registered provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub name: String,
    pub kind: ProviderKind,
    pub priority: u32,
}

/// Selects a subset of registered providers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderFilter {
    /// Only providers of these kinds.
    pub kinds: Option<Vec<ProviderKind>>,
    /// Only providers with these IDs.
    pub ids: Option<Vec<String>>,
}

impl ProviderFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn kinds(kinds: impl IntoIterator<Item = ProviderKind>) -> Self {
        Self {
            kinds: Some(kinds.into_iter().collect()),
            ids: None,
        }
    }

    pub fn ids<S: Into<String>>(ids: impl IntoIterator<Item = S>) -> Self {
        Self {
            kinds: None,
            ids: Some(ids.into_iter().map(Into::into).collect()),
        }
    }

    fn matches(&self, provider: &dyn Provider) -> bool {
        let kind_ok = self
            .kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&provider.kind()));
        let id_ok = self
            .ids
            .as_ref()
            .map_or(true, |ids| ids.iter().any(|id| id == provider.id()));
        kind_ok && id_ok
    }
}

#[derive(Default)]
struct RegistryState {
    providers: HashMap<String, Registration>,
    next_sequence: u64,
}

impl RegistryState {
    /// Registrations in registration order.
    fn ordered(&self) -> Vec<Registration> {
        let mut entries: Vec<_> = self.providers.values().cloned().collect();
        entries.sort_by_key(|r| r.sequence);
        entries
    }
}

/// Registry of search providers.
///
/// Constructed explicitly and shared via `Arc`; there is no process-wide
/// instance.
#[derive(Default)]
pub struct ProviderRegistry {
    state: RwLock<RegistryState>,
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("state", &"<providers>")
            .finish()
    }
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider with the default priority.
    ///
    /// Fails with [`RegistryError::DuplicateProvider`] if the ID is taken.
    pub async fn register(&self, provider: Box<dyn Provider>) -> Result<(), RegistryError> {
        self.register_with(provider, RegisterOptions::default()).await
    }

    /// Register a provider with explicit options.
    pub async fn register_with(
        &self,
        provider: Box<dyn Provider>,
        options: RegisterOptions,
    ) -> Result<(), RegistryError> {
        let id = provider.id().to_string();
        if id.trim().is_empty() {
            return Err(RegistryError::InvalidId(id));
        }

        let mut state = self.state.write().await;
        let sequence = match state.providers.get(&id) {
            Some(existing) if options.replace => existing.sequence,
            Some(_) => return Err(RegistryError::DuplicateProvider(id)),
            None => {
                let sequence = state.next_sequence;
                state.next_sequence += 1;
                sequence
            }
        };

        info!(
            provider = %id,
            kind = %provider.kind(),
            priority = options.priority,
            "Registered provider"
        );

        state.providers.insert(
            id,
            Registration {
                provider: Arc::from(provider),
                priority: options.priority,
                sequence,
            },
        );
        Ok(())
    }

    /// Remove a provider, returning it.
    pub async fn unregister(&self, id: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        let mut state = self.state.write().await;
        match state.providers.remove(id) {
            Some(registration) => {
                info!(provider = %id, "Unregistered provider");
                Ok(registration.provider)
            }
            None => Err(RegistryError::NotFound(id.to_string())),
        }
    }

    pub async fn get(&self, id: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        self.registration(id).await.map(|r| r.provider)
    }

    pub async fn registration(&self, id: &str) -> Result<Registration, RegistryError> {
        let state = self.state.read().await;
        state
            .providers
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.state.read().await.providers.contains_key(id)
    }

    /// Providers of `kind`, in registration order.
    ///
    /// The iterator walks a snapshot taken at call time; later registrations
    /// are not reflected.
    pub async fn list_by_kind(
        &self,
        kind: ProviderKind,
    ) -> impl Iterator<Item = Arc<dyn Provider>> {
        self.snapshot(&ProviderFilter::kinds([kind]))
            .await
            .into_iter()
            .map(|r| r.provider)
    }

    /// Descriptions of every provider, in registration order.
    pub async fn list(&self) -> Vec<ProviderInfo> {
        self.state
            .read()
            .await
            .ordered()
            .iter()
            .map(Registration::info)
            .collect()
    }

    /// Registrations selected by `filter`, in registration order.
    pub async fn snapshot(&self, filter: &ProviderFilter) -> Vec<Registration> {
        self.state
            .read()
            .await
            .ordered()
            .into_iter()
            .filter(|r| filter.matches(r.provider.as_ref()))
            .collect()
    }

    /// Like [`snapshot`](Self::snapshot), but also reports which IDs named
    /// by `filter.ids` are absent, consistently with the returned snapshot.
    pub async fn select(&self, filter: &ProviderFilter) -> Selection {
        let state = self.state.read().await;
        let registrations = state
            .ordered()
            .into_iter()
            .filter(|r| filter.matches(r.provider.as_ref()))
            .collect();

        let mut missing: Vec<String> = Vec::new();
        for id in filter.ids.iter().flatten() {
            if !state.providers.contains_key(id) && !missing.contains(id) {
                missing.push(id.clone());
            }
        }

        Selection {
            registrations,
            missing,
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.providers.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
