//! In-memory storage backend.
//!
//! Reference content is built once from the fixtures and never changes.
//! Saved commands live in a `BTreeMap` behind a `RwLock`. Nothing is
//! persistent; all saved commands are lost when the process exits.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::fixtures::{self, Fixtures};
use crate::models::{Module, NewSavedCommand, Protocol, SavedCommand, SavedCommandPatch, Tutorial};
use crate::{Storage, StorageError};

/// Id given to the first saved command created after seeding.
const FIRST_FREE_ID: i32 = 4;

/// An in-memory backend seeded from [`Fixtures`].
///
/// Protocol ids follow fixture order (1-based). Module ids come from the
/// same counter later used for saved commands. Clones share state.
///
/// # Examples
///
/// ```
/// # use nxdocs_storage::{MemoryStorage, Storage};
/// # #[tokio::main]
/// # async fn main() {
/// let storage = MemoryStorage::seeded().unwrap();
/// let modules = storage.list_modules_by_protocol("nonexistent").await.unwrap();
/// assert!(modules.is_empty());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryStorage {
    protocols: Arc<Vec<Protocol>>,
    modules: Arc<Vec<Module>>,
    tutorials: Arc<Vec<Tutorial>>,
    state: Arc<RwLock<State>>,
}

#[derive(Debug)]
struct State {
    saved_commands: BTreeMap<i32, SavedCommand>,
    next_id: i32,
}

impl State {
    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

impl MemoryStorage {
    /// Build a store from the bundled fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Fixture`] if the embedded fixtures are malformed.
    pub fn seeded() -> Result<Self, StorageError> {
        Ok(Self::from_fixtures(Fixtures::bundled()?))
    }

    /// Build a store from the given fixtures plus the example saved commands.
    #[must_use]
    pub fn from_fixtures(fixtures: Fixtures) -> Self {
        let protocols: Vec<Protocol> = fixtures
            .protocols
            .into_iter()
            .zip(1..)
            .map(|(p, id)| Protocol {
                id,
                name: p.name,
                display_name: p.display_name,
                icon: p.icon,
                description: p.description,
            })
            .collect();

        let mut state = State {
            saved_commands: BTreeMap::new(),
            next_id: 1,
        };

        let modules = fixtures
            .modules
            .into_iter()
            .map(|m| Module {
                id: state.allocate_id(),
                name: m.name,
                // Fixture modules for unlisted protocols attach to the first one.
                protocol_id: protocol_id(&protocols, &m.protocol).unwrap_or(1),
                description: m.description,
                stability: m.stability,
                required_params: m.required_params,
                optional_params: m.optional_params,
                examples: m.examples,
                output: m.output,
                troubleshooting: m.troubleshooting,
            })
            .collect();

        for (seed, id) in fixtures::seed_saved_commands().into_iter().zip(1..) {
            state.saved_commands.insert(id, seed.with_id(id));
        }
        state.next_id = FIRST_FREE_ID;

        tracing::debug!(
            protocols = protocols.len(),
            tutorials = fixtures.tutorials.len(),
            saved_commands = state.saved_commands.len(),
            "in-memory storage seeded"
        );

        Self {
            protocols: Arc::new(protocols),
            modules: Arc::new(modules),
            tutorials: Arc::new(fixtures.tutorials),
            state: Arc::new(RwLock::new(state)),
        }
    }

    fn resolve_protocol(&self, name: &str) -> Option<i32> {
        protocol_id(&self.protocols, name)
    }
}

fn protocol_id(protocols: &[Protocol], name: &str) -> Option<i32> {
    protocols.iter().find(|p| p.name == name).map(|p| p.id)
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<(), StorageError> {
        tracing::info!("using in-memory storage, no database initialization needed");
        Ok(())
    }

    async fn list_protocols(&self) -> Result<Vec<Protocol>, StorageError> {
        Ok(self.protocols.to_vec())
    }

    async fn list_modules(&self) -> Result<Vec<Module>, StorageError> {
        Ok(self.modules.to_vec())
    }

    async fn list_modules_by_protocol(&self, protocol: &str) -> Result<Vec<Module>, StorageError> {
        let Some(protocol_id) = self.resolve_protocol(protocol) else {
            return Ok(Vec::new());
        };
        Ok(self
            .modules
            .iter()
            .filter(|m| m.protocol_id == protocol_id)
            .cloned()
            .collect())
    }

    async fn get_module(
        &self,
        protocol: &str,
        name: &str,
    ) -> Result<Option<Module>, StorageError> {
        let Some(protocol_id) = self.resolve_protocol(protocol) else {
            return Ok(None);
        };
        Ok(self
            .modules
            .iter()
            .find(|m| m.protocol_id == protocol_id && m.name == name)
            .cloned())
    }

    async fn list_tutorials(&self) -> Result<Vec<Tutorial>, StorageError> {
        Ok(self.tutorials.to_vec())
    }

    async fn get_tutorial(&self, slug: &str) -> Result<Option<Tutorial>, StorageError> {
        Ok(self.tutorials.iter().find(|t| t.slug == slug).cloned())
    }

    async fn list_saved_commands(&self) -> Result<Vec<SavedCommand>, StorageError> {
        let state = self.state.read().await;
        Ok(state.saved_commands.values().cloned().collect())
    }

    async fn get_saved_command(&self, id: i32) -> Result<Option<SavedCommand>, StorageError> {
        let state = self.state.read().await;
        Ok(state.saved_commands.get(&id).cloned())
    }

    async fn create_saved_command(
        &self,
        command: NewSavedCommand,
    ) -> Result<SavedCommand, StorageError> {
        let mut state = self.state.write().await;
        let id = state.allocate_id();
        let saved = command.with_id(id);
        state.saved_commands.insert(id, saved.clone());
        Ok(saved)
    }

    async fn update_saved_command(
        &self,
        id: i32,
        patch: SavedCommandPatch,
    ) -> Result<Option<SavedCommand>, StorageError> {
        let mut state = self.state.write().await;
        let Some(existing) = state.saved_commands.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(existing);
        Ok(Some(existing.clone()))
    }

    async fn delete_saved_command(&self, id: i32) -> Result<(), StorageError> {
        let mut state = self.state.write().await;
        state.saved_commands.remove(&id);
        Ok(())
    }
}
