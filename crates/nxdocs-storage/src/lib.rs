//! Storage abstraction for the NetExec docs API.
//!
//! This crate defines the record types (protocols, modules, tutorials, saved
//! commands) and the [`Storage`] trait every backend implements. Handlers
//! hold an `Arc<dyn Storage>` and never know which backend is behind it.
//!
//! Two implementations are provided:
//!
//! - [`MemoryStorage`]: seeded from the bundled fixtures, lost on restart
//! - [`PostgresStorage`]: relational tables in `PostgreSQL` (feature `postgres-backend`)

mod error;
pub mod fixtures;
mod memory;
pub mod models;
#[cfg(feature = "postgres-backend")]
mod postgres_backend;

pub use error::StorageError;
pub use fixtures::Fixtures;
pub use memory::MemoryStorage;
pub use models::{
    AdditionalOptions, Level, Module, ModuleExample, ModuleParameter, ModuleParams,
    NewSavedCommand, Protocol, SavedCommand, SavedCommandPatch, Stability, Tutorial,
};
#[cfg(feature = "postgres-backend")]
pub use postgres_backend::PostgresStorage;

/// Read access to reference content and CRUD over saved commands.
///
/// Lookups that find nothing return `Ok(None)` or an empty list. An `Err`
/// always means the backend failed.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait Storage: Send + Sync + 'static {
    /// Prepare the backend's reference content.
    ///
    /// The in-memory backend is seeded at construction, so this is a no-op
    /// there. The relational backend clears all four tables and reloads them
    /// from the fixtures.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backend fails.
    async fn initialize(&self) -> Result<(), StorageError>;

    /// List every protocol.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn list_protocols(&self) -> Result<Vec<Protocol>, StorageError>;

    /// List every module across all protocols.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn list_modules(&self) -> Result<Vec<Module>, StorageError>;

    /// List the modules of the protocol with the given name.
    ///
    /// The protocol is resolved by name first. An unknown protocol yields an
    /// empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn list_modules_by_protocol(&self, protocol: &str) -> Result<Vec<Module>, StorageError>;

    /// Find one module by protocol name and module name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn get_module(&self, protocol: &str, name: &str)
    -> Result<Option<Module>, StorageError>;

    /// List every tutorial.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn list_tutorials(&self) -> Result<Vec<Tutorial>, StorageError>;

    /// Find a tutorial by slug.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn get_tutorial(&self, slug: &str) -> Result<Option<Tutorial>, StorageError>;

    /// List every saved command.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn list_saved_commands(&self) -> Result<Vec<SavedCommand>, StorageError>;

    /// Find a saved command by id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn get_saved_command(&self, id: i32) -> Result<Option<SavedCommand>, StorageError>;

    /// Store a new saved command and return it with its assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn create_saved_command(
        &self,
        command: NewSavedCommand,
    ) -> Result<SavedCommand, StorageError>;

    /// Apply a partial update. Returns `Ok(None)` if the id does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn update_saved_command(
        &self,
        id: i32,
        patch: SavedCommandPatch,
    ) -> Result<Option<SavedCommand>, StorageError>;

    /// Delete a saved command. Deleting a non-existent
    /// id is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Query`] if the backend fails.
    async fn delete_saved_command(&self, id: i32) -> Result<(), StorageError>;
}
