//! Client-side command building for the NetExec docs site.
//!
//! Turns command-builder form state into a `netexec` command line and keeps
//! a device-local list of quick-saved commands. The local list is separate
//! from the server's saved commands in `nxdocs-storage`; a snapshot can be
//! converted into a server payload, but the two are never synchronized.

pub mod command;
pub mod error;
pub mod generator;
pub mod local_store;

pub use command::{CommandForm, FormOptions, TargetType, build_command};
pub use error::CoreError;
pub use generator::{CommandGenerator, LocalSavedCommand};
pub use local_store::{FileStore, LocalStore, MemoryStore};
