//! Record types served by the API.
//!
//! Field names are camelCase on the wire. Every record also accepts `_id` in
//! place of `id` when deserialized, so documents exported from a
//! document-style store load without a rename step.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

// ── Protocols ────────────────────────────────────────────────────────

/// A network service category (SMB, LDAP, ...) that groups modules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres-backend", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    #[serde(alias = "_id")]
    pub id: i32,
    pub name: String,
    pub display_name: String,
    pub icon: String,
    pub description: String,
}

// ── Modules ──────────────────────────────────────────────────────────

/// Maturity label on a module. Documentation metadata only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
    Stable,
    Beta,
    Experimental,
}

impl std::fmt::Display for Stability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stable => write!(f, "stable"),
            Self::Beta => write!(f, "beta"),
            Self::Experimental => write!(f, "experimental"),
        }
    }
}

impl std::str::FromStr for Stability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stable" => Ok(Self::Stable),
            "beta" => Ok(Self::Beta),
            "experimental" => Ok(Self::Experimental),
            other => Err(format!("unknown stability: {other}")),
        }
    }
}

/// An optional module parameter with its default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleParameter {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// A documented invocation of a module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleExample {
    pub description: String,
    pub command: String,
}

/// A documented unit of functionality belonging to one protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Module {
    #[serde(alias = "_id")]
    pub id: i32,
    pub name: String,
    pub protocol_id: i32,
    pub description: String,
    pub stability: Stability,
    #[serde(default)]
    pub required_params: Option<Vec<String>>,
    #[serde(default)]
    pub optional_params: Option<Vec<ModuleParameter>>,
    #[serde(default)]
    pub examples: Option<Vec<ModuleExample>>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub troubleshooting: Option<Vec<String>>,
}

// ── Tutorials ────────────────────────────────────────────────────────

/// Difficulty of a tutorial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Beginner => write!(f, "beginner"),
            Self::Intermediate => write!(f, "intermediate"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown level: {other}")),
        }
    }
}

/// A long-form guide, addressed by its slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tutorial {
    #[serde(alias = "_id")]
    pub id: i32,
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub image: Option<String>,
    pub description: String,
    pub content: String,
    pub level: Level,
    pub read_time: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

// ── Saved commands ───────────────────────────────────────────────────

/// Module parameters toggled on or off, in the order they were set.
pub type ModuleParams = IndexMap<String, bool>;

/// Extra command-line switches. A `null` value counts as unset.
pub type AdditionalOptions = IndexMap<String, Option<bool>>;

/// A persisted snapshot of command-builder state and its command string.
///
/// `command` is whatever the client generated at save time. It is never
/// recomputed from the other fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCommand {
    #[serde(alias = "_id")]
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i32>,
    pub protocol: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_hash: bool,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub module_params: ModuleParams,
    #[serde(default)]
    pub additional_options: AdditionalOptions,
    pub command: String,
}

/// Fields for a new saved command. The store assigns the id.
///
/// Unknown fields (including a client-supplied `id`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSavedCommand {
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i32>,
    pub protocol: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub is_hash: bool,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub module_params: ModuleParams,
    #[serde(default)]
    pub additional_options: AdditionalOptions,
    pub command: String,
}

impl NewSavedCommand {
    /// Attach an id, producing the stored record.
    #[must_use]
    pub fn with_id(self, id: i32) -> SavedCommand {
        SavedCommand {
            id,
            name: self.name,
            user_id: self.user_id,
            protocol: self.protocol,
            target: self.target,
            username: self.username,
            password: self.password,
            is_hash: self.is_hash,
            module: self.module,
            module_params: self.module_params,
            additional_options: self.additional_options,
            command: self.command,
        }
    }
}

/// A partial update to a saved command.
///
/// `None` leaves a field unchanged. For nullable fields, `Some(None)` (an
/// explicit JSON `null`) clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCommandPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub user_id: Option<Option<i32>>,
    pub protocol: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub target: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub password: Option<Option<String>>,
    pub is_hash: Option<bool>,
    #[serde(default, deserialize_with = "present")]
    pub module: Option<Option<String>>,
    pub module_params: Option<ModuleParams>,
    pub additional_options: Option<AdditionalOptions>,
    pub command: Option<String>,
}

impl SavedCommandPatch {
    /// Merge the patch into an existing record. The id is never changed.
    pub fn apply(self, target: &mut SavedCommand) {
        if let Some(name) = self.name {
            target.name = name;
        }
        if let Some(user_id) = self.user_id {
            target.user_id = user_id;
        }
        if let Some(protocol) = self.protocol {
            target.protocol = protocol;
        }
        if let Some(value) = self.target {
            target.target = value;
        }
        if let Some(username) = self.username {
            target.username = username;
        }
        if let Some(password) = self.password {
            target.password = password;
        }
        if let Some(is_hash) = self.is_hash {
            target.is_hash = is_hash;
        }
        if let Some(module) = self.module {
            target.module = module;
        }
        if let Some(module_params) = self.module_params {
            target.module_params = module_params;
        }
        if let Some(additional_options) = self.additional_options {
            target.additional_options = additional_options;
        }
        if let Some(command) = self.command {
            target.command = command;
        }
    }
}

/// Distinguish a field that is present (possibly `null`) from one that is absent.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> SavedCommand {
        NewSavedCommand {
            name: "scan".to_owned(),
            protocol: "smb".to_owned(),
            target: Some("10.0.0.5".to_owned()),
            username: Some("admin".to_owned()),
            command: "netexec smb 10.0.0.5 -u admin".to_owned(),
            ..NewSavedCommand::default()
        }
        .with_id(7)
    }

    #[test]
    fn saved_command_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["isHash"], false);
        assert!(json["userId"].is_null());
        assert!(json.get("moduleParams").is_some());
        assert!(json.get("additionalOptions").is_some());
    }

    #[test]
    fn underscore_id_is_accepted() {
        let json = r#"{"_id": 3, "name": "smb", "displayName": "SMB", "icon": "fa-server", "description": "d"}"#;
        let protocol: Protocol = serde_json::from_str(json).unwrap();
        assert_eq!(protocol.id, 3);
    }

    #[test]
    fn new_command_ignores_client_id() {
        let json = r#"{"id": 99, "name": "n", "protocol": "ldap", "command": "netexec ldap x"}"#;
        let new: NewSavedCommand = serde_json::from_str(json).unwrap();
        assert_eq!(new.with_id(1).id, 1);
    }

    #[test]
    fn module_params_keep_insertion_order() {
        let json = r#"{"name": "n", "protocol": "smb", "command": "c",
            "moduleParams": {"zeta": true, "alpha": true, "mid": false}}"#;
        let new: NewSavedCommand = serde_json::from_str(json).unwrap();
        let keys: Vec<&str> = new.module_params.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn patch_leaves_absent_fields_alone() {
        let mut command = sample();
        let patch: SavedCommandPatch = serde_json::from_str(r#"{"name": "renamed"}"#).unwrap();
        patch.apply(&mut command);
        assert_eq!(command.name, "renamed");
        assert_eq!(command.username.as_deref(), Some("admin"));
        assert_eq!(command.id, 7);
    }

    #[test]
    fn patch_null_clears_nullable_field() {
        let mut command = sample();
        let patch: SavedCommandPatch =
            serde_json::from_str(r#"{"username": null, "isHash": true}"#).unwrap();
        patch.apply(&mut command);
        assert_eq!(command.username, None);
        assert!(command.is_hash);
        assert_eq!(command.target.as_deref(), Some("10.0.0.5"));
    }

    #[test]
    fn stability_parses_lowercase() {
        assert_eq!("beta".parse::<Stability>().unwrap(), Stability::Beta);
        assert!("Beta".parse::<Stability>().is_err());
        assert_eq!(Level::Advanced.to_string(), "advanced");
    }
}
