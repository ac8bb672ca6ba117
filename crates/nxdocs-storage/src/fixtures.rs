//! Static reference content bundled into the binary.
//!
//! Protocols, modules, and tutorials are embedded as JSON and parsed on
//! demand. Both backends seed from the same [`Fixtures`] so they serve the
//! same content.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::StorageError;
use crate::models::{
    ModuleExample, ModuleParameter, NewSavedCommand, Stability, Tutorial,
};

const PROTOCOLS_JSON: &str = include_str!("../fixtures/protocols.json");
const MODULES_JSON: &str = include_str!("../fixtures/modules.json");
const TUTORIALS_JSON: &str = include_str!("../fixtures/tutorials.json");

/// A protocol before it has been assigned an id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolFixture {
    pub name: String,
    pub display_name: String,
    pub icon: String,
    pub description: String,
}

/// A module that references its protocol by name rather than by id.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleFixture {
    pub name: String,
    pub protocol: String,
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

/// The full set of bundled reference content.
#[derive(Debug, Clone)]
pub struct Fixtures {
    pub protocols: Vec<ProtocolFixture>,
    pub modules: Vec<ModuleFixture>,
    /// Tutorials carry their own ids in the fixture file.
    pub tutorials: Vec<Tutorial>,
}

impl Fixtures {
    /// Parse the embedded fixture files.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Fixture`] if any embedded file is malformed.
    pub fn bundled() -> Result<Self, StorageError> {
        Ok(Self {
            protocols: parse("protocols.json", PROTOCOLS_JSON)?,
            modules: parse("modules.json", MODULES_JSON)?,
            tutorials: parse("tutorials.json", TUTORIALS_JSON)?,
        })
    }
}

fn parse<T: serde::de::DeserializeOwned>(name: &str, raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Fixture {
        name: name.to_owned(),
        reason: e.to_string(),
    })
}

/// The example saved commands every fresh store starts with.
pub fn seed_saved_commands() -> Vec<NewSavedCommand> {
    vec![
        NewSavedCommand {
            name: "SMB Share Scanner".to_owned(),
            user_id: None,
            protocol: "smb".to_owned(),
            target: Some("192.168.1.0/24".to_owned()),
            username: Some("Administrator".to_owned()),
            password: Some("Password123!".to_owned()),
            is_hash: false,
            module: Some("shares".to_owned()),
            module_params: IndexMap::from([("check-share-access".to_owned(), true)]),
            additional_options: IndexMap::from([("verbose".to_owned(), Some(true))]),
            command: "netexec smb 192.168.1.0/24 -u Administrator -p 'Password123!' --shares --verbose"
                .to_owned(),
        },
        NewSavedCommand {
            name: "Domain User Enumeration".to_owned(),
            user_id: None,
            protocol: "ldap".to_owned(),
            target: Some("192.168.1.10".to_owned()),
            username: Some("Administrator".to_owned()),
            password: Some("Password123!".to_owned()),
            is_hash: false,
            module: Some("user_hunter".to_owned()),
            module_params: IndexMap::from([("admin-count".to_owned(), true)]),
            additional_options: IndexMap::new(),
            command: "netexec ldap 192.168.1.10 -u Administrator -p 'Password123!' -M user_hunter -o ADMIN_COUNT=True"
                .to_owned(),
        },
        NewSavedCommand {
            name: "Password Policy Check".to_owned(),
            user_id: None,
            protocol: "ldap".to_owned(),
            target: Some("192.168.1.10".to_owned()),
            username: Some("Administrator".to_owned()),
            password: Some("Password123!".to_owned()),
            is_hash: false,
            module: Some(String::new()),
            module_params: IndexMap::new(),
            additional_options: IndexMap::new(),
            command: "netexec ldap 192.168.1.10 -u Administrator -p 'Password123!' --pass-pol"
                .to_owned(),
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bundled_fixtures_parse() {
        let fixtures = Fixtures::bundled().unwrap();
        assert_eq!(fixtures.protocols.len(), 5);
        assert_eq!(fixtures.modules.len(), 19);
        assert_eq!(fixtures.tutorials.len(), 6);
    }

    #[test]
    fn protocol_names_are_unique() {
        let fixtures = Fixtures::bundled().unwrap();
        let mut names: Vec<&str> = fixtures.protocols.iter().map(|p| p.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), fixtures.protocols.len());
    }

    #[test]
    fn tutorial_slugs_are_unique() {
        let fixtures = Fixtures::bundled().unwrap();
        let mut slugs: Vec<&str> = fixtures.tutorials.iter().map(|t| t.slug.as_str()).collect();
        slugs.sort_unstable();
        slugs.dedup();
        assert_eq!(slugs.len(), fixtures.tutorials.len());
    }

    #[test]
    fn seed_commands_are_anonymous() {
        let seeds = seed_saved_commands();
        assert_eq!(seeds.len(), 3);
        assert!(seeds.iter().all(|c| c.user_id.is_none()));
    }
}
