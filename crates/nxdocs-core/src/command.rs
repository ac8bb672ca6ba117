//! Command-line synthesis.
//!
//! [`build_command`] is a pure function of [`CommandForm`]. The order in
//! which flags are appended is fixed:
//!
//! ```text
//! netexec <protocol> <target> [-u user] [-H hash | -p 'pass']
//!         [-M module [-o key ...]] [--kerberos] [--debug] [--verbose] [--local-auth]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use nxdocs_storage::{AdditionalOptions, ModuleParams};

/// The program every generated command starts with.
pub const PROGRAM: &str = "netexec";

/// How the target field should be read. Only affects the form's hint text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    #[default]
    Ip,
    File,
    Hostname,
}

/// Toggles for the trailing switches.
///
/// Keys other than the four known ones are kept (and round-tripped) but do
/// not produce flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_kerberos: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_auth: Option<bool>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Option<bool>>,
}

impl FormOptions {
    /// Flatten into the map shape stored with server-side saved commands.
    #[must_use]
    pub fn to_map(&self) -> AdditionalOptions {
        let known = [
            ("useKerberos", self.use_kerberos),
            ("debugMode", self.debug_mode),
            ("verbose", self.verbose),
            ("localAuth", self.local_auth),
        ];

        known
            .into_iter()
            .filter(|(_, value)| value.is_some())
            .map(|(key, value)| (key.to_owned(), value))
            .chain(self.extra.iter().map(|(k, v)| (k.clone(), *v)))
            .collect()
    }
}

/// Command-builder form state.
///
/// Empty strings mean "not set" for `username`, `password`, and
/// `selected_module`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandForm {
    pub protocol: String,
    pub target_type: TargetType,
    pub target_value: String,
    pub username: String,
    pub password: String,
    pub use_hash: bool,
    pub selected_module: String,
    pub module_params: ModuleParams,
    pub additional_options: FormOptions,
}

impl Default for CommandForm {
    fn default() -> Self {
        Self {
            protocol: "smb".to_owned(),
            target_type: TargetType::Ip,
            target_value: "192.168.1.0/24".to_owned(),
            username: "Administrator".to_owned(),
            password: "Password123!".to_owned(),
            use_hash: false,
            selected_module: String::new(),
            module_params: ModuleParams::new(),
            additional_options: FormOptions::default(),
        }
    }
}

/// Build the command line for the given form state.
///
/// # Examples
///
/// ```
/// use nxdocs_core::{CommandForm, build_command};
///
/// let form = CommandForm {
///     target_value: "10.0.0.5".to_owned(),
///     password: "Secret1!".to_owned(),
///     ..CommandForm::default()
/// };
/// assert_eq!(build_command(&form), "netexec smb 10.0.0.5 -u Administrator -p 'Secret1!'");
/// ```
#[must_use]
pub fn build_command(form: &CommandForm) -> String {
    let mut cmd = format!("{PROGRAM} {} {}", form.protocol, form.target_value);

    if !form.username.is_empty() {
        cmd.push_str(" -u ");
        cmd.push_str(&form.username);
    }

    if !form.password.is_empty() {
        if form.use_hash {
            cmd.push_str(" -H ");
            cmd.push_str(&form.password);
        } else {
            cmd.push_str(" -p '");
            cmd.push_str(&form.password);
            cmd.push('\'');
        }
    }

    if !form.selected_module.is_empty() {
        cmd.push_str(" -M ");
        cmd.push_str(&form.selected_module);

        let params: Vec<&str> = form
            .module_params
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| key.as_str())
            .collect();
        if !params.is_empty() {
            cmd.push_str(" -o ");
            cmd.push_str(&params.join(" "));
        }
    }

    let options = &form.additional_options;
    let switches = [
        (options.use_kerberos, " --kerberos"),
        (options.debug_mode, " --debug"),
        (options.verbose, " --verbose"),
        (options.local_auth, " --local-auth"),
    ];
    for (enabled, flag) in switches {
        if enabled == Some(true) {
            cmd.push_str(flag);
        }
    }

    cmd
}
