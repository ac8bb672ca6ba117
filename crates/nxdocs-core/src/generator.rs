//! Command-builder state with a live preview and local quick-save.
//!
//! Every edit regenerates the preview. Saving snapshots the form together
//! with the command string generated at that moment; loading restores the
//! snapshot verbatim, including its stored command string, without
//! rebuilding it. A snapshot can therefore show a command that the same
//! fields would no longer produce.

use serde::{Deserialize, Serialize};

use nxdocs_storage::NewSavedCommand;

use crate::command::{CommandForm, build_command};
use crate::error::CoreError;
use crate::local_store::LocalStore;

/// A quick-saved snapshot of the form plus the command generated at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSavedCommand {
    pub name: String,
    #[serde(flatten)]
    pub form: CommandForm,
    pub command: String,
}

impl LocalSavedCommand {
    #[must_use]
    pub fn from_form(name: impl Into<String>, form: CommandForm, command: String) -> Self {
        Self {
            name: name.into(),
            form,
            command,
        }
    }

    /// Build the creation payload for the server's saved-command API.
    ///
    /// The stored command string is sent as-is.
    #[must_use]
    pub fn to_new_saved_command(&self) -> NewSavedCommand {
        let form = &self.form;
        NewSavedCommand {
            name: self.name.clone(),
            user_id: None,
            protocol: form.protocol.clone(),
            target: Some(form.target_value.clone()),
            username: Some(form.username.clone()),
            password: Some(form.password.clone()),
            is_hash: form.use_hash,
            module: Some(form.selected_module.clone()),
            module_params: form.module_params.clone(),
            additional_options: form.additional_options.to_map(),
            command: self.command.clone(),
        }
    }
}

/// The command builder's state.
#[derive(Debug)]
pub struct CommandGenerator<S> {
    form: CommandForm,
    preview: String,
    saved: Vec<LocalSavedCommand>,
    selected: Option<String>,
    store: S,
}

impl<S: LocalStore> CommandGenerator<S> {
    /// Start from the default form and the list already in `store`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the stored list cannot be read.
    pub fn new(store: S) -> Result<Self, CoreError> {
        let saved = store.load()?;
        let form = CommandForm::default();
        let preview = build_command(&form);
        tracing::debug!(saved = saved.len(), "command generator ready");

        Ok(Self {
            form,
            preview,
            saved,
            selected: None,
            store,
        })
    }

    pub fn form(&self) -> &CommandForm {
        &self.form
    }

    /// The command currently shown to the user.
    pub fn preview(&self) -> &str {
        &self.preview
    }

    pub fn saved(&self) -> &[LocalSavedCommand] {
        &self.saved
    }

    /// Name of the snapshot most recently saved or picked.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, name: impl Into<String>) {
        self.selected = Some(name.into());
    }

    /// Edit the form and regenerate the preview.
    pub fn edit(&mut self, f: impl FnOnce(&mut CommandForm)) -> &str {
        f(&mut self.form);
        self.generate()
    }

    /// Rebuild the preview from the current form.
    pub fn generate(&mut self) -> &str {
        self.preview = build_command(&self.form);
        &self.preview
    }

    /// Snapshot the current form under `name` and persist the list.
    ///
    /// Names are not unique; a second save under the same name appends
    /// another snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError`] if the list cannot be persisted. The in-memory
    /// list is left unchanged in that case.
    pub fn save(&mut self, name: impl Into<String>) -> Result<&LocalSavedCommand, CoreError> {
        let name = name.into();
        let command = self.generate().to_owned();
        let mut saved = self.saved.clone();
        saved.push(LocalSavedCommand::from_form(name.clone(), self.form.clone(), command));
        self.store.persist(&saved)?;
        self.saved = saved;
        tracing::debug!(name = %name, total = self.saved.len(), "command saved locally");
        self.selected = Some(name);

        let index = self.saved.len() - 1;
        Ok(&self.saved[index])
    }

    /// Restore the first snapshot named `name`.
    ///
    /// The preview shows the snapshot's stored command, not a rebuilt one.
    /// Returns `false` (and changes nothing) if no snapshot has that name.
    pub fn load(&mut self, name: &str) -> bool {
        let Some(snapshot) = self.saved.iter().find(|c| c.name == name) else {
            return false;
        };
        self.form = snapshot.form.clone();
        self.preview.clone_from(&snapshot.command);
        true
    }
}
