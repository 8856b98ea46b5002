use std::sync::Arc;

use salesdesk_core::notice::Notice;
use salesdesk_core::script::{ScriptDraft, ScriptRecord};
use salesdesk_core::types::ScriptId;
use salesdesk_runtime::script_store::{ScriptError, ScriptStore};

/// Editor state for the developer's script list.
///
/// Selection and field edits only touch the draft; nothing reaches the store
/// until `save`.
pub struct ScriptManager {
    store: Arc<ScriptStore>,
    author: String,
    scripts: Vec<ScriptRecord>,
    selected: Option<ScriptId>,
    draft: ScriptDraft,
}

impl ScriptManager {
    /// Loads the stored scripts and selects the first one.
    pub fn open(store: Arc<ScriptStore>, author: impl Into<String>) -> anyhow::Result<Self> {
        let scripts = store.load()?;
        let mut manager = Self {
            store,
            author: author.into(),
            scripts,
            selected: None,
            draft: ScriptDraft::default(),
        };
        if let Some(first) = manager.scripts.first().map(|s| s.id.clone()) {
            manager.select(&first);
        }
        Ok(manager)
    }

    pub fn scripts(&self) -> &[ScriptRecord] {
        &self.scripts
    }

    pub fn selected(&self) -> Option<&ScriptRecord> {
        let id = self.selected.as_ref()?;
        self.scripts.iter().find(|s| &s.id == id)
    }

    pub fn is_selected(&self, id: &ScriptId) -> bool {
        self.selected.as_ref() == Some(id)
    }

    pub fn draft(&self) -> &ScriptDraft {
        &self.draft
    }

    /// Loads a stored script into the editor. Unknown ids leave everything as is.
    pub fn select(&mut self, id: &ScriptId) -> bool {
        let Some(record) = self.scripts.iter().find(|s| &s.id == id) else {
            log::debug!("select ignored: no script with id {id}");
            return false;
        };
        self.draft = ScriptDraft::from_record(record);
        self.selected = Some(record.id.clone());
        true
    }

    /// Clears the selection and the editor fields.
    pub fn new_script(&mut self) {
        self.selected = None;
        self.draft = ScriptDraft::default();
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.draft.name = name.into();
    }

    pub fn set_prompt(&mut self, prompt_text: impl Into<String>) {
        self.draft.prompt_text = prompt_text.into();
    }

    pub fn set_script_body(&mut self, body: Option<String>) {
        self.draft.script_body = body;
    }

    /// Persists the draft, activates its prompt and selects the saved record.
    pub fn save(&mut self) -> Result<Notice, ScriptError> {
        let record = self.store.save(&self.draft, &self.author)?;
        log::info!("script {} saved by {}", record.id, self.author);

        self.scripts = self.store.load()?;
        self.selected = Some(record.id.clone());
        self.draft = ScriptDraft::from_record(&record);

        Ok(Notice::info(
            "Script Saved",
            format!(
                "Script \"{}\" has been saved and is now active in the frontend",
                record.name
            ),
        ))
    }
}

/// The toast shown when a save is refused or fails.
pub fn error_notice(err: &ScriptError) -> Notice {
    match err {
        ScriptError::EmptyName => Notice::destructive("Error", "Please enter a script name"),
        ScriptError::Storage(e) => Notice::destructive("Error", format!("Could not save: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salesdesk_runtime::defaults::{DEFAULT_PROMPT, DEFAULT_SCRIPT_ID};
    use salesdesk_runtime::kv::MemoryKv;

    fn manager() -> (Arc<ScriptStore>, ScriptManager) {
        let store = Arc::new(ScriptStore::new(Arc::new(MemoryKv::new())));
        let manager = ScriptManager::open(store.clone(), "dev").unwrap();
        (store, manager)
    }

    #[test]
    fn open_selects_first_script() {
        let (_, m) = manager();
        assert_eq!(m.scripts().len(), 1);
        assert!(m.is_selected(&ScriptId::new(DEFAULT_SCRIPT_ID)));
        assert_eq!(m.draft().prompt_text, DEFAULT_PROMPT);
        assert_eq!(m.draft().id, Some(ScriptId::new(DEFAULT_SCRIPT_ID)));
    }

    #[test]
    fn new_script_clears_editor() {
        let (_, mut m) = manager();
        m.new_script();
        assert!(m.selected().is_none());
        assert!(m.draft().name.is_empty());
        assert!(m.draft().prompt_text.is_empty());
        assert!(m.draft().id.is_none());
    }

    #[test]
    fn blank_name_is_refused_without_touching_the_store() {
        let (store, mut m) = manager();
        m.new_script();
        m.set_name("   ");
        m.set_prompt("something");

        let err = m.save().unwrap_err();
        assert!(matches!(err, ScriptError::EmptyName));
        let notice = error_notice(&err);
        assert_eq!(notice.title, "Error");
        assert_eq!(notice.description, "Please enter a script name");
        assert!(notice.destructive);

        assert_eq!(store.load().unwrap().len(), 1);
        assert_eq!(store.active_prompt().unwrap().as_deref(), Some(DEFAULT_PROMPT));
    }

    #[test]
    fn saving_a_new_script_appends_selects_and_activates() {
        let (store, mut m) = manager();
        m.new_script();
        m.set_name("Closer");
        m.set_prompt("Always be closing.");

        let notice = m.save().unwrap();
        assert_eq!(notice.title, "Script Saved");
        assert_eq!(
            notice.description,
            "Script \"Closer\" has been saved and is now active in the frontend"
        );
        assert!(!notice.destructive);

        assert_eq!(m.scripts().len(), 2);
        let selected = m.selected().unwrap();
        assert_eq!(selected.name, "Closer");
        assert_eq!(selected.modified_by, "dev");
        assert_eq!(m.draft().id.as_ref(), Some(&selected.id));
        assert_eq!(
            store.active_prompt().unwrap().as_deref(),
            Some("Always be closing.")
        );
    }

    #[test]
    fn resaving_the_selection_replaces_in_place() {
        let (_, mut m) = manager();
        m.set_prompt("v2");
        m.save().unwrap();
        m.set_prompt("v3");
        m.save().unwrap();

        assert_eq!(m.scripts().len(), 1);
        assert_eq!(m.scripts()[0].id.as_str(), DEFAULT_SCRIPT_ID);
        assert_eq!(m.scripts()[0].prompt_text, "v3");
    }

    #[test]
    fn select_unknown_id_keeps_current_draft() {
        let (_, mut m) = manager();
        m.set_name("edited");
        assert!(!m.select(&ScriptId::new("missing")));
        assert_eq!(m.draft().name, "edited");
        assert!(m.is_selected(&ScriptId::new(DEFAULT_SCRIPT_ID)));
    }

    #[test]
    fn select_discards_unsaved_edits() {
        let (_, mut m) = manager();
        m.new_script();
        m.set_name("Other");
        m.set_prompt("p");
        m.save().unwrap();

        m.set_name("unsaved rename");
        assert!(m.select(&ScriptId::new(DEFAULT_SCRIPT_ID)));
        let other = m.scripts()[1].id.clone();
        assert!(m.select(&other));
        assert_eq!(m.draft().name, "Other");
    }
}
