use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use salesdesk_core::ids::MonotonicIds;
use salesdesk_core::script::{ScriptDraft, ScriptRecord};
use salesdesk_core::types::ScriptId;
use thiserror::Error;

use crate::defaults::{DEFAULT_PROMPT, default_script};
use crate::kv::{KEY_ACTIVE_PROMPT, KEY_SCRIPTS, KeyValueStore};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("please enter a script name")]
    EmptyName,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Saved scripts plus the single active prompt, on top of a key-value store.
pub struct ScriptStore {
    kv: Arc<dyn KeyValueStore>,
    ids: MonotonicIds,
}

impl ScriptStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            ids: MonotonicIds::new(),
        }
    }

    /// Reads every script, seeding the default one on first run.
    ///
    /// Unreadable data is treated like an empty store.
    pub fn load(&self) -> anyhow::Result<Vec<ScriptRecord>> {
        match self.kv.get(KEY_SCRIPTS)? {
            Some(raw) => match serde_json::from_str::<Vec<ScriptRecord>>(&raw) {
                Ok(scripts) => return Ok(scripts),
                Err(e) => log::warn!("stored scripts are unreadable ({e}); reseeding defaults"),
            },
            None => log::info!("no stored scripts; seeding defaults"),
        }
        self.seed()
    }

    /// Stores the draft and makes its prompt the active one.
    ///
    /// A draft whose id matches a stored script replaces it in place; any
    /// other draft is appended under a fresh id.
    pub fn save(&self, draft: &ScriptDraft, author: &str) -> Result<ScriptRecord, ScriptError> {
        if !draft.has_name() {
            return Err(ScriptError::EmptyName);
        }

        let mut scripts = self.load()?;
        let existing = draft
            .id
            .as_ref()
            .and_then(|id| scripts.iter().position(|s| &s.id == id));

        let id = match existing {
            Some(i) => scripts[i].id.clone(),
            None => self.fresh_id(&scripts),
        };

        let record = ScriptRecord {
            id,
            name: draft.name.clone(),
            prompt_text: draft.prompt_text.clone(),
            last_modified: Utc::now(),
            modified_by: author.to_string(),
            script_body: draft.script_body.clone(),
        };

        match existing {
            Some(i) => scripts[i] = record.clone(),
            None => scripts.push(record.clone()),
        }

        self.write_scripts(&scripts)?;
        self.kv
            .set(KEY_ACTIVE_PROMPT, &record.prompt_text)
            .context("store active prompt")?;

        log::info!(
            "script {} ({:?}) saved by {author} and activated",
            record.id,
            record.name
        );
        Ok(record)
    }

    pub fn active_prompt(&self) -> anyhow::Result<Option<String>> {
        self.kv.get(KEY_ACTIVE_PROMPT)
    }

    /// The active prompt, writing the default one first if none is set.
    pub fn active_prompt_or_seed(&self) -> anyhow::Result<String> {
        if let Some(prompt) = self.active_prompt()? {
            return Ok(prompt);
        }
        self.kv
            .set(KEY_ACTIVE_PROMPT, DEFAULT_PROMPT)
            .context("store default active prompt")?;
        Ok(DEFAULT_PROMPT.to_string())
    }

    fn seed(&self) -> anyhow::Result<Vec<ScriptRecord>> {
        let script = default_script();
        let scripts = vec![script];
        self.write_scripts(&scripts)?;
        self.kv
            .set(KEY_ACTIVE_PROMPT, &scripts[0].prompt_text)
            .context("store active prompt")?;
        Ok(scripts)
    }

    fn write_scripts(&self, scripts: &[ScriptRecord]) -> anyhow::Result<()> {
        let json = serde_json::to_string(scripts).context("encode scripts JSON")?;
        self.kv.set(KEY_SCRIPTS, &json).context("store scripts")
    }

    fn fresh_id(&self, scripts: &[ScriptRecord]) -> ScriptId {
        loop {
            let id = ScriptId::new(self.ids.next_id());
            if !scripts.iter().any(|s| s.id == id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{DEFAULT_SCRIPT_ID, DEFAULT_SCRIPT_NAME};
    use crate::kv::MemoryKv;

    fn store() -> (Arc<MemoryKv>, ScriptStore) {
        let kv = Arc::new(MemoryKv::new());
        let store = ScriptStore::new(kv.clone());
        (kv, store)
    }

    #[test]
    fn empty_store_seeds_one_default_script() {
        let (kv, store) = store();

        let scripts = store.load().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].id.as_str(), DEFAULT_SCRIPT_ID);
        assert_eq!(scripts[0].name, DEFAULT_SCRIPT_NAME);
        assert_eq!(scripts[0].modified_by, "system");

        let active = store.active_prompt().unwrap().unwrap();
        assert_eq!(active, scripts[0].prompt_text);
        assert!(active.starts_with("You are a confident and persuasive virtual sales manager"));
        assert!(kv.get(KEY_SCRIPTS).unwrap().is_some());

        // Second load reads what was persisted instead of reseeding.
        let again = store.load().unwrap();
        assert_eq!(again, scripts);
    }

    #[test]
    fn corrupt_scripts_are_reseeded() {
        let (kv, store) = store();
        kv.set(KEY_SCRIPTS, "{\"definitely\": \"not a list\"").unwrap();

        let scripts = store.load().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].id.as_str(), DEFAULT_SCRIPT_ID);
    }

    #[test]
    fn blank_name_is_rejected_without_touching_storage() {
        let (kv, store) = store();
        store.load().unwrap();
        let before = kv.get(KEY_SCRIPTS).unwrap();
        let active_before = store.active_prompt().unwrap();

        let err = store
            .save(&ScriptDraft::named("  ", "new prompt"), "dev")
            .unwrap_err();
        assert!(matches!(err, ScriptError::EmptyName));
        assert_eq!(kv.get(KEY_SCRIPTS).unwrap(), before);
        assert_eq!(store.active_prompt().unwrap(), active_before);
    }

    #[test]
    fn saving_an_existing_id_replaces_in_place() {
        let (_kv, store) = store();
        store.load().unwrap();

        let draft = ScriptDraft::named("X", "Y").with_id(DEFAULT_SCRIPT_ID);
        store.save(&draft, "dev").unwrap();
        let saved = store.save(&draft, "dev").unwrap();

        let scripts = store.load().unwrap();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0], saved);
        assert_eq!(scripts[0].name, "X");
        assert_eq!(scripts[0].modified_by, "dev");
        assert_eq!(store.active_prompt().unwrap().as_deref(), Some("Y"));
    }

    #[test]
    fn new_or_unknown_ids_append_with_fresh_ids() {
        let (_kv, store) = store();
        store.load().unwrap();

        let a = store.save(&ScriptDraft::named("Chips", "Sell chips."), "dev").unwrap();
        let b = store
            .save(&ScriptDraft::named("Soda", "Sell soda.").with_id("gone"), "dev")
            .unwrap();

        let scripts = store.load().unwrap();
        assert_eq!(scripts.len(), 3);
        assert_ne!(a.id, b.id);
        assert_ne!(b.id.as_str(), "gone");
        assert_eq!(scripts[1].id, a.id);
        assert_eq!(scripts[2].id, b.id);
    }

    #[test]
    fn active_prompt_matches_last_save_byte_for_byte() {
        let (_kv, store) = store();
        let prompt = "  Leading space, trailing newline\n\tand a tab, plus ünïcode ✓ ";
        store.save(&ScriptDraft::named("Exact", prompt), "dev").unwrap();
        assert_eq!(store.active_prompt().unwrap().as_deref(), Some(prompt));
    }

    #[test]
    fn activation_is_a_copy_not_a_reference() {
        let (kv, store) = store();
        store.load().unwrap();
        store
            .save(&ScriptDraft::named("A", "first").with_id(DEFAULT_SCRIPT_ID), "dev")
            .unwrap();

        // Rewrite the stored record behind the store's back.
        let mut scripts = store.load().unwrap();
        scripts[0].prompt_text = "edited elsewhere".into();
        kv.set(KEY_SCRIPTS, &serde_json::to_string(&scripts).unwrap())
            .unwrap();

        assert_eq!(store.active_prompt().unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn active_prompt_or_seed_writes_default_once() {
        let (kv, store) = store();
        assert_eq!(store.active_prompt_or_seed().unwrap(), DEFAULT_PROMPT);
        assert_eq!(kv.get(KEY_ACTIVE_PROMPT).unwrap().as_deref(), Some(DEFAULT_PROMPT));

        kv.set(KEY_ACTIVE_PROMPT, "custom").unwrap();
        assert_eq!(store.active_prompt_or_seed().unwrap(), "custom");
    }
}
