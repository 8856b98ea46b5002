use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ScriptId;

/// A named prompt the voice agent can be told to follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    pub id: ScriptId,
    pub name: String,
    // Older dashboards stored this under `prompt`.
    #[serde(alias = "prompt")]
    pub prompt_text: String,
    pub last_modified: DateTime<Utc>,
    pub modified_by: String,

    // Companion talk-track; unrelated to `prompt_text` and never activated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_body: Option<String>,
}

impl ScriptRecord {
    pub fn modified_summary(&self) -> String {
        format!(
            "Modified by {} on {}",
            self.modified_by,
            self.last_modified.format("%Y-%m-%d")
        )
    }
}

/// Contents of the script editor form.
///
/// `id` is `None` for a script that has never been saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptDraft {
    pub id: Option<ScriptId>,
    pub name: String,
    pub prompt_text: String,
    pub script_body: Option<String>,
}

impl ScriptDraft {
    pub fn from_record(record: &ScriptRecord) -> Self {
        Self {
            id: Some(record.id.clone()),
            name: record.name.clone(),
            prompt_text: record.prompt_text.clone(),
            script_body: record.script_body.clone(),
        }
    }

    pub fn named(name: impl Into<String>, prompt_text: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            prompt_text: prompt_text.into(),
            script_body: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(ScriptId::new(id));
        self
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_legacy_prompt_key() {
        let raw = r#"{
            "id": "1700000000000",
            "name": "Legacy",
            "prompt": "Be brief.",
            "lastModified": "2024-05-01T10:00:00Z",
            "modifiedBy": "dev"
        }"#;
        let record: ScriptRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.prompt_text, "Be brief.");
        assert_eq!(record.script_body, None);
        assert_eq!(record.modified_summary(), "Modified by dev on 2024-05-01");
    }

    #[test]
    fn whitespace_only_name_counts_as_missing() {
        assert!(!ScriptDraft::named("   ", "x").has_name());
        assert!(ScriptDraft::named(" Pitch ", "x").has_name());
    }
}
