use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MonotonicIds;
use crate::types::{EntryId, Speaker};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl TranscriptEntry {
    /// `[HH:MM:SS] speaker: text`, as shown in the developer log view.
    pub fn log_line(&self) -> String {
        format!(
            "[{}] {}: {}",
            self.timestamp.format("%H:%M:%S"),
            self.speaker,
            self.text
        )
    }
}

/// Conversation log for one screen. Entries only ever get appended.
#[derive(Debug, Default)]
pub struct TranscriptLog {
    entries: Vec<TranscriptEntry>,
    ids: MonotonicIds,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_entry(&mut self, speaker: Speaker, text: impl Into<String>) -> &TranscriptEntry {
        let entry = TranscriptEntry {
            id: EntryId::new(self.ids.next_id()),
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        };
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    /// The newest `n` entries, oldest first; what an auto-scrolled view shows.
    pub fn tail(&self, n: usize) -> &[TranscriptEntry] {
        let start = self.entries.len().saturating_sub(n);
        &self.entries[start..]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_come_back_in_call_order() {
        let mut log = TranscriptLog::new();
        log.add_entry(Speaker::Agent, "hello");
        log.add_entry(Speaker::User, "hi");
        log.add_entry(Speaker::Agent, "how can I help");

        let texts: Vec<_> = log.entries().iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, ["hello", "hi", "how can I help"]);

        let speakers: Vec<_> = log.entries().iter().map(|e| e.speaker).collect();
        assert_eq!(speakers, [Speaker::Agent, Speaker::User, Speaker::Agent]);
    }

    #[test]
    fn ids_are_unique_even_when_added_back_to_back() {
        let mut log = TranscriptLog::new();
        for i in 0..50 {
            log.add_entry(Speaker::User, format!("m{i}"));
        }
        let mut ids: Vec<_> = log.entries().iter().map(|e| e.id.0.clone()).collect();
        ids.dedup();
        assert_eq!(ids.len(), 50);
    }

    #[test]
    fn tail_keeps_newest_last() {
        let mut log = TranscriptLog::new();
        assert!(log.tail(3).is_empty());
        for t in ["a", "b", "c", "d"] {
            log.add_entry(Speaker::User, t);
        }
        let tail: Vec<_> = log.tail(2).iter().map(|e| e.text.as_str()).collect();
        assert_eq!(tail, ["c", "d"]);
        assert_eq!(log.tail(10).len(), 4);
    }

    #[test]
    fn log_line_names_the_speaker() {
        let mut log = TranscriptLog::new();
        let line = log.add_entry(Speaker::Agent, "connected").log_line();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] agent: connected"));
    }
}
