// Bounded, file-backed chat session store: the durable-local-storage
// analogue. Two fixed keys under the state directory: sessions.json and
// theme.

use std::path::PathBuf;

use codepal_common::{now_millis, ChatMessage, Role};
use serde::{Deserialize, Serialize};

/// Oldest sessions beyond this count are dropped silently on save.
pub const MAX_SESSIONS: usize = 20;

const TITLE_MAX_CHARS: usize = 40;
const SESSIONS_FILE: &str = "sessions.json";
const THEME_FILE: &str = "theme";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session store io: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub title: String,
    pub timestamp: u64,
    pub messages: Vec<ChatMessage>,
}

/// Listing entry for the history view; messages stay on disk.
#[derive(Debug, Clone)]
pub struct SessionMeta {
    pub id: String,
    pub title: String,
    pub timestamp: u64,
}

pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn sessions_path(&self) -> PathBuf {
        self.dir.join(SESSIONS_FILE)
    }

    /// A missing or unreadable list degrades to empty, like a cleared
    /// browser store.
    fn read_all(&self) -> Vec<ChatSession> {
        let raw = match std::fs::read_to_string(self.sessions_path()) {
            Ok(raw) => raw,
            Err(_) => return Vec::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(sessions) => sessions,
            Err(err) => {
                tracing::warn!("discarding corrupt session list: {err}");
                Vec::new()
            }
        }
    }

    fn write_all(&self, sessions: &[ChatSession]) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string(sessions)?;
        std::fs::write(self.sessions_path(), raw)?;
        Ok(())
    }

    /// Upserts by id, most-recent-first, bounded at [`MAX_SESSIONS`].
    /// Saving an empty transcript is a no-op.
    pub fn save(&self, id: &str, messages: &[ChatMessage]) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }
        let session = ChatSession {
            id: id.to_string(),
            title: derive_title(messages),
            timestamp: now_millis(),
            messages: messages.to_vec(),
        };
        let mut sessions = self.read_all();
        match sessions.iter_mut().find(|s| s.id == id) {
            Some(existing) => *existing = session,
            None => sessions.insert(0, session),
        }
        sessions.truncate(MAX_SESSIONS);
        self.write_all(&sessions)
    }

    pub fn load(&self, id: &str) -> Option<Vec<ChatMessage>> {
        self.read_all()
            .into_iter()
            .find(|s| s.id == id)
            .map(|s| s.messages)
    }

    pub fn list(&self) -> Vec<SessionMeta> {
        self.read_all()
            .into_iter()
            .map(|s| SessionMeta {
                id: s.id,
                title: s.title,
                timestamp: s.timestamp,
            })
            .collect()
    }

    /// Saved theme, or the configured fallback when none was saved yet.
    pub fn load_theme(&self, fallback: &str) -> String {
        match std::fs::read_to_string(self.dir.join(THEME_FILE)) {
            Ok(raw) if !raw.trim().is_empty() => raw.trim().to_string(),
            _ => fallback.to_string(),
        }
    }

    pub fn save_theme(&self, name: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(THEME_FILE), name)?;
        Ok(())
    }
}

fn derive_title(messages: &[ChatMessage]) -> String {
    match messages.iter().find(|m| m.role == Role::User) {
        Some(first) => {
            let mut title: String = first.text.chars().take(TITLE_MAX_CHARS).collect();
            title.push_str("...");
            title
        }
        None => "Chat Session".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepal_common::ChatMessage;

    fn transcript(text: &str) -> Vec<ChatMessage> {
        vec![
            ChatMessage::user(text),
            ChatMessage::assistant("sure thing"),
        ]
    }

    #[test]
    fn round_trip_restores_identical_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let msgs = transcript("fix the login bug");
        store.save("s1", &msgs).unwrap();

        let restored = store.load("s1").unwrap();
        assert_eq!(restored.len(), msgs.len());
        assert_eq!(restored[0].text, msgs[0].text);
        assert_eq!(restored[1].text, msgs[1].text);
        assert_eq!(restored[0].role, Role::User);
    }

    #[test]
    fn empty_transcript_save_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save("s1", &[]).unwrap();
        assert!(store.list().is_empty());
        assert!(!store.sessions_path().exists());
    }

    #[test]
    fn twenty_first_session_evicts_the_oldest() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        for i in 0..21 {
            store
                .save(&format!("session-{i}"), &transcript(&format!("msg {i}")))
                .unwrap();
        }
        let listed = store.list();
        assert_eq!(listed.len(), MAX_SESSIONS);
        // Prepend order: newest first, and the very first save is gone.
        assert_eq!(listed[0].id, "session-20");
        assert!(listed.iter().all(|s| s.id != "session-0"));
    }

    #[test]
    fn upsert_replaces_in_place_without_growing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        store.save("a", &transcript("one")).unwrap();
        store.save("b", &transcript("two")).unwrap();
        store.save("a", &transcript("one updated")).unwrap();
        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(store.load("a").unwrap()[0].text, "one updated");
    }

    #[test]
    fn title_is_first_user_message_truncated() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        let long = "x".repeat(100);
        store.save("s", &transcript(&long)).unwrap();
        let title = &store.list()[0].title;
        assert_eq!(title.chars().count(), 43);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn corrupt_store_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        std::fs::write(store.sessions_path(), "{not json").ok();
        assert!(store.list().is_empty());
        store.save("s", &transcript("hello")).unwrap();
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn theme_falls_back_until_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path());
        assert_eq!(store.load_theme("dark"), "dark");
        store.save_theme("light").unwrap();
        // A saved theme wins over whatever the config suggests.
        assert_eq!(store.load_theme("dark"), "light");
    }
}
