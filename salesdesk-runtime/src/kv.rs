use anyhow::Context;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Username of the logged-in developer.
pub const KEY_DEV_USER: &str = "dev_user";
/// JSON array of every saved script.
pub const KEY_SCRIPTS: &str = "dev_scripts";
/// Copy of the prompt text the voice agent should use.
pub const KEY_ACTIVE_PROMPT: &str = "active_ai_prompt";

/// String key-value storage shared by the dashboard screens.
///
/// Single writer; every call is a full read-modify-write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn delete(&self, key: &str) -> anyhow::Result<()>;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    match m.lock() {
        Ok(g) => g,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[derive(Debug, Default)]
pub struct MemoryKv {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(lock(&self.values).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// All keys in one JSON object on disk.
#[derive(Debug)]
pub struct JsonFileKv {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileKv {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> anyhow::Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read state: {}", self.path.display()))?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(values) => Ok(values),
            Err(e) => {
                let aside = self.path.with_extension("corrupt");
                log::warn!(
                    "state file {} is unreadable ({e}); moving it to {} and starting empty",
                    self.path.display(),
                    aside.display()
                );
                std::fs::rename(&self.path, &aside).with_context(|| {
                    format!("move aside corrupt state: {}", self.path.display())
                })?;
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_all(&self, values: &BTreeMap<String, String>) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(values).context("encode state JSON")?;
        crate::fs::write_atomic(&self.path, &json)
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> anyhow::Result<()> {
        let _guard = lock(&self.write_lock);
        let mut values = self.read_all()?;
        f(&mut values);
        self.write_all(&values)
    }
}

impl KeyValueStore for JsonFileKv {
    fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.update(|values| {
            values.remove(key);
        })
    }
}
