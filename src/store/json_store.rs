use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Serialize, de::DeserializeOwned};

use crate::store::ledger::LedgerStore;

const MISTAKES_FILE: &str = "mistakes.json";

/// JSON files under the application data directory.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(default_data_dir())
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)
            .with_context(|| format!("creating data dir {}", base_dir.display()))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    /// `Ok(None)` when the file does not exist yet.
    fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        let path = self.file_path(name);
        if !path.exists() {
            return Ok(None);
        }
        let content =
            fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
        let data = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(Some(data))
    }

    /// Write through a temp file and rename so a crash never leaves a
    /// half-written file behind.
    fn save<T: Serialize + ?Sized>(&self, name: &str, data: &T) -> Result<()> {
        let path = self.file_path(name);
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("creating {}", tmp_path.display()))?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }

    pub fn mistakes_path(&self) -> PathBuf {
        self.file_path(MISTAKES_FILE)
    }
}

impl LedgerStore for JsonStore {
    fn load_mistakes(&self) -> Result<Vec<String>> {
        Ok(self.load(MISTAKES_FILE)?.unwrap_or_default())
    }

    fn save_mistakes(&self, keys: &[String]) -> Result<()> {
        self.save(MISTAKES_FILE, keys)
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("phrasedrill")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_loads_empty() {
        let (_dir, store) = make_test_store();
        assert!(store.load_mistakes().unwrap().is_empty());
    }

    #[test]
    fn save_then_load() {
        let (_dir, store) = make_test_store();
        let keys = vec!["give up".to_string(), "放棄".to_string()];
        store.save_mistakes(&keys).unwrap();
        assert_eq!(store.load_mistakes().unwrap(), keys);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let (_dir, store) = make_test_store();
        fs::write(store.mistakes_path(), "{oops").unwrap();
        let err = store.load_mistakes().unwrap_err();
        assert!(err.to_string().contains("parsing"));
    }

    #[test]
    fn save_leaves_no_tmp_file() {
        let (dir, store) = make_test_store();
        store.save_mistakes(&["a".to_string()]).unwrap();
        let tmp_files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().and_then(|x| x.to_str()) == Some("tmp"))
            .collect();
        assert!(tmp_files.is_empty(), "no residual .tmp files");
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let (dir, _store) = make_test_store();
        let bad_store = JsonStore {
            base_dir: dir.path().join("nonexistent_subdir"),
        };
        assert!(bad_store.save_mistakes(&["a".to_string()]).is_err());
    }
}
