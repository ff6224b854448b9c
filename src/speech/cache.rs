use std::collections::hash_map::DefaultHasher;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

/// Audio clips on disk under the user cache directory, keyed by text.
pub struct ClipCache {
    base_dir: PathBuf,
}

impl ClipCache {
    pub fn new(subdir: &str) -> Option<Self> {
        let base = dirs::cache_dir()?.join("phrasedrill").join(subdir);
        Self::at(base)
    }

    pub fn at(base_dir: PathBuf) -> Option<Self> {
        fs::create_dir_all(&base_dir).ok()?;
        Some(Self { base_dir })
    }

    pub fn path_for(&self, key: &str, extension: &str) -> PathBuf {
        self.base_dir
            .join(format!("{}.{extension}", Self::file_stem(key)))
    }

    pub fn get(&self, key: &str, extension: &str) -> Option<Vec<u8>> {
        fs::read(self.path_for(key, extension)).ok()
    }

    pub fn put(&self, key: &str, extension: &str, bytes: &[u8]) -> bool {
        fs::write(self.path_for(key, extension), bytes).is_ok()
    }

    /// Readable prefix plus a hash, so long or non-ASCII keys stay short.
    fn file_stem(key: &str) -> String {
        let prefix: String = key
            .chars()
            .take(32)
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        format!("{prefix}-{:016x}", hasher.finish())
    }
}
