/// Named, versioned offline caches.
///
/// One cache per version tag (e.g. `dumb-charades-v3`); version bumps
/// replace the whole cache rather than evicting entries. The directory
/// store keeps each cache as a subdirectory holding body files plus a
/// small TOML index; the in-memory store backs tests.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::worker::fetch::Response;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache storage denied: {0}")]
    Denied(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("cache index corrupt: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("cache index encode: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Storage for named caches of URL → response pairs.
pub trait CacheStorage {
    fn lookup(&self, cache: &str, url: &str) -> Result<Option<Response>, CacheError>;
    fn put(&mut self, cache: &str, url: &str, resp: &Response) -> Result<(), CacheError>;
    /// Names of all caches currently present.
    fn names(&self) -> Result<Vec<String>, CacheError>;
    /// Delete a whole cache; returns whether it existed.
    fn delete(&mut self, cache: &str) -> Result<bool, CacheError>;
}

// ── Directory-backed store ──

#[derive(Serialize, Deserialize, Default)]
struct Index {
    #[serde(default)]
    next_file: u32,
    #[serde(default, rename = "entry")]
    entries: Vec<Entry>,
}

#[derive(Serialize, Deserialize)]
struct Entry {
    url: String,
    file: String,
    status: u16,
    content_type: Option<String>,
    same_origin: bool,
}

const INDEX_FILE: &str = "index.toml";

/// Persistent store: `<root>/<cache-name>/` holds `index.toml` plus one
/// body file per entry.
pub struct DirCacheStore {
    root: PathBuf,
}

impl DirCacheStore {
    pub fn new(root: PathBuf) -> Self {
        DirCacheStore { root }
    }

    fn cache_dir(&self, cache: &str) -> PathBuf {
        self.root.join(cache)
    }

    fn load_index(&self, cache: &str) -> Result<Index, CacheError> {
        let path = self.cache_dir(cache).join(INDEX_FILE);
        if !path.is_file() {
            return Ok(Index::default());
        }
        Ok(toml::from_str(&fs::read_to_string(path)?)?)
    }

    fn store_index(&self, cache: &str, index: &Index) -> Result<(), CacheError> {
        let path = self.cache_dir(cache).join(INDEX_FILE);
        fs::write(path, toml::to_string(index)?)?;
        Ok(())
    }
}

impl CacheStorage for DirCacheStore {
    fn lookup(&self, cache: &str, url: &str) -> Result<Option<Response>, CacheError> {
        let index = self.load_index(cache)?;
        let entry = match index.entries.iter().find(|e| e.url == url) {
            Some(e) => e,
            None => {
                debug!("cache miss: {cache} {url}");
                return Ok(None);
            }
        };
        let body = fs::read(self.cache_dir(cache).join(&entry.file))?;
        debug!("cache hit: {cache} {url}");
        Ok(Some(Response {
            status: entry.status,
            content_type: entry.content_type.clone(),
            body,
            same_origin: entry.same_origin,
            from_cache: false,
        }))
    }

    fn put(&mut self, cache: &str, url: &str, resp: &Response) -> Result<(), CacheError> {
        fs::create_dir_all(self.cache_dir(cache))?;
        let mut index = self.load_index(cache)?;

        let file = match index.entries.iter().find(|e| e.url == url) {
            Some(existing) => existing.file.clone(),
            None => {
                let file = format!("e{}.bin", index.next_file);
                index.next_file += 1;
                file
            }
        };
        fs::write(self.cache_dir(cache).join(&file), &resp.body)?;

        index.entries.retain(|e| e.url != url);
        index.entries.push(Entry {
            url: url.to_string(),
            file,
            status: resp.status,
            content_type: resp.content_type.clone(),
            same_origin: resp.same_origin,
        });
        self.store_index(cache, &index)
    }

    fn names(&self) -> Result<Vec<String>, CacheError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            if dir_entry.path().is_dir() {
                names.push(dir_entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete(&mut self, cache: &str) -> Result<bool, CacheError> {
        let dir = self.cache_dir(cache);
        if !dir.is_dir() {
            return Ok(false);
        }
        fs::remove_dir_all(dir)?;
        debug!("cache deleted: {cache}");
        Ok(true)
    }
}

// ══════════════════════════════════════════════════════════════
// In-memory store (tests)
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
pub mod test_store {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemCacheStore {
        caches: HashMap<String, HashMap<String, Response>>,
        /// Simulate a storage security restriction: every operation fails.
        pub deny: bool,
    }

    impl MemCacheStore {
        pub fn new() -> Self {
            MemCacheStore::default()
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.deny {
                Err(CacheError::Denied("storage disabled".into()))
            } else {
                Ok(())
            }
        }
    }

    impl CacheStorage for MemCacheStore {
        fn lookup(&self, cache: &str, url: &str) -> Result<Option<Response>, CacheError> {
            self.check()?;
            Ok(self.caches.get(cache).and_then(|c| c.get(url)).cloned())
        }

        fn put(&mut self, cache: &str, url: &str, resp: &Response) -> Result<(), CacheError> {
            self.check()?;
            self.caches
                .entry(cache.to_string())
                .or_default()
                .insert(url.to_string(), resp.clone());
            Ok(())
        }

        fn names(&self) -> Result<Vec<String>, CacheError> {
            self.check()?;
            let mut names: Vec<String> = self.caches.keys().cloned().collect();
            names.sort();
            Ok(names)
        }

        fn delete(&mut self, cache: &str) -> Result<bool, CacheError> {
            self.check()?;
            Ok(self.caches.remove(cache).is_some())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::fetch::Response;

    // TempDir is returned so it outlives the store.
    fn store() -> (tempfile::TempDir, DirCacheStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = DirCacheStore::new(dir.path().join("caches"));
        (dir, store)
    }

    #[test]
    fn put_then_lookup_round_trips() {
        let (_dir, mut store) = store();
        let resp = Response::ok("text/html", b"<h1>hi</h1>".to_vec());
        store.put("dumb-charades-v3", "/", &resp).unwrap();

        let got = store.lookup("dumb-charades-v3", "/").unwrap().unwrap();
        assert_eq!(got.status, 200);
        assert_eq!(got.content_type.as_deref(), Some("text/html"));
        assert_eq!(got.body, b"<h1>hi</h1>");
        assert!(got.same_origin);
    }

    #[test]
    fn lookup_missing_is_none() {
        let (_dir, store) = store();
        assert!(store.lookup("dumb-charades-v3", "/").unwrap().is_none());
    }

    #[test]
    fn put_replaces_existing_entry() {
        let (_dir, mut store) = store();
        store.put("c", "/a", &Response::ok("text/plain", b"one".to_vec())).unwrap();
        store.put("c", "/a", &Response::ok("text/plain", b"two".to_vec())).unwrap();
        let got = store.lookup("c", "/a").unwrap().unwrap();
        assert_eq!(got.body, b"two");
    }

    #[test]
    fn names_and_delete() {
        let (_dir, mut store) = store();
        store.put("dumb-charades-v2", "/", &Response::ok("text/html", vec![])).unwrap();
        store.put("dumb-charades-v3", "/", &Response::ok("text/html", vec![])).unwrap();
        assert_eq!(store.names().unwrap(), vec!["dumb-charades-v2", "dumb-charades-v3"]);

        assert!(store.delete("dumb-charades-v2").unwrap());
        assert!(!store.delete("dumb-charades-v2").unwrap());
        assert_eq!(store.names().unwrap(), vec!["dumb-charades-v3"]);
    }

    #[test]
    fn empty_root_lists_no_names() {
        let (_dir, store) = store();
        assert!(store.names().unwrap().is_empty());
    }
}
