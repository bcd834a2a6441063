//! Content-addressed, append-only cache for LLM responses (spec 4.7).

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use sha2::{Digest, Sha256};

/// One cached LLM response, fields pinned exactly as spec section 6 lists
/// them. Timestamps are caller-supplied RFC3339 strings; the cache never
/// calls a clock itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub message: String,
    pub model: String,
    pub prompt: String,
    pub tokens_used: Option<u64>,
    pub parameters: Json,
    pub requested_at: String,
    pub responded_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheLine {
    key: String,
    value: CacheEntry,
}

/// Hydrated at startup from `.aua/cache.json`; every miss is appended to
/// disk synchronously before the call returns.
#[derive(Debug, Default)]
pub struct Cache {
    path: PathBuf,
    entries: HashMap<String, CacheEntry>,
}

impl Cache {
    /// Compute the content-address for a request: `SHA-256(prompt ':'
    /// model ':' base_uri ':' serialized_generation_params)`.
    pub fn key(prompt: &str, model: &str, base_uri: &str, params: &Json) -> String {
        let serialized = serde_json::to_string(params).unwrap_or_default();
        let material = format!("{prompt}:{model}:{base_uri}:{serialized}");
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Read every line of `path`, keeping the first entry for a duplicate
    /// key. A missing file hydrates to an empty cache; a malformed line is
    /// logged and skipped rather than failing the whole load.
    pub fn hydrate(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut entries = HashMap::new();
        match fs::read_to_string(&path) {
            Ok(contents) => {
                for line in contents.lines() {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<CacheLine>(line) {
                        Ok(CacheLine { key, value }) => {
                            entries.entry(key).or_insert(value);
                        }
                        Err(err) => warn!("skipping malformed cache line: {err}"),
                    }
                }
                debug!("hydrated {} cache entries from {}", entries.len(), path.display());
            }
            Err(err) => trace!("no existing cache at {}: {err}", path.display()),
        }
        Cache { path, entries }
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    /// Persist a new entry. A write failure is logged and swallowed per
    /// spec 7 ("a cache-write failure does not fail the operation");
    /// the entry is still kept in memory for the remainder of this run.
    pub fn insert(&mut self, key: String, entry: CacheEntry) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("could not create cache directory {}: {err}", parent.display());
            }
        }
        let line = CacheLine { key: key.clone(), value: entry.clone() };
        match serde_json::to_string(&line) {
            Ok(serialized) => {
                let result = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&self.path)
                    .and_then(|mut file| writeln!(file, "{serialized}"));
                if let Err(err) = result {
                    warn!("could not append cache entry to {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("could not serialize cache entry: {err}"),
        }
        self.entries.entry(key).or_insert(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_cache_path(name: &str) -> PathBuf {
        let mut p = env::temp_dir();
        p.push(format!("aura-cache-test-{name}-{}.json", std::process::id()));
        p
    }

    #[test]
    fn key_is_deterministic() {
        let params = serde_json::json!({"temperature": 0.2});
        let a = Cache::key("hi", "gpt-4o-mini", "https://api", &params);
        let b = Cache::key("hi", "gpt-4o-mini", "https://api", &params);
        assert_eq!(a, b);
    }

    #[test]
    fn different_prompts_hash_differently() {
        let params = serde_json::json!({});
        let a = Cache::key("hi", "m", "b", &params);
        let b = Cache::key("bye", "m", "b", &params);
        assert_ne!(a, b);
    }

    #[test]
    fn missing_file_hydrates_empty() {
        let cache = Cache::hydrate(temp_cache_path("missing"));
        assert!(cache.get("anything").is_none());
    }

    #[test]
    fn insert_then_hydrate_roundtrips() {
        let path = temp_cache_path("roundtrip");
        let _ = fs::remove_file(&path);
        let mut cache = Cache::hydrate(&path);
        let entry = CacheEntry {
            message: "Rayleigh scattering...".to_string(),
            model: "gpt-4o-mini".to_string(),
            prompt: "Why is the sky blue?".to_string(),
            tokens_used: Some(42),
            parameters: serde_json::json!({"temperature": 0.2}),
            requested_at: "2026-01-01T00:00:00Z".to_string(),
            responded_at: "2026-01-01T00:00:01Z".to_string(),
        };
        cache.insert("mykey".to_string(), entry.clone());

        let rehydrated = Cache::hydrate(&path);
        assert_eq!(rehydrated.get("mykey"), Some(&entry));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn duplicate_key_keeps_first() {
        let path = temp_cache_path("dup");
        let _ = fs::remove_file(&path);
        let mut cache = Cache::hydrate(&path);
        let first = CacheEntry {
            message: "first".to_string(),
            model: "m".to_string(),
            prompt: "p".to_string(),
            tokens_used: None,
            parameters: serde_json::json!({}),
            requested_at: "t0".to_string(),
            responded_at: "t1".to_string(),
        };
        let mut second = first.clone();
        second.message = "second".to_string();
        cache.insert("k".to_string(), first.clone());
        cache.insert("k".to_string(), second);
        assert_eq!(cache.get("k"), Some(&first));
        let _ = fs::remove_file(&path);
    }
}
