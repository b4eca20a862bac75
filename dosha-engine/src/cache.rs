//! Content-addressed feature cache
//!
//! Keys are SHA-256 digests over the waveform (samples, sampling rate,
//! override) and every extractor parameter, so a change to either yields a
//! different key. Degenerate results are cached like any other: the same
//! input always reproduces them.
//!
//! # Architecture
//! - In-memory map bounded by `max_entries`, oldest insert evicted first
//! - Optional directory of `<key>.json` files, read through on a memory miss
//!   and purged by age
//!
//! Disk failures are logged and treated as misses; the cache never fails an
//! extraction.

use crate::error::Result;
use crate::pulse::{FeatureVector, PulseFeatureExtractor, Waveform};
use chrono::{DateTime, Duration, Utc};
use dosha_common::config::CacheSettings;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Upper bound on the purge age, keeps the cutoff representable
const MAX_AGE_DAYS: u64 = 365 * 100;

/// On-disk entry
#[derive(Debug, Serialize, Deserialize)]
struct CachedFeatures {
    key: String,
    created_at: DateTime<Utc>,
    features: FeatureVector,
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: HashMap<String, FeatureVector>,
    /// Insertion order for eviction
    order: VecDeque<String>,
}

/// Feature cache shared across concurrent assessments
#[derive(Debug)]
pub struct FeatureCache {
    state: RwLock<MemoryState>,
    max_entries: usize,
    dir: Option<PathBuf>,
}

/// Digest of a waveform and the extractor parameters applied to it
pub fn cache_key(waveform: &Waveform, extractor: &PulseFeatureExtractor) -> String {
    let mut hasher = Sha256::new();

    hasher.update((waveform.samples().len() as u64).to_le_bytes());
    for sample in waveform.samples() {
        hasher.update(sample.to_le_bytes());
    }
    hasher.update(waveform.sampling_rate().to_le_bytes());
    match waveform.heart_rate_override() {
        Some(hr) => {
            hasher.update([1u8]);
            hasher.update(hr.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }

    hasher.update(extractor.default_heart_rate.to_le_bytes());
    match extractor.min_prominence {
        Some(p) => {
            hasher.update([1u8]);
            hasher.update(p.to_le_bytes());
        }
        None => hasher.update([0u8]),
    }
    hasher.update(extractor.band_low_hz.to_le_bytes());
    hasher.update(extractor.band_high_hz.to_le_bytes());
    hasher.update((extractor.filter_order as u64).to_le_bytes());
    hasher.update(extractor.min_beat_spacing.to_le_bytes());

    format!("{:x}", hasher.finalize())
}

impl FeatureCache {
    /// Memory-only cache
    pub fn new(max_entries: usize) -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            max_entries,
            dir: None,
        }
    }

    /// Add a disk directory, creating it if needed
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        self.dir = Some(dir);
        Ok(self)
    }

    /// Cache from the `[cache]` config section, `None` when disabled
    ///
    /// Stale disk entries are purged on open.
    pub fn from_settings(settings: &CacheSettings) -> Result<Option<Self>> {
        if !settings.enabled {
            return Ok(None);
        }
        let mut cache = Self::new(settings.max_entries);
        if let Some(dir) = &settings.dir {
            cache = cache.with_dir(dir)?;
            let purged = cache.purge_older_than(settings.max_age_days)?;
            if purged > 0 {
                info!("Purged {} stale feature cache entries from {}", purged, dir.display());
            }
        }
        Ok(Some(cache))
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Entries held in memory
    pub fn len(&self) -> usize {
        self.read_state(|s| s.entries.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a key in memory, then on disk
    pub fn get(&self, key: &str) -> Option<FeatureVector> {
        if let Some(features) = self.read_state(|s| s.entries.get(key).cloned()) {
            debug!("Feature cache hit (memory): {}", key);
            return Some(features);
        }

        let path = self.entry_path(key)?;
        if !path.exists() {
            return None;
        }
        match read_entry(&path) {
            Ok(entry) if entry.key == key => {
                debug!("Feature cache hit (disk): {}", key);
                self.insert_memory(key.to_string(), entry.features.clone());
                Some(entry.features)
            }
            Ok(_) => {
                warn!("Cache file {} holds a different key, ignoring", path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Store features under `key`
    pub fn insert(&self, key: String, features: FeatureVector) {
        if let Some(path) = self.entry_path(&key) {
            let entry = CachedFeatures {
                key: key.clone(),
                created_at: Utc::now(),
                features: features.clone(),
            };
            if let Err(e) = write_entry(&path, &entry) {
                warn!("Failed to write cache file {}: {}", path.display(), e);
            }
        }
        self.insert_memory(key, features);
    }

    /// Cached features for this waveform, extracting on a miss
    pub fn get_or_extract(&self, extractor: &PulseFeatureExtractor, waveform: &Waveform) -> FeatureVector {
        let key = cache_key(waveform, extractor);
        if let Some(features) = self.get(&key) {
            return features;
        }
        let features = extractor.extract(waveform);
        self.insert(key, features.clone());
        features
    }

    /// Drop every in-memory entry (disk entries remain)
    pub fn clear(&self) {
        self.write_state(|s| {
            s.entries.clear();
            s.order.clear();
        });
    }

    /// Delete disk entries older than `max_age_days`
    ///
    /// Unreadable entry files are deleted too. Returns the number removed.
    pub fn purge_older_than(&self, max_age_days: u64) -> Result<usize> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };
        let cutoff = Utc::now() - Duration::days(max_age_days.min(MAX_AGE_DAYS) as i64);

        let mut removed = 0;
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let stale = match read_entry(&path) {
                Ok(cached) => cached.created_at < cutoff,
                Err(e) => {
                    warn!("Removing unreadable cache file {}: {}", path.display(), e);
                    true
                }
            };
            if stale {
                std::fs::remove_file(&path)?;
                removed += 1;
            }
        }
        debug!("Purged {} cache files older than {} days", removed, max_age_days);
        Ok(removed)
    }

    fn entry_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.join(format!("{}.json", key)))
    }

    fn insert_memory(&self, key: String, features: FeatureVector) {
        if self.max_entries == 0 {
            return;
        }
        let max_entries = self.max_entries;
        self.write_state(|s| {
            if s.entries.insert(key.clone(), features).is_none() {
                s.order.push_back(key);
            }
            while s.entries.len() > max_entries {
                let Some(oldest) = s.order.pop_front() else {
                    break;
                };
                s.entries.remove(&oldest);
            }
        });
    }

    fn read_state<T>(&self, f: impl FnOnce(&MemoryState) -> T) -> T {
        let guard = self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }

    fn write_state<T>(&self, f: impl FnOnce(&mut MemoryState) -> T) -> T {
        let mut guard = self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

fn read_entry(path: &Path) -> Result<CachedFeatures> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

fn write_entry(path: &Path, entry: &CachedFeatures) -> Result<()> {
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, serde_json::to_vec(entry)?)?;
    std::fs::rename(&temp_path, path)?;
    Ok(())
}
