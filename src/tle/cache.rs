//! TLE disk caching module
//!
//! Catalog-number fetches are stored as JSON files in the platform cache
//! directory. An entry is served without touching the network while its
//! element set epoch is younger than the expiration threshold.

use bevy::log::{debug, warn};
use chrono::{DateTime, Duration, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::tle::parser::parse_tle_epoch_to_utc;
use crate::tle::types::TleText;

/// Serialized cache entry stored as JSON on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTle {
    pub norad: u32,
    pub name: Option<String>,
    pub line1: String,
    pub line2: String,
    pub epoch_utc: DateTime<Utc>,
    pub cached_at: DateTime<Utc>,
}

impl CachedTle {
    /// Returns None if line 1 carries no parseable epoch.
    pub fn from_text(norad: u32, text: &TleText) -> Option<Self> {
        Some(Self {
            norad,
            name: text.name.clone(),
            line1: text.line1.clone(),
            line2: text.line2.clone(),
            epoch_utc: parse_tle_epoch_to_utc(&text.line1)?,
            cached_at: Utc::now(),
        })
    }

    pub fn to_text(&self) -> TleText {
        TleText {
            name: self.name.clone(),
            line1: self.line1.clone(),
            line2: self.line2.clone(),
        }
    }
}

/// TLE disk cache manager
#[derive(Debug, Clone)]
pub struct TleCache {
    cache_dir: PathBuf,
    expiration_days: i64,
}

impl TleCache {
    /// Cache in the platform cache directory, e.g. `~/.cache/satstatus/tle/`
    /// on Linux.
    pub fn new(expiration_days: i64) -> Result<Self, anyhow::Error> {
        let proj_dirs = ProjectDirs::from("", "", "satstatus")
            .ok_or_else(|| anyhow::anyhow!("Failed to resolve cache directory"))?;
        Self::new_in_dir(proj_dirs.cache_dir().join("tle"), expiration_days)
    }

    pub fn new_in_dir(cache_dir: PathBuf, expiration_days: i64) -> Result<Self, anyhow::Error> {
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            cache_dir,
            expiration_days,
        })
    }

    /// Ok(None) on a cache miss; Err if the file exists but is unreadable.
    pub fn read(&self, norad: u32) -> Result<Option<CachedTle>, anyhow::Error> {
        let path = self.cache_path(norad);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn write(&self, entry: &CachedTle) -> Result<(), anyhow::Error> {
        let contents = serde_json::to_string_pretty(entry)?;
        fs::write(self.cache_path(entry.norad), contents)?;
        Ok(())
    }

    pub fn is_valid_at(&self, entry: &CachedTle, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(entry.epoch_utc) < Duration::days(self.expiration_days)
    }

    pub fn is_valid(&self, entry: &CachedTle) -> bool {
        self.is_valid_at(entry, Utc::now())
    }

    /// A still-valid cached element set, if any. Unreadable entries count as
    /// misses.
    pub fn lookup(&self, norad: u32) -> Option<TleText> {
        match self.read(norad) {
            Ok(Some(entry)) if self.is_valid(&entry) => {
                debug!("[TLE CACHE] hit norad={} epoch={}", norad, entry.epoch_utc);
                Some(entry.to_text())
            }
            Ok(Some(entry)) => {
                debug!("[TLE CACHE] expired norad={} epoch={}", norad, entry.epoch_utc);
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("[TLE CACHE] unreadable entry norad={}: {}", norad, e);
                None
            }
        }
    }

    /// Best-effort write of a freshly fetched element set.
    pub fn store(&self, norad: u32, text: &TleText) {
        let Some(entry) = CachedTle::from_text(norad, text) else {
            warn!("[TLE CACHE] not caching norad={}: no epoch", norad);
            return;
        };
        if let Err(e) = self.write(&entry) {
            warn!("[TLE CACHE] write failed norad={}: {}", norad, e);
        }
    }

    fn cache_path(&self, norad: u32) -> PathBuf {
        self.cache_dir.join(format!("{}.json", norad))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::orbital::propagation::tests::{ISS_LINE1, ISS_LINE2, ISS_NAME};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn unique_temp_dir(test_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "satstatus-tle-cache-{}-{}-{}",
            test_name,
            std::process::id(),
            nanos
        ))
    }

    fn iss_text() -> TleText {
        TleText {
            name: Some(ISS_NAME.to_string()),
            line1: ISS_LINE1.to_string(),
            line2: ISS_LINE2.to_string(),
        }
    }

    fn entry_with_epoch(norad: u32, epoch_utc: DateTime<Utc>) -> CachedTle {
        CachedTle {
            epoch_utc,
            ..CachedTle::from_text(norad, &iss_text()).unwrap()
        }
    }

    #[test]
    fn test_entry_epoch_comes_from_line1() {
        let entry = CachedTle::from_text(25544, &iss_text()).unwrap();
        assert_eq!(entry.epoch_utc, parse_tle_epoch_to_utc(ISS_LINE1).unwrap());
        assert_eq!(entry.to_text(), iss_text());

        let broken = TleText {
            line1: "1 25544U".into(),
            ..iss_text()
        };
        assert!(CachedTle::from_text(25544, &broken).is_none());
    }

    #[test]
    fn test_cache_validation() {
        let cache = TleCache::new_in_dir(unique_temp_dir("validation"), 7).unwrap();
        let now = Utc::now();
        assert!(cache.is_valid_at(&entry_with_epoch(1, now - Duration::days(3)), now));
        assert!(!cache.is_valid_at(&entry_with_epoch(1, now - Duration::days(10)), now));

        let short = TleCache::new_in_dir(unique_temp_dir("validation_short"), 1).unwrap();
        assert!(!short.is_valid_at(&entry_with_epoch(1, now - Duration::days(2)), now));
    }

    #[test]
    fn test_cache_write_and_read() {
        let cache = TleCache::new_in_dir(unique_temp_dir("write_and_read"), 7).unwrap();
        let entry = entry_with_epoch(99999, Utc::now());

        cache.write(&entry).expect("Failed to write to cache");
        let cached = cache.read(99999).unwrap().expect("Cache entry not found");

        assert_eq!(cached.norad, 99999);
        assert_eq!(cached.name.as_deref(), Some(ISS_NAME));
        assert_eq!(cached.line1, entry.line1);
        assert!(cache.is_valid(&cached));
    }

    #[test]
    fn test_cache_miss() {
        let cache = TleCache::new_in_dir(unique_temp_dir("miss"), 7).unwrap();
        assert!(cache.read(77777).unwrap().is_none());
        assert!(cache.lookup(77777).is_none());
    }

    #[test]
    fn test_lookup_skips_expired_entries() {
        let cache = TleCache::new_in_dir(unique_temp_dir("lookup_expired"), 7).unwrap();
        // the ISS sample epoch is from 2008
        cache.store(25544, &iss_text());
        assert!(cache.read(25544).unwrap().is_some());
        assert!(cache.lookup(25544).is_none());

        cache.write(&entry_with_epoch(25544, Utc::now())).unwrap();
        assert_eq!(cache.lookup(25544), Some(iss_text()));
    }

    #[test]
    fn test_lookup_treats_corrupt_file_as_miss() {
        let dir = unique_temp_dir("corrupt");
        let cache = TleCache::new_in_dir(dir.clone(), 7).unwrap();
        fs::write(dir.join("12345.json"), "{ not json").unwrap();
        assert!(cache.read(12345).is_err());
        assert!(cache.lookup(12345).is_none());
    }

    #[test]
    fn test_cache_file_persistence() {
        let dir = unique_temp_dir("persistence");
        let cache = TleCache::new_in_dir(dir.clone(), 7).unwrap();
        cache.write(&entry_with_epoch(55555, Utc::now())).unwrap();

        let reopened = TleCache::new_in_dir(dir, 7).unwrap();
        assert!(reopened.lookup(55555).is_some());
    }
}
