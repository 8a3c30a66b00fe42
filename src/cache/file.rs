use crate::cache::error::CacheError;
use crate::cache::{CacheEntry, SeriesCache};
use crate::types::coordinate::CacheKey;
use crate::types::series::{merge_new_variables, SeriesMap};
use async_trait::async_trait;
use bincode::config::{Configuration, Fixint, LittleEndian};
use chrono::Utc;
use log::{debug, info, warn};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::sync::Mutex;

const CACHE_FILE_PREFIX: &str = "series-";
const BINCODE_CONFIG: Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();

/// Series cache persisted as one bincode file per coordinate.
///
/// Files are written to a temporary sibling and renamed into place, so a
/// concurrent reader decodes either the previous entry or the new one.
pub struct FileSeriesCache {
    cache_dir: PathBuf,
    default_ttl: Duration,
    // Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileSeriesCache {
    pub async fn new(cache_dir: &Path, default_ttl: Duration) -> Result<Self, CacheError> {
        tokio::fs::create_dir_all(cache_dir)
            .await
            .map_err(|e| CacheError::CacheDirCreation(cache_dir.to_path_buf(), e))?;
        Ok(Self {
            cache_dir: cache_dir.to_path_buf(),
            default_ttl,
            write_lock: Mutex::new(()),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        let file_stem: String = key
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir
            .join(format!("{}{}.bin", CACHE_FILE_PREFIX, file_stem))
    }

    async fn read_entry(path: &Path) -> Result<Option<CacheEntry>, CacheError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::CacheRead(path.to_path_buf(), e)),
        };
        let decoded = tokio::task::spawn_blocking(move || {
            bincode::serde::decode_from_slice::<CacheEntry, _>(&bytes, BINCODE_CONFIG)
        })
        .await?;
        match decoded {
            Ok((entry, _)) => Ok(Some(entry)),
            Err(e) => {
                warn!(
                    "Ignoring undecodable cache file {}: {}",
                    path.display(),
                    e
                );
                Ok(None)
            }
        }
    }

    async fn write_entry(&self, path: &Path, entry: CacheEntry) -> Result<(), CacheError> {
        let dir = self.cache_dir.clone();
        let path_buf = path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let bytes = bincode::serde::encode_to_vec(&entry, BINCODE_CONFIG)
                .map_err(|e| CacheError::CacheEncode(Box::new(e)))?;
            let mut temp_file = NamedTempFile::new_in(&dir)
                .map_err(|e| CacheError::CacheWrite(path_buf.clone(), e))?;
            temp_file
                .write_all(&bytes)
                .map_err(|e| CacheError::CacheWrite(path_buf.clone(), e))?;
            temp_file
                .flush()
                .map_err(|e| CacheError::CacheWrite(path_buf.clone(), e))?;
            temp_file
                .persist(&path_buf)
                .map_err(|e| CacheError::CachePersist(path_buf.clone(), e))?;
            Ok::<(), CacheError>(())
        })
        .await??;
        Ok(())
    }
}

#[async_trait]
impl SeriesCache for FileSeriesCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<CacheEntry>, CacheError> {
        let path = self.entry_path(key);
        let entry = Self::read_entry(&path).await?;
        Ok(entry.filter(|e| !e.is_expired(Utc::now())))
    }

    async fn put(
        &self,
        key: &CacheKey,
        series: SeriesMap,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let path = self.entry_path(key);
        self.write_entry(&path, CacheEntry::new(series, ttl)).await?;
        info!("Cached series for {} to {}", key, path.display());
        Ok(())
    }

    async fn merge_variables(&self, key: &CacheKey, series: SeriesMap) -> Result<(), CacheError> {
        let _guard = self.write_lock.lock().await;
        let path = self.entry_path(key);
        let entry = match Self::read_entry(&path).await? {
            Some(mut entry) if !entry.is_expired(Utc::now()) => {
                let added = merge_new_variables(&mut entry.series, series);
                debug!("Merged {:?} into cache file {}", added, path.display());
                entry
            }
            _ => CacheEntry::new(series, self.default_ttl),
        };
        self.write_entry(&path, entry).await
    }

    fn name(&self) -> &str {
        "file"
    }
}
