use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

pub const DOWNLOADED_ITEMS_FILE: &str = ".downloaded_items";

/// Item identifier to the filename its data was last downloaded as.
pub type DownloadedItems = BTreeMap<String, String>;

#[derive(Error, Debug)]
#[error("failed to record downloaded items in {path}")]
pub struct CacheError {
    pub path: PathBuf,
    #[source]
    pub source: plist::Error,
}

pub fn cache_path(download_dir: &Path) -> PathBuf {
    download_dir.join(DOWNLOADED_ITEMS_FILE)
}

/// A missing or unreadable cache is treated as empty.
pub fn load_previous(path: &Path) -> DownloadedItems {
    if !path.exists() {
        return DownloadedItems::new();
    }
    match plist::from_file(path) {
        Ok(items) => items,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable downloaded items file");
            DownloadedItems::new()
        }
    }
}

/// Rewrites the cache in full when `current` differs from `previous`.
/// Returns whether the file was written.
pub fn save_if_changed(
    path: &Path,
    previous: &DownloadedItems,
    current: &DownloadedItems,
) -> Result<bool, CacheError> {
    if previous == current {
        debug!("downloaded items unchanged");
        return Ok(false);
    }
    plist::to_file_binary(path, current).map_err(|source| CacheError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_garbage_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(dir.path());
        assert!(load_previous(&path).is_empty());

        std::fs::write(&path, b"garbage").unwrap();
        assert!(load_previous(&path).is_empty());
    }

    #[test]
    fn writes_only_when_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(dir.path());
        let previous = DownloadedItems::new();

        assert!(!save_if_changed(&path, &previous, &previous.clone()).unwrap());
        assert!(!path.exists());

        let mut current = previous.clone();
        current.insert("abc".into(), "Yosemite.mmpk".into());
        assert!(save_if_changed(&path, &previous, &current).unwrap());
        assert!(std::fs::read(&path).unwrap().starts_with(b"bplist00"));
        assert_eq!(load_previous(&path), current);
    }

    #[test]
    fn reads_xml_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = cache_path(dir.path());
        let mut items = DownloadedItems::new();
        items.insert("abc".into(), "parcels.zip".into());
        plist::to_file_xml(&path, &items).unwrap();
        assert_eq!(load_previous(&path), items);
    }

    #[test]
    fn reports_unwritable_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join(DOWNLOADED_ITEMS_FILE);
        let mut current = DownloadedItems::new();
        current.insert("abc".into(), "a.tif".into());
        assert!(save_if_changed(&path, &DownloadedItems::new(), &current).is_err());
    }
}
