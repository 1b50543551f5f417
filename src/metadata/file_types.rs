use std::collections::BTreeMap;
use std::path::Path;

use super::errors::ManifestError;

/// Subdirectory name to the file extensions filed under it.
pub type FileTypes = BTreeMap<String, Vec<String>>;

pub fn load_file_types(path: &Path) -> Result<FileTypes, ManifestError> {
    plist::from_file(path).map_err(|source| ManifestError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
