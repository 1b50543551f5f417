use std::path::{Path, PathBuf};

use crate::metadata::FileTypes;

/// Maps downloaded filenames onto their place in the download directory.
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    download_dir: PathBuf,
    file_types: FileTypes,
}

impl DestinationResolver {
    pub fn new(download_dir: impl Into<PathBuf>, file_types: FileTypes) -> Self {
        Self {
            download_dir: download_dir.into(),
            file_types,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// First subdirectory (in name order) that lists the file's extension.
    pub fn subdirectory_for(&self, filename: &str) -> Option<&str> {
        let ext = Path::new(filename).extension()?.to_str()?;
        self.file_types
            .iter()
            .find(|(_, exts)| exts.iter().any(|e| e == ext))
            .map(|(dir, _)| dir.as_str())
    }

    pub fn resolve(&self, filename: &str) -> PathBuf {
        match self.subdirectory_for(filename) {
            Some(dir) => self.download_dir.join(dir).join(filename),
            None => self.download_dir.join(filename),
        }
    }

    /// Where an item downloaded as `filename` lives on disk. Multi-file
    /// archives are unpacked into a directory named after the archive.
    pub fn local_item_path(&self, filename: &str) -> PathBuf {
        let path = self.resolve(filename);
        if is_zip(&path) {
            path.with_extension("")
        } else {
            path
        }
    }
}

pub fn is_zip(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zip")
}
