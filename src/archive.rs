//! Zip handling for downloaded item data.
//!
//! Archives are flattened on extraction: every file lands directly in the
//! target directory regardless of the folders it sits in inside the archive.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};
use zip::ZipArchive;
use zip::result::ZipError;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("failed to open archive {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid zip archive {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: ZipError,
    },
    #[error("archive {path} contains no extractable files")]
    Empty { path: PathBuf },
    #[error("failed to extract {entry} to {dest}")]
    Extract {
        entry: String,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("extracting the archive did not produce {path}")]
    NotExtracted { path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLayout {
    /// Exactly one file; holds the name it is extracted under.
    SingleFile(String),
    /// Number of files, always more than one.
    MultiFile(usize),
}

/// The name an entry is extracted under: its last path component, as with
/// `unzip -j`. `None` when that component is empty, `.` or `..`.
pub fn flat_name(entry_name: &str) -> Option<&str> {
    match entry_name.rsplit(['/', '\\']).next()? {
        "" | "." | ".." => None,
        name => Some(name),
    }
}

fn open(path: &Path) -> Result<ZipArchive<File>, ArchiveError> {
    let file = File::open(path).map_err(|source| ArchiveError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ZipArchive::new(file).map_err(|source| ArchiveError::Zip {
        path: path.to_path_buf(),
        source,
    })
}

/// Classifies the archive by the files [`extract_flat`] would write.
pub fn inspect(path: &Path) -> Result<ArchiveLayout, ArchiveError> {
    let mut archive = open(path)?;
    let mut files = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i).map_err(|source| ArchiveError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.is_dir() {
            continue;
        }
        match flat_name(entry.name()) {
            Some(name) => files.push(name.to_string()),
            None => warn!(entry = entry.name(), "ignoring archive entry without a file name"),
        }
    }
    debug!(archive = %path.display(), files = files.len(), "inspected archive");
    match files.as_mut_slice() {
        [] => Err(ArchiveError::Empty {
            path: path.to_path_buf(),
        }),
        [only] => Ok(ArchiveLayout::SingleFile(std::mem::take(only))),
        _ => Ok(ArchiveLayout::MultiFile(files.len())),
    }
}

/// Extracts every file of the archive directly into `dest`, overwriting
/// existing files. Returns the number of files written, which is never zero.
pub fn extract_flat(path: &Path, dest: &Path) -> Result<usize, ArchiveError> {
    let mut archive = open(path)?;
    fs::create_dir_all(dest).map_err(|source| ArchiveError::Extract {
        entry: String::new(),
        dest: dest.to_path_buf(),
        source,
    })?;
    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|source| ArchiveError::Zip {
            path: path.to_path_buf(),
            source,
        })?;
        if entry.is_dir() {
            continue;
        }
        let entry_name = entry.name().to_string();
        let Some(name) = flat_name(&entry_name) else {
            warn!(entry = %entry_name, "skipping archive entry without a file name");
            continue;
        };
        let out = dest.join(name);
        File::create(&out)
            .and_then(|mut file| io::copy(&mut entry, &mut file))
            .map_err(|source| ArchiveError::Extract {
                entry: entry_name.clone(),
                dest: out.clone(),
                source,
            })?;
        written += 1;
    }
    if written == 0 {
        return Err(ArchiveError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data).unwrap();
            }
        }
        let bytes = writer.finish().unwrap().into_inner();
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn single_file_reports_base_name() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("a.zip");
        write_zip(&zip, &[("nested/", b""), ("nested/Yosemite.mmpk", b"pkg")]);
        assert_eq!(
            inspect(&zip).unwrap(),
            ArchiveLayout::SingleFile("Yosemite.mmpk".into())
        );
    }

    #[test]
    fn counts_files_not_directories() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("a.zip");
        write_zip(
            &zip,
            &[("shp/", b""), ("shp/a.shp", b"1"), ("shp/a.dbf", b"2"), ("a.prj", b"3")],
        );
        assert_eq!(inspect(&zip).unwrap(), ArchiveLayout::MultiFile(3));
    }

    #[test]
    fn empty_and_corrupt_archives_fail() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.zip");
        write_zip(&empty, &[("only-a-dir/", b"")]);
        assert!(matches!(inspect(&empty), Err(ArchiveError::Empty { .. })));

        let corrupt = dir.path().join("corrupt.zip");
        fs::write(&corrupt, b"definitely not a zip").unwrap();
        assert!(matches!(inspect(&corrupt), Err(ArchiveError::Zip { .. })));
    }

    #[test]
    fn extraction_flattens_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("a.zip");
        write_zip(&zip, &[("x/y/one.txt", b"one"), ("two.txt", b"two")]);
        let dest = dir.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("two.txt"), b"stale").unwrap();

        assert_eq!(extract_flat(&zip, &dest).unwrap(), 2);
        assert_eq!(fs::read(dest.join("one.txt")).unwrap(), b"one");
        assert_eq!(fs::read(dest.join("two.txt")).unwrap(), b"two");
        assert!(!dest.join("x").exists());
    }

    #[test]
    fn parent_components_are_junked_not_followed() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("a.zip");
        write_zip(&zip, &[("../elevation.tif", b"raster")]);
        let dest = dir.path().join("out");

        assert_eq!(
            inspect(&zip).unwrap(),
            ArchiveLayout::SingleFile("elevation.tif".into())
        );
        assert_eq!(extract_flat(&zip, &dest).unwrap(), 1);
        assert_eq!(fs::read(dest.join("elevation.tif")).unwrap(), b"raster");
        assert!(!dir.path().join("elevation.tif").exists());
    }

    #[test]
    fn entries_without_a_file_name_are_never_extracted() {
        let dir = tempfile::tempdir().unwrap();
        let zip = dir.path().join("a.zip");
        write_zip(&zip, &[("sub/..", b"x")]);
        let dest = dir.path().join("out");

        assert!(matches!(inspect(&zip), Err(ArchiveError::Empty { .. })));
        assert!(matches!(
            extract_flat(&zip, &dest),
            Err(ArchiveError::Empty { .. })
        ));

        let mixed = dir.path().join("mixed.zip");
        write_zip(&mixed, &[("sub/..", b"x"), ("ok.txt", b"ok")]);
        assert_eq!(inspect(&mixed).unwrap(), ArchiveLayout::SingleFile("ok.txt".into()));
        assert_eq!(extract_flat(&mixed, &dest).unwrap(), 1);
        assert!(dest.join("ok.txt").exists());
    }

    #[test]
    fn flat_names() {
        assert_eq!(flat_name("a/b/c.tif"), Some("c.tif"));
        assert_eq!(flat_name("/abs/c.tif"), Some("c.tif"));
        assert_eq!(flat_name("win\\path\\c.tif"), Some("c.tif"));
        assert_eq!(flat_name("sub/.."), None);
        assert_eq!(flat_name("."), None);
        assert_eq!(flat_name(""), None);
    }
}
