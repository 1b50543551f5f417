use reqwest::Client;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::archive::{self, ArchiveError, ArchiveLayout};
use crate::destination::{DestinationResolver, is_zip};
use crate::metadata::PortalItem;
use crate::request::RequestError;
use crate::request::portal::data_url;

#[derive(Error, Debug)]
pub enum ItemError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("failed to place download at {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("archive task panicked or was cancelled")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug)]
pub struct ItemContext {
    pub http: Client,
    pub resolver: DestinationResolver,
    pub attempts: usize,
}

/// Downloads one item's data into place and returns the filename to record
/// for it.
///
/// Zip archives holding a single file are unpacked next to where that file
/// belongs and recorded under its name. Archives holding several files are
/// unpacked into a directory named after the archive and recorded under the
/// archive's name.
pub async fn download_item(
    portal: &Url,
    item: &PortalItem,
    ctx: &ItemContext,
) -> Result<String, ItemError> {
    let url = data_url(portal, &item.identifier)?;
    let fetched = crate::fetch_to_temp_retry(
        &ctx.http,
        &url,
        ctx.resolver.download_dir(),
        ctx.attempts,
    )
    .await?;
    let suggested = fetched.suggested_filename;
    let temp = fetched.path;
    let is_archive = is_zip(Path::new(&suggested));

    let download_name = if is_archive {
        let archive_path = temp.to_path_buf();
        let layout = tokio::task::spawn_blocking(move || archive::inspect(&archive_path)).await??;
        debug!(item = %item.identifier, ?layout, "classified archive");
        match layout {
            ArchiveLayout::SingleFile(name) => name,
            ArchiveLayout::MultiFile(_) => suggested,
        }
    } else {
        suggested
    };

    let destination = ctx.resolver.resolve(&download_name);
    let parent = destination
        .parent()
        .unwrap_or_else(|| ctx.resolver.download_dir())
        .to_path_buf();
    tokio::fs::create_dir_all(&parent)
        .await
        .map_err(|source| ItemError::Io {
            path: parent.clone(),
            source,
        })?;
    remove_existing(&destination).await?;
    debug!(item = %item.identifier, destination = %destination.display(), "placing download");

    if is_archive {
        let extract_to = if is_zip(&destination) {
            let dir = destination.with_extension("");
            remove_existing(&dir).await?;
            dir
        } else {
            parent
        };
        tokio::task::spawn_blocking(move || archive::extract_flat(&temp, &extract_to)).await??;
        if !is_zip(&destination) && !destination.exists() {
            return Err(ArchiveError::NotExtracted { path: destination }.into());
        }
    } else {
        temp.persist(&destination).map_err(|e| ItemError::Io {
            path: destination.clone(),
            source: e.error,
        })?;
    }
    Ok(download_name)
}

async fn remove_existing(path: &Path) -> Result<(), ItemError> {
    let result = match tokio::fs::symlink_metadata(path).await {
        Ok(meta) if meta.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|source| ItemError::Io {
        path: path.to_path_buf(),
        source,
    })
}
