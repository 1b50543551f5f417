use futures::{StreamExt, stream};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::destination::DestinationResolver;
use crate::metadata::{ManifestError, load_file_types, load_portal_items};
use crate::request::RequestError;
use crate::task::cache::{CacheError, cache_path, load_previous, save_if_changed};
use crate::task::download::{ItemContext, ItemError, download_item};

#[derive(Debug, Clone)]
pub struct Options {
    pub portal_items: PathBuf,
    pub file_types: PathBuf,
    pub download_dir: PathBuf,
    /// Concurrent downloads; `None` starts every pending item at once.
    pub jobs: Option<usize>,
    pub attempts: usize,
    pub connect_timeout: Duration,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    /// Identifiers downloaded in this run, in completion order.
    pub downloaded: Vec<String>,
    /// Identifiers whose data was already on disk.
    pub skipped: Vec<String>,
    pub cache_written: bool,
}

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to create download directory {path}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("failed to download item {identifier}")]
    Item {
        identifier: String,
        #[source]
        source: ItemError,
    },
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Downloads every item not already present in the download directory.
///
/// The first failed item stops the batch: downloads still in flight are
/// dropped, and the downloaded-items cache is saved with whatever completed
/// before the failure.
pub async fn run_batch(opts: Options) -> Result<BatchReport, BatchError> {
    if !opts.download_dir.exists() {
        std::fs::create_dir(&opts.download_dir).map_err(|source| BatchError::DownloadDir {
            path: opts.download_dir.clone(),
            source,
        })?;
    }
    let portal_items = load_portal_items(&opts.portal_items)?;
    let file_types = load_file_types(&opts.file_types)?;
    let resolver = DestinationResolver::new(&opts.download_dir, file_types);

    let cache_file = cache_path(&opts.download_dir);
    let previous = load_previous(&cache_file);
    let mut downloaded_items = previous.clone();
    let mut report = BatchReport::default();

    let mut pending = Vec::new();
    for (portal, item) in portal_items.iter() {
        let filename = downloaded_items
            .get(&item.identifier)
            .cloned()
            .unwrap_or_else(|| item.filename.clone());
        let local = resolver.local_item_path(&filename);
        if local.exists() {
            info!("Item {} has already been downloaded", item.identifier);
            // Backfills caches written before this item was tracked.
            downloaded_items.insert(item.identifier.clone(), filename);
            report.skipped.push(item.identifier.clone());
        } else {
            debug!(item = %item.identifier, path = %local.display(), "not on disk");
            pending.push((portal, item));
        }
    }

    let ctx = ItemContext {
        http: crate::request::client::build_http_client(opts.connect_timeout)?,
        resolver,
        attempts: opts.attempts.max(1),
    };
    let limit = opts
        .jobs
        .filter(|&n| n > 0)
        .unwrap_or(pending.len())
        .max(1);
    let ctx = &ctx;
    let mut downloads = stream::iter(pending.into_iter().map(|(portal, item)| async move {
        info!("Downloading item {}", item.identifier);
        (item, download_item(portal, item, ctx).await)
    }))
    .buffer_unordered(limit);

    let mut failure = None;
    while let Some((item, result)) = downloads.next().await {
        match result {
            Ok(filename) => {
                debug!(item = %item.identifier, %filename, "downloaded");
                downloaded_items.insert(item.identifier.clone(), filename);
                report.downloaded.push(item.identifier.clone());
            }
            Err(source) => {
                warn!("Error downloading item {}: {}", item.identifier, source);
                failure = Some(BatchError::Item {
                    identifier: item.identifier.clone(),
                    source,
                });
                break;
            }
        }
    }
    drop(downloads);

    let saved = save_if_changed(&cache_file, &previous, &downloaded_items);
    if let Some(err) = failure {
        if let Err(cache_err) = saved {
            warn!(error = %cache_err, "could not record downloaded items");
        }
        return Err(err);
    }
    report.cache_written = saved?;
    Ok(report)
}
