pub mod archive;
pub mod cli;
pub mod destination;
pub mod metadata;
pub mod request;
pub mod task;

use anyhow::Result;
use reqwest::Client;
use std::path::Path;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use url::Url;

use crate::request::RequestError;

/// A response body spooled to a temporary file that is removed on drop
/// unless persisted.
#[derive(Debug)]
pub(crate) struct Fetched {
    pub path: TempPath,
    pub suggested_filename: String,
}

pub(crate) async fn fetch_to_temp(
    client: &Client,
    url: &Url,
    dir: &Path,
) -> Result<Fetched, RequestError> {
    let transport = |source| RequestError::Transport {
        url: url.clone(),
        source,
    };
    let mut res = client.get(url.clone()).send().await.map_err(transport)?;
    let status = res.status();
    if !status.is_success() {
        return Err(RequestError::Status {
            url: url.clone(),
            status,
        });
    }
    let suggested_filename = request::filename::suggested_filename(res.headers(), res.url())
        .ok_or_else(|| RequestError::MissingFilename { url: url.clone() })?;

    let write_err = |source| RequestError::Write {
        url: url.clone(),
        path: dir.to_path_buf(),
        source,
    };
    let (file, path) = tempfile::Builder::new()
        .prefix(".download-")
        .tempfile_in(dir)
        .map_err(write_err)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);
    while let Some(chunk) = res.chunk().await.map_err(transport)? {
        file.write_all(&chunk).await.map_err(write_err)?;
    }
    file.flush().await.map_err(write_err)?;
    Ok(Fetched {
        path,
        suggested_filename,
    })
}

pub(crate) async fn fetch_to_temp_retry(
    client: &Client,
    url: &Url,
    dir: &Path,
    attempts: usize,
) -> Result<Fetched, RequestError> {
    let mut delay = Duration::from_millis(500);
    let mut attempt = 1;
    loop {
        match fetch_to_temp(client, url, dir).await {
            Ok(fetched) => return Ok(fetched),
            Err(e) if attempt < attempts => {
                warn!(%url, attempt, error = %e, "download failed, retrying");
                sleep(delay).await;
                delay = std::cmp::min(delay * 2, Duration::from_secs(8));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

pub async fn run(cfg: crate::cli::Cli) -> Result<()> {
    info!(?cfg, "starting download-portal-item-data");
    let opts = crate::task::update::Options {
        portal_items: cfg.portal_items,
        file_types: cfg.file_types,
        download_dir: cfg.download_dir,
        jobs: cfg.jobs.map(|n| n.get()),
        attempts: cfg.attempts as usize,
        connect_timeout: Duration::from_secs(cfg.connect_timeout_secs),
    };
    let report = crate::task::update::run_batch(opts).await?;
    info!(
        downloaded = report.downloaded.len(),
        skipped = report.skipped.len(),
        cache_written = report.cache_written,
        "finished"
    );
    Ok(())
}
