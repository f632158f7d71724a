//! Streaming asset downloads

use crate::crawler::{Fetcher, ACCEPT_ANY};
use crate::extract::AssetRef;
use crate::output::sanitize_file_name;
use crate::record::{AssetKind, AssetManifest};
use crate::AssetError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Result of downloading every asset of one product
#[derive(Debug, Default)]
pub struct DownloadOutcome {
    /// Files present on disk, relative to the output directory
    pub manifest: AssetManifest,

    /// Assets that could not be stored
    pub failures: Vec<AssetError>,

    /// Files fetched in this call
    pub downloaded: usize,

    /// Files already on disk and left untouched
    pub reused: usize,
}

/// Stores product assets under `<output>/<product_id>/assets/<kind>/`
#[derive(Debug, Clone)]
pub struct AssetDownloader {
    output_dir: PathBuf,
}

impl AssetDownloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Path of an asset relative to the output directory, with `/` separators
    pub fn relative_path(product_id: &str, kind: AssetKind, file_name: &str) -> String {
        format!(
            "{}/assets/{}/{}",
            sanitize_file_name(product_id),
            kind.as_str(),
            sanitize_file_name(file_name)
        )
    }

    /// Downloads every referenced asset of a product
    ///
    /// Failures are collected, never returned: one broken link must not cost
    /// the product its record. Files already on disk are kept and listed.
    pub async fn download_all(
        &self,
        fetcher: &Fetcher,
        product_id: &str,
        refs: &[AssetRef],
    ) -> DownloadOutcome {
        let mut outcome = DownloadOutcome::default();
        let mut seen = HashSet::new();

        for asset in refs {
            let relative = Self::relative_path(product_id, asset.kind, &asset.file_name);
            if !seen.insert(relative.clone()) {
                tracing::debug!("Skipping duplicate asset {}", relative);
                continue;
            }

            let target = self.output_dir.join(&relative);

            if is_present(&target).await {
                tracing::debug!("Asset already present: {}", relative);
                outcome.reused += 1;
                outcome.manifest.push(asset.kind, relative);
                continue;
            }

            match download_to(fetcher, &asset.url, &target).await {
                Ok(bytes) => {
                    tracing::debug!("Downloaded {} ({} bytes)", relative, bytes);
                    outcome.downloaded += 1;
                    outcome.manifest.push(asset.kind, relative);
                }
                Err(e) => {
                    tracing::warn!("Asset for {} skipped: {}", product_id, e);
                    outcome.failures.push(e);
                }
            }
        }

        outcome
    }
}

async fn is_present(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// `<file>.part` next to the final target
fn part_path(target: &Path) -> PathBuf {
    let mut name = target.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    target.with_file_name(name)
}

/// Streams one URL into `target`, returning the number of bytes written
///
/// The body goes to a `.part` file that is renamed once complete, so an
/// interrupted transfer never looks like a finished download.
async fn download_to(fetcher: &Fetcher, url: &str, target: &Path) -> Result<u64, AssetError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| AssetError::Io { path, source }
    };

    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(io_err(parent))?;
    }

    let mut response = fetcher
        .fetch_response(url, ACCEPT_ANY)
        .await
        .map_err(|source| AssetError::Fetch {
            url: url.to_string(),
            source,
        })?;

    let part = part_path(target);
    let mut file = tokio::fs::File::create(&part)
        .await
        .map_err(io_err(&part))?;
    let mut written: u64 = 0;

    loop {
        let chunk = match response.chunk().await {
            Ok(Some(chunk)) => chunk,
            Ok(None) => break,
            Err(source) => {
                drop(file);
                let _ = tokio::fs::remove_file(&part).await;
                return Err(AssetError::Transfer {
                    url: url.to_string(),
                    source,
                });
            }
        };

        if let Err(e) = file.write_all(&chunk).await {
            drop(file);
            let _ = tokio::fs::remove_file(&part).await;
            return Err(io_err(&part)(e));
        }
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(io_err(&part))?;
    drop(file);

    tokio::fs::rename(&part, target)
        .await
        .map_err(io_err(target))?;

    Ok(written)
}
