//! Concurrent download execution.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future;

use crate::error::Result;
use crate::fs::paths::{destination_dir, ensure_dir};
use crate::media::{MediaCategory, MediaItem};
use crate::output::progress::create_item_bar;
use crate::platform::FileFetcher;
use crate::scan::ScanReport;

/// Media chosen for download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadSelection {
    Images,
    Videos,
    Other,
    All,
}

impl DownloadSelection {
    /// Whether a category falls under this selection.
    pub fn includes(&self, category: MediaCategory) -> bool {
        match self {
            DownloadSelection::Images => category == MediaCategory::Image,
            DownloadSelection::Videos => category == MediaCategory::Video,
            DownloadSelection::Other => category == MediaCategory::Other,
            DownloadSelection::All => true,
        }
    }

    /// Option label shown in the selection prompt.
    pub fn label(&self) -> &'static str {
        match self {
            DownloadSelection::Images => "Images",
            DownloadSelection::Videos => "Videos",
            DownloadSelection::Other => "Other files",
            DownloadSelection::All => "Everything",
        }
    }
}

/// Result of one download batch.
#[derive(Debug)]
pub struct DownloadSummary {
    pub succeeded: usize,
    pub total: usize,
    pub destination: PathBuf,
}

impl DownloadSummary {
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}

/// Downloads every selected media item of a scan concurrently.
///
/// All tasks of one invocation are issued jointly; a failing item is logged
/// and counted, never aborting its siblings.
pub struct DownloadOrchestrator {
    fetcher: Arc<dyn FileFetcher>,
    root: PathBuf,
}

impl DownloadOrchestrator {
    pub fn new(fetcher: Arc<dyn FileFetcher>, root: PathBuf) -> Self {
        Self { fetcher, root }
    }

    /// Fetch all selected items into a fresh destination directory.
    pub async fn download(
        &self,
        report: &ScanReport,
        selection: DownloadSelection,
        server_name: &str,
        channel_name: &str,
    ) -> Result<DownloadSummary> {
        let destination = destination_dir(&self.root, server_name, channel_name, report.started_at);

        let selected: Vec<&MediaItem> = report
            .media
            .items()
            .iter()
            .filter(|item| selection.includes(item.category))
            .collect();
        let total = selected.len();

        if total == 0 {
            return Ok(DownloadSummary {
                succeeded: 0,
                total: 0,
                destination,
            });
        }

        ensure_dir(&destination)?;
        tracing::info!(
            "Downloading {} files to {}",
            total,
            destination.display()
        );

        let bar = create_item_bar(total as u64, "Downloading");
        let tasks: Vec<_> = selected
            .into_iter()
            .map(|item| {
                let fetcher = Arc::clone(&self.fetcher);
                let path = destination.join(&item.file_name);
                let url = item.url.clone();
                let bar = bar.clone();
                async move {
                    let outcome = download_one(fetcher.as_ref(), &url, &path).await;
                    bar.inc(1);
                    match outcome {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!("Download failed for {}: {}", path.display(), e);
                            false
                        }
                    }
                }
            })
            .collect();

        let results = future::join_all(tasks).await;
        bar.finish_and_clear();

        let succeeded = results.into_iter().filter(|ok| *ok).count();
        tracing::info!("Download finished: {}/{} files", succeeded, total);

        Ok(DownloadSummary {
            succeeded,
            total,
            destination,
        })
    }
}

/// Fetch one URL and write it to disk.
async fn download_one(fetcher: &dyn FileFetcher, url: &str, path: &Path) -> Result<()> {
    tracing::debug!("Downloading {} as {}", url, path.display());
    let bytes = fetcher.fetch_bytes(url).await?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
