use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_stream::StreamExt;
use tracing::info;

use crate::error::ScanError;
use crate::progress::{ProgressSink, TransferProgress};

/// Remote repository base; fixed, not configurable from the CLI.
pub const REPO_BASE_URL: &str = "https://f-droid.org/repo";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Downloads repository files into a local cache directory.
///
/// A file already present in the cache is authoritative: no revalidation,
/// no TTL. Transfers are strictly sequential, one in flight at a time.
pub struct Fetcher {
    client: reqwest::Client,
    cache_dir: PathBuf,
    base_url: String,
}

impl Fetcher {
    pub fn new(cache_dir: PathBuf) -> Result<Self, ScanError> {
        Self::with_base_url(cache_dir, REPO_BASE_URL)
    }

    /// The base URL is injectable so tests never reach the real repository.
    pub fn with_base_url(
        cache_dir: PathBuf,
        base_url: impl Into<String>,
    ) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            cache_dir,
            base_url: base_url.into(),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Returns the cache path for `filename`, downloading it on a miss.
    ///
    /// A pre-existing file is returned as-is with no network activity at
    /// all, which makes repeated runs idempotent.
    pub async fn ensure_cached<S: ProgressSink>(
        &self,
        filename: &str,
        progress: &mut TransferProgress<S>,
    ) -> Result<PathBuf, ScanError> {
        let dest = self.cache_dir.join(filename);
        if fs::try_exists(&dest).await? {
            info!("{filename} already cached, using existing copy");
            return Ok(dest);
        }

        fs::create_dir_all(&self.cache_dir).await?;

        let url = format!("{}/{}", self.base_url, filename);
        info!("downloading {url} to {}", dest.display());
        self.download(&url, &dest, progress).await?;

        Ok(dest)
    }

    /// Streams `url` into `dest`.
    ///
    /// The body is written to a `.part` sibling and renamed on success, so
    /// an interrupted transfer never masquerades as a cached file.
    async fn download<S: ProgressSink>(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut TransferProgress<S>,
    ) -> Result<(), ScanError> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let total = response.content_length().unwrap_or(0);

        let file_name = dest.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
            ScanError::Filesystem(io::Error::new(
                io::ErrorKind::InvalidInput,
                "destination has no file name",
            ))
        })?;
        let part = dest.with_file_name(format!("{file_name}.part"));

        let mut file = fs::File::create(&part).await?;
        let mut downloaded: u64 = 0;

        let copied: Result<(), ScanError> = async {
            let stream = response.bytes_stream();
            tokio::pin!(stream);

            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                downloaded += chunk.len() as u64;
                progress.update(total, downloaded);
            }

            file.flush().await?;
            Ok(())
        }
        .await;

        // The transfer is over either way; a started bar must not outlive it.
        progress.finish();
        copied?;

        drop(file);
        fs::rename(&part, dest).await?;

        Ok(())
    }
}
