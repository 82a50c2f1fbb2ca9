//! Archive downloads.

use std::io::Read;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use url::Url;

use crate::util::shell::Shell;

/// Fetches the raw bytes behind a URL.
pub trait Downloader {
    fn download(&self, url: &Url, shell: &Shell) -> Result<Vec<u8>>;
}

/// Blocking HTTP(S) downloader; also reads `file://` URLs for local mirrors.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout.unwrap_or(Self::DEFAULT_TIMEOUT))
            .user_agent(concat!("mpdec-recipe/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(HttpDownloader { client })
    }

    fn read_file_url(url: &Url) -> Result<Vec<u8>> {
        let path = url
            .to_file_path()
            .map_err(|_| anyhow::anyhow!("invalid file url: {}", url))?;
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &Url, shell: &Shell) -> Result<Vec<u8>> {
        match url.scheme() {
            "file" => return Self::read_file_url(url),
            "http" | "https" => {}
            other => bail!("unsupported url scheme `{}` in {}", other, url),
        }

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .with_context(|| format!("failed to download tarball from {}", url))?;

        if !response.status().is_success() {
            bail!(
                "failed to download tarball from {}: HTTP {}",
                url,
                response.status()
            );
        }

        let total = response.content_length();
        let progress = shell.bytes_progress(url.as_str(), total);
        let mut bytes = Vec::with_capacity(initial_capacity(total));
        let mut buffer = [0u8; 64 * 1024];

        loop {
            let n = response
                .read(&mut buffer)
                .with_context(|| "failed to read tarball response body")?;
            if n == 0 {
                break;
            }
            bytes.extend_from_slice(&buffer[..n]);
            progress.inc(n as u64);
        }
        progress.finish();

        tracing::debug!("downloaded {} bytes from {}", bytes.len(), url);
        Ok(bytes)
    }
}

/// Upper bound on what an unverified `Content-Length` may preallocate.
const MAX_PREALLOC: u64 = 64 << 20;

fn initial_capacity(content_length: Option<u64>) -> usize {
    content_length.unwrap_or(0).min(MAX_PREALLOC) as usize
}
