//! Fetching and unpacking the pinned source tarball.
//!
//! The archive is cached under `<cache_dir>/<name>-<version>.tar.gz`. A
//! cached copy is reused without touching the network unless a refetch is
//! forced. Bytes are only extracted after their SHA-256 digest matches the
//! pinned value.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::errors::RecipeError;
use crate::core::recipe::SourceArchive;
use crate::sources::download::Downloader;
use crate::util::fs::{remove_dir_all_if_exists, write_atomic};
use crate::util::hash::{digest_matches, sha256_bytes};
use crate::util::shell::{Shell, Status};

/// Environment variable that forces a fresh download.
pub const FORCE_DOWNLOAD_ENV: &str = "MPDEC_RECIPE_FORCE_DOWNLOAD";

/// Name of the directory the sources are extracted into.
pub const SOURCE_SUBFOLDER: &str = "source_subfolder";

/// How the fetch step may use the cache and the network.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub cache_dir: PathBuf,
    /// Ignore any cached archive and download again.
    pub force_download: bool,
    /// Never touch the network.
    pub offline: bool,
}

/// Result of a successful fetch.
#[derive(Debug, Clone)]
pub struct Fetched {
    /// Extracted sources, with the tarball's top directory stripped.
    pub source_dir: PathBuf,
    /// Cached archive path.
    pub archive_path: PathBuf,
    /// Whether the archive came from the cache.
    pub from_cache: bool,
}

/// Obtain, verify and extract `archive` into `<build_dir>/source_subfolder`.
pub fn fetch_source(
    archive: &SourceArchive,
    opts: &FetchOptions,
    build_dir: &Path,
    downloader: &dyn Downloader,
    shell: &Shell,
) -> Result<Fetched> {
    let archive_path = opts.cache_dir.join(archive.file_name());

    let (bytes, from_cache) = match read_cached(archive, &archive_path, opts.force_download)? {
        Some(bytes) => {
            shell.status(Status::Fresh, format!("{} (cached)", archive.file_name()));
            (bytes, true)
        }
        None => {
            if opts.offline {
                return Err(RecipeError::Offline { path: archive_path }.into());
            }
            let bytes = download_verified(archive, downloader, shell)?;
            write_atomic(&archive_path, &bytes)?;
            tracing::debug!("cached archive at {}", archive_path.display());
            (bytes, false)
        }
    };

    let source_dir = build_dir.join(SOURCE_SUBFOLDER);
    // Patches must see pristine sources, never a previously patched tree.
    remove_dir_all_if_exists(&source_dir)?;

    shell.status(Status::Extracting, archive.file_name());
    extract_tarball(&bytes, &source_dir, Some(&archive.top_dir()))
        .with_context(|| format!("failed to extract {}", archive.file_name()))?;

    tracing::info!("Extracted {} to {}", archive.file_name(), source_dir.display());

    Ok(Fetched {
        source_dir,
        archive_path,
        from_cache,
    })
}

/// Return the cached archive if it exists, matches the digest, and no
/// refetch was requested.
fn read_cached(archive: &SourceArchive, path: &Path, force: bool) -> Result<Option<Vec<u8>>> {
    if force {
        tracing::info!("forced download requested, ignoring cache");
        return Ok(None);
    }
    if !path.is_file() {
        return Ok(None);
    }

    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let actual = sha256_bytes(&bytes);
    if digest_matches(&actual, &archive.sha256) {
        return Ok(Some(bytes));
    }

    tracing::warn!(
        "cached archive {} has digest {}, expected {}; downloading again",
        path.display(),
        actual,
        archive.sha256
    );
    std::fs::remove_file(path)
        .with_context(|| format!("failed to remove stale cache {}", path.display()))?;
    Ok(None)
}

/// Download `archive` and check its digest before handing the bytes back.
fn download_verified(
    archive: &SourceArchive,
    downloader: &dyn Downloader,
    shell: &Shell,
) -> Result<Vec<u8>> {
    let url = archive.parsed_url()?;
    shell.status(Status::Fetching, &url);

    let bytes = downloader.download(&url, shell)?;
    let actual = sha256_bytes(&bytes);
    if !digest_matches(&actual, &archive.sha256) {
        return Err(RecipeError::Integrity {
            url: archive.url.clone(),
            expected: archive.sha256.clone(),
            actual,
        }
        .into());
    }

    tracing::debug!("Tarball hash verified: {}", &actual[..16]);
    Ok(bytes)
}

/// Whether `force_download` was requested through the environment.
pub fn force_download_from_env() -> bool {
    std::env::var(FORCE_DOWNLOAD_ENV)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Extract a gzipped tarball into `dest`, optionally stripping a leading
/// directory.
pub fn extract_tarball(data: &[u8], dest: &Path, strip_prefix: Option<&str>) -> Result<()> {
    use flate2::read::GzDecoder;
    use std::io::Cursor;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(Cursor::new(data)));

    std::fs::create_dir_all(dest)
        .with_context(|| format!("failed to create destination directory: {}", dest.display()))?;

    for entry in archive.entries().context("failed to read tarball entries")? {
        let mut entry = entry.context("failed to read tarball entry")?;
        let entry_path = entry.path().context("failed to get entry path")?.into_owned();

        let Some(relative) = safe_relative(&entry_path, strip_prefix)? else {
            // The prefix directory itself.
            continue;
        };

        let output_path = dest.join(&relative);
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }

        let entry_type = entry.header().entry_type();
        match entry_type {
            tar::EntryType::Directory => {
                std::fs::create_dir_all(&output_path).with_context(|| {
                    format!("failed to create directory: {}", output_path.display())
                })?;
            }
            tar::EntryType::Regular | tar::EntryType::Continuous => {
                entry.unpack(&output_path).with_context(|| {
                    format!("failed to extract file: {}", output_path.display())
                })?;
            }
            tar::EntryType::Link => {
                // Hard link targets name an earlier entry by its archive path.
                let target = entry
                    .link_name()?
                    .map(|t| t.into_owned())
                    .with_context(|| format!("hard link without target: {}", entry_path.display()))?;
                let Some(target) = safe_relative(&target, strip_prefix)? else {
                    bail!("hard link points at the archive root: {}", entry_path.display());
                };
                std::fs::copy(dest.join(&target), &output_path).with_context(|| {
                    format!(
                        "failed to extract hard link {} -> {}",
                        output_path.display(),
                        target.display()
                    )
                })?;
            }
            tar::EntryType::Symlink => {
                #[cfg(unix)]
                {
                    if let Some(target) = entry.link_name()? {
                        std::os::unix::fs::symlink(target.as_ref(), &output_path).with_context(
                            || format!("failed to create symlink: {}", output_path.display()),
                        )?;
                    }
                }
                #[cfg(windows)]
                {
                    tracing::debug!("Skipping symlink on Windows: {}", entry_path.display());
                }
            }
            _ => {
                tracing::debug!(
                    "Skipping unsupported entry type {:?}: {}",
                    entry_type,
                    entry_path.display()
                );
            }
        }
    }

    Ok(())
}

/// Strip `strip_prefix` from an archive path and reject anything that could
/// land outside the destination. `None` is the prefix directory itself.
fn safe_relative(path: &Path, strip_prefix: Option<&str>) -> Result<Option<PathBuf>> {
    let relative = match strip_prefix {
        Some(prefix) => path
            .strip_prefix(prefix.trim_end_matches('/'))
            .unwrap_or(path)
            .to_path_buf(),
        None => path.to_path_buf(),
    };

    if relative.as_os_str().is_empty() {
        return Ok(None);
    }

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!(
            "tarball entry escapes destination directory: {}",
            path.display()
        );
    }

    Ok(Some(relative))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_tarball, MockDownloader};
    use tempfile::TempDir;

    fn setup() -> (TempDir, SourceArchive, Vec<u8>) {
        let tmp = TempDir::new().unwrap();
        let bytes = fixture_tarball();
        let archive = SourceArchive {
            sha256: sha256_bytes(&bytes),
            ..SourceArchive::mpdecimal()
        };
        (tmp, archive, bytes)
    }

    fn opts(tmp: &TempDir) -> FetchOptions {
        FetchOptions {
            cache_dir: tmp.path().join("cache"),
            force_download: false,
            offline: false,
        }
    }

    #[test]
    fn test_fetch_downloads_and_extracts() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let build_dir = tmp.path().join("build");

        let fetched =
            fetch_source(&archive, &opts(&tmp), &build_dir, &downloader, &Shell::silent())
                .unwrap();

        assert!(!fetched.from_cache);
        assert_eq!(downloader.request_count(), 1);
        assert!(fetched.archive_path.exists());
        assert!(fetched.source_dir.join("configure").exists());
        assert!(fetched.source_dir.join("libmpdec/Makefile.in").exists());
        assert!(!fetched.source_dir.join(archive.top_dir()).exists());
    }

    #[test]
    fn test_cached_archive_skips_network() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let build_dir = tmp.path().join("build");
        let opts = opts(&tmp);

        fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();
        let second =
            fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();

        assert!(second.from_cache);
        assert_eq!(downloader.request_count(), 1);
    }

    #[test]
    fn test_force_download_bypasses_cache() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let build_dir = tmp.path().join("build");
        let mut opts = opts(&tmp);

        fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();
        opts.force_download = true;
        let second =
            fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();

        assert!(!second.from_cache);
        assert_eq!(downloader.request_count(), 2);
    }

    #[test]
    fn test_digest_mismatch_never_extracts() {
        let (tmp, archive, _) = setup();
        let downloader = MockDownloader::serving(b"not the release".to_vec());
        let build_dir = tmp.path().join("build");
        let opts = opts(&tmp);

        let err = fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent())
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RecipeError>(),
            Some(RecipeError::Integrity { .. })
        ));
        assert!(!build_dir.join(SOURCE_SUBFOLDER).exists());
        assert!(!opts.cache_dir.join(archive.file_name()).exists());
    }

    #[test]
    fn test_corrupt_cache_is_refetched() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let opts = opts(&tmp);
        std::fs::create_dir_all(&opts.cache_dir).unwrap();
        std::fs::write(opts.cache_dir.join(archive.file_name()), b"truncated").unwrap();

        let fetched = fetch_source(
            &archive,
            &opts,
            &tmp.path().join("build"),
            &downloader,
            &Shell::silent(),
        )
        .unwrap();

        assert!(!fetched.from_cache);
        assert_eq!(downloader.request_count(), 1);
    }

    #[test]
    fn test_offline_without_cache_fails_without_request() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let mut opts = opts(&tmp);
        opts.offline = true;

        let err = fetch_source(
            &archive,
            &opts,
            &tmp.path().join("build"),
            &downloader,
            &Shell::silent(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RecipeError>(),
            Some(RecipeError::Offline { .. })
        ));
        assert_eq!(downloader.request_count(), 0);
    }

    #[test]
    fn test_refetch_replaces_patched_sources() {
        let (tmp, archive, bytes) = setup();
        let downloader = MockDownloader::serving(bytes);
        let build_dir = tmp.path().join("build");
        let opts = opts(&tmp);

        let fetched =
            fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();
        let stray = fetched.source_dir.join("stray.o");
        std::fs::write(&stray, b"obj").unwrap();

        fetch_source(&archive, &opts, &build_dir, &downloader, &Shell::silent()).unwrap();
        assert!(!stray.exists());
    }

    #[test]
    fn test_extract_tarball_rejects_parent_components() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut tar_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut tar_data, Compression::default());
            let mut builder = tar::Builder::new(encoder);
            let mut header = tar::Header::new_gnu();
            // set_path refuses `..`, so write the raw name bytes.
            header.as_gnu_mut().unwrap().name[..9].copy_from_slice(b"../evil.c");
            header.set_size(1);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, &b"x"[..]).unwrap();
            builder.into_inner().unwrap().finish().unwrap();
        }

        let tmp = TempDir::new().unwrap();
        let err = extract_tarball(&tar_data, &tmp.path().join("out"), None).unwrap_err();
        assert!(err.to_string().contains("escapes destination"));
    }

    fn tarball_with_link(target: &str) -> Vec<u8> {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let mut tar_data = Vec::new();
        {
            let encoder = GzEncoder::new(&mut tar_data, Compression::default());
            let mut builder = tar::Builder::new(encoder);

            let mut header = tar::Header::new_gnu();
            header.set_size(5);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, "mpdecimal-2.4.2/a.txt", &b"hello"[..])
                .unwrap();

            let mut link = tar::Header::new_gnu();
            link.set_entry_type(tar::EntryType::Link);
            link.set_size(0);
            link.set_mode(0o644);
            builder
                .append_link(&mut link, "mpdecimal-2.4.2/b.txt", target)
                .unwrap();

            builder.into_inner().unwrap().finish().unwrap();
        }
        tar_data
    }

    #[test]
    fn test_extract_tarball_hard_link_under_prefix() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");

        extract_tarball(
            &tarball_with_link("mpdecimal-2.4.2/a.txt"),
            &out,
            Some("mpdecimal-2.4.2"),
        )
        .unwrap();

        assert_eq!(std::fs::read_to_string(out.join("b.txt")).unwrap(), "hello");

        // Patching one name must not rewrite the other.
        std::fs::write(out.join("b.txt"), "patched").unwrap();
        assert_eq!(std::fs::read_to_string(out.join("a.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_extract_tarball_rejects_absolute_hard_link() {
        let tmp = TempDir::new().unwrap();
        let err = extract_tarball(
            &tarball_with_link("/etc/hostname"),
            &tmp.path().join("out"),
            Some("mpdecimal-2.4.2"),
        )
        .unwrap_err();

        assert!(err.to_string().contains("escapes destination"));
    }
}
