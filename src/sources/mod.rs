//! Obtaining the upstream sources.

pub mod download;
pub mod tarball;

pub use download::{Downloader, HttpDownloader};
pub use tarball::{fetch_source, FetchOptions, Fetched};
