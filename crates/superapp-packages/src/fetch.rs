//! Archive download.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{PackageError, PackageResult};

/// Downloads an archive to a file.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
	/// Writes the resource at `url` to `dest`, returning the byte count.
	async fn fetch(&self, url: &str, dest: &Path) -> PackageResult<u64>;
}

/// Fetches `http(s)://` URLs with `reqwest` and copies `file://` URLs.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
	client: reqwest::Client,
}

impl HttpFetcher {
	/// A fetcher whose requests time out after `timeout`.
	pub fn new(timeout: Duration) -> PackageResult<Self> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| PackageError::Download {
				url: String::new(),
				reason: e.to_string(),
			})?;
		Ok(Self { client })
	}

	/// A fetcher over an existing client.
	pub fn with_client(client: reqwest::Client) -> Self {
		Self { client }
	}

	async fn download(&self, url: &Url, dest: &Path) -> PackageResult<u64> {
		let failed = |e: reqwest::Error| PackageError::Download {
			url: url.to_string(),
			reason: e.to_string(),
		};

		let mut response = self
			.client
			.get(url.clone())
			.send()
			.await
			.and_then(|r| r.error_for_status())
			.map_err(failed)?;

		let mut file = tokio::fs::File::create(dest).await?;
		let mut written = 0u64;
		while let Some(chunk) = response.chunk().await.map_err(failed)? {
			file.write_all(&chunk).await?;
			written += chunk.len() as u64;
		}
		file.flush().await?;
		Ok(written)
	}
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
	async fn fetch(&self, url: &str, dest: &Path) -> PackageResult<u64> {
		let parsed = Url::parse(url).map_err(|e| PackageError::Download {
			url: url.to_string(),
			reason: e.to_string(),
		})?;

		match parsed.scheme() {
			"http" | "https" => self.download(&parsed, dest).await,
			"file" => {
				let source = parsed.to_file_path().map_err(|()| PackageError::Download {
					url: url.to_string(),
					reason: "not a local path".to_string(),
				})?;
				tokio::fs::copy(&source, dest)
					.await
					.map_err(|e| PackageError::Download {
						url: url.to_string(),
						reason: e.to_string(),
					})
			}
			other => Err(PackageError::Download {
				url: url.to_string(),
				reason: format!("unsupported scheme '{}'", other),
			}),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	fn fetcher() -> HttpFetcher {
		HttpFetcher::new(Duration::from_secs(5)).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn test_file_url_is_copied() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let source = dir.path().join("app.zip");
		std::fs::write(&source, b"PK\x03\x04data").unwrap();
		let url = Url::from_file_path(&source).unwrap();
		let dest = dir.path().join("copy.zip");

		// Act
		let written = fetcher().fetch(url.as_str(), &dest).await.unwrap();

		// Assert
		assert_eq!(written, 8);
		assert_eq!(std::fs::read(&dest).unwrap(), b"PK\x03\x04data");
	}

	#[rstest]
	#[case("ftp://example.com/app.zip")]
	#[case("not a url")]
	#[tokio::test]
	async fn test_unsupported_locations(#[case] url: &str) {
		let dir = TempDir::new().unwrap();

		let err = fetcher().fetch(url, &dir.path().join("x.zip")).await.unwrap_err();

		assert!(matches!(err, PackageError::Download { .. }));
	}

	#[rstest]
	#[tokio::test]
	async fn test_missing_local_file() {
		let dir = TempDir::new().unwrap();
		let url = Url::from_file_path(dir.path().join("absent.zip")).unwrap();

		let err = fetcher()
			.fetch(url.as_str(), &dir.path().join("x.zip"))
			.await
			.unwrap_err();

		assert!(matches!(err, PackageError::Download { .. }));
	}
}
