//! On-device package layout.
//!
//! ```text
//! <documents_root>/wso2/micro-apps/<appId>.zip
//! <documents_root>/wso2/micro-apps/<appId>-extracted/**
//! ```

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::{PackageError, PackageResult};

/// Entry point candidates, checked in order.
pub const ENTRY_CANDIDATES: [&str; 2] = ["index.html", "build/index.html"];

/// Manifest candidates, checked in order.
pub const MANIFEST_CANDIDATES: [&str; 2] = ["microapp.json", "build/microapp.json"];

/// Paths of installed packages under one document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageLayout {
	documents_root: PathBuf,
}

impl PackageLayout {
	/// Layout under `documents_root`.
	pub fn new(documents_root: impl Into<PathBuf>) -> Self {
		Self {
			documents_root: documents_root.into(),
		}
	}

	/// The document root.
	pub fn documents_root(&self) -> &Path {
		&self.documents_root
	}

	/// Directory holding every archive and artifact.
	pub fn packages_dir(&self) -> PathBuf {
		self.documents_root.join("wso2").join("micro-apps")
	}

	/// Archive path of `app_id`.
	pub fn archive_path(&self, app_id: &str) -> PathBuf {
		self.packages_dir().join(format!("{}.zip", app_id))
	}

	/// Artifact directory of `app_id`.
	pub fn extracted_dir(&self, app_id: &str) -> PathBuf {
		self.packages_dir().join(format!("{}-extracted", app_id))
	}

	/// Entry point of an extracted package.
	pub async fn find_entry_point(&self, app_id: &str) -> PackageResult<PathBuf> {
		let dir = self.extracted_dir(app_id);
		find_first(&dir, &ENTRY_CANDIDATES)
			.await
			.ok_or(PackageError::IndexNotFound(dir))
	}

	/// Manifest of an extracted package.
	pub async fn find_manifest(&self, app_id: &str) -> PackageResult<PathBuf> {
		let dir = self.extracted_dir(app_id);
		find_first(&dir, &MANIFEST_CANDIDATES)
			.await
			.ok_or(PackageError::ManifestNotFound(dir))
	}
}

/// The first of `candidates` (relative to `base`) that is an existing file.
pub async fn find_first(base: &Path, candidates: &[&str]) -> Option<PathBuf> {
	for candidate in candidates {
		let path = base.join(candidate);
		if tokio::fs::metadata(&path)
			.await
			.map(|m| m.is_file())
			.unwrap_or(false)
		{
			return Some(path);
		}
	}
	None
}

/// Rejects ids that would escape the packages directory.
pub fn validate_app_id(app_id: &str) -> PackageResult<()> {
	let valid = !app_id.is_empty()
		&& app_id != "."
		&& app_id != ".."
		&& !app_id.contains(['/', '\\', '\0']);
	if valid {
		Ok(())
	} else {
		Err(PackageError::InvalidAppId(app_id.to_string()))
	}
}

/// Percent-encoded `file://` URI of `path`.
pub fn file_uri(path: &Path) -> PackageResult<String> {
	let absolute = std::path::absolute(path)?;
	Url::from_file_path(&absolute)
		.map(String::from)
		.map_err(|()| PackageError::Io(std::io::Error::new(
			std::io::ErrorKind::InvalidInput,
			format!("cannot express {} as a file URI", absolute.display()),
		)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use tempfile::TempDir;

	#[rstest]
	fn test_paths() {
		let layout = PackageLayout::new("/data");
		assert_eq!(
			layout.archive_path("wallet"),
			PathBuf::from("/data/wso2/micro-apps/wallet.zip")
		);
		assert_eq!(
			layout.extracted_dir("wallet"),
			PathBuf::from("/data/wso2/micro-apps/wallet-extracted")
		);
	}

	#[rstest]
	#[tokio::test]
	async fn test_root_candidate_wins_over_build() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let layout = PackageLayout::new(dir.path());
		let extracted = layout.extracted_dir("app");
		std::fs::create_dir_all(extracted.join("build")).unwrap();
		std::fs::write(extracted.join("index.html"), "<html/>").unwrap();
		std::fs::write(extracted.join("build/index.html"), "<html/>").unwrap();

		// Act
		let entry = layout.find_entry_point("app").await.unwrap();

		// Assert
		assert_eq!(entry, extracted.join("index.html"));
	}

	#[rstest]
	#[tokio::test]
	async fn test_build_candidate_and_missing() {
		let dir = TempDir::new().unwrap();
		let layout = PackageLayout::new(dir.path());
		let extracted = layout.extracted_dir("app");
		std::fs::create_dir_all(extracted.join("build")).unwrap();
		std::fs::write(extracted.join("build/microapp.json"), "{}").unwrap();

		assert_eq!(
			layout.find_manifest("app").await.unwrap(),
			extracted.join("build/microapp.json")
		);
		assert!(matches!(
			layout.find_entry_point("app").await,
			Err(PackageError::IndexNotFound(_))
		));
	}

	#[rstest]
	#[case("wallet", true)]
	#[case("com.example.wallet", true)]
	#[case("", false)]
	#[case("..", false)]
	#[case("a/b", false)]
	#[case("a\\b", false)]
	fn test_validate_app_id(#[case] id: &str, #[case] ok: bool) {
		assert_eq!(validate_app_id(id).is_ok(), ok);
	}

	#[rstest]
	fn test_file_uri_is_percent_encoded() {
		let uri = file_uri(Path::new("/data/my apps/index.html")).unwrap();
		assert_eq!(uri, "file:///data/my%20apps/index.html");
	}
}
