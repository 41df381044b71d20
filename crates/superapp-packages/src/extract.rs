//! Archive extraction.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PackageError, PackageResult};

/// Counts of one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
	/// Files written.
	pub files: usize,
	/// Entries skipped as macOS metadata or unsafe paths.
	pub skipped: usize,
}

/// Whether `name` is macOS archive metadata (`__MACOSX/` tree or `._*`
/// resource forks).
pub fn is_metadata_entry(name: &str) -> bool {
	name.starts_with("__MACOSX/")
		|| name == "__MACOSX"
		|| name.split('/').any(|segment| segment.starts_with("._"))
}

/// Extracts `archive` into a fresh `dest`, recreating its directory tree.
///
/// Any previous content of `dest` is removed first. Runs on the blocking pool.
pub async fn extract_archive(archive: &Path, dest: &Path) -> PackageResult<ExtractSummary> {
	let archive_path = archive.to_path_buf();
	let dest_path = dest.to_path_buf();
	let joined =
		tokio::task::spawn_blocking(move || extract_blocking(&archive_path, &dest_path)).await;

	match joined {
		Ok(result) => result,
		Err(e) => Err(PackageError::Extract {
			path: archive.to_path_buf(),
			reason: e.to_string(),
		}),
	}
}

fn extract_blocking(archive: &Path, dest: &Path) -> PackageResult<ExtractSummary> {
	let corrupt = |reason: String| PackageError::Extract {
		path: archive.to_path_buf(),
		reason,
	};

	let file = fs::File::open(archive)?;
	let mut zip = zip::ZipArchive::new(file).map_err(|e| corrupt(e.to_string()))?;

	match fs::remove_dir_all(dest) {
		Ok(()) => {}
		Err(e) if e.kind() == io::ErrorKind::NotFound => {}
		Err(e) => return Err(e.into()),
	}
	fs::create_dir_all(dest)?;

	let mut summary = ExtractSummary::default();
	for index in 0..zip.len() {
		let mut entry = zip.by_index(index).map_err(|e| corrupt(e.to_string()))?;
		let name = entry.name().to_string();

		if is_metadata_entry(&name) {
			summary.skipped += 1;
			continue;
		}
		let Some(relative) = entry.enclosed_name() else {
			tracing::warn!(entry = %name, "skipping archive entry with unsafe path");
			summary.skipped += 1;
			continue;
		};
		let target: PathBuf = dest.join(relative);

		if entry.is_dir() {
			fs::create_dir_all(&target)?;
			continue;
		}
		if let Some(parent) = target.parent() {
			fs::create_dir_all(parent)?;
		}
		let mut out = fs::File::create(&target)?;
		io::copy(&mut entry, &mut out)?;
		summary.files += 1;
	}

	tracing::debug!(
		archive = %archive.display(),
		files = summary.files,
		skipped = summary.skipped,
		"archive extracted"
	);
	Ok(summary)
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::io::Write;
	use tempfile::TempDir;
	use zip::write::SimpleFileOptions;

	fn write_zip(path: &Path, entries: &[(&str, &str)]) {
		let file = fs::File::create(path).unwrap();
		let mut zip = zip::ZipWriter::new(file);
		let options = SimpleFileOptions::default();
		for (name, content) in entries {
			if name.ends_with('/') {
				zip.add_directory(*name, options).unwrap();
			} else {
				zip.start_file(*name, options).unwrap();
				zip.write_all(content.as_bytes()).unwrap();
			}
		}
		zip.finish().unwrap();
	}

	#[rstest]
	#[case("__MACOSX/._index.html", true)]
	#[case("__MACOSX/", true)]
	#[case("build/._index.html", true)]
	#[case("._microapp.json", true)]
	#[case("build/index.html", false)]
	#[case("static/app.min.js", false)]
	fn test_metadata_detection(#[case] name: &str, #[case] expected: bool) {
		assert_eq!(is_metadata_entry(name), expected);
	}

	#[rstest]
	#[tokio::test]
	async fn test_extracts_tree_and_skips_metadata() {
		// Arrange
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("app.zip");
		write_zip(
			&archive,
			&[
				("build/", ""),
				("build/index.html", "<html/>"),
				("build/static/app.js", "console.log(1)"),
				("__MACOSX/build/._index.html", "junk"),
				("build/._app.js", "junk"),
			],
		);
		let dest = dir.path().join("app-extracted");

		// Act
		let summary = extract_archive(&archive, &dest).await.unwrap();

		// Assert
		assert_eq!(summary.files, 2);
		assert_eq!(summary.skipped, 2);
		assert!(dest.join("build/index.html").is_file());
		assert!(dest.join("build/static/app.js").is_file());
		assert!(!dest.join("__MACOSX").exists());
		assert!(!dest.join("build/._app.js").exists());
	}

	#[rstest]
	#[tokio::test]
	async fn test_reextraction_replaces_previous_artifact() {
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("app.zip");
		let dest = dir.path().join("app-extracted");
		fs::create_dir_all(&dest).unwrap();
		fs::write(dest.join("stale.txt"), "old").unwrap();
		write_zip(&archive, &[("index.html", "<html/>")]);

		extract_archive(&archive, &dest).await.unwrap();

		assert!(dest.join("index.html").is_file());
		assert!(!dest.join("stale.txt").exists());
	}

	#[rstest]
	#[tokio::test]
	async fn test_corrupt_archive() {
		let dir = TempDir::new().unwrap();
		let archive = dir.path().join("bad.zip");
		fs::write(&archive, b"definitely not a zip").unwrap();

		let err = extract_archive(&archive, &dir.path().join("out")).await.unwrap_err();

		assert!(matches!(err, PackageError::Extract { .. }));
	}
}
