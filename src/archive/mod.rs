//! Source-bundle extraction.
//!
//! Unpacks a (gzipped) tar into a destination directory, preserving relative
//! paths. Entries are first written into a staging directory inside the
//! destination and promoted only after the whole archive unpacked cleanly,
//! so a failed extraction leaves no partial tree behind.
//!
//! Entries whose path is absolute or climbs out through `..` fail the
//! extraction with [`ExtractError::UnsafeEntry`]. Symlinks, hard links and
//! special files are skipped.

mod error;

pub use error::ExtractError;

use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

/// First two bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extensions removed by [`strip_image_files`].
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "gif", "bmp", "svg"];

/// Counts from one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionSummary {
    /// Regular files written.
    pub files: usize,
    /// Directory entries created.
    pub directories: usize,
    /// Entries skipped (links, devices, empty names).
    pub skipped: usize,
}

/// Unpacks the archive at `archive_path` into `dest`.
///
/// `dest` is created if missing. Existing top-level paths in `dest` that
/// collide with archive contents are replaced.
///
/// # Errors
///
/// - [`ExtractError::Unreadable`] if the archive cannot be opened
/// - [`ExtractError::Corrupt`] if the stream is not a valid tar
/// - [`ExtractError::UnsafeEntry`] if an entry escapes `dest`
/// - [`ExtractError::Io`] if writing the tree fails
#[instrument(fields(archive = %archive_path.display(), dest = %dest.display()))]
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<ExtractionSummary, ExtractError> {
    let file = fs::File::open(archive_path).map_err(|e| ExtractError::unreadable(archive_path, e))?;
    let mut reader = BufReader::new(file);
    let is_gzip = reader
        .fill_buf()
        .map_err(|e| ExtractError::unreadable(archive_path, e))?
        .starts_with(&GZIP_MAGIC);
    debug!(is_gzip, "detected archive encoding");

    let stream: Box<dyn Read> = if is_gzip {
        Box::new(GzDecoder::new(reader))
    } else {
        Box::new(reader)
    };

    fs::create_dir_all(dest).map_err(|e| ExtractError::io(dest, e))?;
    let staging = tempfile::Builder::new()
        .prefix(".extract-")
        .tempdir_in(dest)
        .map_err(|e| ExtractError::io(dest, e))?;

    // On any error `staging` drops here and takes the partial tree with it.
    let summary = unpack_into(archive_path, stream, staging.path())?;
    promote(staging.path(), dest)?;

    info!(
        files = summary.files,
        directories = summary.directories,
        skipped = summary.skipped,
        "archive extracted"
    );
    Ok(summary)
}

fn unpack_into(
    archive_path: &Path,
    stream: Box<dyn Read>,
    staging: &Path,
) -> Result<ExtractionSummary, ExtractError> {
    let mut archive = Archive::new(stream);
    let mut summary = ExtractionSummary::default();

    let entries = archive
        .entries()
        .map_err(|e| ExtractError::corrupt(archive_path, e))?;
    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::corrupt(archive_path, e))?;
        let raw_path = entry
            .path()
            .map_err(|e| ExtractError::corrupt(archive_path, e))?
            .into_owned();

        let relative = contained_path(&raw_path)?;
        if relative.as_os_str().is_empty() {
            summary.skipped += 1;
            continue;
        }
        let target = staging.join(&relative);

        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() {
            fs::create_dir_all(&target).map_err(|e| ExtractError::io(&target, e))?;
            summary.directories += 1;
        } else if entry_type.is_file() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| ExtractError::io(parent, e))?;
            }
            entry
                .unpack(&target)
                .map_err(|e| ExtractError::io(&target, e))?;
            summary.files += 1;
        } else {
            debug!(entry = %raw_path.display(), ?entry_type, "skipping non-regular entry");
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

/// Rejects absolute and parent-climbing entry paths; drops `.` segments.
fn contained_path(raw: &Path) -> Result<PathBuf, ExtractError> {
    let mut relative = PathBuf::new();
    for component in raw.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                warn!(entry = %raw.display(), "rejecting archive entry outside destination");
                return Err(ExtractError::unsafe_entry(raw));
            }
        }
    }
    Ok(relative)
}

/// Moves every top-level child of `staging` into `dest`.
fn promote(staging: &Path, dest: &Path) -> Result<(), ExtractError> {
    let children = fs::read_dir(staging).map_err(|e| ExtractError::io(staging, e))?;
    for child in children {
        let child = child.map_err(|e| ExtractError::io(staging, e))?;
        let target = dest.join(child.file_name());
        if let Ok(meta) = fs::symlink_metadata(&target) {
            let removed = if meta.is_dir() {
                fs::remove_dir_all(&target)
            } else {
                fs::remove_file(&target)
            };
            removed.map_err(|e| ExtractError::io(&target, e))?;
        }
        fs::rename(child.path(), &target).map_err(|e| ExtractError::io(&target, e))?;
    }
    Ok(())
}

/// Removes image files (by extension, case-insensitive) under `root`.
///
/// Returns the number of files removed. Files that cannot be removed are
/// logged and skipped.
#[instrument(fields(root = %root.display()))]
pub fn strip_image_files(root: &Path) -> usize {
    let mut removed = 0;
    for entry in WalkDir::new(root).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }
        match fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(error) => {
                warn!(path = %entry.path().display(), error = %error, "failed to remove image file");
            }
        }
    }
    debug!(removed, "image files stripped");
    removed
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|image| ext.eq_ignore_ascii_case(image))
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use tar::EntryType;

    use crate::test_support::archive::{
        gzip, tar_bytes, tar_with_link, tar_with_raw_path, tar_with_symlink, write_tar_gz,
    };

    #[test]
    fn test_extract_preserves_relative_paths() {
        let temp = TempDir::new().unwrap();
        let archive = write_tar_gz(
            temp.path(),
            &[
                ("main.tex", "\\input{sections/intro}"),
                ("sections/intro.tex", "Hello"),
            ],
        );
        let dest = temp.path().join("out");

        let summary = extract_archive(&archive, &dest).unwrap();

        assert_eq!(summary.files, 2);
        assert_eq!(
            fs::read_to_string(dest.join("main.tex")).unwrap(),
            "\\input{sections/intro}"
        );
        assert_eq!(
            fs::read_to_string(dest.join("sections/intro.tex")).unwrap(),
            "Hello"
        );
    }

    #[test]
    fn test_extract_leaves_no_staging_directory() {
        let temp = TempDir::new().unwrap();
        let archive = write_tar_gz(temp.path(), &[("main.tex", "x")]);
        let dest = temp.path().join("out");

        extract_archive(&archive, &dest).unwrap();

        let names: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["main.tex".to_string()]);
    }

    #[test]
    fn test_extract_accepts_uncompressed_tar() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("plain.tar");
        fs::write(&archive, tar_bytes(&[("paper.tex", "plain")])).unwrap();
        let dest = temp.path().join("out");

        extract_archive(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("paper.tex")).unwrap(), "plain");
    }

    #[test]
    fn test_extract_rejects_parent_traversal_and_discards_partial_tree() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("evil.tar.gz");
        fs::write(
            &archive,
            gzip(&tar_with_raw_path(&[("ok.tex", "fine")], "../escaped.tex", "evil")),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let result = extract_archive(&archive, &dest);

        assert!(matches!(result, Err(ExtractError::UnsafeEntry { .. })));
        assert!(!temp.path().join("escaped.tex").exists());
        assert_eq!(fs::read_dir(&dest).unwrap().count(), 0, "partial tree kept");
    }

    #[test]
    fn test_extract_rejects_absolute_entry() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("abs.tar");
        fs::write(&archive, tar_with_raw_path(&[], "/tmp/absolute.tex", "x")).unwrap();

        let result = extract_archive(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ExtractError::UnsafeEntry { .. })));
    }

    #[test]
    fn test_extract_skips_symlink_and_never_writes_through_it() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let archive = temp.path().join("link.tar.gz");
        let target = outside.path().to_str().unwrap();
        fs::write(
            &archive,
            gzip(&tar_with_symlink(
                "link",
                target,
                &[("link/evil.tex", "evil"), ("main.tex", "ok")],
            )),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let summary = extract_archive(&archive, &dest).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.files, 2);
        assert!(!outside.path().join("evil.tex").exists());
        let meta = fs::symlink_metadata(dest.join("link")).unwrap();
        assert!(!meta.file_type().is_symlink());
        assert!(meta.is_dir());
        assert_eq!(fs::read_to_string(dest.join("link/evil.tex")).unwrap(), "evil");
    }

    #[test]
    fn test_extract_skips_hard_link_entry() {
        let temp = TempDir::new().unwrap();
        let secret = temp.path().join("secret.txt");
        fs::write(&secret, "secret").unwrap();
        let archive = temp.path().join("hard.tar");
        fs::write(
            &archive,
            tar_with_link(
                EntryType::Link,
                "copy.tex",
                secret.to_str().unwrap(),
                &[("main.tex", "ok")],
            ),
        )
        .unwrap();
        let dest = temp.path().join("out");

        let summary = extract_archive(&archive, &dest).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.files, 1);
        assert!(!dest.join("copy.tex").exists());
        assert_eq!(fs::read_to_string(&secret).unwrap(), "secret");
    }

    #[test]
    fn test_extract_corrupt_archive_is_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bad.tar.gz");
        fs::write(&archive, b"this is not an archive at all").unwrap();

        let result = extract_archive(&archive, &temp.path().join("out"));
        assert!(matches!(result, Err(ExtractError::Corrupt { .. })));
    }

    #[test]
    fn test_extract_gzip_of_non_tar_is_error() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("bad.tar.gz");
        fs::write(&archive, gzip(b"\\documentclass{article}")).unwrap();

        assert!(extract_archive(&archive, &temp.path().join("out")).is_err());
    }

    #[test]
    fn test_extract_missing_archive_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let result = extract_archive(&temp.path().join("missing.tar.gz"), temp.path());
        assert!(matches!(result, Err(ExtractError::Unreadable { .. })));
    }

    #[test]
    fn test_extract_replaces_existing_paths_in_dest() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("main.tex"), "stale").unwrap();
        let archive = write_tar_gz(temp.path(), &[("main.tex", "fresh")]);

        extract_archive(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("main.tex")).unwrap(), "fresh");
    }

    #[test]
    fn test_strip_image_files_removes_only_images() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("figs")).unwrap();
        fs::write(temp.path().join("main.tex"), "x").unwrap();
        fs::write(temp.path().join("figs/plot.PNG"), "x").unwrap();
        fs::write(temp.path().join("figs/diagram.pdf"), "x").unwrap();
        fs::write(temp.path().join("figs/data.csv"), "x").unwrap();

        assert_eq!(strip_image_files(temp.path()), 2);
        assert!(temp.path().join("main.tex").exists());
        assert!(temp.path().join("figs/data.csv").exists());
        assert!(!temp.path().join("figs/plot.PNG").exists());
    }
}
