//! In-memory source bundles for extraction and pipeline tests.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{Builder, EntryType, Header};

/// Builds an uncompressed tar from `(path, contents)` pairs.
#[allow(clippy::unwrap_used)]
pub fn tar_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, contents) in files {
        let mut header = Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder
            .append_data(&mut header, path, contents.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap()
}

/// Like [`tar_bytes`] but appends one more entry whose stored name is
/// written verbatim, bypassing the builder's path validation.
#[allow(clippy::unwrap_used)]
pub fn tar_with_raw_path(files: &[(&str, &str)], raw_path: &str, contents: &str) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    for (path, body) in files {
        let mut header = Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder.append_data(&mut header, path, body.as_bytes()).unwrap();
    }

    let mut header = Header::new_gnu();
    let name = raw_path.as_bytes();
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_entry_type(EntryType::Regular);
    header.set_cksum();
    builder.append(&header, contents.as_bytes()).unwrap();
    builder.into_inner().unwrap()
}

/// Tar holding a link entry `link -> target` of `kind`, followed by
/// `files_after` as regular files.
#[allow(clippy::unwrap_used)]
pub fn tar_with_link(
    kind: EntryType,
    link: &str,
    target: &str,
    files_after: &[(&str, &str)],
) -> Vec<u8> {
    let mut builder = Builder::new(Vec::new());
    let mut header = Header::new_gnu();
    header.set_entry_type(kind);
    header.set_size(0);
    header.set_mode(0o777);
    header.set_link_name(target).unwrap();
    builder
        .append_data(&mut header, link, std::io::empty())
        .unwrap();

    for (path, body) in files_after {
        let mut header = Header::new_gnu();
        header.set_size(body.len() as u64);
        header.set_mode(0o644);
        header.set_entry_type(EntryType::Regular);
        builder.append_data(&mut header, path, body.as_bytes()).unwrap();
    }
    builder.into_inner().unwrap()
}

/// Symbolic-link flavor of [`tar_with_link`].
pub fn tar_with_symlink(link: &str, target: &str, files_after: &[(&str, &str)]) -> Vec<u8> {
    tar_with_link(EntryType::Symlink, link, target, files_after)
}

/// Gzip-compresses `bytes`.
#[allow(clippy::unwrap_used)]
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

/// Writes a `.tar.gz` of `files` into `dir` and returns its path.
#[allow(clippy::unwrap_used)]
pub fn write_tar_gz(dir: &Path, files: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("source.tar.gz");
    std::fs::write(&path, gzip(&tar_bytes(files))).unwrap();
    path
}
