//! SHA-256 content addressing.
//!
//! The image tag of the API handler is the fingerprint of its build
//! context, so any change to a file that ends up in the image yields a new
//! tag and a replaced function.

use std::io::Read;
use std::path::{Path, PathBuf};

use checkerstack_common::error::{Result, StackError};
use checkerstack_common::types::Sha256Hash;
use sha2::{Digest, Sha256};

use crate::exclude::ExcludeSet;

const READ_CHUNK: usize = 64 * 1024;

/// Computes the SHA-256 hash of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<Sha256Hash> {
    tracing::debug!(path = %path.display(), "computing SHA-256 hash");
    let mut hasher = Sha256::new();
    feed_file(&mut hasher, path)?;
    Sha256Hash::from_hex(format!("{:x}", hasher.finalize()))
}

/// Fingerprints a container build context.
///
/// Files are visited in lexicographic order of their relative paths; each
/// contributes its relative path, its size, and its content digest.
/// Symlinks are not followed: a link contributes its target path, as the
/// image build copies the link itself. Paths matched
/// by `excludes` are skipped. The dockerfile name is part of the digest so
/// building the same tree from a different file yields a different tag.
///
/// # Errors
///
/// Returns an error if the directory or the dockerfile is missing, or if
/// any file cannot be read.
pub fn fingerprint_context(
    context_dir: &Path,
    dockerfile: &str,
    excludes: &ExcludeSet,
) -> Result<Sha256Hash> {
    tracing::info!(context = %context_dir.display(), dockerfile, "fingerprinting build context");

    if !context_dir.is_dir() {
        return Err(StackError::NotFound {
            kind: "build context",
            id: context_dir.display().to_string(),
        });
    }
    if !context_dir.join(dockerfile).is_file() {
        return Err(StackError::NotFound {
            kind: "dockerfile",
            id: context_dir.join(dockerfile).display().to_string(),
        });
    }

    let mut files = Vec::new();
    collect_files(context_dir, Path::new(""), excludes, &mut files)?;
    files.sort();

    let mut hasher = Sha256::new();
    hasher.update(b"dockerfile\0");
    hasher.update(dockerfile.as_bytes());
    hasher.update(b"\0");

    for relative in &files {
        let path = context_dir.join(relative);
        let meta = std::fs::symlink_metadata(&path).map_err(|e| StackError::Io {
            path: path.clone(),
            source: e,
        })?;
        hasher.update(normalized(relative).as_bytes());
        hasher.update(b"\0");
        if meta.file_type().is_symlink() {
            let target = std::fs::read_link(&path).map_err(|e| StackError::Io {
                path: path.clone(),
                source: e,
            })?;
            hasher.update(b"symlink\0");
            hasher.update(normalized(&target).as_bytes());
        } else {
            hasher.update(meta.len().to_le_bytes());
            hasher.update(hash_file(&path)?.as_hex().as_bytes());
        }
        hasher.update(b"\0");
    }

    let hash = Sha256Hash::from_hex(format!("{:x}", hasher.finalize()))?;
    tracing::info!(files = files.len(), hash = %hash, "build context fingerprinted");
    Ok(hash)
}

fn collect_files(
    root: &Path,
    relative: &Path,
    excludes: &ExcludeSet,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let dir = root.join(relative);
    let entries = std::fs::read_dir(&dir).map_err(|e| StackError::Io {
        path: dir.clone(),
        source: e,
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| StackError::Io {
            path: dir.clone(),
            source: e,
        })?;
        let child = relative.join(entry.file_name());
        if excludes.is_excluded(&child) {
            tracing::debug!(path = %child.display(), "excluded from build context");
            continue;
        }
        let file_type = entry.file_type().map_err(|e| StackError::Io {
            path: entry.path(),
            source: e,
        })?;
        if file_type.is_dir() {
            collect_files(root, &child, excludes, out)?;
        } else if file_type.is_file() || file_type.is_symlink() {
            out.push(child);
        }
    }
    Ok(())
}

fn feed_file(hasher: &mut Sha256, path: &Path) -> Result<()> {
    let mut file = std::fs::File::open(path).map_err(|e| StackError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        let n = file.read(&mut buf).map_err(|e| StackError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buf[..n]);
    }
}

/// Relative path with `/` separators on every platform.
fn normalized(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
