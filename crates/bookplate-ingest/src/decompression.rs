//! Archive extraction for catalog exports
//!
//! Each export is a gzip-compressed tar holding one MARC-XML file named after
//! the archive (`Full_set_bibs_new_147.tar.gz` holds `Full_set_bibs_new_147.xml`).
//!
//! # Examples
//!
//! ```rust,ignore
//! use bookplate_ingest::decompression::extract_archive;
//!
//! let extracted = extract_archive(&archive, &output_dir)?;
//! let records = read_marc_file(extracted.path())?;
//! extracted.remove()?;
//! ```

use bookplate_common::{BookplateError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Extension of the decompressed record file
pub const OUTPUT_EXTENSION: &str = "xml";

/// Permission bits of the decompressed record file (`rw-rw-r--`)
pub const OUTPUT_MODE: u32 = 0o664;

/// Derive the record file name from an archive file name
///
/// Strips the outer compression extension and the inner container extension,
/// then appends `.xml`. Returns `None` when nothing is left.
pub fn derive_output_name(archive_name: &str) -> Option<String> {
    let without_gz = Path::new(archive_name).file_stem()?;
    let base = Path::new(without_gz).file_stem()?.to_str()?;
    if base.is_empty() {
        return None;
    }
    Some(format!("{}.{}", base, OUTPUT_EXTENSION))
}

/// A decompressed record file that is deleted when released
///
/// Dropping the guard removes the file; call [`ExtractedFile::remove`] to
/// observe deletion errors instead.
#[derive(Debug)]
pub struct ExtractedFile {
    path: PathBuf,
    removed: bool,
}

impl ExtractedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now
    pub fn remove(mut self) -> std::io::Result<()> {
        self.removed = true;
        std::fs::remove_file(&self.path)?;
        debug!(path = %self.path.display(), "Deleted decompressed file");
        Ok(())
    }
}

impl Drop for ExtractedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "Failed to delete decompressed file");
            }
        }
    }
}

/// Prefix of the per-archive staging directories inside `output_dir`
const STAGING_PREFIX: &str = ".extract-";

/// Decompress a `.tar.gz` archive into `output_dir`
///
/// Entries are unpacked into a private staging directory first. Only the
/// record file derived from the archive name is moved into `output_dir` and
/// given mode [`OUTPUT_MODE`]; the staging directory and anything else the
/// archive held are deleted on every path out of this function.
pub fn extract_archive(archive: &Path, output_dir: &Path) -> Result<ExtractedFile> {
    let archive_name = archive
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| BookplateError::extraction(archive, "archive path has no usable file name"))?;
    let output_name = derive_output_name(archive_name).ok_or_else(|| {
        BookplateError::extraction(archive, "cannot derive a record file name from the archive name")
    })?;

    debug!(
        archive = %archive.display(),
        output_dir = %output_dir.display(),
        "Decompressing archive"
    );

    std::fs::create_dir_all(output_dir).map_err(|e| {
        BookplateError::extraction(archive, format!("cannot create output directory: {}", e))
    })?;

    // A record file left by an interrupted run must never stand in for this archive's.
    let output_path = output_dir.join(&output_name);
    match std::fs::remove_file(&output_path) {
        Ok(()) => warn!(path = %output_path.display(), "Removed stale decompressed file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
        Err(e) => {
            return Err(BookplateError::extraction(
                archive,
                format!("cannot remove stale '{}': {}", output_name, e),
            ))
        },
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(output_dir)
        .map_err(|e| {
            BookplateError::extraction(archive, format!("cannot create staging directory: {}", e))
        })?;

    let file = File::open(archive)
        .map_err(|e| BookplateError::extraction(archive, format!("cannot open archive: {}", e)))?;
    let mut tar = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    tar.unpack(staging.path())
        .map_err(|e| BookplateError::extraction(archive, format!("cannot unpack archive: {}", e)))?;

    let staged_path = staging.path().join(&output_name);
    if !staged_path.is_file() {
        return Err(BookplateError::extraction(
            archive,
            format!("expected '{}' in archive, but it was not extracted", output_name),
        ));
    }

    std::fs::rename(&staged_path, &output_path).map_err(|e| {
        BookplateError::extraction(archive, format!("cannot move '{}' into place: {}", output_name, e))
    })?;

    // From here on the guard owns the file, so a failed chmod still cleans up.
    let extracted = ExtractedFile {
        path: output_path,
        removed: false,
    };
    set_output_permissions(extracted.path()).map_err(|e| {
        BookplateError::extraction(archive, format!("cannot set permissions: {}", e))
    })?;

    if let Err(e) = staging.close() {
        warn!(archive = %archive.display(), error = %e, "Failed to delete staging directory");
    }

    debug!(path = %extracted.path().display(), "Extracted record file");
    Ok(extracted)
}

#[cfg(unix)]
fn set_output_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(OUTPUT_MODE))
}

#[cfg(not(unix))]
fn set_output_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
