//! Bookplate JSON store
//!
//! One file per bibliographic record, `{dir}/{mms_id}.json`. The first save
//! writes a single object; later saves for the same id turn the file into a
//! list and append, so repeated sightings across exports accumulate.

use crate::bookplate::BookplateData;
use bookplate_common::{BookplateError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk shape of a bookplate file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StoredBookplates {
    Single(BookplateData),
    Many(Vec<BookplateData>),
}

impl StoredBookplates {
    /// Append a bookplate, promoting a single entry to a list
    pub fn push(self, bookplate: BookplateData) -> Self {
        let mut entries = self.into_vec();
        entries.push(bookplate);
        StoredBookplates::Many(entries)
    }

    pub fn into_vec(self) -> Vec<BookplateData> {
        match self {
            StoredBookplates::Single(one) => vec![one],
            StoredBookplates::Many(many) => many,
        }
    }
}

/// Result of a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No file existed; a single object was written
    Created,
    /// Merged into an existing file, which now holds `entries` bookplates
    Merged { entries: usize },
}

/// File-per-record store rooted at a directory
#[derive(Debug, Clone)]
pub struct BookplateStore {
    dir: PathBuf,
}

impl BookplateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `mms_id`
    pub fn path_for(&self, mms_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", mms_id))
    }

    /// Read what is stored for `mms_id`
    pub fn load(&self, mms_id: &str) -> Result<Option<Vec<BookplateData>>> {
        let path = self.path_for(mms_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(read_stored(&path)?.into_vec()))
    }

    /// Persist a bookplate, merging with anything already stored for its id
    ///
    /// The file is replaced atomically; on error the previous contents are
    /// left as they were.
    pub fn save(&self, bookplate: &BookplateData) -> Result<SaveOutcome> {
        if bookplate.mms_id.is_empty() || bookplate.mms_id.contains(['/', '\\']) {
            return Err(BookplateError::malformed_record(format!(
                "cannot store bookplate under mms_id '{}'",
                bookplate.mms_id
            )));
        }

        let path = self.path_for(&bookplate.mms_id);

        let (stored, outcome) = if path.exists() {
            warn!(mms_id = %bookplate.mms_id, "Existing bookplate data found; merging");
            let merged = read_stored(&path)?.push(bookplate.clone());
            let entries = match &merged {
                StoredBookplates::Many(many) => many.len(),
                StoredBookplates::Single(_) => 1,
            };
            (merged, SaveOutcome::Merged { entries })
        } else {
            debug!(mms_id = %bookplate.mms_id, "New bookplate data");
            (StoredBookplates::Single(bookplate.clone()), SaveOutcome::Created)
        };

        write_atomic(&path, &stored)?;
        Ok(outcome)
    }
}

fn read_stored(path: &Path) -> Result<StoredBookplates> {
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        BookplateError::corrupt_store(
            path,
            format!("expected a bookplate object or a list of them: {}", e),
        )
    })
}

/// Write sorted-key, two-space-indented JSON via a temp file and rename
fn write_atomic(path: &Path, stored: &StoredBookplates) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // serde_json::Value objects are BTreeMap-backed, so keys come out sorted.
    let value = serde_json::to_value(stored)?;
    let json = serde_json::to_string_pretty(&value)?;

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    std::fs::write(&temp_path, json)?;
    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(e.into());
    }
    Ok(())
}
