//! Archive discovery and sequencing
//!
//! Export files carry an unpadded sequence number (`Full_set_bibs_new_9.tar.gz`,
//! `Full_set_bibs_new_10.tar.gz`), so a lexical sort puts 10 before 9. Archives
//! are ordered by the rightmost digit run of their file stem instead.

use bookplate_common::{BookplateError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

fn digit_runs() -> Option<&'static Regex> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()
}

/// Sequence number embedded in an archive path
///
/// Uses the last digit run of `Path::file_stem` (for `a_2023_7.tar.gz` the
/// stem is `a_2023_7.tar` and the key is 7). No digits gives 0; a run too
/// large for `u64` saturates.
pub fn sequence_key(path: &Path) -> u64 {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();

    digit_runs()
        .and_then(|digits| digits.find_iter(&stem).last())
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Order archive paths by ascending sequence key
///
/// The sort is stable, so paths sharing a key keep their input order.
pub fn sequence_archives(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    paths.sort_by_key(|p| sequence_key(p));
    if let (Some(first), Some(last)) = (paths.first(), paths.last()) {
        debug!(
            count = paths.len(),
            first = %first.display(),
            last = %last.display(),
            "Sequenced archives"
        );
    }
    paths
}

/// Compile a shell-style file-name pattern (`*`, `?`, literals)
fn glob_regex(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut [0u8; 4]))),
        }
    }
    re.push('$');

    Regex::new(&re)
        .map_err(|e| BookplateError::config(format!("Invalid archive pattern '{}': {}", pattern, e)))
}

/// List the files directly inside `dir` whose name matches `pattern`
///
/// The result is in directory order; pass it through [`sequence_archives`].
pub fn discover_archives(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = glob_regex(pattern)?;
    let discovery_err = |source| BookplateError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(discovery_err)? {
        let entry = entry.map_err(discovery_err)?;
        if !entry.file_type().map_err(discovery_err)?.is_file() {
            continue;
        }

        let name = entry.file_name();
        if matcher.is_match(&name.to_string_lossy()) {
            archives.push(entry.path());
        }
    }

    debug!(
        dir = %dir.display(),
        pattern,
        found = archives.len(),
        "Discovered archives"
    );

    Ok(archives)
}
