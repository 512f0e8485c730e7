//! Shared fixtures for bookplate-ingest integration tests
//!
//! Builds catalog-export archives the way the ILS delivers them: a gzip'd tar
//! holding one MARC-XML file named after the archive.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::{Path, PathBuf};

/// One record in a generated export
pub struct TestRecord {
    pub mms_id: Option<String>,
    pub title: String,
    pub donor: Option<String>,
    pub fund: Option<String>,
}

impl TestRecord {
    /// A record with a 996 $u bookplate and a 996 $z fund
    pub fn with_bookplate(mms_id: &str, donor: &str, fund: &str) -> Self {
        Self {
            mms_id: Some(mms_id.to_string()),
            title: format!("Title of {}", mms_id),
            donor: Some(donor.to_string()),
            fund: Some(fund.to_string()),
        }
    }

    /// A record without any 996 field
    pub fn plain(mms_id: &str) -> Self {
        Self {
            mms_id: Some(mms_id.to_string()),
            title: format!("Title of {}", mms_id),
            donor: None,
            fund: None,
        }
    }

    /// A bookplate record missing its 001 identifier
    pub fn without_id(donor: &str) -> Self {
        Self {
            mms_id: None,
            title: "Untitled".to_string(),
            donor: Some(donor.to_string()),
            fund: None,
        }
    }

    fn to_xml(&self) -> String {
        let mut xml = String::from("  <record>\n    <leader>00000nam a2200000 i 4500</leader>\n");
        if let Some(id) = &self.mms_id {
            xml.push_str(&format!("    <controlfield tag=\"001\">{}</controlfield>\n", id));
        }
        xml.push_str(&format!(
            "    <datafield tag=\"245\" ind1=\"1\" ind2=\"0\">\n      <subfield code=\"a\">{}</subfield>\n    </datafield>\n",
            self.title
        ));
        if self.donor.is_some() || self.fund.is_some() {
            xml.push_str("    <datafield tag=\"996\" ind1=\" \" ind2=\" \">\n");
            if let Some(donor) = &self.donor {
                xml.push_str(&format!("      <subfield code=\"u\">{}</subfield>\n", donor));
            }
            if let Some(fund) = &self.fund {
                xml.push_str(&format!("      <subfield code=\"z\">{}</subfield>\n", fund));
            }
            xml.push_str("    </datafield>\n");
        }
        xml.push_str("  </record>\n");
        xml
    }
}

/// Render records as a MARC-XML collection
pub fn marc_collection(records: &[TestRecord]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<collection xmlns=\"http://www.loc.gov/MARC21/slim\">\n",
    );
    for record in records {
        xml.push_str(&record.to_xml());
    }
    xml.push_str("</collection>\n");
    xml
}

/// Write `{dir}/{name}` as a tar.gz holding `{name minus .tar.gz}.xml`
pub fn write_export(dir: &Path, name: &str, records: &[TestRecord]) -> PathBuf {
    let inner_name = format!("{}.xml", name.trim_end_matches(".tar.gz"));
    write_archive(dir, name, &inner_name, marc_collection(records).as_bytes())
}

/// Write a tar.gz with a single entry of arbitrary content
pub fn write_archive(dir: &Path, name: &str, entry_name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    let encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut header = tar::Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, entry_name, content).unwrap();

    builder.into_inner().unwrap().finish().unwrap();
    path
}

/// Source, output, and store directories for one run
pub struct TestDirs {
    pub root: tempfile::TempDir,
    pub source: PathBuf,
    pub output: PathBuf,
    pub store: PathBuf,
}

impl TestDirs {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let source = root.path().join("source");
        let output = root.path().join("output");
        let store = root.path().join("bookplates");
        std::fs::create_dir_all(&source).unwrap();
        Self {
            root,
            source,
            output,
            store,
        }
    }

    pub fn tracker_path(&self) -> PathBuf {
        self.output.join("tracker.json")
    }

    /// Files left in the output directory, excluding the tracker
    pub fn leftover_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.output) else {
            return Vec::new();
        };
        entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.file_name().and_then(|n| n.to_str()) != Some("tracker.json"))
            .collect()
    }
}
