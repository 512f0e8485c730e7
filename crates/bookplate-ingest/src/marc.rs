//! MARC-XML record reader
//!
//! Deserializes a MARCXML `<collection>` into [`MarcRecord`]s with quick-xml's
//! serde support. Only the parts the bookplate pipeline reads are modelled:
//! the leader, control fields, and data fields with their sub-fields.
//!
//! # Format
//! ```xml
//! <collection xmlns="http://www.loc.gov/MARC21/slim">
//!   <record>
//!     <leader>01234nam a2200301 i 4500</leader>
//!     <controlfield tag="001">991003874639706966</controlfield>
//!     <datafield tag="245" ind1="1" ind2="0">
//!       <subfield code="a">A title :</subfield>
//!       <subfield code="b">a subtitle</subfield>
//!     </datafield>
//!   </record>
//! </collection>
//! ```

use bookplate_common::{BookplateError, Result};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Root element of a MARC-XML export
#[derive(Debug, Deserialize)]
struct Collection {
    #[serde(rename = "record", default)]
    records: Vec<MarcRecord>,
}

/// One bibliographic record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarcRecord {
    #[serde(default)]
    pub leader: Option<String>,

    #[serde(rename = "controlfield", default)]
    pub control_fields: Vec<ControlField>,

    #[serde(rename = "datafield", default)]
    pub data_fields: Vec<DataField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControlField {
    #[serde(rename = "@tag")]
    pub tag: String,

    #[serde(rename = "$text", default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataField {
    #[serde(rename = "@tag")]
    pub tag: String,

    #[serde(rename = "@ind1", default)]
    pub ind1: String,

    #[serde(rename = "@ind2", default)]
    pub ind2: String,

    #[serde(rename = "subfield", default)]
    pub subfields: Vec<SubField>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubField {
    #[serde(rename = "@code")]
    pub code: String,

    #[serde(rename = "$text", default)]
    pub value: String,
}

impl MarcRecord {
    /// Value of the first control field with `tag`
    pub fn control_field(&self, tag: &str) -> Option<&str> {
        self.control_fields
            .iter()
            .find(|f| f.tag == tag)
            .map(|f| f.value.as_str())
    }

    /// All data fields with `tag`, in record order
    pub fn fields<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a DataField> + 'a {
        self.data_fields.iter().filter(move |f| f.tag == tag)
    }

    /// First data field with `tag`
    pub fn field(&self, tag: &str) -> Option<&DataField> {
        self.data_fields.iter().find(|f| f.tag == tag)
    }

    /// Title statement: 245 $a, followed by 245 $b when present
    pub fn title(&self) -> Option<String> {
        let field = self.field("245")?;
        let main = field.subfield("a")?.trim();
        let title = match field.subfield("b").map(str::trim) {
            Some(rest) if !rest.is_empty() => format!("{} {}", main, rest),
            _ => main.to_string(),
        };
        Some(title)
    }
}

impl DataField {
    /// Value of the first sub-field with `code`
    pub fn subfield(&self, code: &str) -> Option<&str> {
        self.subfields
            .iter()
            .find(|s| s.code == code)
            .map(|s| s.value.as_str())
    }

    /// Values of all sub-fields with `code`
    pub fn subfields<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.subfields
            .iter()
            .filter(move |s| s.code == code)
            .map(|s| s.value.as_str())
    }
}

/// Parse MARC-XML content held in memory
pub fn parse_marc_xml(content: &str) -> Result<Vec<MarcRecord>> {
    let collection: Collection = quick_xml::de::from_str(content)
        .map_err(|e| BookplateError::parse("<memory>", e.to_string()))?;
    Ok(collection.records)
}

/// Read every record from a MARC-XML file, preserving file order
pub fn read_marc_file(path: &Path) -> Result<Vec<MarcRecord>> {
    debug!(path = %path.display(), "Reading MARC-XML file");

    let file = File::open(path)
        .map_err(|e| BookplateError::parse(path, format!("cannot open file: {}", e)))?;
    let collection: Collection = quick_xml::de::from_reader(BufReader::new(file))
        .map_err(|e| BookplateError::parse(path, e.to_string()))?;

    debug!(
        path = %path.display(),
        records = collection.records.len(),
        "Parsed MARC-XML file"
    );
    Ok(collection.records)
}
