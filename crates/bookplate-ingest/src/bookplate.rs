//! Bookplate detection
//!
//! A record carries a bookplate when its first 996 field has a non-empty `u`
//! sub-field (the donor/bookplate text). The `z` sub-field of the same field
//! holds the fund description and is optional.

use crate::marc::MarcRecord;
use bookplate_common::{BookplateError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const BOOKPLATE_TAG: &str = "996";
pub const DONOR_CODE: &str = "u";
pub const FUND_CODE: &str = "z";
pub const MMS_ID_TAG: &str = "001";

/// Bookplate metadata extracted from one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookplateData {
    /// Control identifier from field 001; the store key
    pub mms_id: String,

    pub title: String,

    /// 996 $u
    pub donor_info: String,

    /// 996 $z, empty when absent
    pub fund_info: String,

    /// Outcome of the discovery-site check, when one ran
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<String>,
}

/// Inspect a record for bookplate metadata
///
/// Returns `Ok(None)` for records without a non-empty 996 $u. A record that has
/// one but lacks a 001 identifier is an error, since the result could not be
/// stored under a key.
pub fn extract_bookplate(record: &MarcRecord) -> Result<Option<BookplateData>> {
    let Some(field) = record.field(BOOKPLATE_TAG) else {
        return Ok(None);
    };
    let donor_info = match field.subfield(DONOR_CODE) {
        Some(u) if !u.is_empty() => u.to_string(),
        _ => return Ok(None),
    };

    let mms_id = record
        .control_field(MMS_ID_TAG)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            BookplateError::malformed_record(format!(
                "record with bookplate '{}' has no {} identifier",
                donor_info, MMS_ID_TAG
            ))
        })?
        .to_string();

    let bookplate = BookplateData {
        fund_info: field.subfield(FUND_CODE).unwrap_or_default().to_string(),
        title: record.title().unwrap_or_default(),
        mms_id,
        donor_info,
        confirmation: None,
    };

    debug!(mms_id = %bookplate.mms_id, "Bookplate data found");
    Ok(Some(bookplate))
}
