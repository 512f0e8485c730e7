//! Discovery-site confirmation hook
//!
//! Checking that the public discovery page actually renders a bookplate is
//! slow and flaky, so the pipeline only talks to it through [`Confirmer`] and
//! never lets a failed check escape.

use crate::bookplate::BookplateData;
use bookplate_common::Result;
use tracing::{debug, warn};

/// Result of one discovery-site check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationResult {
    pub found: bool,
    pub detail: String,
}

/// Checks whether the discovery page for a record shows its bookplate
pub trait Confirmer {
    fn confirm(&self, mms_id: &str) -> Result<ConfirmationResult>;
}

/// Run the check for one bookplate and record the outcome on it
///
/// Errors are logged and written into `confirmation` as text. Returns whether
/// the bookplate was found.
pub fn check_bookplate(confirmer: &dyn Confirmer, bookplate: &mut BookplateData) -> bool {
    match confirmer.confirm(&bookplate.mms_id) {
        Ok(result) => {
            debug!(mms_id = %bookplate.mms_id, found = result.found, "Discovery check finished");
            let status = if result.found { "bookplate found" } else { "bookplate not found" };
            bookplate.confirmation = Some(format!("{}: {}", status, result.detail));
            result.found
        },
        Err(e) => {
            warn!(mms_id = %bookplate.mms_id, error = %e, "Discovery check failed");
            bookplate.confirmation = Some(format!("problem with discovery check: {}", e));
            false
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use bookplate_common::BookplateError;

    struct Fixed(Option<bool>);

    impl Confirmer for Fixed {
        fn confirm(&self, mms_id: &str) -> Result<ConfirmationResult> {
            match self.0 {
                Some(found) => Ok(ConfirmationResult {
                    found,
                    detail: format!("page for {}", mms_id),
                }),
                None => Err(BookplateError::confirmation("timed out waiting for page")),
            }
        }
    }

    fn bookplate() -> BookplateData {
        BookplateData {
            mms_id: "991003874639706966".to_string(),
            title: "T".to_string(),
            donor_info: "Purchased with the Fund".to_string(),
            fund_info: String::new(),
            confirmation: None,
        }
    }

    #[test]
    fn test_found() {
        let mut b = bookplate();
        assert!(check_bookplate(&Fixed(Some(true)), &mut b));
        assert_eq!(
            b.confirmation.as_deref(),
            Some("bookplate found: page for 991003874639706966")
        );
    }

    #[test]
    fn test_not_found() {
        let mut b = bookplate();
        assert!(!check_bookplate(&Fixed(Some(false)), &mut b));
        assert!(b.confirmation.unwrap().starts_with("bookplate not found"));
    }

    #[test]
    fn test_failure_is_absorbed() {
        let mut b = bookplate();
        assert!(!check_bookplate(&Fixed(None), &mut b));
        let text = b.confirmation.unwrap();
        assert!(text.starts_with("problem with discovery check"));
        assert!(text.contains("timed out"));
    }
}
