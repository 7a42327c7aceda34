use crate::creatives::{CreativeRow, COLUMN_TARGET_ZIP_CODE};
use crate::error::RowError;
use crate::models::{GeoTargeting, PostalCode, TargetingCriteria};

const POSTAL_CODE_KIND: &str = "dfareporting#postalCode";
const MAX_ZIP_CODE: u32 = 99_999;

/// Derives the targeting of an ad from its CSV row.
///
/// Swapping the strategy changes which targeting dimensions the created ads
/// carry without touching how videos, creatives and ads are created.
pub trait TargetingStrategy: Send + Sync {
    /// Columns the input CSV must have for this strategy to work.
    fn required_columns(&self) -> &[&'static str];

    fn derive(&self, row: &CreativeRow) -> Result<TargetingCriteria, RowError>;
}

/// Targets each ad to the five-digit postal code in the row's `ZIP` column.
#[derive(Debug, Clone)]
pub struct ZipCodeTargeting {
    country_code: String,
    country_dart_id: String,
}

impl ZipCodeTargeting {
    pub fn new(country_code: &str, country_dart_id: &str) -> Self {
        ZipCodeTargeting {
            country_code: country_code.to_string(),
            country_dart_id: country_dart_id.to_string(),
        }
    }
}

impl TargetingStrategy for ZipCodeTargeting {
    fn required_columns(&self) -> &[&'static str] {
        &[COLUMN_TARGET_ZIP_CODE]
    }

    fn derive(&self, row: &CreativeRow) -> Result<TargetingCriteria, RowError> {
        let raw = row.require(COLUMN_TARGET_ZIP_CODE)?;
        let zip_code = format_zip_code(raw).ok_or_else(|| {
            RowError::InvalidRow(format!(
                "invalid '{}' '{}': expected up to five digits",
                COLUMN_TARGET_ZIP_CODE, raw
            ))
        })?;

        Ok(TargetingCriteria {
            geo_targeting: Some(GeoTargeting {
                postal_codes: vec![PostalCode {
                    kind: POSTAL_CODE_KIND.to_string(),
                    id: zip_code.clone(),
                    code: zip_code,
                    country_code: self.country_code.clone(),
                    country_dart_id: self.country_dart_id.clone(),
                }],
            }),
        })
    }
}

// Spreadsheets drop leading zeros, so "2134" is read as "02134".
fn format_zip_code(raw: &str) -> Option<String> {
    match raw.parse::<u32>() {
        Ok(zip) if zip <= MAX_ZIP_CODE => Some(format!("{:05}", zip)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creatives::tests::{table, HEADER};

    #[test]
    fn test_format_zip_code() {
        assert_eq!(format_zip_code("2134"), Some("02134".to_string()));
        assert_eq!(format_zip_code("90210"), Some("90210".to_string()));
        assert_eq!(format_zip_code("0"), Some("00000".to_string()));
        assert_eq!(format_zip_code("100000"), None);
        assert_eq!(format_zip_code("-1"), None);
        assert_eq!(format_zip_code("02134-1234"), None);
    }

    #[test]
    fn test_derive_postal_code() {
        let table = table(&format!("{}\nclip.mp4,,Clip,2134,https://x.example\n", HEADER));
        let targeting = ZipCodeTargeting::new("US", "256");

        let criteria = targeting.derive(&table.rows[0]).unwrap();
        let postal_code = &criteria.geo_targeting.unwrap().postal_codes[0];

        assert_eq!(postal_code.code, "02134");
        assert_eq!(postal_code.id, "02134");
        assert_eq!(postal_code.kind, "dfareporting#postalCode");
        assert_eq!(postal_code.country_code, "US");
        assert_eq!(postal_code.country_dart_id, "256");
    }

    #[test]
    fn test_derive_rejects_bad_zip() {
        let table = table(&format!(
            "{}\nclip.mp4,,Clip,abc,https://x.example\nclip.mp4,,Clip,,https://x.example\n",
            HEADER
        ));
        let targeting = ZipCodeTargeting::new("US", "256");

        assert!(matches!(
            targeting.derive(&table.rows[0]),
            Err(RowError::InvalidRow(reason)) if reason.contains("'ZIP' 'abc'")
        ));
        assert!(matches!(
            targeting.derive(&table.rows[1]),
            Err(RowError::InvalidRow(reason)) if reason == "missing value for 'ZIP'"
        ));
    }

    #[test]
    fn test_required_columns() {
        assert_eq!(ZipCodeTargeting::new("US", "256").required_columns(), &["ZIP"]);
    }
}
