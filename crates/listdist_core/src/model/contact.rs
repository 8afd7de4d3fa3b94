//! Canonical contact row produced by the schema validator.

use crate::import::CellValue;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Formatter;

/// One normalized input row.
///
/// Field names serialize to the exact column names of the upload format so
/// stored lists round-trip with the admin console unchanged. Client-built
/// payloads may carry spreadsheet cells as JSON numbers; those are accepted
/// and rendered the same way uploaded numeric cells are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(rename = "FirstName", deserialize_with = "text_or_number")]
    pub first_name: String,
    #[serde(rename = "Phone", deserialize_with = "text_or_number")]
    pub phone: String,
    #[serde(rename = "Notes", default, deserialize_with = "text_or_number")]
    pub notes: String,
}

impl ContactRecord {
    pub fn new(
        first_name: impl Into<String>,
        phone: impl Into<String>,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            phone: phone.into(),
            notes: notes.into(),
        }
    }

    /// Returns the canonical name of the first blank required field, if any.
    pub fn first_blank_required(&self) -> Option<&'static str> {
        if self.first_name.trim().is_empty() {
            Some("FirstName")
        } else if self.phone.trim().is_empty() {
            Some("Phone")
        } else {
            None
        }
    }
}

fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextOrNumber;

    impl<'de> Visitor<'de> for TextOrNumber {
        type Value = String;

        fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            f.write_str("a string or a number")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_string<E: de::Error>(self, value: String) -> Result<String, E> {
            Ok(value)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<String, E> {
            Ok(value.to_string())
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<String, E> {
            Ok(CellValue::Number(value).to_text())
        }
    }

    deserializer.deserialize_any(TextOrNumber)
}

#[cfg(test)]
mod tests {
    use super::ContactRecord;
    use serde_json::json;

    #[test]
    fn numeric_cells_deserialize_as_text() {
        let record: ContactRecord = serde_json::from_value(json!({
            "FirstName": "Ana",
            "Phone": 5550100,
            "Notes": 2.5
        }))
        .unwrap();

        assert_eq!(record, ContactRecord::new("Ana", "5550100", "2.5"));
    }

    #[test]
    fn integral_floats_drop_the_fraction() {
        let record: ContactRecord =
            serde_json::from_value(json!({ "FirstName": 7, "Phone": 5550100.0 })).unwrap();

        assert_eq!(record, ContactRecord::new("7", "5550100", ""));
    }

    #[test]
    fn other_json_types_are_rejected() {
        let err = serde_json::from_value::<ContactRecord>(json!({
            "FirstName": "Ana",
            "Phone": true
        }))
        .unwrap_err();

        assert!(err.to_string().contains("a string or a number"));
    }
}
