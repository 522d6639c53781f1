//! Avro schemas registered for each dataset type.

use serde_json::{json, Value};

use crate::models::DatasetKind;

const NAMESPACE: &str = "com.amazonaws.personalize.schema";

/// Schema document for a dataset kind.
#[must_use]
pub fn schema_for(kind: DatasetKind) -> Value {
    match kind {
        DatasetKind::Interactions => json!({
            "type": "record",
            "name": "Interactions",
            "namespace": NAMESPACE,
            "fields": [
                { "name": "USER_ID", "type": "string" },
                { "name": "ITEM_ID", "type": "string" },
                { "name": "TIMESTAMP", "type": "long" },
                { "name": "SERVICE_LENGTH", "type": ["float", "null"], "categorical": true },
                { "name": "MASSAGE_NAME", "type": ["string", "null"], "categorical": true },
                { "name": "CENTER_NAME", "type": ["string", "null"], "categorical": true },
                { "name": "EVENT_TYPE", "type": "string" }
            ],
            "version": "1.0"
        }),
        DatasetKind::Users => json!({
            "type": "record",
            "name": "Users",
            "namespace": NAMESPACE,
            "fields": [
                { "name": "USER_ID", "type": "string" },
                { "name": "AGE", "type": ["int", "null"] },
                { "name": "GENDER", "type": "string", "categorical": true },
                { "name": "ZIPCODE", "type": ["string", "null"], "categorical": true },
                { "name": "BASE_CENTER", "type": ["string", "null"], "categorical": true }
            ],
            "version": "1.0"
        }),
        DatasetKind::Items => json!({
            "type": "record",
            "name": "Items",
            "namespace": NAMESPACE,
            "fields": [
                { "name": "ITEM_ID", "type": "string" },
                { "name": "ITEM_NAME", "type": ["string", "null"], "textual": true }
            ],
            "version": "1.0"
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_writer::CsvTable;
    use crate::models::{InteractionRow, ItemRow, UserRow};

    fn field_names(kind: DatasetKind) -> Vec<String> {
        schema_for(kind)["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_schemas_match_csv_headers() {
        assert_eq!(field_names(DatasetKind::Interactions), InteractionRow::HEADER);
        assert_eq!(field_names(DatasetKind::Users), UserRow::HEADER);
        assert_eq!(field_names(DatasetKind::Items), ItemRow::HEADER);
    }

    #[test]
    fn test_schema_names() {
        assert_eq!(schema_for(DatasetKind::Interactions)["name"], "Interactions");
        assert_eq!(schema_for(DatasetKind::Items)["namespace"], NAMESPACE);
    }
}
