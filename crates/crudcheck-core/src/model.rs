//! Items as seen through the API and through the store

use serde::{Deserialize, Serialize};

/// Payload for creating an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub description: String,
}

impl NewItem {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// JSON body for `POST /items`
    pub fn to_payload(&self) -> String {
        serde_json::json!({
            "name": self.name,
            "description": self.description,
        })
        .to_string()
    }
}

/// An item as returned by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// A row of the `items` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRow {
    pub id: i64,
    pub name: String,
    pub description: String,
}

impl ItemRow {
    /// Whether the row carries exactly the submitted values
    pub fn matches(&self, submitted: &NewItem) -> bool {
        self.name == submitted.name && self.description == submitted.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = NewItem::new("E2E Item", "End-to-end test").to_payload();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["name"], "E2E Item");
        assert_eq!(value["description"], "End-to-end test");
    }

    #[test]
    fn test_item_description_defaults_to_empty() {
        let item: Item = serde_json::from_str(r#"{"id": 3, "name": "x"}"#).unwrap();
        assert_eq!(item.description, "");
    }
}
