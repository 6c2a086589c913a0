//! Normalized search document.
//!
//! A `SearchDocument` is produced fresh for every provisioning call and is
//! never persisted by the core. It only travels to and from the index client.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::content_type::{ContentType, UnknownContentType};

/// A person attached to a document (owner or contributor).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPerson {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_node: String,
}

impl SearchPerson {
    pub fn new(
        name: impl Into<String>,
        username: impl Into<String>,
        url: impl Into<String>,
        role: impl Into<String>,
        network_node: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            url: url.into(),
            role: role.into(),
            network_node: network_node.into(),
        }
    }
}

/// Document sent to the search index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchDocument {
    /// Native entity ID, as a string.
    #[serde(rename = "_internal_id", default, skip_serializing_if = "String::is_empty")]
    pub internal_id: String,
    /// Remote ID assigned by the index. `None` until indexed.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SearchPerson>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributors: Vec<SearchPerson>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub primary_url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumbnail_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub language: String,
    /// Wire tag of the content type. Kept as a string so that documents
    /// coming back from the index with an unexpected tag still deserialize.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_node: String,
}

impl SearchDocument {
    /// Create a document for the given native entity ID and content type.
    pub fn new(
        internal_id: impl Into<String>,
        content_type: ContentType,
        title: impl Into<String>,
    ) -> Self {
        Self {
            internal_id: internal_id.into(),
            title: title.into(),
            content_type: content_type.as_str().to_string(),
            ..Default::default()
        }
    }

    /// Remote ID, if present and non-empty.
    pub fn remote_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// Set or clear the remote ID. An empty string clears it.
    pub fn set_remote_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Parsed content type.
    pub fn content_type(&self) -> Result<ContentType, UnknownContentType> {
        self.content_type.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_wire_names_and_skips_empty_fields() {
        let mut doc = SearchDocument::new("42", ContentType::Post, "Hello");
        doc.publication_date = NaiveDate::from_ymd_opt(2024, 3, 1);

        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "_internal_id": "42",
                "title": "Hello",
                "publication_date": "2024-03-01",
                "content_type": "post"
            })
        );
    }

    #[test]
    fn test_deserializes_index_response() {
        let doc: SearchDocument = serde_json::from_value(json!({
            "_id": "yQQEYY0B1VMrrWgmZN1j",
            "_internal_id": "7",
            "title": "A site",
            "content_type": "site",
            "owner": { "name": "Ada", "role": "admin" }
        }))
        .unwrap();

        assert_eq!(doc.remote_id(), Some("yQQEYY0B1VMrrWgmZN1j"));
        assert_eq!(doc.content_type(), Ok(ContentType::Site));
        assert_eq!(doc.owner.unwrap().name, "Ada");
    }

    #[test]
    fn test_empty_remote_id_counts_as_missing() {
        let mut doc = SearchDocument::new("1", ContentType::Group, "G");
        doc.id = Some(String::new());
        assert_eq!(doc.remote_id(), None);

        doc.set_remote_id("abc");
        assert_eq!(doc.remote_id(), Some("abc"));
        doc.set_remote_id("");
        assert!(doc.id.is_none());
    }
}
