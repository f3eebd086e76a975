//! Document and entity types exchanged with the server.
//!
//! A stored document can be read in three shapes:
//!
//! - [`BaseDocument`]: system attributes plus a generic attribute map
//! - [`RawDocument`]: the undecoded response body, decoded per attribute on access
//! - `serde_json::Value`: a tree of JSON nodes
//!
//! All three carry the same logical content; [`RawDocument::decode`] converts
//! the raw form into either of the others without another request.
use super::error::{DriverError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;
use std::collections::BTreeMap;

/// Document with `_key`, `_id`, and `_rev` split out and all other attributes
/// kept in a map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseDocument {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, Value>,
}

impl BaseDocument {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// Undecoded document body as received from the server.
///
/// Attribute lookups decode only the requested value, which mirrors how a
/// binary slice view is read.
#[derive(Debug, Clone)]
pub struct RawDocument(Box<RawValue>);

impl RawDocument {
    /// Wrap a response body, rejecting anything that is not valid JSON.
    pub fn from_body(body: String) -> Result<Self> {
        Ok(Self(RawValue::from_string(body)?))
    }

    /// Decode the whole document into another representation.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(self.0.get())?)
    }

    /// Decode a single top-level attribute.
    pub fn get<T: DeserializeOwned>(&self, attribute: &str) -> Result<T> {
        let fields: BTreeMap<String, &RawValue> = serde_json::from_str(self.0.get())?;
        let raw = fields
            .get(attribute)
            .ok_or_else(|| DriverError::Decode(format!("attribute {attribute:?} not present")))?;
        Ok(serde_json::from_str(raw.get())?)
    }

    pub fn get_str(&self, attribute: &str) -> Result<String> {
        self.get(attribute)
    }

    pub fn get_i64(&self, attribute: &str) -> Result<i64> {
        self.get(attribute)
    }
}

/// Metadata returned by insert, update, and delete.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_key")]
    pub key: String,
    #[serde(rename = "_rev")]
    pub revision: String,
}

/// Collection description returned by collection creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionEntity {
    pub id: String,
    pub name: String,
    /// 2 for document collections, 3 for edge collections.
    #[serde(rename = "type", default)]
    pub collection_type: u32,
    #[serde(default)]
    pub status: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ServerVersion {
    pub server: String,
    pub version: String,
    #[serde(default)]
    pub license: Option<String>,
}

/// Render an attribute value the way it reads in a transcript: strings
/// without quotes, absent values as `null`.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => "null".to_string(),
    }
}

/// Read a string attribute from a tree document.
pub fn tree_str<'a>(document: &'a Value, attribute: &str) -> Result<&'a str> {
    document
        .get(attribute)
        .and_then(Value::as_str)
        .ok_or_else(|| DriverError::Decode(format!("attribute {attribute:?} is not a string")))
}

/// Read an integer attribute from a tree document.
pub fn tree_i64(document: &Value, attribute: &str) -> Result<i64> {
    document
        .get(attribute)
        .and_then(Value::as_i64)
        .ok_or_else(|| DriverError::Decode(format!("attribute {attribute:?} is not an integer")))
}
