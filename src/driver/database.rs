//! Database and collection handles.
use super::client::{encode_segment, ArangoClient, Method};
use super::cursor::{Cursor, CursorResponse, QueryOptions};
use super::document::{CollectionEntity, DocumentMeta, RawDocument};
use super::error::Result;
use super::names::{check_collection_name, check_document_key};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

/// Bind parameters for an AQL query, keyed by name without the `@`.
pub type BindVars = BTreeMap<String, Value>;

pub struct Database<'a> {
    client: &'a ArangoClient,
    name: String,
}

impl<'a> Database<'a> {
    pub(crate) fn new(client: &'a ArangoClient, name: &str) -> Self {
        Self {
            client,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn api_path(&self, rest: &str) -> String {
        format!("/_db/{}/_api/{rest}", encode_segment(&self.name))
    }

    /// Create a document collection and return the server's description of it.
    pub fn create_collection(&self, name: &str) -> Result<CollectionEntity> {
        check_collection_name(name)?;
        let body = self.client.request(
            Method::Post,
            &self.api_path("collection"),
            Some(&json!({ "name": name })),
        )?;
        Ok(serde_json::from_str(&body)?)
    }

    pub fn collection(&self, name: &str) -> Collection<'a> {
        Collection {
            client: self.client,
            database: self.name.clone(),
            name: name.to_string(),
        }
    }

    /// Run an AQL query and return a cursor over its results.
    ///
    /// The first batch arrives with this call; later batches are fetched while
    /// the cursor is iterated.
    pub fn query<T: DeserializeOwned>(
        &self,
        aql: &str,
        bind_vars: &BindVars,
        options: Option<&QueryOptions>,
    ) -> Result<Cursor<'a, T>> {
        let mut request = Map::new();
        request.insert("query".to_string(), Value::String(aql.to_string()));
        request.insert("bindVars".to_string(), serde_json::to_value(bind_vars)?);
        if let Some(options) = options {
            if let Some(batch_size) = options.batch_size {
                request.insert("batchSize".to_string(), json!(batch_size));
            }
            if options.count {
                request.insert("count".to_string(), Value::Bool(true));
            }
        }
        let body = self.client.request(
            Method::Post,
            &self.api_path("cursor"),
            Some(&Value::Object(request)),
        )?;
        let first: CursorResponse<T> = serde_json::from_str(&body)?;
        tracing::debug!(
            database = %self.name,
            batch = first.result.len(),
            has_more = first.has_more,
            "query opened"
        );
        Ok(Cursor::new(self.client, &self.name, first))
    }
}

pub struct Collection<'a> {
    client: &'a ArangoClient,
    database: String,
    name: String,
}

impl Collection<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    fn collection_path(&self) -> String {
        format!(
            "/_db/{}/_api/document/{}",
            encode_segment(&self.database),
            encode_segment(&self.name)
        )
    }

    fn document_path(&self, key: &str) -> Result<String> {
        check_document_key(key)?;
        Ok(format!("{}/{}", self.collection_path(), encode_segment(key)))
    }

    pub fn insert_document<D: Serialize>(&self, document: &D) -> Result<DocumentMeta> {
        let body = serde_json::to_value(document)?;
        let response = self
            .client
            .request(Method::Post, &self.collection_path(), Some(&body))?;
        Ok(serde_json::from_str(&response)?)
    }

    /// Fetch a document without decoding it.
    pub fn read_document(&self, key: &str) -> Result<RawDocument> {
        let body = self
            .client
            .request(Method::Get, &self.document_path(key)?, None)?;
        RawDocument::from_body(body)
    }

    /// Fetch a document decoded as `T`.
    pub fn get_document<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.read_document(key)?.decode()
    }

    /// Merge `partial` into the stored document; attributes not named in
    /// `partial` keep their values.
    pub fn update_document<D: Serialize>(&self, key: &str, partial: &D) -> Result<DocumentMeta> {
        let body = serde_json::to_value(partial)?;
        let response = self.client.request(
            Method::Patch,
            &format!("{}?mergeObjects=true", self.document_path(key)?),
            Some(&body),
        )?;
        Ok(serde_json::from_str(&response)?)
    }

    pub fn delete_document(&self, key: &str) -> Result<DocumentMeta> {
        let response = self
            .client
            .request(Method::Delete, &self.document_path(key)?, None)?;
        Ok(serde_json::from_str(&response)?)
    }
}
