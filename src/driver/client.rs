//! Blocking HTTP connection to an ArangoDB server.
//!
//! Each method builds a REST request, sends it through a shared `ureq` agent,
//! and maps non-success responses onto [`DriverError::Server`].

use super::database::Database;
use super::document::ServerVersion;
use super::error::{DriverError, Result};
use super::names::check_database_name;
use base64::Engine;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use ureq::typestate::WithBody;
use ureq::Agent;

/// Database every server has; database administration goes through it.
pub const SYSTEM_DATABASE: &str = "_system";

/// Connection settings understood by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientOptions {
    pub endpoint: String,
    pub user: String,
    pub password: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

/// Connection to one ArangoDB server.
///
/// The connection is released by [`ArangoClient::shutdown`] or when dropped.
pub struct ArangoClient {
    agent: Agent,
    endpoint: String,
    authorization: String,
    version: ServerVersion,
}

impl ArangoClient {
    /// Connect and verify the server answers `GET /_api/version`.
    pub fn connect(options: &ClientOptions) -> Result<Self> {
        let config = Agent::config_builder()
            .timeout_global(Some(options.timeout))
            .http_status_as_error(false)
            .build();
        let agent = Agent::new_with_config(config);
        let credentials = format!("{}:{}", options.user, options.password);
        let authorization = format!(
            "Basic {}",
            base64::engine::general_purpose::STANDARD.encode(credentials)
        );
        let endpoint = options.endpoint.trim_end_matches('/').to_string();

        let mut client = Self {
            agent,
            endpoint,
            authorization,
            version: ServerVersion::default(),
        };
        let body = client.request(Method::Get, "/_api/version", None)?;
        client.version = serde_json::from_str(&body)?;
        tracing::info!(
            endpoint = %client.endpoint,
            server = %client.version.server,
            version = %client.version.version,
            license = client.version.license.as_deref().unwrap_or("unknown"),
            "connected"
        );
        Ok(client)
    }

    pub fn version(&self) -> &ServerVersion {
        &self.version
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Create a database; fails when it already exists or the name is invalid.
    pub fn create_database(&self, name: &str) -> Result<()> {
        check_database_name(name)?;
        let path = format!("/_db/{SYSTEM_DATABASE}/_api/database");
        self.request(Method::Post, &path, Some(&json!({ "name": name })))?;
        Ok(())
    }

    pub fn drop_database(&self, name: &str) -> Result<()> {
        let path = format!(
            "/_db/{SYSTEM_DATABASE}/_api/database/{}",
            encode_segment(name)
        );
        self.request(Method::Delete, &path, None)?;
        Ok(())
    }

    /// Handle for a database; no request is made until it is used.
    pub fn db(&self, name: &str) -> Database<'_> {
        Database::new(self, name)
    }

    /// Release the connection.
    pub fn shutdown(self) {
        tracing::info!(endpoint = %self.endpoint, "connection released");
    }

    /// Send one request and return the response body of a successful call.
    pub(crate) fn request(&self, method: Method, path: &str, body: Option<&Value>) -> Result<String> {
        let url = format!("{}{}", self.endpoint, path);
        let auth = self.authorization.as_str();
        let start = Instant::now();
        let response = match method {
            Method::Get => self.agent.get(&url).header("Authorization", auth).call(),
            Method::Delete => self.agent.delete(&url).header("Authorization", auth).call(),
            Method::Post => send(self.agent.post(&url), auth, body),
            Method::Put => send(self.agent.put(&url), auth, body),
            Method::Patch => send(self.agent.patch(&url), auth, body),
        };
        let mut response = response?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;

        tracing::debug!(
            method = method.as_str(),
            path,
            status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            response_bytes = text.len(),
            "arango request complete"
        );

        if status >= 400 {
            return Err(DriverError::from_response(status, &text));
        }
        Ok(text)
    }
}

fn send(
    request: ureq::RequestBuilder<WithBody>,
    auth: &str,
    body: Option<&Value>,
) -> std::result::Result<ureq::http::Response<ureq::Body>, ureq::Error> {
    let request = request.header("Authorization", auth);
    match body {
        Some(body) => request.send_json(body),
        None => request.send_empty(),
    }
}

/// Percent-encode a single URL path segment (names and document keys).
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
