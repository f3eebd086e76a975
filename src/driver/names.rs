//! Client-side checks for database names, collection names, and document keys.
//!
//! The server enforces the same rules; checking locally keeps obviously bad
//! names from producing a round-trip and gives a clearer message.
use super::error::{DriverError, Result};
use regex::Regex;
use std::sync::OnceLock;

const MAX_DATABASE_NAME_BYTES: usize = 64;
const MAX_COLLECTION_NAME_BYTES: usize = 256;
const MAX_DOCUMENT_KEY_BYTES: usize = 254;

fn database_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_\-]*$").expect("database pattern"))
}

fn collection_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_\-]*$").expect("collection pattern"))
}

fn key_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_\-:.@()+,=;$!*'%]+$").expect("document key pattern")
    })
}

pub fn check_database_name(name: &str) -> Result<()> {
    check(name, "database", database_pattern(), MAX_DATABASE_NAME_BYTES)
}

pub fn check_collection_name(name: &str) -> Result<()> {
    check(name, "collection", collection_pattern(), MAX_COLLECTION_NAME_BYTES)
}

pub fn check_document_key(key: &str) -> Result<()> {
    check(key, "document key", key_pattern(), MAX_DOCUMENT_KEY_BYTES)
}

fn check(name: &str, kind: &'static str, pattern: &Regex, max_bytes: usize) -> Result<()> {
    if name.len() > max_bytes || !pattern.is_match(name) {
        return Err(DriverError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}
