//! The scripted walkthrough: one flat sequence of driver calls.
//!
//! Each guarded step runs to completion or records its failure and moves on;
//! only the bulk insert propagates. Progress goes to stdout, failures to
//! stderr, and every outcome lands in the returned [`WalkthroughReport`].
mod report;

pub use report::{Step, StepOutcome, WalkthroughReport};

use crate::driver::{
    display_value, tree_i64, tree_str, ArangoClient, BaseDocument, BindVars, QueryOptions,
    RawDocument,
};
use anyhow::{anyhow, Context, Result};
use serde_json::{json, Value};

pub const DATABASE_NAME: &str = "mydb";
pub const COLLECTION_NAME: &str = "firstCollection";
pub const DOCUMENT_KEY: &str = "myKey";
pub const BULK_DOCUMENT_COUNT: usize = 10;

const SEPARATOR: &str = "-----------";
const SELECT_QUERY: &str = "FOR t IN firstCollection FILTER t.name == @name RETURN t";
const REMOVE_QUERY: &str = "FOR t IN firstCollection FILTER t.name == @name \
                            REMOVE t IN firstCollection LET removed = OLD RETURN removed";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    pub batch_size: Option<u32>,
    pub cleanup: bool,
}

/// A run stopped by a failed bulk insert. `report` holds every step that ran,
/// ending with the failed insert.
#[derive(Debug)]
pub struct Aborted {
    pub report: WalkthroughReport,
    pub error: anyhow::Error,
}

/// Run every step against `client`.
///
/// Returns `Err` only when the bulk insert fails; all other failures are
/// recorded in the report.
pub fn run(
    client: &ArangoClient,
    options: &RunOptions,
) -> std::result::Result<WalkthroughReport, Aborted> {
    let mut report = WalkthroughReport::default();
    let db = client.db(DATABASE_NAME);
    let collection = db.collection(COLLECTION_NAME);
    tracing::info!(
        endpoint = client.endpoint(),
        server_version = %client.version().version,
        database = db.name(),
        collection = collection.name(),
        "walkthrough starting"
    );

    guarded(
        &mut report,
        Step::CreateDatabase,
        format!("create database {DATABASE_NAME}"),
        || {
            client.create_database(DATABASE_NAME)?;
            println!("Database created: {DATABASE_NAME}");
            Ok(())
        },
    );

    guarded(
        &mut report,
        Step::CreateCollection,
        format!("create collection {COLLECTION_NAME}"),
        || {
            let entity = db.create_collection(COLLECTION_NAME)?;
            tracing::debug!(
                id = %entity.id,
                collection_type = entity.collection_type,
                status = ?entity.status,
                "collection created"
            );
            println!("Collection created: {}", entity.name);
            Ok(())
        },
    );

    guarded(
        &mut report,
        Step::InsertDocument,
        format!("create document {DOCUMENT_KEY}"),
        || {
            let mut document = BaseDocument::with_key(DOCUMENT_KEY);
            document.add_attribute("a", "Foo");
            document.add_attribute("b", 42);
            let meta = collection.insert_document(&document)?;
            tracing::debug!(id = %meta.id, rev = %meta.revision, "document created");
            println!("Document created");
            Ok(())
        },
    );

    // One fetch feeds all three representations.
    let fetched: std::result::Result<RawDocument, String> = collection
        .read_document(DOCUMENT_KEY)
        .map_err(|err| err.to_string());
    let read_action = format!("get document {DOCUMENT_KEY}");

    guarded(&mut report, Step::ReadAsMap, read_action.clone(), || {
        let document: BaseDocument = fetched_document(&fetched)?.decode()?;
        println!("Key: {}", document.key().unwrap_or("null"));
        println!("Attribute a: {}", display_value(document.attribute("a")));
        println!("Attribute b: {}", display_value(document.attribute("b")));
        Ok(())
    });

    println!("{SEPARATOR}");
    guarded(&mut report, Step::ReadAsRaw, read_action.clone(), || {
        let document = fetched_document(&fetched)?;
        println!("Key: {}", document.get_str("_key")?);
        println!("Attribute a: {}", document.get_str("a")?);
        println!("Attribute b: {}", document.get_i64("b")?);
        Ok(())
    });

    println!("{SEPARATOR}");
    guarded(&mut report, Step::ReadAsTree, read_action.clone(), || {
        let document: Value = fetched_document(&fetched)?.decode()?;
        println!("Key: {}", tree_str(&document, "_key")?);
        println!("Attribute a: {}", tree_str(&document, "a")?);
        println!("Attribute b: {}", tree_i64(&document, "b")?);
        Ok(())
    });
    println!("{SEPARATOR}");

    guarded(
        &mut report,
        Step::UpdateDocument,
        format!("update document {DOCUMENT_KEY}"),
        || {
            let meta = collection.update_document(DOCUMENT_KEY, &json!({ "c": "Bar" }))?;
            tracing::debug!(rev = %meta.revision, "document updated");
            println!("Document updated");
            Ok(())
        },
    );

    guarded(&mut report, Step::ReadUpdated, read_action, || {
        let document: BaseDocument = collection.get_document(DOCUMENT_KEY)?;
        println!("Key: {}", document.key().unwrap_or("null"));
        println!("Attribute a: {}", display_value(document.attribute("a")));
        println!("Attribute b: {}", display_value(document.attribute("b")));
        println!("Attribute c: {}", display_value(document.attribute("c")));
        Ok(())
    });

    guarded(
        &mut report,
        Step::DeleteDocument,
        format!("delete document {DOCUMENT_KEY}"),
        || {
            let meta = collection.delete_document(DOCUMENT_KEY)?;
            match collection.read_document(&meta.key) {
                Err(err) if err.is_not_found() => {
                    println!("Document deleted");
                    Ok(())
                }
                Err(err) => Err(err.into()),
                Ok(_) => Err(anyhow!("document {} still readable after delete", meta.key)),
            }
        },
    );

    let bulk_action = format!("insert {BULK_DOCUMENT_COUNT} documents");
    let inserted: Result<()> = (0..BULK_DOCUMENT_COUNT).try_for_each(|index| {
        let key = index.to_string();
        let mut document = BaseDocument::with_key(key.as_str());
        document.add_attribute("name", "Homer");
        collection
            .insert_document(&document)
            .with_context(|| format!("insert document {key}"))?;
        Ok(())
    });
    if let Err(error) = inserted {
        report.record(StepOutcome::failed(
            Step::BulkInsert,
            bulk_action,
            format!("{error:#}"),
        ));
        return Err(Aborted { report, error });
    }
    println!("Inserted {BULK_DOCUMENT_COUNT} documents");
    report.record(StepOutcome::ok(Step::BulkInsert, bulk_action));

    let bind_vars = BindVars::from([("name".to_string(), json!("Homer"))]);
    let query_options = QueryOptions {
        batch_size: options.batch_size,
        count: true,
    };

    guarded(&mut report, Step::QuerySelect, "execute query", || {
        let cursor = db.query::<BaseDocument>(SELECT_QUERY, &bind_vars, Some(&query_options))?;
        tracing::debug!(count = ?cursor.result_count(), "select query opened");
        for document in cursor {
            let document = document?;
            println!("Key: {}", document.key().unwrap_or("null"));
        }
        Ok(())
    });

    guarded(&mut report, Step::QueryRemove, "execute query", || {
        let cursor = db.query::<BaseDocument>(REMOVE_QUERY, &bind_vars, Some(&query_options))?;
        for document in cursor {
            let document = document?;
            println!("Removed document {}", document.key().unwrap_or("null"));
        }
        Ok(())
    });

    if options.cleanup {
        guarded(
            &mut report,
            Step::DropDatabase,
            format!("drop database {DATABASE_NAME}"),
            || {
                client.drop_database(DATABASE_NAME)?;
                println!("Database dropped: {DATABASE_NAME}");
                Ok(())
            },
        );
    }

    Ok(report)
}

/// Run one step, turning a failure into a report entry and a stderr line.
fn guarded<F>(report: &mut WalkthroughReport, step: Step, action: impl Into<String>, body: F)
where
    F: FnOnce() -> Result<()>,
{
    let action = action.into();
    let outcome = match body() {
        Ok(()) => StepOutcome::ok(step, action),
        Err(err) => {
            let message = format!("{err:#}");
            tracing::warn!(?step, error = %message, "step failed");
            StepOutcome::failed(step, action, message)
        }
    };
    if let Some(line) = outcome.failure_line() {
        eprintln!("{line}");
    }
    report.record(outcome);
}

fn fetched_document(
    fetched: &std::result::Result<RawDocument, String>,
) -> Result<&RawDocument> {
    fetched.as_ref().map_err(|message| anyhow!("{message}"))
}
