//! CLI argument parsing for the walkthrough.
//!
//! Every flag is optional; running the binary bare performs the walkthrough
//! against a local server with default credentials.
use crate::config::Overrides;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "arango-walkthrough",
    version,
    about = "Scripted CRUD and AQL walkthrough against an ArangoDB server",
    after_help = "Steps:\n  create database mydb, create collection firstCollection,\n  insert/read/update/delete document myKey, insert ten documents,\n  select and remove them with AQL, disconnect.\n\nExamples:\n  arango-walkthrough\n  arango-walkthrough --endpoint http://db:8529 --user root --password secret\n  arango-walkthrough --cleanup --json"
)]
pub struct RootArgs {
    /// Server URL (default http://127.0.0.1:8529, env ARANGO_ENDPOINT)
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// User name for Basic auth (default root, env ARANGO_USER)
    #[arg(long, value_name = "NAME")]
    pub user: Option<String>,

    /// Password for Basic auth (default empty, env ARANGO_PASSWORD)
    #[arg(long, value_name = "PASS")]
    pub password: Option<String>,

    /// JSON config file (default <config dir>/arango-walkthrough/config.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Documents per cursor batch for the AQL steps
    #[arg(long, value_name = "N")]
    pub batch_size: Option<u32>,

    /// Drop the walkthrough database after the last step
    #[arg(long)]
    pub cleanup: bool,

    /// Emit the final step report as JSON
    #[arg(long)]
    pub json: bool,

    /// Log driver requests to stderr
    #[arg(long)]
    pub verbose: bool,
}

impl RootArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            endpoint: self.endpoint.clone(),
            user: self.user.clone(),
            password: self.password.clone(),
            timeout_secs: self.timeout_secs,
            batch_size: self.batch_size,
        }
    }
}
