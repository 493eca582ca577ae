use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// A MongoDB deployment reached through `--uri`
    Mongo,
    /// An in-process collection, optionally seeded with `--seed`
    Memory,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a catalog of operations against a store
    Run {
        #[arg(
            long,
            help = "Catalog file (JSON); the built-in bookstore catalog is used when omitted"
        )]
        catalog: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = StoreBackend::Mongo)]
        store: StoreBackend,

        #[arg(long, help = "MongoDB connection string (overrides DOCRUN_URI)")]
        uri: Option<String>,

        #[arg(long, help = "Database name (overrides DOCRUN_DATABASE)")]
        database: Option<String>,

        #[arg(long, help = "Collection name (overrides DOCRUN_COLLECTION)")]
        collection: Option<String>,

        #[arg(long, help = "JSON array of documents to load into the memory store")]
        seed: Option<PathBuf>,

        #[arg(long, help = "Fail operations still pending after this many seconds")]
        deadline_secs: Option<u64>,

        #[arg(
            long,
            help = "If specified, also writes the JSON report to this file"
        )]
        output: Option<PathBuf>,

        #[arg(
            long,
            help = "If set, prints the report as JSON instead of a table"
        )]
        json: bool,

        #[arg(long, help = "Load extra environment variables from this .env file")]
        env_file: Option<PathBuf>,
    },
    /// Validate a catalog and print it as JSON along with any findings
    Catalog {
        #[arg(long, help = "Catalog file (JSON); defaults to the built-in bookstore catalog")]
        catalog: Option<PathBuf>,
    },
    /// Connect to the store and close the connection again
    TestConn {
        /// MongoDB connection string; falls back to DOCRUN_URI, then localhost
        #[arg(long)]
        uri: Option<String>,

        #[arg(long, help = "Load extra environment variables from this .env file")]
        env_file: Option<PathBuf>,
    },
}
