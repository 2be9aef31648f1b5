// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! CLI command definitions for Lakeshore

use clap::{Args, Parser, Subcommand, ValueEnum};
use lakeshore::config::DEFAULT_REF;
use std::path::PathBuf;

/// Catalog used when `--catalog` is not given
pub const DEFAULT_CATALOG_URI: &str = "redb://./lakeshore.redb";

/// Log level options
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Warnings and errors
    Warn,
    /// Info, warnings, and errors
    Info,
    /// Debug messages and above (verbose)
    Debug,
    /// All messages including trace (very verbose)
    Trace,
    /// Disable all logging
    Off,
}

impl LogLevel {
    /// Convert to log::LevelFilter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
            LogLevel::Off => log::LevelFilter::Off,
        }
    }
}

/// Lakeshore CLI - catalog-backed ingestion
#[derive(Parser)]
#[command(name = "lakeshore")]
#[command(about = "Lakeshore - ingest relational tables into a versioned catalog")]
#[command(version)]
pub struct Cli {
    /// Set log level (error, warn, info, debug, trace, off)
    #[arg(short = 'l', long = "log-level", global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Verbose mode (equivalent to --log-level debug)
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Read a relation, commit it to the catalog and verify the commit
    Run(Box<RunArgs>),

    /// Print the rows of a table
    Show {
        /// Table identity (`namespace.table`)
        table: String,

        #[command(flatten)]
        catalog: CatalogArgs,

        /// Snapshot version to read (defaults to the current one)
        #[arg(long)]
        version: Option<u64>,

        /// Maximum rows to print
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the snapshot history of a table
    History {
        /// Table identity (`namespace.table`)
        table: String,

        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// List the tables on a ref
    Tables {
        #[command(flatten)]
        catalog: CatalogArgs,
    },

    /// Ref management commands
    Branch {
        #[command(subcommand)]
        action: BranchAction,

        #[command(flatten)]
        catalog: CatalogArgs,
    },
}

/// Which catalog and ref a command talks to
#[derive(Args, Clone, Debug)]
pub struct CatalogArgs {
    /// Catalog URI (memory://, redb://<file>, sled://<dir>)
    #[arg(long = "catalog", global = true, default_value = DEFAULT_CATALOG_URI)]
    pub uri: String,

    /// Catalog ref to operate on
    #[arg(long = "ref", global = true, default_value = DEFAULT_REF)]
    pub reference: String,
}

/// Ref management subcommands
#[derive(Subcommand)]
pub enum BranchAction {
    /// Create a new ref forked from an existing one
    Create {
        /// Name of the new ref
        name: String,

        /// Ref to fork from
        #[arg(long, default_value = DEFAULT_REF)]
        from: String,
    },

    /// List all refs
    List,
}

/// Arguments of `lakeshore run`. Flags override values from `--config`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// JSON pipeline config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Source endpoint (a SQLite path or sqlite://<path>)
    #[arg(long)]
    pub source: Option<String>,

    /// Source driver
    #[arg(long)]
    pub driver: Option<String>,

    /// Relation (table or view) to read
    #[arg(long)]
    pub relation: Option<String>,

    /// Username for the source connection
    #[arg(short = 'u', long = "user")]
    pub user: Option<String>,

    /// Password for the source connection (prompted when a user is given without one)
    #[arg(short = 'p', long = "password")]
    pub password: Option<String>,

    /// Catalog URI (memory://, redb://<file>, sled://<dir>)
    #[arg(long)]
    pub catalog: Option<String>,

    /// Catalog ref to commit to
    #[arg(long = "ref")]
    pub reference: Option<String>,

    /// Catalog authentication mode
    #[arg(long, value_enum)]
    pub auth: Option<AuthKind>,

    /// Bearer token (prompted when bearer auth has no token)
    #[arg(long)]
    pub token: Option<String>,

    /// Object storage endpoint recorded with the catalog connection
    #[arg(long)]
    pub storage_endpoint: Option<String>,

    /// Warehouse root under which snapshot locations are recorded
    #[arg(long)]
    pub warehouse: Option<String>,

    /// Destination table (`namespace.table`)
    #[arg(short, long)]
    pub target: Option<String>,

    /// Rows per staged chunk
    #[arg(long)]
    pub batch_rows: Option<usize>,

    /// Rows to print from the source and the committed table
    #[arg(long)]
    pub preview_rows: Option<usize>,

    /// Do not print row previews
    #[arg(short, long)]
    pub quiet: bool,
}

/// Catalog authentication modes accepted on the command line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AuthKind {
    None,
    Bearer,
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}
