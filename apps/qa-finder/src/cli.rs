//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use domain_vector::QueryMode;

#[derive(Debug, Parser)]
#[command(name = "qa-finder")]
#[command(about = "Find semantically similar questions in a hosted vector index")]
pub struct Cli {
    /// Index to query or load (overrides QA_INDEX_NAME)
    #[arg(long, global = true)]
    pub index: Option<String>,

    /// How questions are embedded: local or integrated (overrides QA_QUERY_MODE)
    #[arg(long, global = true)]
    pub mode: Option<QueryMode>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Subcommand, PartialEq)]
pub enum Commands {
    /// Ask questions interactively (default)
    Ask,

    /// Run the built-in sample questions
    Demo,

    /// Create the index if needed and load the dataset into it
    Index {
        /// JSON Lines dataset (overrides QA_DATASET)
        #[arg(short, long)]
        dataset: Option<PathBuf>,

        /// Records per upsert call
        #[arg(short, long)]
        batch_size: Option<usize>,

        /// Stop after this many valid records
        #[arg(short, long)]
        max_records: Option<usize>,

        /// Load even if the index already holds vectors
        #[arg(short, long)]
        force: bool,
    },

    /// Print index statistics as JSON
    Stats,
}

impl Cli {
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Ask)
    }
}
