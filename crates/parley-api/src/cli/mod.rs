//! CLI command definitions and dispatch for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. Three commands: `serve`
//! runs the REST API, `create-user` provisions a user with an API key,
//! and `prompts` is the offline workflow-prompt batch utility.

pub mod prompts;
pub mod user;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Chat with a hosted LLM over persistent sessions.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the REST API server.
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on.
        #[arg(long, default_value = "3000", env = "PARLEY_PORT")]
        port: u16,

        /// Export traces via OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Register a user and print their API key (shown once).
    CreateUser {
        /// Email address of the new user.
        #[arg(long)]
        email: String,
    },

    /// Generate prompts for a batch of workflow definitions.
    Prompts {
        /// JSON file holding an array of workflow definitions.
        #[arg(long)]
        input: PathBuf,

        /// Destination JSONL file.
        #[arg(long)]
        output: PathBuf,
    },
}
