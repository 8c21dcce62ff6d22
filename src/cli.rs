//! Command-line interface parsing for wsapi
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! client configuration and validated requests for `main`.

use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::client::MutationMethod;
use crate::config::{ClientConfig, DEFAULT_BACKEND_URL};
use crate::refresh::PollConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// Request paths are appended to the backend URL and must be absolute
    #[error("Invalid path: '{0}'. Paths must start with '/', e.g. /api/tools")]
    InvalidPath(String),

    /// The --body argument is not valid JSON
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),

    /// Polling every zero seconds is not possible
    #[error("Invalid interval: must be at least 1 second")]
    InvalidInterval,

    /// No home directory to keep the token in
    #[error("Could not determine a data directory for the auth token")]
    NoDataDir,
}

/// wsapi - query the workspace portal backend through a request cache
#[derive(Parser, Debug)]
#[command(name = "wsapi")]
#[command(about = "Cached client for the workspace portal backend")]
#[command(version)]
pub struct Cli {
    /// Backend base URL; request paths are appended to it
    #[arg(long, global = true, env = "WORKSPACE_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Log cache and request activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// GET a path through the cache
    ///
    /// With --repeat, later iterations are served from cache while the TTL lasts.
    Get {
        path: String,
        /// Cache TTL in milliseconds
        #[arg(long, default_value_t = 30_000)]
        ttl: u64,
        /// Number of times to issue the read
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// POST a JSON body
    Post {
        path: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// PUT a JSON body
    Put {
        path: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// PATCH a JSON body
    Patch {
        path: String,
        #[arg(long)]
        body: Option<String>,
    },
    /// DELETE a resource
    Delete { path: String },
    /// Re-read a path on an interval and print each result
    Watch {
        path: String,
        /// Seconds between reloads
        #[arg(long, default_value_t = 30)]
        interval: u64,
        /// Stop after this many reloads
        #[arg(long)]
        count: Option<usize>,
    },
    /// Store the bearer token sent with every request
    Login { token: String },
    /// Forget the stored bearer token
    Logout,
}

/// A validated write request
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRequest {
    pub method: MutationMethod,
    pub path: String,
    pub body: Option<Value>,
}

impl Cli {
    /// Client configuration derived from global flags
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.backend_url.as_str())
    }
}

impl Command {
    /// Returns the write request for mutation subcommands, `None` otherwise
    pub fn mutation(&self) -> Result<Option<MutationRequest>, CliError> {
        let (method, path, body) = match self {
            Command::Post { path, body } => (MutationMethod::Post, path, body.as_deref()),
            Command::Put { path, body } => (MutationMethod::Put, path, body.as_deref()),
            Command::Patch { path, body } => (MutationMethod::Patch, path, body.as_deref()),
            Command::Delete { path } => (MutationMethod::Delete, path, None),
            _ => return Ok(None),
        };
        Ok(Some(MutationRequest {
            method,
            path: validate_path(path)?.to_string(),
            body: parse_body_arg(body)?,
        }))
    }
}

/// Checks that a request path is absolute
pub fn validate_path(path: &str) -> Result<&str, CliError> {
    if path.starts_with('/') {
        Ok(path)
    } else {
        Err(CliError::InvalidPath(path.to_string()))
    }
}

/// Parses the optional --body argument as JSON
pub fn parse_body_arg(body: Option<&str>) -> Result<Option<Value>, CliError> {
    body.map(|raw| serde_json::from_str(raw).map_err(|e| CliError::InvalidBody(e.to_string())))
        .transpose()
}

/// Builds the poll configuration for `watch`
pub fn poll_config(interval_secs: u64) -> Result<PollConfig, CliError> {
    if interval_secs == 0 {
        return Err(CliError::InvalidInterval);
    }
    Ok(PollConfig {
        interval: Duration::from_secs(interval_secs),
        enabled: true,
    })
}
