//! wsapi - command-line front end for the workspace portal backend
//!
//! Reads go through the request cache; writes invalidate the affected
//! resource family. Results are printed to stdout as pretty JSON.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::Value;
use tracing::info;

use workspace_api::auth::TokenStore;
use workspace_api::cli::{poll_config, validate_path, Cli, CliError, Command};
use workspace_api::client::{CachedClient, FetchOptions};
use workspace_api::logging;
use workspace_api::query::{Query, QueryOptions};
use workspace_api::refresh::{PollMessage, Poller};

fn print_json(value: &Value) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Polls `path` and prints every result until `count` reloads have happened
async fn watch(
    client: CachedClient,
    path: &str,
    interval: u64,
    count: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = poll_config(interval)?;
    let query = Arc::new(Query::new(client, path, QueryOptions::default()));

    let mut initial = query.subscribe();
    initial.wait_for(|state| !state.loading).await?;
    let state = query.state();
    match (&state.data, &state.error) {
        (_, Some(error)) => eprintln!("error: {}", error),
        (Some(data), None) => print_json(data)?,
        (None, None) => {}
    }

    let mut poller = Poller::spawn(Arc::clone(&query), config);
    let mut seen = 0;
    while count.map_or(true, |limit| seen < limit) {
        match poller.recv().await {
            Some(PollMessage::Updated(state)) => {
                if let Some(data) = &state.data {
                    print_json(data)?;
                }
            }
            Some(PollMessage::RefreshError(error)) => eprintln!("error: {}", error),
            None => break,
        }
        seen += 1;
    }

    poller.shutdown().await;
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let tokens = TokenStore::new();
    let client = CachedClient::new(&cli.client_config(), tokens.clone());

    match cli.command {
        Command::Get { path, ttl, repeat } => {
            let path = validate_path(&path)?;
            let options = FetchOptions::with_ttl(Duration::from_millis(ttl));
            for _ in 0..repeat.max(1) {
                let data = client.fetch(path, options).await?;
                print_json(&data)?;
            }
        }
        Command::Watch {
            path,
            interval,
            count,
        } => {
            let path = validate_path(&path)?;
            watch(client, path, interval, count).await?;
        }
        Command::Login { token } => {
            tokens.ok_or(CliError::NoDataDir)?.save(&token)?;
            info!("stored auth token");
            println!("Logged in");
        }
        Command::Logout => {
            tokens.ok_or(CliError::NoDataDir)?.clear()?;
            println!("Logged out");
        }
        write => {
            if let Some(request) = write.mutation()? {
                let result = client
                    .mutate(&request.path, request.method, request.body.as_ref())
                    .await?;
                print_json(&result)?;
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
