//! # docugen CLI interface
//!
//! Command parsing and orchestration only: validation, polling, the document
//! cache and export all live in `docugen-core`. This module wires them to the
//! HTTP client and prints results.
//!
//! - [`Cli`] holds the global `--config` flag and a [`Commands`] subcommand.
//! - [`run`] is the async entry point used by `main` and by integration tests.
//!
//! Each invocation is a fresh process with a fresh cookie store, so commands
//! that need a session log in first when `auth.username` and
//! `DOCUGEN_PASSWORD` are both configured.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docugen_core::contract::{DocgenApi, NewAccount};
use docugen_core::polling::Poller;
use docugen_core::validator::validate;
use docugen_core::workspace::Workspace;
use docugen_core::{ExportError, PollError};

use crate::client::HttpClient;
use crate::load_config::{load_config, CliConfig};
use crate::view::{render_status, render_summary, render_tree};

/// Generate documentation for a source repository through the docugen backend.
#[derive(Parser)]
#[clap(
    name = "docugen",
    version,
    about = "Submit a repository to the docugen backend and export the generated documentation"
)]
pub struct Cli {
    /// Path to the YAML config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with the configured username and DOCUGEN_PASSWORD
    Login {
        /// Overrides auth.username from the config file
        #[clap(long)]
        username: Option<String>,
    },
    /// Create an account (the email doubles as username), then log in
    Register {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
    },
    /// Store a model API key on the backend
    SetKey {
        /// Defaults to GEMINI_API_KEY
        #[clap(long)]
        key: Option<String>,
    },
    /// Show whether a model API key is stored on the backend
    KeyStatus,
    /// Analyze a repository and write the generated documents to disk
    Generate {
        /// Repository URL (https, http, ssh or git@host:path)
        #[clap(long)]
        url: String,
        /// Output directory, overrides output.dir from the config file
        #[clap(long)]
        output: Option<PathBuf>,
        /// Only list files whose name contains this text
        #[clap(long)]
        search: Option<String>,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Login { username } => {
            let username = username
                .or_else(|| config.username.clone())
                .context("No username given: pass --username or set auth.username")?;
            let password = require_password(&config)?;
            let client = HttpClient::new(&config.base_url)?;
            let login = client.login(&username, password).await?;
            println!("Logged in as {}", login.user_name);
            Ok(())
        }
        Commands::Register { name, email } => {
            let password = require_password(&config)?;
            let client = HttpClient::new(&config.base_url)?;
            let account = NewAccount {
                username: email.clone(),
                email,
                full_name: name,
                password: password.to_string(),
            };
            client.register(&account).await?;
            println!("Registered and logged in as {}", account.username);
            Ok(())
        }
        Commands::SetKey { key } => {
            let key = key
                .or_else(|| config.api_key.clone())
                .context("No API key given: pass --key or set GEMINI_API_KEY")?;
            let client = HttpClient::new(&config.base_url)?;
            authenticate(&client, &config).await?;
            client.save_api_key(&key).await?;
            println!("API key saved");
            Ok(())
        }
        Commands::KeyStatus => {
            let client = HttpClient::new(&config.base_url)?;
            authenticate(&client, &config).await?;
            let status = client.get_api_key_status().await?;
            println!(
                "API key configured: {}",
                if status.configured { "yes" } else { "no" }
            );
            Ok(())
        }
        Commands::Generate {
            url,
            output,
            search,
        } => {
            let output_dir = output.unwrap_or_else(|| config.output_dir.clone());
            generate(&config, &url, output_dir, search.as_deref()).await
        }
    }
}

fn require_password(config: &CliConfig) -> Result<&str> {
    config
        .password
        .as_deref()
        .context("DOCUGEN_PASSWORD is not set")
}

/// Log in when credentials are configured; otherwise rely on the backend
/// accepting anonymous requests.
async fn authenticate(client: &HttpClient, config: &CliConfig) -> Result<()> {
    match config.credentials() {
        Some((username, password)) => {
            let login = client.login(username, password).await?;
            tracing::info!(user_name = %login.user_name, "Session established");
            Ok(())
        }
        None => {
            tracing::warn!("No credentials configured, continuing without a session");
            Ok(())
        }
    }
}

async fn generate(
    config: &CliConfig,
    url: &str,
    output_dir: PathBuf,
    search: Option<&str>,
) -> Result<()> {
    validate(url).with_context(|| format!("Rejected repository URL {url:?}"))?;

    let client = Arc::new(HttpClient::new(&config.base_url)?.with_api_key(config.api_key.clone()));
    authenticate(&client, config).await?;

    let handle = Poller::new(client).submit(url)?;
    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let status = updates.borrow_and_update().clone();
            println!("{}", render_status(&status));
        }
    });

    let finished = tokio::select! {
        r = handle.wait() => r,
        _ = tokio::signal::ctrl_c() => {
            tracing::warn!("Interrupted, cancelling analysis");
            Err(PollError::Cancelled)
        }
    };
    if matches!(finished, Err(PollError::Cancelled)) {
        printer.abort();
    } else if let Err(e) = printer.await {
        tracing::warn!(error = %e, "Status printer task failed");
    }

    let outcome = match finished {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(command = "generate", error = %e, "Analysis did not complete");
            return Err(e.into());
        }
    };

    println!("{}", render_summary(&outcome.summary));
    let mut workspace = Workspace::new();
    workspace.apply_outcome(outcome);

    let files = match search {
        Some(query) => workspace.search(query),
        None => workspace.files().to_vec(),
    };
    print!("{}", render_tree(&files));

    match workspace.export_generated(&output_dir) {
        Ok(written) => {
            for path in &written {
                println!("wrote {}", path.display());
            }
            tracing::info!(command = "generate", count = written.len(), "Generation complete");
            Ok(())
        }
        Err(e @ ExportError::NothingToExport) => Err(e.into()),
        Err(e) => Err(e).with_context(|| format!("Failed to export to {}", output_dir.display())),
    }
}
