//! stored CLI
//!
//! Reads, writes and deletes documents in a MongoDB-backed store.

use std::{io, process::ExitCode};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stored::{mongodb::MongoDbConnector, prelude::*};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

const PROJECT_ENV_NAME: &str = "STORED_PROJECT";
const URI_ENV_NAME: &str = "STORED_MONGODB_URI";

#[derive(Parser, Debug)]
#[command(name = "stored")]
#[command(about = "Read and write documents in a stored document store")]
#[command(version)]
#[command(after_help = "\
Every store lives in a project (the MongoDB database name). Pass it with
--project or set STORED_PROJECT.

Credentials are taken from the connection string in --uri or STORED_MONGODB_URI.")]
struct Cli {
    /// Project holding the documents
    #[arg(short, long, global = true, env = PROJECT_ENV_NAME)]
    project: Option<String>,

    /// MongoDB connection string
    #[arg(long, global = true, env = URI_ENV_NAME, default_value = "mongodb://localhost:27017")]
    uri: String,

    /// Work inside a single collection; ids become collection-relative
    #[arg(short, long, global = true)]
    collection: Option<String>,

    /// Log store operations to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the document referred to by ID
    Get { id: String },
    /// Store the JSON object read from stdin as the document referred to by ID
    Set { id: String },
    /// Delete the document referred to by ID
    #[command(alias = "delete")]
    Del { id: String },
    /// Print every document id
    List,
    /// Print every document as ID<TAB>JSON
    Dump,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "stored=debug,stored_core=debug,stored_mongodb=debug" } else { "warn" };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let project = cli
        .project
        .context(format!("Missing project name. Pass --project or set {PROJECT_ENV_NAME}."))?;

    let store = MongoDbConnector::new(&cli.uri)
        .store_builder(project)
        .maybe_collection(cli.collection)
        .build()?;

    debug!(?store, command = ?cli.command, "running command");

    let result = match cli.command {
        Commands::Get { id } => commands::get(&store, &Id::from(id), &mut io::stdout()).await,
        Commands::Set { id } => {
            let input = io::read_to_string(io::stdin()).context("failed to read stdin")?;
            commands::set(&store, &Id::from(id), &input).await
        }
        Commands::Del { id } => commands::del(&store, &Id::from(id)).await,
        Commands::List => commands::list(&store, &mut io::stdout()).await,
        Commands::Dump => commands::dump(&store, &mut io::stdout()).await,
    };

    store.close().await;

    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() { ExitCode::FAILURE } else { ExitCode::SUCCESS };
        }
    };

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
