use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use futures_util::StreamExt;
use passbook_core::{PageRecord, StreamRecord, StructuredTransaction};
use passbook_ingest::{BankId, DocumentOpener, JsonTableDocument, Orchestrator, stream_async};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod state;

#[derive(Parser, Debug)]
#[command(name = "passbook", version, about = "Rebuild bank statement transactions from extracted tables")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a document of extracted tables into transactions
    Parse {
        /// JSON file with per-page tables
        document: PathBuf,

        /// Bank name (defaults to the configured bank)
        #[arg(long)]
        bank: Option<String>,

        #[arg(long)]
        password: Option<String>,

        /// Emit one JSON record per line as pages complete
        #[arg(long)]
        stream: bool,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,

        /// Pages processed concurrently in batch mode
        #[arg(long)]
        workers: Option<usize>,
    },

    /// List supported bank names
    Banks,

    /// Manage ~/.passbook/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Serialize)]
struct ParseResponse<'a> {
    status: &'a str,
    bank: &'a str,
    pages: &'a [PageRecord],
    transactions: Vec<&'a StructuredTransaction>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Parse {
            document,
            bank,
            password,
            stream,
            compact,
            workers,
        } => {
            let cfg = config::load_config()?;

            let bank = bank.unwrap_or(cfg.parse.default_bank);
            let orchestrator = Orchestrator::new(&bank);
            log::info!("parsing {} as {}", document.display(), orchestrator.bank().name());

            if stream || cfg.parse.stream {
                stream_document(orchestrator, document, password).await?;
            } else {
                let pretty = cfg.parse.pretty && !compact;
                let workers = workers.unwrap_or(cfg.parse.workers);
                parse_batch(orchestrator, &document, password.as_deref(), pretty, workers)?;
            }
        }

        Command::Banks => {
            for id in BankId::ALL {
                println!("{}", id.name());
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },
    }

    Ok(())
}

fn parse_batch(
    orchestrator: Orchestrator,
    document: &Path,
    password: Option<&str>,
    pretty: bool,
    workers: usize,
) -> Result<()> {
    let doc = JsonTableDocument::at(document);
    let report = if workers > 1 {
        orchestrator.run_batch_parallel(&doc, password, workers)
    } else {
        orchestrator.run_batch(&doc, password)
    };

    let response = ParseResponse {
        status: report.status(),
        bank: &report.bank,
        pages: &report.pages,
        transactions: report.transactions().collect(),
    };
    let out = if pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{out}");

    for page in report.errors() {
        eprintln!("page {}: {}", page.page, page.error.as_deref().unwrap_or(""));
    }
    if report.status() == "failed" {
        bail!("could not open {}", document.display());
    }
    Ok(())
}

async fn stream_document(
    orchestrator: Orchestrator,
    document: PathBuf,
    password: Option<String>,
) -> Result<()> {
    let doc: Arc<dyn DocumentOpener> = Arc::new(JsonTableDocument::at(&document));
    let mut records = std::pin::pin!(stream_async(orchestrator, doc, password, 2));

    let stdout = std::io::stdout();
    let mut failed = false;
    while let Some(record) = records.next().await {
        if let StreamRecord::Page(p) = &record {
            failed |= p.page == 0 && p.is_error();
        }
        let mut out = stdout.lock();
        writeln!(out, "{}", serde_json::to_string(&record)?)?;
        out.flush()?;
    }

    if failed {
        bail!("could not open {}", document.display());
    }
    Ok(())
}
