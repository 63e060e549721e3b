use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use scraper_wizard::config::Config;
use scraper_wizard::dataset::TabularDataset;
use scraper_wizard::infra::{GoogleSheetsClient, ReqwestProcessingClient};
use scraper_wizard::logging;
use scraper_wizard::observability;
use scraper_wizard::pipeline::ingestion::{IngestionSource, LocalFileSource, RemoteSpreadsheetSource};
use scraper_wizard::{SubmissionOutcome, WizardSession};

#[derive(Parser)]
#[command(name = "scraper_wizard")]
#[command(about = "Enrich a table row by row through a templated processing service")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SourceArgs {
    /// Local delimited-text file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Google Sheets URL containing /d/<id>
    #[arg(long)]
    sheet_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest a source and print the parsed table
    Preview {
        #[command(flatten)]
        source: SourceArgs,
        /// Print rows as JSON objects
        #[arg(long)]
        json: bool,
        /// Maximum rows to print
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Ingest, submit for processing and save the processed results
    Process {
        #[command(flatten)]
        source: SourceArgs,
        /// Column whose values feed the prompt
        #[arg(long)]
        main_column: String,
        /// Prompt template with exactly one {placeholder}
        #[arg(long)]
        prompt: String,
        /// Directory the processed results are written into
        #[arg(long, default_value = "output")]
        output: PathBuf,
    },
}

impl SourceArgs {
    async fn into_source(self) -> anyhow::Result<IngestionSource> {
        match (self.file, self.sheet_url) {
            (Some(path), _) => Ok(LocalFileSource::open(&path).await?.into()),
            (None, Some(url)) => Ok(RemoteSpreadsheetSource::new(url).into()),
            (None, None) => anyhow::bail!("either --file or --sheet-url is required"),
        }
    }
}

fn print_table(dataset: &TabularDataset, limit: usize) {
    println!("   {}", dataset.headers().join(" | "));
    for record in dataset.records().take(limit) {
        println!("   {}", record.values().join(" | "));
    }
    if dataset.len() > limit {
        println!("   ... {} more rows", dataset.len() - limit);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = logging::init_logging();
    observability::describe_all();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;

    let sheets = Arc::new(GoogleSheetsClient::new(config.sheets.clone()));
    let processing = Arc::new(ReqwestProcessingClient::new(&config.processing)?);
    info!(endpoint = processing.endpoint(), "Processing service configured");
    let session = WizardSession::new(sheets, processing);

    match cli.command {
        Commands::Preview { source, json, limit } => {
            println!("📥 Ingesting data...");
            session.ingest(source.into_source().await?).await?;
            let dataset = session.dataset().await.context("no dataset after ingestion")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&dataset.to_json_records())?);
            } else {
                println!("\n📊 {} columns, {} rows:", dataset.headers().len(), dataset.len());
                print_table(&dataset, limit);
            }
        }
        Commands::Process {
            source,
            main_column,
            prompt,
            output,
        } => {
            println!("📥 Step 1: Ingesting data...");
            session.ingest(source.into_source().await?).await?;

            println!("📡 Step 2: Submitting for processing...");
            match session.process(&main_column, &prompt).await {
                Ok(SubmissionOutcome::Applied { rows, columns, .. }) => {
                    println!("✅ Received {} rows across {} columns", rows, columns);
                }
                Ok(SubmissionOutcome::Discarded { .. }) => {
                    anyhow::bail!("result was discarded because the dataset changed");
                }
                Err(e) => {
                    error!("Processing failed: {}", e);
                    println!("❌ {}", e);
                    return Err(e.into());
                }
            }

            if let Some(result) = session.preview().await {
                println!("\n📊 Processed data:");
                print_table(result.preview(), 10);
            }

            let path = session.export().await?.write_to(&output).await?;
            println!("\n💾 Output file: {}", path.display());
        }
    }
    Ok(())
}
